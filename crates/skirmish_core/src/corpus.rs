use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::classify::Classifier;
use crate::core_api::{FileIssue, FileReport, FileStats};
use crate::document_io::{read_document, write_document};
use crate::faction::Faction;
use crate::markup::BlockLocator;
use crate::mutate::{BlockMutator, ConversionRecord};
use crate::span::Splices;

/// Top-level directories under the XML root that hold rewritable content.
pub const CONTENT_DIRS: [&str; 4] = ["Units", "Buildings", "Research", "Upgrades"];

const SKIPPED_DIR_MARKERS: [&str; 2] = ["Story", "Campaign"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkScope {
    /// Skips ground units, which skirmish space rosters never reference.
    Mutation,
    Validation,
}

fn is_skipped_dir(entry: &DirEntry, xml_root: &Path, scope: WalkScope) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let rel = entry.path().strip_prefix(xml_root).unwrap_or(entry.path());
    let rel_text = rel.to_string_lossy();
    if SKIPPED_DIR_MARKERS
        .iter()
        .any(|marker| rel_text.contains(marker))
    {
        return true;
    }
    scope == WalkScope::Mutation && rel.starts_with(Path::new("Units").join("Ground"))
}

fn is_xml_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

pub fn xml_files(xml_root: &Path, scope: WalkScope) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for dir in CONTENT_DIRS {
        let dir = xml_root.join(dir);
        if !dir.is_dir() {
            continue;
        }
        let walker = WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped_dir(entry, xml_root, scope));
        for entry in walker {
            match entry {
                Ok(entry) if is_xml_file(&entry) => out.push(entry.into_path()),
                Ok(_) => {}
                Err(err) => warn!(error = %err, "skipping unreadable directory entry"),
            }
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentRewrite {
    /// `None` when the document is unchanged.
    pub text: Option<String>,
    pub stats: FileStats,
    pub records: Vec<ConversionRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    pub files_scanned: usize,
    pub files_modified: usize,
    pub neutral_converted: usize,
    pub faction_modified: usize,
    pub records: Vec<ConversionRecord>,
    /// Only collected in diagnostics mode.
    pub file_reports: Vec<FileReport>,
    pub issues: Vec<FileIssue>,
}

#[derive(Debug, Clone)]
pub struct CorpusWalker {
    xml_root: PathBuf,
    classifier: Classifier,
    mutator: BlockMutator,
    diagnostics: bool,
}

impl CorpusWalker {
    pub fn new(faction: Faction, xml_root: impl Into<PathBuf>) -> Self {
        Self {
            xml_root: xml_root.into(),
            classifier: Classifier::new(faction),
            mutator: BlockMutator::new(faction),
            diagnostics: false,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Rewrites `text`, whose path relative to the XML root is `rel`.
    pub fn rewrite_document(&self, text: &str, rel: &Path) -> io::Result<DocumentRewrite> {
        let mut rewrite = DocumentRewrite::default();
        if let Some(rule) = self.classifier.file_verdict(rel) {
            debug!(path = %rel.display(), %rule, "file skipped");
            return Ok(rewrite);
        }

        let mut splices = Splices::new();
        for block in BlockLocator::new(text, rel) {
            let classification = self.classifier.classify(&block);
            if !classification.ownership.is_mutable() {
                continue;
            }
            let mutation = self.mutator.mutate(&block, &classification);

            if mutation.is_converted() {
                rewrite.stats.neutral_converted += 1;
            } else {
                rewrite.stats.faction_modified += 1;
            }
            rewrite
                .stats
                .entities
                .push(block.name.unwrap_or("Unknown").to_string());
            if let Some(record) = mutation.record {
                rewrite.stats.records.add(record.category, 1);
                rewrite.records.push(record);
            }
            if mutation.body != block.body {
                splices.push(block.body_range, mutation.body);
            }
        }

        if !splices.is_empty() {
            rewrite.text = Some(splices.apply(text)?);
        }
        Ok(rewrite)
    }

    pub fn walk(&self) -> WalkReport {
        let mut report = WalkReport::default();
        for path in xml_files(&self.xml_root, WalkScope::Mutation) {
            report.files_scanned += 1;
            let rel = path
                .strip_prefix(&self.xml_root)
                .unwrap_or(&path)
                .to_path_buf();
            if let Err(err) = self.process_file(&path, &rel, &mut report) {
                warn!(path = %rel.display(), error = %err, "skipping file");
                report.issues.push(FileIssue {
                    path: rel,
                    message: err.to_string(),
                });
            }
        }

        info!(
            scanned = report.files_scanned,
            modified = report.files_modified,
            neutral_converted = report.neutral_converted,
            faction_modified = report.faction_modified,
            records = report.records.len(),
            "corpus rewrite finished"
        );
        report
    }

    fn process_file(&self, path: &Path, rel: &Path, report: &mut WalkReport) -> io::Result<()> {
        let text = read_document(path)?;
        let rewrite = self.rewrite_document(&text, rel)?;
        let Some(updated) = rewrite.text else {
            return Ok(());
        };
        write_document(path, &updated)?;

        report.files_modified += 1;
        report.neutral_converted += rewrite.stats.neutral_converted;
        report.faction_modified += rewrite.stats.faction_modified;
        // Records only count once their entity is on disk.
        report.records.extend(rewrite.records);
        debug!(
            path = %rel.display(),
            converted = rewrite.stats.neutral_converted,
            modified = rewrite.stats.faction_modified,
            "file rewritten"
        );
        if self.diagnostics {
            report.file_reports.push(FileReport {
                path: rel.to_path_buf(),
                stats: rewrite.stats,
            });
        }
        Ok(())
    }
}
