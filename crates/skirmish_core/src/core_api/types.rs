use std::path::PathBuf;

use serde::Serialize;

use crate::faction::Faction;
use crate::mutate::RosterCategory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOptions {
    /// Working mod folder; the XML root is `<mod_dir>/Data/Xml`.
    pub mod_dir: PathBuf,
    /// Explicit pristine copy. Discovered next to `mod_dir` when absent.
    pub backup_dir: Option<PathBuf>,
    pub faction: Faction,
    pub restore: bool,
    pub fixes: bool,
    pub income_boost: bool,
    pub validation: bool,
    pub diagnostics: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mod_dir: PathBuf::from("."),
            backup_dir: None,
            faction: Faction::Republic,
            restore: true,
            fixes: true,
            income_boost: true,
            validation: true,
            diagnostics: false,
        }
    }
}

impl RunOptions {
    pub fn new(mod_dir: impl Into<PathBuf>, faction: Faction) -> Self {
        Self {
            mod_dir: mod_dir.into(),
            faction,
            ..Self::default()
        }
    }

    pub fn xml_root(&self) -> PathBuf {
        self.mod_dir.join("Data").join("Xml")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub squadrons: usize,
    pub small_ships: usize,
    pub capital_ships: usize,
    pub heroes: usize,
}

impl CategoryCounts {
    pub fn add(&mut self, category: RosterCategory, count: usize) {
        match category {
            RosterCategory::Squadron => self.squadrons += count,
            RosterCategory::SmallShip => self.small_ships += count,
            RosterCategory::CapitalShip => self.capital_ships += count,
            RosterCategory::Hero => self.heroes += count,
        }
    }

    pub fn total(&self) -> usize {
        self.squadrons + self.small_ships + self.capital_ships + self.heroes
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub neutral_converted: usize,
    pub faction_modified: usize,
    pub records: CategoryCounts,
    /// Names of every rewritten entity, in document order.
    pub entities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub stats: FileStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIssue {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoftMiss {
    pub path: PathBuf,
    pub category: Option<RosterCategory>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestoreOutcome {
    Skipped,
    Created {
        backup: PathBuf,
    },
    Mirrored {
        backup: PathBuf,
        copied: usize,
        removed: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub faction: Faction,
    pub xml_root: PathBuf,
    pub restore: RestoreOutcome,
    pub fixes_applied: usize,
    pub files_scanned: usize,
    pub files_modified: usize,
    pub neutral_converted: usize,
    pub faction_modified: usize,
    /// Unique conversion records handed to the roster injector.
    pub records: CategoryCounts,
    /// Names actually appended to build lists.
    pub injected: CategoryCounts,
    pub income_files_boosted: usize,
    pub files_validated: usize,
    /// Only filled in diagnostics mode.
    pub file_reports: Vec<FileReport>,
    pub issues: Vec<FileIssue>,
    pub soft_misses: Vec<SoftMiss>,
    pub validation_warnings: Vec<ValidationWarning>,
}

impl RunReport {
    pub fn new(faction: Faction, xml_root: PathBuf) -> Self {
        Self {
            faction,
            xml_root,
            restore: RestoreOutcome::Skipped,
            fixes_applied: 0,
            files_scanned: 0,
            files_modified: 0,
            neutral_converted: 0,
            faction_modified: 0,
            records: CategoryCounts::default(),
            injected: CategoryCounts::default(),
            income_files_boosted: 0,
            files_validated: 0,
            file_reports: Vec::new(),
            issues: Vec::new(),
            soft_misses: Vec::new(),
            validation_warnings: Vec::new(),
        }
    }
}
