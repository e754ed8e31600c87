use tracing::{info, warn};

use crate::backup;
use crate::corpus::CorpusWalker;
use crate::fixes;
use crate::income;
use crate::roster::{RosterInjector, dedup_records};
use crate::validate;

use super::error::CoreError;
use super::types::{RunOptions, RunReport};

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Self
    }

    /// Restore, known fixes, rewrite, roster injection, income boost and
    /// validation, in that order. Only restore failures are fatal.
    pub fn run(&self, options: &RunOptions) -> Result<RunReport, CoreError> {
        let xml_root = options.xml_root();
        let faction = options.faction;
        let mut report = RunReport::new(faction, xml_root.clone());
        info!(%faction, mod_dir = %options.mod_dir.display(), "applying skirmish god mode");

        if options.restore {
            info!("step 1: restoring from clean backup");
            report.restore = backup::restore(&options.mod_dir, options.backup_dir.as_deref())?;
        }
        if !xml_root.is_dir() {
            warn!(path = %xml_root.display(), "XML root not found, nothing to rewrite");
        }

        if options.fixes {
            info!("step 2: applying known corpus fixes");
            let fixed = fixes::apply_known_fixes(&xml_root);
            report.fixes_applied = fixed.files_fixed;
            report.issues.extend(fixed.issues);
        }

        info!("step 3: rewriting entities for {faction}");
        let walk = CorpusWalker::new(faction, &xml_root)
            .with_diagnostics(options.diagnostics)
            .walk();
        report.files_scanned = walk.files_scanned;
        report.files_modified = walk.files_modified;
        report.neutral_converted = walk.neutral_converted;
        report.faction_modified = walk.faction_modified;
        report.file_reports = walk.file_reports;
        report.issues.extend(walk.issues);

        let records = dedup_records(&walk.records);
        for record in &records {
            report.records.add(record.category, 1);
        }
        let injection = RosterInjector::new(faction, &xml_root).inject(&records);
        report.injected = injection.injected;
        report.soft_misses.extend(injection.soft_misses);
        report.issues.extend(injection.issues);

        if options.income_boost {
            info!("step 4: boosting starbase income for every faction");
            let boosted = income::boost_starbase_income(&xml_root);
            report.income_files_boosted = boosted.files_boosted;
            report.soft_misses.extend(boosted.soft_misses);
            report.issues.extend(boosted.issues);
        }

        if options.validation {
            info!("step 5: validating content files");
            let checked = validate::validate_tree(&xml_root);
            report.files_validated = checked.files_checked;
            report.validation_warnings = checked.warnings;
        }

        info!(
            modified = report.files_modified,
            records = report.records.total(),
            injected = report.injected.total(),
            issues = report.issues.len(),
            "done"
        );
        Ok(report)
    }
}
