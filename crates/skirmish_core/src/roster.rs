//! Appends newly buildable units to the faction's production buildings.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core_api::{CategoryCounts, FileIssue, SoftMiss};
use crate::document_io::{read_document, write_document};
use crate::faction::{Faction, FactionProfile, STARBASE_TOP_TIER};
use crate::markup::{Element, ElementLocator, fields};
use crate::mutate::{ConversionRecord, RosterCategory};
use crate::span::{ByteRange, Splices};

pub const BUILD_LIST_FIELD: &str = "Tactical_Buildable_Objects_Multiplayer";

const ENTRY_INDENT: &str = "\n\t\t\t\t";
const CLOSING_INDENT: &str = "\n\t\t\t";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildingMatch {
    Named(String),
    /// Every skirmish starbase of the highest tier in the file; `expected` is
    /// the faction's own name for it, used in messages.
    TopTierStarbase { expected: String },
}

impl BuildingMatch {
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            Self::Named(expected) => name.eq_ignore_ascii_case(expected),
            Self::TopTierStarbase { .. } => {
                let lower = name.to_ascii_lowercase();
                lower.starts_with("skirmish_")
                    && lower.ends_with(&format!("_star_base_{STARBASE_TOP_TIER}"))
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::TopTierStarbase { expected } => {
                format!("{expected} (or any Skirmish_*_Star_Base_{STARBASE_TOP_TIER})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterTarget {
    pub category: RosterCategory,
    pub file: PathBuf,
    pub element_tag: &'static str,
    pub building: BuildingMatch,
}

pub fn roster_targets(faction: &FactionProfile) -> Vec<RosterTarget> {
    let dir = faction.skirmish_buildings_dir();
    vec![
        RosterTarget {
            category: RosterCategory::Squadron,
            file: dir.join("Starbases.xml"),
            element_tag: "StarBase",
            building: BuildingMatch::TopTierStarbase {
                expected: faction.starbase(STARBASE_TOP_TIER),
            },
        },
        RosterTarget {
            category: RosterCategory::SmallShip,
            file: dir.join("Shipyards.xml"),
            element_tag: "SpaceBuildable",
            building: BuildingMatch::Named(faction.frigate_yard()),
        },
        RosterTarget {
            category: RosterCategory::CapitalShip,
            file: dir.join("Shipyards.xml"),
            element_tag: "SpaceBuildable",
            building: BuildingMatch::Named(faction.capital_yard()),
        },
        RosterTarget {
            category: RosterCategory::Hero,
            file: dir.join("Research_Facilities.xml"),
            element_tag: "SpaceBuildable",
            building: BuildingMatch::Named(faction.research_facility()),
        },
    ]
}

pub fn dedup_records(records: &[ConversionRecord]) -> Vec<ConversionRecord> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| seen.insert(record.unit_name.to_ascii_lowercase()))
        .cloned()
        .collect()
}

pub fn build_list_members(list: &str) -> impl Iterator<Item = &str> {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|member| !member.is_empty())
}

pub fn is_build_list_member(list: &str, name: &str) -> bool {
    build_list_members(list).any(|member| member.eq_ignore_ascii_case(name))
}

/// Returns the new list value and the names it gained, or `None` when every
/// name is already a member.
pub fn append_to_build_list<'n>(list: &str, names: &[&'n str]) -> Option<(String, Vec<&'n str>)> {
    let mut added: Vec<&'n str> = Vec::new();
    for &name in names {
        let already = is_build_list_member(list, name)
            || added.iter().any(|seen| seen.eq_ignore_ascii_case(name));
        if !already {
            added.push(name);
        }
    }
    if added.is_empty() {
        return None;
    }

    let existing = list.trim_end();
    let mut out = String::with_capacity(list.len() + added.len() * 32);
    out.push_str(existing);
    if !existing.trim().is_empty() && !existing.ends_with(',') {
        out.push(',');
    }
    for name in &added {
        out.push_str(ENTRY_INDENT);
        out.push_str(name);
        out.push(',');
    }
    out.push_str(CLOSING_INDENT);
    Some((out, added))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionReport {
    pub injected: CategoryCounts,
    pub files_written: Vec<PathBuf>,
    pub soft_misses: Vec<SoftMiss>,
    pub issues: Vec<FileIssue>,
}

#[derive(Debug, Clone)]
pub struct RosterInjector {
    faction: FactionProfile,
    xml_root: PathBuf,
}

impl RosterInjector {
    pub fn new(faction: Faction, xml_root: impl Into<PathBuf>) -> Self {
        Self {
            faction: faction.profile(),
            xml_root: xml_root.into(),
        }
    }

    pub fn inject(&self, records: &[ConversionRecord]) -> InjectionReport {
        let records = dedup_records(records);
        let mut report = InjectionReport::default();
        if records.is_empty() {
            return report;
        }

        let targets = roster_targets(&self.faction);
        let mut files: Vec<&Path> = Vec::new();
        for target in &targets {
            if !files.contains(&target.file.as_path()) {
                files.push(&target.file);
            }
        }

        for file in files {
            let pending: Vec<(&RosterTarget, Vec<&str>)> = targets
                .iter()
                .filter(|target| target.file == file)
                .map(|target| (target, names_for(&records, target.category)))
                .filter(|(_, names)| !names.is_empty())
                .collect();
            if pending.is_empty() {
                continue;
            }
            self.inject_file(file, &pending, &mut report);
        }

        info!(
            faction = %self.faction.faction,
            injected = report.injected.total(),
            soft_misses = report.soft_misses.len(),
            "roster injection finished"
        );
        report
    }

    fn inject_file(
        &self,
        file: &Path,
        pending: &[(&RosterTarget, Vec<&str>)],
        report: &mut InjectionReport,
    ) {
        let path = self.xml_root.join(file);
        let text = match read_document(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                for (target, _) in pending {
                    soft_miss(report, file, target.category, "roster file not found".to_string());
                }
                return;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read roster file");
                report.issues.push(FileIssue {
                    path: file.to_path_buf(),
                    message: err.to_string(),
                });
                return;
            }
        };

        let mut splices = Splices::new();
        let mut gained: Vec<(RosterCategory, usize)> = Vec::new();
        for (target, names) in pending {
            match plan_target(&text, target, names, &mut splices) {
                Ok(count) => gained.push((target.category, count)),
                Err(message) => soft_miss(report, file, target.category, message),
            }
        }
        if splices.is_empty() {
            return;
        }

        splices.sort();
        let written = splices
            .apply(&text)
            .and_then(|updated| write_document(&path, &updated));
        match written {
            Ok(()) => {
                for (category, count) in gained {
                    report.injected.add(category, count);
                }
                report.files_written.push(file.to_path_buf());
                info!(path = %file.display(), "updated build lists");
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot write roster file");
                report.issues.push(FileIssue {
                    path: file.to_path_buf(),
                    message: err.to_string(),
                });
            }
        }
    }
}

fn names_for(records: &[ConversionRecord], category: RosterCategory) -> Vec<&str> {
    records
        .iter()
        .filter(|record| record.category == category)
        .map(|record| record.unit_name.as_str())
        .collect()
}

/// Queues the build-list edits for one target and returns how many distinct
/// names it gains. `Err` carries the soft-miss message.
fn plan_target(
    text: &str,
    target: &RosterTarget,
    names: &[&str],
    splices: &mut Splices,
) -> Result<usize, String> {
    let buildings: Vec<Element<'_>> =
        ElementLocator::new(text, |tag: &str| tag.eq_ignore_ascii_case(target.element_tag))
            .filter(|element| element.name().is_some_and(|name| target.building.accepts(name)))
            .collect();
    if buildings.is_empty() {
        return Err(format!(
            "no {} named {}",
            target.element_tag,
            target.building.describe()
        ));
    }

    let mut gained: Vec<&str> = Vec::new();
    let mut with_list = 0usize;
    for building in &buildings {
        let Some(list) = fields::find_field(building.body, BUILD_LIST_FIELD) else {
            continue;
        };
        with_list += 1;
        let Some((value, added)) = append_to_build_list(list.body, names) else {
            continue;
        };
        let offset = building.body_range.start;
        splices.push(
            ByteRange::new(offset + list.body_range.start, offset + list.body_range.end),
            value,
        );
        for name in added {
            if !gained.contains(&name) {
                gained.push(name);
            }
        }
    }

    if with_list == 0 {
        return Err(format!(
            "{} has no {BUILD_LIST_FIELD}",
            target.building.describe()
        ));
    }
    Ok(gained.len())
}

fn soft_miss(report: &mut InjectionReport, file: &Path, category: RosterCategory, message: String) {
    warn!(path = %file.display(), %category, "{message}");
    report.soft_misses.push(SoftMiss {
        path: file.to_path_buf(),
        category: Some(category),
        message,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_is_delimited_and_case_insensitive() {
        let list = "\n\t\t\t\tHapan_Cruiser_Mk2,\n\t\t\t\tTie_Fighter";
        assert!(is_build_list_member(list, "tie_fighter"));
        assert!(!is_build_list_member(list, "Hapan_Cruiser"));
    }

    #[test]
    fn append_keeps_existing_entries_and_skips_members() {
        let list = "\n\t\t\t\tA_Wing\n\t\t\t";
        let (value, added) = append_to_build_list(list, &["B_Wing", "a_wing", "B_Wing"]).unwrap();
        assert_eq!(added, vec!["B_Wing"]);
        assert_eq!(value, "\n\t\t\t\tA_Wing,\n\t\t\t\tB_Wing,\n\t\t\t");
        assert!(append_to_build_list(&value, &["B_Wing"]).is_none());
    }

    #[test]
    fn top_tier_starbase_match() {
        let matcher = BuildingMatch::TopTierStarbase {
            expected: "Skirmish_Republic_Star_Base_5".to_string(),
        };
        assert!(matcher.accepts("Skirmish_Republic_Star_Base_5"));
        assert!(!matcher.accepts("Skirmish_Republic_Star_Base_4"));
        assert!(!matcher.accepts("Republic_Star_Base_5"));
    }
}
