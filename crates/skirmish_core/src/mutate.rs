use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use crate::classify::{BuildableType, Classification, Ownership};
use crate::faction::{Faction, FactionProfile, STARBASE_TOP_TIER, contains_ignore_ascii_case};
use crate::markup::{EntityBlock, EntityKind, OWNERSHIP_FIELD, fields};

const SPECIAL_STRUCTURES_FIELD: &str = "Required_Special_Structures";
const DROPPED_PREREQUISITES: [&str; 3] = [
    "Required_Planets",
    "Required_Orbiting_Units",
    "Tactical_Build_Prerequisites",
];
const LIFETIME_LIMIT_FIELD: &str = "Build_Limit_Lifetime_Per_Player";
const ECONOMY_FIELDS: [(&str, &str); 6] = [
    ("Build_Time_Seconds", "1"),
    ("Tactical_Build_Time_Seconds", "1"),
    ("Population_Value", "0"),
    ("Build_Limit_Current_Per_Player", "-1"),
    (LIFETIME_LIMIT_FIELD, "-1"),
    ("Build_Max_Instances_Per_Planet", "-1"),
];
const RESEARCH_LIFETIME_LIMIT: &str = "1";
const RESEARCH_PATH_MARKERS: [&str; 2] = ["Research", "Upgrades"];

const NON_BUILDABLE_PATTERN: &str = r"DUMMY|ORBITAL|DELETE_STRUCTURE|UPGRADE|DOWNGRADE|_Garrison(_|$)|_G(_|$)|Cost|UC_|Crate|Container|Ammo|Spawner|Debuff|Penalty|Death|Walker|Trooper|Infantry|Prop|Structure|Test|Marker|Loot|Treasure";

fn non_buildable_names() -> &'static Regex {
    static NON_BUILDABLE: OnceLock<Regex> = OnceLock::new();
    NON_BUILDABLE.get_or_init(|| {
        RegexBuilder::new(NON_BUILDABLE_PATTERN)
            .case_insensitive(true)
            .build()
            .expect("non-buildable name pattern is valid")
    })
}

pub fn is_non_buildable_name(name: &str) -> bool {
    non_buildable_names().is_match(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RosterCategory {
    Squadron,
    SmallShip,
    CapitalShip,
    Hero,
}

impl RosterCategory {
    pub fn from_buildable(buildable: BuildableType) -> Option<Self> {
        match buildable {
            BuildableType::Squadron => Some(Self::Squadron),
            BuildableType::SmallShip => Some(Self::SmallShip),
            BuildableType::CapitalShip => Some(Self::CapitalShip),
            BuildableType::Hero => Some(Self::Hero),
            BuildableType::Other => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Squadron => "squadron",
            Self::SmallShip => "small ship",
            Self::CapitalShip => "capital ship",
            Self::Hero => "hero",
        }
    }
}

impl fmt::Display for RosterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConversionRecord {
    pub unit_name: String,
    pub category: RosterCategory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub body: String,
    pub ownership: Ownership,
    pub record: Option<ConversionRecord>,
}

impl Mutation {
    pub fn is_converted(&self) -> bool {
        self.ownership == Ownership::Convertible
    }
}

#[derive(Debug, Clone)]
pub struct BlockMutator {
    faction: FactionProfile,
}

impl BlockMutator {
    pub fn new(faction: Faction) -> Self {
        Self {
            faction: faction.profile(),
        }
    }

    pub fn mutate(&self, block: &EntityBlock<'_>, classification: &Classification) -> Mutation {
        let ownership = classification.ownership;
        if !ownership.is_mutable() {
            return Mutation {
                body: block.body.to_string(),
                ownership,
                record: None,
            };
        }

        let mut body = block.body.to_string();
        let mut record = None;
        if ownership == Ownership::Convertible {
            body = self.convert(&body);
            record = conversion_record(block, classification.buildable);
        }
        body = economy_rewrite(&body, is_research_like(block));

        debug!(
            entity = block.name.unwrap_or("<unnamed>"),
            ?ownership,
            recorded = record.is_some(),
            "rewrote entity"
        );

        Mutation {
            body,
            ownership,
            record,
        }
    }

    fn convert(&self, body: &str) -> String {
        let mut body = fields::replace_first_field_value(body, OWNERSHIP_FIELD, self.faction.affiliation)
            .unwrap_or_else(|| body.to_string());
        body = fields::set_single_field(
            &body,
            SPECIAL_STRUCTURES_FIELD,
            &self.faction.frigate_yard(),
            OWNERSHIP_FIELD,
        );
        for field in DROPPED_PREREQUISITES {
            body = fields::remove_field(&body, field);
        }
        body = fields::set_field(&body, "Required_Star_Base_Level", &STARBASE_TOP_TIER.to_string());
        body = fields::set_field(&body, "Tech_Level", "1");
        body = fields::set_field(&body, "Build_Tab_Space_Units", "Yes");
        fields::set_field(&body, "Build_Initially_Locked", "No")
    }
}

fn conversion_record(block: &EntityBlock<'_>, buildable: BuildableType) -> Option<ConversionRecord> {
    if !matches!(
        block.kind,
        EntityKind::SpaceUnit | EntityKind::Squadron | EntityKind::HeroUnique
    ) {
        return None;
    }
    let name = block.name?;
    if is_non_buildable_name(name) {
        debug!(entity = name, "not recorded, helper object");
        return None;
    }
    Some(ConversionRecord {
        unit_name: name.to_string(),
        category: RosterCategory::from_buildable(buildable)?,
    })
}

fn is_research_like(block: &EntityBlock<'_>) -> bool {
    block.kind == EntityKind::Upgrade || path_mentions_research(block.source_file)
}

fn path_mentions_research(path: &Path) -> bool {
    let path = path.to_string_lossy();
    RESEARCH_PATH_MARKERS
        .iter()
        .any(|marker| contains_ignore_ascii_case(&path, marker))
}

/// Build time, population and build limits shared by every rewritten entity.
/// Technologies keep a lifetime limit of one and their other limits as is.
pub fn economy_rewrite(body: &str, research: bool) -> String {
    let mut body = body.to_string();
    for (field, value) in ECONOMY_FIELDS {
        let value = if !research {
            value
        } else if field == LIFETIME_LIMIT_FIELD {
            RESEARCH_LIFETIME_LIMIT
        } else if field.starts_with("Build_Limit") || field == "Build_Max_Instances_Per_Planet" {
            continue;
        } else {
            value
        };
        body = fields::set_field(&body, field, value);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_objects_are_not_buildable() {
        assert!(is_non_buildable_name("CIS_Garrison_Trooper"));
        assert!(is_non_buildable_name("Hapan_Dummy_Spawner"));
        assert!(is_non_buildable_name("Pirate_Fighter_G"));
        assert!(!is_non_buildable_name("Neutral_Hapan_Cruiser"));
        assert!(!is_non_buildable_name("Hapan_Gun_Boat"));
    }

    #[test]
    fn research_rewrite_only_sets_lifetime_limit() {
        let body = "\n\t\t<Build_Limit_Current_Per_Player>3</Build_Limit_Current_Per_Player>\n\t";
        let out = economy_rewrite(body, true);
        assert!(out.contains("<Build_Limit_Current_Per_Player>3</Build_Limit_Current_Per_Player>"));
        assert!(out.contains("<Build_Limit_Lifetime_Per_Player>1</Build_Limit_Lifetime_Per_Player>"));
        assert!(!out.contains("Build_Max_Instances_Per_Planet"));
        assert!(out.contains("<Build_Time_Seconds>1</Build_Time_Seconds>"));
        assert_eq!(economy_rewrite(&out, true), out);
    }
}
