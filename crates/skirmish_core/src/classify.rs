use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::faction::{Faction, FactionProfile, contains_ignore_ascii_case};
use crate::markup::{EntityBlock, EntityKind, fields};

/// Shared base-class definitions every faction's AI depends on.
pub const EXCLUDED_FILES: [&str; 7] = [
    "_Default_Base.xml",
    "_Attrition.xml",
    "BuildPads.xml",
    "Research_Facilities_Default.xml",
    "Shipyards_Default.xml",
    "Units_Space_Neutral_Freighters.xml",
    "Units_Space_Neutral_CEC_YT.xml",
];

pub const NON_PLAYABLE_GROUPS: [&str; 10] = [
    "HC",
    "Cartels",
    "CSA",
    "Warlords",
    "Mand",
    "Mandalorian",
    "H",
    "S",
    "Sith",
    "Naboo",
];

const CONVERTIBLE_MARKERS: [&str; 2] = ["Neutral", "Underworld"];
const CAPITAL_MARKERS: [&str; 6] = [
    "Capital",
    "Destroyer",
    "Cruiser",
    "Carrier",
    "Battleship",
    "Dreadnought",
];
const CATEGORY_FIELD: &str = "CategoryMask";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Ownership {
    Owned,
    Convertible,
    Foreign,
    Excluded,
    Unmatched,
}

impl Ownership {
    pub fn is_mutable(&self) -> bool {
        matches!(self, Self::Owned | Self::Convertible)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuildableType {
    Squadron,
    SmallShip,
    CapitalShip,
    Hero,
    Other,
}

/// One step of the classification chain. Rules are evaluated in order and
/// the first one that matches decides the entity's [`Ownership`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rule {
    ExcludedFile,
    ForeignFactionFile,
    ForeignName,
    ConvertibleOwnership,
    OwnedAffiliation,
    OwnedUpgradeDirectory,
}

impl Rule {
    pub const ORDER: [Rule; 6] = [
        Self::ExcludedFile,
        Self::ForeignFactionFile,
        Self::ForeignName,
        Self::ConvertibleOwnership,
        Self::OwnedAffiliation,
        Self::OwnedUpgradeDirectory,
    ];

    pub fn outcome(&self) -> Ownership {
        match *self {
            Self::ExcludedFile => Ownership::Excluded,
            Self::ForeignFactionFile | Self::ForeignName => Ownership::Foreign,
            Self::ConvertibleOwnership => Ownership::Convertible,
            Self::OwnedAffiliation | Self::OwnedUpgradeDirectory => Ownership::Owned,
        }
    }

    pub fn is_file_level(&self) -> bool {
        matches!(self, Self::ExcludedFile | Self::ForeignFactionFile)
    }

    pub fn matches(&self, subject: &Subject<'_>, faction: &FactionProfile) -> bool {
        match *self {
            Self::ExcludedFile => is_excluded_file(subject.path),
            Self::ForeignFactionFile => is_foreign_file(subject.path, faction),
            Self::ForeignName => subject
                .name
                .is_some_and(|name| has_foreign_name_segment(name, faction)),
            Self::ConvertibleOwnership => {
                subject.ownership_tag.is_some_and(is_convertible_tag)
                    && !has_faction_path_marker(subject.path)
            }
            Self::OwnedAffiliation => subject
                .ownership_tag
                .is_some_and(|tag| faction.matches_affiliation(tag)),
            Self::OwnedUpgradeDirectory => {
                subject.kind == Some(EntityKind::Upgrade)
                    && subject.path.parent().is_some_and(|dir| {
                        contains_ignore_ascii_case(&dir.to_string_lossy(), faction.directory)
                    })
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match *self {
            Self::ExcludedFile => "excluded file",
            Self::ForeignFactionFile => "foreign faction file",
            Self::ForeignName => "foreign name",
            Self::ConvertibleOwnership => "convertible ownership",
            Self::OwnedAffiliation => "owned affiliation",
            Self::OwnedUpgradeDirectory => "owned upgrade directory",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject<'a> {
    pub kind: Option<EntityKind>,
    pub name: Option<&'a str>,
    pub ownership_tag: Option<&'a str>,
    pub path: &'a Path,
}

impl<'a> Subject<'a> {
    pub fn file(path: &'a Path) -> Self {
        Self {
            kind: None,
            name: None,
            ownership_tag: None,
            path,
        }
    }
}

impl<'a> From<&EntityBlock<'a>> for Subject<'a> {
    fn from(block: &EntityBlock<'a>) -> Self {
        Self {
            kind: Some(block.kind),
            name: block.name,
            ownership_tag: block.ownership_tag,
            path: block.source_file,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub ownership: Ownership,
    pub rule: Option<Rule>,
    pub buildable: BuildableType,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    faction: FactionProfile,
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(faction: Faction) -> Self {
        Self::with_rules(faction, Rule::ORDER.to_vec())
    }

    pub fn with_rules(faction: Faction, rules: Vec<Rule>) -> Self {
        Self {
            faction: faction.profile(),
            rules,
        }
    }

    pub fn faction(&self) -> &FactionProfile {
        &self.faction
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn file_verdict(&self, path: &Path) -> Option<Rule> {
        let subject = Subject::file(path);
        self.rules
            .iter()
            .copied()
            .filter(Rule::is_file_level)
            .find(|rule| rule.matches(&subject, &self.faction))
    }

    pub fn classify(&self, block: &EntityBlock<'_>) -> Classification {
        let subject = Subject::from(block);
        let rule = self
            .rules
            .iter()
            .copied()
            .find(|rule| rule.matches(&subject, &self.faction));
        let ownership = rule.map_or(Ownership::Unmatched, |rule| rule.outcome());

        debug!(
            entity = block.name.unwrap_or("<unnamed>"),
            kind = %block.kind,
            ?ownership,
            "classified"
        );

        Classification {
            ownership,
            rule,
            buildable: buildable_type(block.kind, block.body),
        }
    }
}

pub fn buildable_type(kind: EntityKind, body: &str) -> BuildableType {
    match kind {
        EntityKind::Squadron => BuildableType::Squadron,
        EntityKind::HeroUnique => BuildableType::Hero,
        EntityKind::SpaceUnit => {
            let mask = fields::field_value(body, CATEGORY_FIELD).unwrap_or("");
            if CAPITAL_MARKERS
                .iter()
                .any(|marker| contains_ignore_ascii_case(mask, marker))
            {
                BuildableType::CapitalShip
            } else {
                BuildableType::SmallShip
            }
        }
        _ => BuildableType::Other,
    }
}

pub fn is_excluded_file(path: &Path) -> bool {
    path.file_name().is_some_and(|name| {
        let name = name.to_string_lossy();
        EXCLUDED_FILES
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(&name))
    })
}

fn is_foreign_file(path: &Path, faction: &FactionProfile) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy();
    faction.rivals().any(|rival| {
        rival
            .file_keywords
            .iter()
            .any(|keyword| has_separated_keyword(&name, keyword, &['_', '\\'], &['_', '\\']))
    })
}

fn has_foreign_name_segment(name: &str, faction: &FactionProfile) -> bool {
    if !name.contains('_') {
        return false;
    }
    let foreign: Vec<&str> = faction
        .rivals()
        .flat_map(|rival| rival.name_keywords.iter().copied())
        .chain(NON_PLAYABLE_GROUPS)
        .collect();
    name.split('_').any(|segment| {
        foreign
            .iter()
            .any(|keyword| segment.eq_ignore_ascii_case(keyword))
    })
}

fn is_convertible_tag(ownership_tag: &str) -> bool {
    CONVERTIBLE_MARKERS
        .iter()
        .any(|marker| contains_ignore_ascii_case(ownership_tag, marker))
}

/// Whether any major faction marks the path, e.g. `Units/Space/Empire/...`
/// or `Units_Hero_Republic_...`. `Old_Republic` style names do not count.
pub fn has_faction_path_marker(path: &Path) -> bool {
    let haystack = format!("/{}", path.to_string_lossy());
    Faction::ALL.iter().any(|faction| {
        faction.profile().file_keywords.iter().any(|keyword| {
            has_separated_keyword(&haystack, keyword, &['/', '\\', '_'], &['/', '\\', '_', '.'])
        })
    })
}

// `leading` must not follow `Old`.
fn has_separated_keyword(haystack: &str, keyword: &str, leading: &[char], trailing: &[char]) -> bool {
    let haystack = haystack.to_ascii_lowercase();
    let keyword = keyword.to_ascii_lowercase();

    haystack.match_indices(&keyword).any(|(idx, _)| {
        let before = &haystack[..idx];
        let Some(sep) = before.chars().next_back() else {
            return false;
        };
        if !leading.contains(&sep) {
            return false;
        }
        if before[..before.len() - sep.len_utf8()].ends_with("old") {
            return false;
        }
        haystack[idx + keyword.len()..]
            .chars()
            .next()
            .is_some_and(|after| trailing.contains(&after))
    })
}
