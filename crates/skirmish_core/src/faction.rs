use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};

/// Highest starbase tier in skirmish; converted units require it.
pub const STARBASE_TOP_TIER: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Republic,
    Cis,
    Rebellion,
    Empire,
}

impl Faction {
    pub const ALL: [Faction; 4] = [Self::Republic, Self::Cis, Self::Rebellion, Self::Empire];

    pub fn menu_index(&self) -> u8 {
        match *self {
            Self::Republic => 1,
            Self::Cis => 2,
            Self::Rebellion => 3,
            Self::Empire => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Republic => "Republic",
            Self::Cis => "CIS",
            Self::Rebellion => "Rebellion",
            Self::Empire => "Empire",
        }
    }

    pub fn profile(&self) -> FactionProfile {
        match *self {
            Self::Republic => FactionProfile {
                faction: *self,
                display_name: "Republic",
                affiliation: "Republic",
                affiliation_keywords: &["Republic"],
                file_keywords: &["Republic"],
                name_keywords: &["Republic", "Rep"],
                short_code: "Republic",
                directory: "Republic",
            },
            Self::Cis => FactionProfile {
                faction: *self,
                display_name: "CIS",
                affiliation: "CIS",
                affiliation_keywords: &["CIS", "Confederacy"],
                file_keywords: &["CIS", "Confederacy"],
                name_keywords: &["CIS", "Confederacy"],
                short_code: "CIS",
                directory: "CIS",
            },
            Self::Rebellion => FactionProfile {
                faction: *self,
                display_name: "Rebellion",
                affiliation: "Rebel",
                affiliation_keywords: &["Rebel"],
                file_keywords: &["Rebel"],
                name_keywords: &["Rebel", "R"],
                short_code: "R",
                directory: "Rebel",
            },
            Self::Empire => FactionProfile {
                faction: *self,
                display_name: "Empire",
                affiliation: "Empire",
                affiliation_keywords: &["Empire"],
                file_keywords: &["Empire"],
                name_keywords: &["Empire", "E"],
                short_code: "E",
                directory: "Empire",
            },
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Faction {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "republic" => Ok(Self::Republic),
            "2" | "cis" | "confederacy" => Ok(Self::Cis),
            "3" | "rebellion" | "rebel" => Ok(Self::Rebellion),
            "4" | "empire" => Ok(Self::Empire),
            _ => Err(CoreError::new(
                CoreErrorCode::InvalidSelection,
                format!(
                    "invalid faction '{value}', expected one of: 1, 2, 3, 4, republic, cis, rebellion, empire"
                ),
            )),
        }
    }
}

/// Everything the rewriter needs to know about the faction receiving god mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactionProfile {
    pub faction: Faction,
    pub display_name: &'static str,
    /// Value written into the ownership tag of converted entities.
    pub affiliation: &'static str,
    /// An ownership tag containing any of these belongs to the faction.
    pub affiliation_keywords: &'static [&'static str],
    /// Markers identifying the faction in file and directory names.
    pub file_keywords: &'static [&'static str],
    /// Underscore-separated segments identifying the faction in entity names.
    pub name_keywords: &'static [&'static str],
    pub short_code: &'static str,
    pub directory: &'static str,
}

impl FactionProfile {
    pub fn frigate_yard(&self) -> String {
        format!("{}_Frigate_Shipyard", self.short_code)
    }

    pub fn capital_yard(&self) -> String {
        format!("{}_Capital_Shipyard", self.short_code)
    }

    pub fn starbase(&self, tier: u8) -> String {
        format!("Skirmish_{}_Star_Base_{}", self.directory, tier)
    }

    pub fn research_facility(&self) -> String {
        format!("{}_Research_Facility", self.directory)
    }

    /// Skirmish building directory relative to the XML root.
    pub fn skirmish_buildings_dir(&self) -> PathBuf {
        PathBuf::from("Buildings")
            .join("Space")
            .join("Skirmish")
            .join(self.directory)
    }

    pub fn matches_affiliation(&self, ownership_tag: &str) -> bool {
        self.affiliation_keywords
            .iter()
            .any(|keyword| contains_ignore_ascii_case(ownership_tag, keyword))
    }

    pub fn rivals(&self) -> impl Iterator<Item = FactionProfile> + use<> {
        let own = self.faction;
        Faction::ALL
            .into_iter()
            .filter(move |faction| *faction != own)
            .map(|faction| faction.profile())
    }
}

pub(crate) fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_menu_numbers_and_names() {
        assert_eq!("1".parse::<Faction>().unwrap(), Faction::Republic);
        assert_eq!(" Confederacy ".parse::<Faction>().unwrap(), Faction::Cis);
        assert_eq!("REBEL".parse::<Faction>().unwrap(), Faction::Rebellion);
        assert_eq!("4".parse::<Faction>().unwrap(), Faction::Empire);

        let err = "5".parse::<Faction>().unwrap_err();
        assert_eq!(err.code, CoreErrorCode::InvalidSelection);
        assert!(err.message.contains("invalid faction '5'"));
    }

    #[test]
    fn building_names_follow_the_faction_code() {
        let republic = Faction::Republic.profile();
        assert_eq!(republic.frigate_yard(), "Republic_Frigate_Shipyard");
        assert_eq!(republic.capital_yard(), "Republic_Capital_Shipyard");

        let rebels = Faction::Rebellion.profile();
        assert_eq!(rebels.frigate_yard(), "R_Frigate_Shipyard");
        assert_eq!(rebels.research_facility(), "Rebel_Research_Facility");
        assert_eq!(rebels.starbase(STARBASE_TOP_TIER), "Skirmish_Rebel_Star_Base_5");
        assert_eq!(
            rebels.skirmish_buildings_dir(),
            PathBuf::from("Buildings/Space/Skirmish/Rebel")
        );
    }

    #[test]
    fn rivals_exclude_the_faction_itself() {
        let rivals: Vec<Faction> = Faction::Cis
            .profile()
            .rivals()
            .map(|profile| profile.faction)
            .collect();
        assert_eq!(rivals, vec![Faction::Republic, Faction::Rebellion, Faction::Empire]);
        assert!(Faction::Cis.profile().matches_affiliation("Confederacy_Navy"));
    }
}
