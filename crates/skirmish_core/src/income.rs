use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::core_api::{FileIssue, SoftMiss};
use crate::document_io::{read_document, write_document};
use crate::faction::Faction;

pub const BOOSTED_INCOME: &str = "100000";

fn income_value() -> &'static Regex {
    static INCOME: OnceLock<Regex> = OnceLock::new();
    INCOME.get_or_init(|| {
        Regex::new(r"<Base_Income_Value>[\d.]+</Base_Income_Value>")
            .expect("income pattern is valid")
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomeReport {
    pub files_boosted: usize,
    pub soft_misses: Vec<SoftMiss>,
    pub issues: Vec<FileIssue>,
}

pub fn boost_text(text: &str) -> String {
    income_value()
        .replace_all(
            text,
            format!("<Base_Income_Value>{BOOSTED_INCOME}</Base_Income_Value>"),
        )
        .into_owned()
}

/// Raises the numeric base income of every faction's skirmish starbases, so
/// AI opponents get the same economy as the player.
pub fn boost_starbase_income(xml_root: &Path) -> IncomeReport {
    let mut report = IncomeReport::default();
    for faction in Faction::ALL {
        let rel = faction.profile().skirmish_buildings_dir().join("Starbases.xml");
        let path = xml_root.join(&rel);
        if !path.is_file() {
            warn!(path = %rel.display(), "starbase file not found, income unchanged");
            report.soft_misses.push(SoftMiss {
                path: rel,
                category: None,
                message: "starbase file not found".to_string(),
            });
            continue;
        }

        let result = read_document(&path).and_then(|text| {
            let boosted = boost_text(&text);
            if boosted == text {
                return Ok(false);
            }
            write_document(&path, &boosted).map(|()| true)
        });
        match result {
            Ok(true) => {
                report.files_boosted += 1;
                info!(path = %rel.display(), "boosted starbase income");
            }
            Ok(false) => info!(path = %rel.display(), "no income values to boost"),
            Err(err) => {
                warn!(path = %rel.display(), error = %err, "cannot boost income");
                report.issues.push(FileIssue {
                    path: rel,
                    message: err.to_string(),
                });
            }
        }
    }
    report
}
