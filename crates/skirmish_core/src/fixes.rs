//! One-off repairs for known defects in the shipped corpus.

use std::io;
use std::path::{Path, PathBuf};

use regex::RegexBuilder;
use tracing::{info, warn};

use crate::core_api::FileIssue;
use crate::document_io::{read_document, write_document};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownFix {
    /// `/`-separated, relative to the XML root.
    pub path: &'static str,
    /// Multi-line regular expression.
    pub pattern: &'static str,
    pub replacement: &'static str,
}

impl KnownFix {
    pub fn relative_path(&self) -> PathBuf {
        self.path.split('/').collect()
    }
}

pub static KNOWN_FIXES: [KnownFix; 11] = [
    KnownFix {
        path: "Upgrades/Vanilla.xml",
        pattern: r"^\s+<\?xml",
        replacement: "<?xml",
    },
    KnownFix {
        path: "Upgrades/Skirmish/Space/Republic/Mines_Defense.xml",
        pattern: r"^\s+<\?xml",
        replacement: "<?xml",
    },
    KnownFix {
        path: "Units/Space/Units_Space_First_Order_Supremacy.xml",
        pattern: r"</Reserve_Spaned_Units_Teh_0>",
        replacement: "</Reserve_Spawned_Units_Tech_0>",
    },
    KnownFix {
        path: "Buildings/Ground/Skirmish_Rework/Mine.xml",
        pattern: r#"(<Affiliation>CIS</Affiliation>)\s*(<GroundBuildable Name="Republic_Mineral_Processor">)"#,
        replacement: "${1}\n\t</GroundBuildable>\n\n\t${2}",
    },
    KnownFix {
        path: "Units/Space/Units_Hero_Empire_181st_Fighter_Wing.XML",
        pattern: r"<181st>",
        replacement: "<_181st>",
    },
    KnownFix {
        path: "Units/Space/Units_Hero_Empire_181st_Fighter_Wing.XML",
        pattern: r"</181st>",
        replacement: "</_181st>",
    },
    KnownFix {
        path: "Units/Space/Units_Hero_Empire_181st_Fighter_Wing_BU.xml",
        pattern: r"<181st>",
        replacement: "<_181st>",
    },
    KnownFix {
        path: "Units/Space/Units_Hero_Empire_181st_Fighter_Wing_BU.xml",
        pattern: r"</181st>",
        replacement: "</_181st>",
    },
    KnownFix {
        path: "Units/Space/Units_Hero_Minors_CSA_Tagge.XML",
        pattern: r#"<\?xml version="1.0"\?>\s*<80s_Visor_Man>"#,
        replacement: concat!(r#"<?xml version="1.0"?>"#, "\n<_80s_Visor_Man>"),
    },
    KnownFix {
        path: "Units/Space/Units_Hero_Minors_CSA_Tagge.XML",
        pattern: r"</80s_Visor_Man>",
        replacement: "</_80s_Visor_Man>",
    },
    KnownFix {
        path: "Units/Space/Units_Hero_Minors_CSA_Tagge.XML",
        pattern: r"^<80s_Visor_Man>",
        replacement: concat!(r#"<?xml version="1.0"?>"#, "\n<_80s_Visor_Man>"),
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixReport {
    pub files_fixed: usize,
    pub issues: Vec<FileIssue>,
}

/// Applies `fixes` in order, returning the text unchanged when none match.
pub fn apply_fixes_to_text(text: &str, fixes: &[&KnownFix]) -> Result<String, regex::Error> {
    let mut out = text.to_string();
    for fix in fixes {
        let pattern = RegexBuilder::new(fix.pattern).multi_line(true).build()?;
        out = pattern.replace_all(&out, fix.replacement).into_owned();
    }
    Ok(out)
}

pub fn apply_known_fixes(xml_root: &Path) -> FixReport {
    apply_fixes(xml_root, &KNOWN_FIXES)
}

pub fn apply_fixes(xml_root: &Path, fixes: &[KnownFix]) -> FixReport {
    let mut report = FixReport::default();
    let mut paths: Vec<&str> = Vec::new();
    for fix in fixes {
        if !paths.contains(&fix.path) {
            paths.push(fix.path);
        }
    }

    for rel in paths {
        let file_fixes: Vec<&KnownFix> = fixes.iter().filter(|fix| fix.path == rel).collect();
        let rel_path = file_fixes[0].relative_path();
        match fix_file(&xml_root.join(&rel_path), &file_fixes) {
            Ok(true) => report.files_fixed += 1,
            Ok(false) => {}
            Err(err) => {
                warn!(path = rel, error = %err, "fix failed");
                report.issues.push(FileIssue {
                    path: rel_path,
                    message: err.to_string(),
                });
            }
        }
    }

    info!(files = report.files_fixed, "applied known fixes");
    report
}

fn fix_file(path: &Path, fixes: &[&KnownFix]) -> io::Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    let text = read_document(path)?;
    let fixed = apply_fixes_to_text(&text, fixes)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    if fixed == text {
        return Ok(false);
    }
    write_document(path, &fixed)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixes_for(path: &str) -> Vec<&'static KnownFix> {
        KNOWN_FIXES.iter().filter(|fix| fix.path == path).collect()
    }

    #[test]
    fn leading_whitespace_before_declaration_is_dropped() {
        let out = apply_fixes_to_text("  \n\t<?xml version=\"1.0\"?>\n<Root/>", &fixes_for("Upgrades/Vanilla.xml")).unwrap();
        assert!(out.starts_with("<?xml"));
    }

    #[test]
    fn missing_closer_is_inserted_once() {
        let fixes = fixes_for("Buildings/Ground/Skirmish_Rework/Mine.xml");
        let text = "<Affiliation>CIS</Affiliation>\n\t<GroundBuildable Name=\"Republic_Mineral_Processor\">";
        let once = apply_fixes_to_text(text, &fixes).unwrap();
        assert_eq!(
            once,
            "<Affiliation>CIS</Affiliation>\n\t</GroundBuildable>\n\n\t<GroundBuildable Name=\"Republic_Mineral_Processor\">"
        );
        assert_eq!(apply_fixes_to_text(&once, &fixes).unwrap(), once);
    }

    #[test]
    fn digit_tag_names_get_a_prefix() {
        let fixes = fixes_for("Units/Space/Units_Hero_Minors_CSA_Tagge.XML");
        let out = apply_fixes_to_text("<80s_Visor_Man>\n</80s_Visor_Man>", &fixes).unwrap();
        assert_eq!(out, "<?xml version=\"1.0\"?>\n<_80s_Visor_Man>\n</_80s_Visor_Man>");
    }
}
