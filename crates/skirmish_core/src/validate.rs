use std::path::Path;
use std::sync::OnceLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use tracing::{info, warn};

use crate::core_api::ValidationWarning;
use crate::corpus::{WalkScope, xml_files};
use crate::document_io::read_document;

fn comments() -> &'static Regex {
    static COMMENTS: OnceLock<Regex> = OnceLock::new();
    COMMENTS.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"))
}

/// Strict check: balanced and matching tags, one root element, nothing but
/// whitespace outside it.
pub fn check_well_formed(text: &str) -> Result<(), String> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| format!("at byte {}: {err}", reader.error_position()))?;
        match event {
            Event::Start(_) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unexpected end tag at byte {}", reader.buffer_position()))?;
            }
            Event::Empty(_) => {
                if depth == 0 {
                    roots += 1;
                }
            }
            Event::Text(content) => {
                let content = content
                    .unescape()
                    .map_err(|err| format!("at byte {}: {err}", reader.buffer_position()))?;
                if depth == 0 && !content.trim().is_empty() {
                    return Err(format!(
                        "text outside the root element at byte {}",
                        reader.buffer_position()
                    ));
                }
            }
            Event::CData(_) if depth == 0 => {
                return Err("CDATA outside the root element".to_string());
            }
            Event::Eof => break,
            _ => {}
        }
        if roots > 1 {
            return Err(format!(
                "more than one root element, second at byte {}",
                reader.buffer_position()
            ));
        }
    }

    if depth != 0 {
        return Err(format!("{depth} element(s) left open at end of document"));
    }
    if roots == 0 {
        return Err("no root element".to_string());
    }
    Ok(())
}

/// Like [`check_well_formed`], retried once with comments removed since the
/// game tolerates malformed comments. The error is from the first attempt.
pub fn validate_document(text: &str) -> Result<(), String> {
    let Err(first) = check_well_formed(text) else {
        return Ok(());
    };
    let stripped = comments().replace_all(text, "");
    match check_well_formed(&stripped) {
        Ok(()) => Ok(()),
        Err(_) => Err(first),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub files_checked: usize,
    pub warnings: Vec<ValidationWarning>,
}

pub fn validate_tree(xml_root: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();
    for path in xml_files(xml_root, WalkScope::Validation) {
        let rel = path.strip_prefix(xml_root).unwrap_or(&path).to_path_buf();
        report.files_checked += 1;
        let text = match read_document(&path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %rel.display(), error = %err, "cannot read for validation");
                report.warnings.push(ValidationWarning {
                    path: rel,
                    message: format!("unreadable: {err}"),
                });
                continue;
            }
        };
        if let Err(message) = validate_document(&text) {
            warn!(path = %rel.display(), %message, "syntax check failed, the game may still load it");
            report.warnings.push(ValidationWarning { path: rel, message });
        }
    }
    info!(
        checked = report.files_checked,
        warnings = report.warnings.len(),
        "validation finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_single_root_document() {
        let text = "<?xml version=\"1.0\"?>\n<!-- units -->\n<Units><SpaceUnit Name=\"A\"><X>1</X></SpaceUnit><Y/></Units>\n";
        assert_eq!(check_well_formed(text), Ok(()));
    }

    #[test]
    fn rejects_structural_defects() {
        assert!(check_well_formed("<A><B></A>").is_err());
        assert!(check_well_formed("<A></A><B></B>").is_err());
        assert!(check_well_formed("<A><B></B>").is_err());
        assert!(check_well_formed("junk<A/>").is_err());
        assert!(check_well_formed("").is_err());
    }

    #[test]
    fn retries_without_comments() {
        let text = "<A><!-- -- double dash -- --></A><!-- <B> -->";
        assert!(validate_document(text).is_ok());
        assert!(validate_document("<A><!-- x --></B>").is_err());
    }
}
