use std::fmt::Write as _;
use std::path::Path;

use skirmish_core::core_api::{
    CategoryCounts, FileIssue, FileReport, RestoreOutcome, RunReport, SoftMiss, ValidationWarning,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

const RULE_WIDTH: usize = 60;
const LABEL_WIDTH: usize = 20;
const NAME_LIST_LIMIT: usize = 10;
const NAME_LIST_EDGE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    /// Also list every soft miss, validation warning and file issue.
    pub verbose: bool,
}

pub fn render_json_summary(report: &RunReport, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(default_json(report)),
    }
}

pub fn render_text_summary(report: &RunReport) -> String {
    render_text_summary_with_options(report, TextRenderOptions::default())
}

pub fn render_text_summary_with_options(report: &RunReport, options: TextRenderOptions) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    writeln!(&mut out, "{rule}").expect("writing to String cannot fail");
    writeln!(&mut out, " Skirmish God Mode: {}", report.faction)
        .expect("writing to String cannot fail");
    writeln!(&mut out, "{rule}").expect("writing to String cannot fail");

    push_row(&mut out, "Restore", &restore_label(&report.restore));
    push_row(&mut out, "Known fixes", &format!("{} file(s)", report.fixes_applied));
    push_row(&mut out, "Files scanned", &report.files_scanned.to_string());
    push_row(&mut out, "Files modified", &report.files_modified.to_string());
    push_row(&mut out, "Neutral converted", &report.neutral_converted.to_string());
    push_row(&mut out, "Faction modified", &report.faction_modified.to_string());
    push_row(&mut out, "Roster records", &counts_label(&report.records));
    push_row(&mut out, "Injected", &counts_label(&report.injected));
    push_row(
        &mut out,
        "Income boosted",
        &format!("{} file(s)", report.income_files_boosted),
    );
    push_row(
        &mut out,
        "Validated",
        &format!(
            "{} file(s), {} warning(s)",
            report.files_validated,
            report.validation_warnings.len()
        ),
    );
    push_row(&mut out, "Soft misses", &report.soft_misses.len().to_string());
    push_row(&mut out, "Issues", &report.issues.len().to_string());

    if !report.file_reports.is_empty() {
        render_diagnostics(&mut out, &report.file_reports);
    }

    if options.verbose {
        render_soft_misses(&mut out, &report.soft_misses);
        render_warnings(&mut out, &report.validation_warnings);
    }
    // Issues are listed regardless of verbosity.
    render_issues(&mut out, &report.issues);

    out
}

fn push_row(out: &mut String, label: &str, value: &str) {
    writeln!(out, " {label:<LABEL_WIDTH$}: {value}").expect("writing to String cannot fail");
}

fn restore_label(outcome: &RestoreOutcome) -> String {
    match outcome {
        RestoreOutcome::Skipped => "skipped".to_string(),
        RestoreOutcome::Created { backup } => format!("created backup {}", backup.display()),
        RestoreOutcome::Mirrored {
            backup,
            copied,
            removed,
        } => format!(
            "mirrored {} ({copied} copied, {removed} removed)",
            backup.display()
        ),
    }
}

fn counts_label(counts: &CategoryCounts) -> String {
    format!(
        "{} squadron(s), {} small ship(s), {} capital ship(s), {} hero(es)",
        counts.squadrons, counts.small_ships, counts.capital_ships, counts.heroes
    )
}

/// Names to print for one file: all of them up to the limit, otherwise the
/// first and last few around an elision line.
pub fn elide_names(names: &[String]) -> Vec<String> {
    if names.len() <= NAME_LIST_LIMIT {
        return names.to_vec();
    }
    let mut lines: Vec<String> = names[..NAME_LIST_EDGE].to_vec();
    lines.push(format!("... ({} more) ...", names.len() - NAME_LIST_EDGE * 2));
    lines.extend_from_slice(&names[names.len() - NAME_LIST_EDGE..]);
    lines
}

fn render_diagnostics(out: &mut String, files: &[FileReport]) {
    let (neutral, faction): (Vec<&FileReport>, Vec<&FileReport>) = files
        .iter()
        .partition(|file| file.stats.neutral_converted > 0);

    if !neutral.is_empty() {
        section_header(out, "Neutral/Underworld conversions");
        for file in neutral {
            let stats = &file.stats;
            let mut parts = vec![format!("{} neutral converted", stats.neutral_converted)];
            if stats.records.total() > 0 {
                parts.push(counts_label(&stats.records));
            }
            writeln!(out, "\n  File: {}", display_path(&file.path))
                .expect("writing to String cannot fail");
            writeln!(out, "    Type: {}", parts.join(", ")).expect("writing to String cannot fail");
            render_entity_names(out, &stats.entities);
        }
    }

    if !faction.is_empty() {
        section_header(out, "Faction modifications (build time/population/limits)");
        for file in faction {
            writeln!(out, "\n  File: {}", display_path(&file.path))
                .expect("writing to String cannot fail");
            writeln!(out, "    Faction units modified: {}", file.stats.faction_modified)
                .expect("writing to String cannot fail");
            render_entity_names(out, &file.stats.entities);
        }
    }
}

fn render_entity_names(out: &mut String, names: &[String]) {
    if names.is_empty() {
        return;
    }
    writeln!(out, "    Units modified: {}", names.len()).expect("writing to String cannot fail");
    for line in elide_names(names) {
        if line.starts_with("...") {
            writeln!(out, "      {line}").expect("writing to String cannot fail");
        } else {
            writeln!(out, "      - {line}").expect("writing to String cannot fail");
        }
    }
}

fn section_header(out: &mut String, title: &str) {
    writeln!(out).expect("writing to String cannot fail");
    writeln!(out, "{}", "-".repeat(RULE_WIDTH)).expect("writing to String cannot fail");
    writeln!(out, " {title}").expect("writing to String cannot fail");
    writeln!(out, "{}", "-".repeat(RULE_WIDTH)).expect("writing to String cannot fail");
}

fn render_soft_misses(out: &mut String, misses: &[SoftMiss]) {
    if misses.is_empty() {
        return;
    }
    section_header(out, "Soft misses");
    for miss in misses {
        let category = miss
            .category
            .map(|category| format!(" [{category}]"))
            .unwrap_or_default();
        writeln!(out, "  {}{category}: {}", display_path(&miss.path), miss.message)
            .expect("writing to String cannot fail");
    }
}

fn render_warnings(out: &mut String, warnings: &[ValidationWarning]) {
    if warnings.is_empty() {
        return;
    }
    section_header(out, "Validation warnings (the game may still load these)");
    for warning in warnings {
        writeln!(out, "  {}: {}", display_path(&warning.path), warning.message)
            .expect("writing to String cannot fail");
    }
}

fn render_issues(out: &mut String, issues: &[FileIssue]) {
    if issues.is_empty() {
        return;
    }
    section_header(out, "Skipped files");
    for issue in issues {
        writeln!(out, "  {}: {}", display_path(&issue.path), issue.message)
            .expect("writing to String cannot fail");
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn default_json(report: &RunReport) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();
    out.insert(
        "faction".to_string(),
        JsonValue::String(report.faction.to_string()),
    );
    out.insert(
        "xml_root".to_string(),
        JsonValue::String(report.xml_root.display().to_string()),
    );
    out.insert("restore".to_string(), restore_to_json(&report.restore));
    out.insert(
        "fixes_applied".to_string(),
        JsonValue::from(report.fixes_applied),
    );
    out.insert(
        "files_scanned".to_string(),
        JsonValue::from(report.files_scanned),
    );
    out.insert(
        "files_modified".to_string(),
        JsonValue::from(report.files_modified),
    );
    out.insert(
        "neutral_converted".to_string(),
        JsonValue::from(report.neutral_converted),
    );
    out.insert(
        "faction_modified".to_string(),
        JsonValue::from(report.faction_modified),
    );
    out.insert("records".to_string(), counts_to_json(&report.records));
    out.insert("injected".to_string(), counts_to_json(&report.injected));
    out.insert(
        "income_files_boosted".to_string(),
        JsonValue::from(report.income_files_boosted),
    );
    out.insert(
        "files_validated".to_string(),
        JsonValue::from(report.files_validated),
    );
    out.insert(
        "file_reports".to_string(),
        JsonValue::Array(report.file_reports.iter().map(file_report_to_json).collect()),
    );
    out.insert(
        "soft_misses".to_string(),
        JsonValue::Array(
            report
                .soft_misses
                .iter()
                .map(|miss| {
                    let mut entry = path_message_json(&miss.path, &miss.message);
                    entry.insert(
                        "category".to_string(),
                        match miss.category {
                            Some(category) => JsonValue::String(category.to_string()),
                            None => JsonValue::Null,
                        },
                    );
                    JsonValue::Object(entry)
                })
                .collect(),
        ),
    );
    out.insert(
        "validation_warnings".to_string(),
        JsonValue::Array(
            report
                .validation_warnings
                .iter()
                .map(|warning| JsonValue::Object(path_message_json(&warning.path, &warning.message)))
                .collect(),
        ),
    );
    out.insert(
        "issues".to_string(),
        JsonValue::Array(
            report
                .issues
                .iter()
                .map(|issue| JsonValue::Object(path_message_json(&issue.path, &issue.message)))
                .collect(),
        ),
    );
    out
}

fn restore_to_json(outcome: &RestoreOutcome) -> JsonValue {
    let mut out = JsonMap::new();
    match outcome {
        RestoreOutcome::Skipped => {
            out.insert("kind".to_string(), JsonValue::String("skipped".to_string()));
        }
        RestoreOutcome::Created { backup } => {
            out.insert("kind".to_string(), JsonValue::String("created".to_string()));
            out.insert(
                "backup".to_string(),
                JsonValue::String(backup.display().to_string()),
            );
        }
        RestoreOutcome::Mirrored {
            backup,
            copied,
            removed,
        } => {
            out.insert("kind".to_string(), JsonValue::String("mirrored".to_string()));
            out.insert(
                "backup".to_string(),
                JsonValue::String(backup.display().to_string()),
            );
            out.insert("copied".to_string(), JsonValue::from(*copied));
            out.insert("removed".to_string(), JsonValue::from(*removed));
        }
    }
    JsonValue::Object(out)
}

fn counts_to_json(counts: &CategoryCounts) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("squadrons".to_string(), JsonValue::from(counts.squadrons));
    out.insert("small_ships".to_string(), JsonValue::from(counts.small_ships));
    out.insert(
        "capital_ships".to_string(),
        JsonValue::from(counts.capital_ships),
    );
    out.insert("heroes".to_string(), JsonValue::from(counts.heroes));
    out.insert("total".to_string(), JsonValue::from(counts.total()));
    JsonValue::Object(out)
}

fn file_report_to_json(file: &FileReport) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "path".to_string(),
        JsonValue::String(display_path(&file.path)),
    );
    out.insert(
        "neutral_converted".to_string(),
        JsonValue::from(file.stats.neutral_converted),
    );
    out.insert(
        "faction_modified".to_string(),
        JsonValue::from(file.stats.faction_modified),
    );
    out.insert("records".to_string(), counts_to_json(&file.stats.records));
    out.insert(
        "entities".to_string(),
        JsonValue::Array(
            file.stats
                .entities
                .iter()
                .map(|name| JsonValue::String(name.clone()))
                .collect(),
        ),
    );
    JsonValue::Object(out)
}

fn path_message_json(path: &Path, message: &str) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();
    out.insert("path".to_string(), JsonValue::String(display_path(path)));
    out.insert("message".to_string(), JsonValue::String(message.to_string()));
    out
}
