use std::path::PathBuf;

use serde_json::Value;
use skirmish_core::core_api::{
    CategoryCounts, FileIssue, FileReport, FileStats, RestoreOutcome, RunReport, SoftMiss,
    ValidationWarning,
};
use skirmish_core::faction::Faction;
use skirmish_core::mutate::RosterCategory;
use skirmish_render::{
    JsonStyle, TextRenderOptions, elide_names, render_json_summary, render_text_summary,
    render_text_summary_with_options,
};

fn sample_report() -> RunReport {
    let mut report = RunReport::new(Faction::Republic, PathBuf::from("mod/Data/Xml"));
    report.restore = RestoreOutcome::Mirrored {
        backup: PathBuf::from("mod - copy"),
        copied: 3,
        removed: 1,
    };
    report.fixes_applied = 2;
    report.files_scanned = 40;
    report.files_modified = 7;
    report.neutral_converted = 12;
    report.faction_modified = 30;
    report.records = CategoryCounts {
        squadrons: 4,
        small_ships: 5,
        capital_ships: 2,
        heroes: 1,
    };
    report.injected = CategoryCounts {
        squadrons: 4,
        small_ships: 5,
        capital_ships: 2,
        heroes: 0,
    };
    report.income_files_boosted = 1;
    report.files_validated = 40;
    report.file_reports = vec![
        FileReport {
            path: PathBuf::from("Units/Space/Hapan/Hapan_Ships.xml"),
            stats: FileStats {
                neutral_converted: 12,
                faction_modified: 0,
                records: CategoryCounts {
                    small_ships: 12,
                    ..CategoryCounts::default()
                },
                entities: (1..=12).map(|i| format!("Hapan_Ship_{i}")).collect(),
            },
        },
        FileReport {
            path: PathBuf::from("Units/Space/Republic/Rep_Ships.xml"),
            stats: FileStats {
                neutral_converted: 0,
                faction_modified: 2,
                records: CategoryCounts::default(),
                entities: vec!["Rep_Acclamator".to_string(), "Rep_Venator".to_string()],
            },
        },
    ];
    report.soft_misses = vec![
        SoftMiss {
            path: PathBuf::from("Buildings/Republic/Starbases.xml"),
            category: Some(RosterCategory::Hero),
            message: "no hero roster building".to_string(),
        },
        SoftMiss {
            path: PathBuf::from("Buildings/CIS/Starbases.xml"),
            category: None,
            message: "file not found".to_string(),
        },
    ];
    report.validation_warnings = vec![ValidationWarning {
        path: PathBuf::from("Units/Broken.xml"),
        message: "1 element(s) left open at end of document".to_string(),
    }];
    report.issues = vec![FileIssue {
        path: PathBuf::from("Units/Binary.xml"),
        message: "stream did not contain valid UTF-8".to_string(),
    }];
    report
}

fn keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect()
}

#[test]
fn json_summary_uses_canonical_top_level_order() {
    let value = render_json_summary(&sample_report(), JsonStyle::CanonicalV1);

    assert_eq!(
        keys(&value),
        vec![
            "faction",
            "xml_root",
            "restore",
            "fixes_applied",
            "files_scanned",
            "files_modified",
            "neutral_converted",
            "faction_modified",
            "records",
            "injected",
            "income_files_boosted",
            "files_validated",
            "file_reports",
            "soft_misses",
            "validation_warnings",
            "issues",
        ]
    );
    assert_eq!(
        keys(&value["records"]),
        vec!["squadrons", "small_ships", "capital_ships", "heroes", "total"]
    );
}

#[test]
fn json_summary_carries_values() {
    let value = render_json_summary(&sample_report(), JsonStyle::CanonicalV1);
    let value: Value = serde_json::from_str(
        &serde_json::to_string(&value).expect("rendered json should serialize"),
    )
    .expect("serialized json should parse");

    assert_eq!(value["faction"], "Republic");
    assert_eq!(value["restore"]["kind"], "mirrored");
    assert_eq!(value["restore"]["removed"], 1);
    assert_eq!(value["records"]["total"], 12);
    assert_eq!(value["injected"]["heroes"], 0);
    assert_eq!(value["soft_misses"][0]["category"], "hero");
    assert_eq!(value["soft_misses"][1]["category"], Value::Null);
    assert_eq!(
        value["file_reports"][0]["path"],
        "Units/Space/Hapan/Hapan_Ships.xml"
    );
    assert_eq!(
        value["file_reports"][0]["entities"]
            .as_array()
            .map(Vec::len),
        Some(12)
    );
}

#[test]
fn text_summary_lists_counts_and_issues() {
    let rendered = render_text_summary(&sample_report());

    assert!(rendered.contains(" Skirmish God Mode: Republic"));
    assert!(rendered.contains("mirrored mod - copy (3 copied, 1 removed)"));
    assert!(rendered.contains(" Files modified      : 7"));
    assert!(rendered.contains("4 squadron(s), 5 small ship(s), 2 capital ship(s), 0 hero(es)"));
    assert!(rendered.contains(" Soft misses         : 2"));
    assert!(rendered.contains(" Skipped files"));
    assert!(rendered.contains("Units/Binary.xml: stream did not contain valid UTF-8"));
    assert!(!rendered.contains(" Soft misses\n"));
    assert!(!rendered.contains("Validation warnings"));
}

#[test]
fn verbose_text_lists_misses_and_warnings() {
    let rendered =
        render_text_summary_with_options(&sample_report(), TextRenderOptions { verbose: true });

    assert!(rendered.contains("Buildings/Republic/Starbases.xml [hero]: no hero roster building"));
    assert!(rendered.contains("Buildings/CIS/Starbases.xml: file not found"));
    assert!(rendered.contains("Units/Broken.xml: 1 element(s) left open"));
}

#[test]
fn diagnostics_split_conversions_from_faction_edits() {
    let rendered = render_text_summary(&sample_report());

    let neutral = rendered
        .find("Neutral/Underworld conversions")
        .expect("neutral section should render");
    let faction = rendered
        .find("Faction modifications")
        .expect("faction section should render");
    assert!(neutral < faction);
    assert!(rendered.contains("  File: Units/Space/Hapan/Hapan_Ships.xml"));
    assert!(rendered.contains("    Type: 12 neutral converted, 0 squadron(s), 12 small ship(s)"));
    assert!(rendered.contains("      ... (2 more) ..."));
    assert!(rendered.contains("      - Hapan_Ship_1\n"));
    assert!(rendered.contains("      - Hapan_Ship_12\n"));
    assert!(!rendered.contains("      - Hapan_Ship_6\n"));
    assert!(rendered.contains("    Faction units modified: 2"));
    assert!(rendered.contains("      - Rep_Venator"));
}

#[test]
fn short_name_lists_are_not_elided() {
    let names: Vec<String> = (0..10).map(|i| format!("Unit_{i}")).collect();
    assert_eq!(elide_names(&names), names);

    let names: Vec<String> = (0..11).map(|i| format!("Unit_{i}")).collect();
    let lines = elide_names(&names);
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[5], "... (1 more) ...");
    assert_eq!(lines[10], "Unit_10");
}
