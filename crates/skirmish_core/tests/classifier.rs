use std::path::Path;

use skirmish_core::classify::{BuildableType, Classifier, Ownership, Rule, Subject};
use skirmish_core::faction::Faction;
use skirmish_core::markup::{BlockLocator, EntityKind};

fn classify_one(faction: Faction, path: &str, text: &str) -> (Ownership, Option<Rule>, BuildableType) {
    let path = Path::new(path);
    let block = BlockLocator::new(text, path)
        .next()
        .unwrap_or_else(|| panic!("no entity in {text}"));
    let result = Classifier::new(faction).classify(&block);
    (result.ownership, result.rule, result.buildable)
}

fn space_unit(name: &str, affiliation: &str, mask: &str) -> String {
    format!(
        "<SpaceUnit Name=\"{name}\">\n\t<Affiliation>{affiliation}</Affiliation>\n\t<CategoryMask>{mask}</CategoryMask>\n</SpaceUnit>"
    )
}

#[test]
fn excluded_files_win_over_everything() {
    let text = space_unit("Neutral_Freighter", "Neutral", "Corvette");
    let (ownership, rule, _) = classify_one(Faction::Republic, "Units/Space/Units_Space_Neutral_Freighters.xml", &text);
    assert_eq!(ownership, Ownership::Excluded);
    assert_eq!(rule, Some(Rule::ExcludedFile));
}

#[test]
fn rival_file_names_are_foreign_but_old_republic_is_not() {
    let text = space_unit("Some_Ship", "Neutral", "Frigate");
    let (ownership, rule, _) = classify_one(Faction::Empire, "Units/Space/Units_Space_Republic_Ships.xml", &text);
    assert_eq!((ownership, rule), (Ownership::Foreign, Some(Rule::ForeignFactionFile)));

    let (ownership, _, _) = classify_one(Faction::Empire, "Units/Space/Units_Space_Old_Republic_Ships.xml", &text);
    assert_eq!(ownership, Ownership::Convertible);
}

#[test]
fn rival_and_group_name_segments_are_foreign() {
    let cases = [
        ("Venator_E", Faction::Republic),
        ("Mandalorian_Kandosii", Faction::Republic),
        ("R_Nebulon_B", Faction::Empire),
        ("Sith_Interdictor", Faction::Cis),
    ];
    for (name, faction) in cases {
        let text = space_unit(name, "Neutral", "Frigate");
        let (ownership, rule, _) = classify_one(faction, "Units/Space/Units_Space_Mixed.xml", &text);
        assert_eq!(ownership, Ownership::Foreign, "{name}");
        assert_eq!(rule, Some(Rule::ForeignName), "{name}");
    }
}

#[test]
fn neutral_entities_in_faction_paths_are_not_convertible() {
    let text = space_unit("Hapan_Nova", "Neutral", "Frigate");
    let (ownership, _, _) = classify_one(Faction::Republic, "Units/Space/Empire/Hapan.xml", &text);
    assert_eq!(ownership, Ownership::Unmatched);

    let (ownership, rule, buildable) = classify_one(Faction::Republic, "Units/Space/Units_Space_Neutral_Hapan.xml", &text);
    assert_eq!(ownership, Ownership::Convertible);
    assert_eq!(rule, Some(Rule::ConvertibleOwnership));
    assert_eq!(buildable, BuildableType::SmallShip);
}

#[test]
fn owned_affiliation_matches_every_keyword() {
    let text = space_unit("Munificent", "Confederacy", "Cruiser");
    let (ownership, rule, buildable) = classify_one(Faction::Cis, "Units/Space/Units_Space_Frigates.xml", &text);
    assert_eq!((ownership, rule), (Ownership::Owned, Some(Rule::OwnedAffiliation)));
    assert_eq!(buildable, BuildableType::CapitalShip);
}

#[test]
fn upgrades_are_owned_by_their_directory() {
    let text = "<UpgradeObject Name=\"Shield_Upgrade_Mk2\">\n\t<Tech_Level>2</Tech_Level>\n</UpgradeObject>";
    let (ownership, rule, buildable) = classify_one(Faction::Republic, "Upgrades/Skirmish/Space/Republic/Shields.xml", text);
    assert_eq!((ownership, rule), (Ownership::Owned, Some(Rule::OwnedUpgradeDirectory)));
    assert_eq!(buildable, BuildableType::Other);

    let (ownership, _, _) = classify_one(Faction::Rebellion, "Upgrades/Skirmish/Space/Republic/Shields.xml", text);
    assert_eq!(ownership, Ownership::Unmatched);
}

#[test]
fn rules_are_individually_testable() {
    let rebellion = Faction::Rebellion.profile();
    let subject = Subject {
        kind: Some(EntityKind::Squadron),
        name: Some("X_Wing_Squadron"),
        ownership_tag: Some("Rebel"),
        path: Path::new("Units/Space/Units_Space_Fighters.xml"),
    };
    assert!(Rule::OwnedAffiliation.matches(&subject, &rebellion));
    assert!(!Rule::ConvertibleOwnership.matches(&subject, &rebellion));
    assert!(!Rule::ForeignName.matches(&subject, &rebellion));

    let classifier = Classifier::with_rules(Faction::Rebellion, vec![Rule::ConvertibleOwnership]);
    assert_eq!(classifier.rules(), &[Rule::ConvertibleOwnership]);
    assert_eq!(classifier.file_verdict(Path::new("Units/Space/BuildPads.xml")), None);
    assert_eq!(
        Classifier::new(Faction::Rebellion).file_verdict(Path::new("Units/Space/BuildPads.xml")),
        Some(Rule::ExcludedFile)
    );
}

#[test]
fn heroes_and_squadrons_get_their_own_buildable_types() {
    let hero = "<UniqueUnit Name=\"Talon_Karrde\"><Affiliation>Underworld</Affiliation></UniqueUnit>";
    let (_, _, buildable) = classify_one(Faction::Empire, "Units/Space/Units_Hero_Underworld.xml", hero);
    assert_eq!(buildable, BuildableType::Hero);

    let squadron = "<Squadron Name=\"Hapan_Squadron\"><Affiliation>Neutral</Affiliation></Squadron>";
    let (_, _, buildable) = classify_one(Faction::Empire, "Units/Space/Units_Space_Neutral_Hapan.xml", squadron);
    assert_eq!(buildable, BuildableType::Squadron);
}
