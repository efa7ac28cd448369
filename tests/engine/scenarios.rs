use std::str::FromStr;

use dbimpact::engine::{EngineErrorKind, Scenario};

#[test]
fn catalog_contains_the_four_scenarios() {
    let keys: Vec<&str> = Scenario::all().iter().map(|scenario| scenario.key()).collect();
    assert_eq!(
        keys,
        vec![
            "primary_db_failure",
            "replica_lag",
            "backup_failure",
            "storage_pressure"
        ]
    );
}

#[test]
fn keys_round_trip_through_from_str() {
    for scenario in Scenario::all() {
        let parsed = Scenario::from_str(scenario.key()).expect("catalog key must parse");
        assert_eq!(parsed, *scenario);
    }
}

#[test]
fn unknown_key_is_not_found_never_a_default() {
    let err = Scenario::from_str("meteor_strike").expect_err("unknown key must fail");
    assert_eq!(err.kind, EngineErrorKind::NotFound);
    assert!(err.message.contains("meteor_strike"));
}

#[test]
fn descriptors_carry_prompt_material() {
    for scenario in Scenario::all() {
        let descriptor = scenario.describe();
        assert!(!descriptor.name.is_empty());
        assert!(!descriptor.description.is_empty());
        assert!(
            descriptor.prompt_section.contains("SCENARIO:"),
            "{} prompt section must open with the scenario statement",
            descriptor.key
        );
        assert!(!descriptor.tags.is_empty());
    }
}

#[test]
fn display_matches_the_wire_key() {
    assert_eq!(Scenario::PrimaryDbFailure.to_string(), "primary_db_failure");
    assert_eq!(Scenario::StoragePressure.to_string(), "storage_pressure");
}
