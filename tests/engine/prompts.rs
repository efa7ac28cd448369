use dbimpact::engine::{
    ConfigurationSnapshot, PolicyContext, Scenario,
    context::assemble,
    prompts::{render_instruction, render_repair_instruction},
};

fn context() -> dbimpact::engine::AnalysisContext {
    let snapshot = ConfigurationSnapshot {
        identifier: "prod-orders-db-01".to_string(),
        multi_az: false,
        backup_retention_days: 1,
        pitr_enabled: false,
        engine: "mysql".to_string(),
        instance_class: "db.m5.large".to_string(),
        read_replicas: 0,
        allocated_storage_gb: 100,
        max_allocated_storage_gb: None,
    };
    let policy = PolicyContext::new("RTO: 30 minutes. RPO: 5 minutes.");
    assemble(snapshot, policy, Scenario::PrimaryDbFailure)
}

#[test]
fn identical_contexts_render_byte_identical_instructions() {
    assert_eq!(render_instruction(&context()), render_instruction(&context()));
}

#[test]
fn instruction_carries_every_context_section() {
    let rendered = render_instruction(&context());

    assert!(rendered.contains("prod-orders-db-01"));
    assert!(rendered.contains("Primary Database Failure"));
    assert!(rendered.contains("DATABASE CONFIGURATION:"));
    assert!(rendered.contains("Multi-AZ: false"));
    assert!(rendered.contains("Max Allocated Storage: not configured"));
    assert!(rendered.contains("BUSINESS POLICIES & HISTORICAL DATA:"));
    assert!(rendered.contains("RTO: 30 minutes. RPO: 5 minutes."));
}

#[test]
fn instruction_spells_out_the_full_verdict_schema() {
    let rendered = render_instruction(&context());
    for field in [
        "sla_violation",
        "rto_violation",
        "rpo_violation",
        "expected_outage_time_minutes",
        "business_severity",
        "\"why\"",
        "recommendations",
        "confidence",
    ] {
        assert!(rendered.contains(field), "missing schema field: {field}");
    }
    assert!(rendered.contains("LOW"));
    assert!(rendered.contains("CRITICAL"));
}

#[test]
fn scenario_choice_changes_only_the_scenario_material() {
    let base = context();
    let mut other = context();
    other.scenario = Scenario::BackupFailure;

    let first = render_instruction(&base);
    let second = render_instruction(&other);
    assert_ne!(first, second);
    assert!(second.contains("Backup Failure"));
    // Shared sections are unaffected by the scenario swap.
    assert!(second.contains("Multi-AZ: false"));
    assert!(second.contains("RTO: 30 minutes. RPO: 5 minutes."));
}

#[test]
fn repair_instruction_embeds_original_and_violation() {
    let original = render_instruction(&context());
    let repaired = render_repair_instruction(&original, "missing required field 'confidence'");

    assert!(repaired.starts_with(&original));
    assert!(repaired.contains("CORRECTION REQUIRED:"));
    assert!(repaired.contains("missing required field 'confidence'"));
}
