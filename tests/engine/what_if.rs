use std::{collections::BTreeMap, sync::Arc};

use serde_json::{Value, json};

use dbimpact::engine::{EngineErrorKind, Scenario, Severity};

use crate::support::{Behavior, ScriptedBackend, fast_limits, pipeline_with, verdict_json};

fn protective_overrides() -> BTreeMap<String, Value> {
    let mut overrides = BTreeMap::new();
    overrides.insert("multi_az".to_string(), json!(true));
    overrides.insert("pitr_enabled".to_string(), json!(true));
    overrides.insert("backup_retention_days".to_string(), json!(7));
    overrides
}

/// Routed so the unprotected baseline configuration reads as CRITICAL and
/// the protected hypothetical as LOW.
fn severity_routed_backend() -> Arc<ScriptedBackend> {
    Arc::new(
        ScriptedBackend::new()
            .route(
                "Multi-AZ: true",
                vec![Behavior::Reply(verdict_json("LOW", 5, false))],
            )
            .route("", vec![Behavior::Reply(verdict_json("CRITICAL", 87, true))]),
    )
}

#[tokio::test]
async fn compare_reports_the_improvement_delta() {
    let pipeline = pipeline_with(severity_routed_backend(), fast_limits());

    let comparison = pipeline
        .compare(
            "prod-orders-db-01",
            Scenario::PrimaryDbFailure,
            &protective_overrides(),
        )
        .await
        .expect("comparison succeeds");

    assert_eq!(comparison.baseline.business_severity(), Severity::Critical);
    assert_eq!(comparison.hypothetical.business_severity(), Severity::Low);

    let improvement = &comparison.improvement;
    assert!(improvement.severity_improved);
    assert_eq!(improvement.severity_change, "CRITICAL -> LOW");
    assert_eq!(improvement.outage_reduction_minutes, 82);
    assert!(improvement.sla_violation_prevented);
    assert!(improvement.rto_violation_prevented);
    assert!(improvement.rpo_violation_prevented);
}

#[tokio::test]
async fn regression_is_reported_not_masked() {
    // Routed inversely: the hypothetical reads worse than the baseline.
    let backend = Arc::new(
        ScriptedBackend::new()
            .route(
                "Multi-AZ: true",
                vec![Behavior::Reply(verdict_json("HIGH", 60, true))],
            )
            .route("", vec![Behavior::Reply(verdict_json("MEDIUM", 20, false))]),
    );
    let pipeline = pipeline_with(backend, fast_limits());

    let comparison = pipeline
        .compare(
            "prod-orders-db-01",
            Scenario::PrimaryDbFailure,
            &protective_overrides(),
        )
        .await
        .expect("comparison succeeds");

    let improvement = &comparison.improvement;
    assert!(!improvement.severity_improved);
    assert_eq!(improvement.severity_change, "MEDIUM -> HIGH");
    assert_eq!(improvement.outage_reduction_minutes, -40);
    assert!(!improvement.sla_violation_prevented);
}

#[tokio::test]
async fn simulate_is_idempotent_over_an_unchanged_base() {
    let backend = severity_routed_backend();
    let pipeline = pipeline_with(backend.clone(), fast_limits());
    let overrides = protective_overrides();

    let first = pipeline
        .simulate("prod-orders-db-01", Scenario::PrimaryDbFailure, &overrides)
        .await
        .expect("first simulation succeeds");
    let second = pipeline
        .simulate("prod-orders-db-01", Scenario::PrimaryDbFailure, &overrides)
        .await
        .expect("second simulation succeeds");

    assert_eq!(first, second);
    // Both runs rendered the identical derived-configuration instruction.
    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
}

#[tokio::test]
async fn simulate_never_leaks_overrides_into_later_baseline_runs() {
    let backend = severity_routed_backend();
    let pipeline = pipeline_with(backend.clone(), fast_limits());

    pipeline
        .simulate(
            "prod-orders-db-01",
            Scenario::PrimaryDbFailure,
            &protective_overrides(),
        )
        .await
        .expect("simulation succeeds");

    let baseline = pipeline
        .analyze(&dbimpact::engine::AnalysisRequest::new(
            "prod-orders-db-01",
            Scenario::PrimaryDbFailure,
        ))
        .await
        .expect("baseline analysis succeeds");

    // The base config still renders as unprotected after the simulation.
    assert_eq!(baseline.business_severity(), Severity::Critical);
    assert!(backend.calls()[1].contains("Multi-AZ: false"));
}

#[tokio::test]
async fn unknown_override_key_aborts_before_inference() {
    let backend = severity_routed_backend();
    let pipeline = pipeline_with(backend.clone(), fast_limits());

    let mut overrides = BTreeMap::new();
    overrides.insert("multiaz".to_string(), json!(true));
    let err = pipeline
        .compare("prod-orders-db-01", Scenario::PrimaryDbFailure, &overrides)
        .await
        .expect_err("typo must abort the comparison");

    assert_eq!(err.kind, EngineErrorKind::UnknownField);
    assert_eq!(backend.call_count(), 0);
}
