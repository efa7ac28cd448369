use std::sync::Arc;

use dbimpact::engine::{
    AnalysisRequest, EngineErrorKind, EngineLimits, Scenario, Severity,
};

use crate::support::{Behavior, ScriptedBackend, fast_limits, pipeline_with, verdict_json};

fn requests(identifiers: &[&str]) -> Vec<AnalysisRequest> {
    identifiers
        .iter()
        .map(|identifier| AnalysisRequest::new(*identifier, Scenario::PrimaryDbFailure))
        .collect()
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let backend = ScriptedBackend::always("", Behavior::Reply(verdict_json("LOW", 0, false)));
    let pipeline = pipeline_with(backend, fast_limits());

    let err = pipeline
        .analyze_batch(&[], 4)
        .await
        .expect_err("empty batch must fail");
    assert_eq!(err.kind, EngineErrorKind::InvalidRequest);
}

#[tokio::test]
async fn oversized_batch_is_rejected_whole() {
    let backend = ScriptedBackend::always("", Behavior::Reply(verdict_json("LOW", 0, false)));
    let pipeline = pipeline_with(
        backend.clone(),
        EngineLimits {
            max_batch_size: 2,
            ..fast_limits()
        },
    );

    let err = pipeline
        .analyze_batch(&requests(&["db-a", "db-b", "db-c"]), 4)
        .await
        .expect_err("batch above the cap must fail before any work starts");
    assert_eq!(err.kind, EngineErrorKind::InvalidRequest);
    assert!(err.message.contains("split"), "message suggests splitting the batch");
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn results_keep_input_order_and_isolate_failures() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .route(
                "prod-orders-db-01",
                vec![Behavior::Reply(verdict_json("CRITICAL", 87, true))],
            )
            .route(
                "prod-users-db",
                vec![Behavior::Reply(verdict_json("LOW", 2, false))],
            ),
    );
    let pipeline = pipeline_with(backend, fast_limits());

    let result = pipeline
        .analyze_batch(
            &requests(&["prod-orders-db-01", "prod-missing-db", "prod-users-db"]),
            3,
        )
        .await
        .expect("batch itself succeeds even when a target fails");

    assert_eq!(result.entries.len(), 3);
    assert_eq!(result.entries[0].identifier, "prod-orders-db-01");
    assert_eq!(result.entries[1].identifier, "prod-missing-db");
    assert_eq!(result.entries[2].identifier, "prod-users-db");

    let critical = result.entries[0].outcome.as_ref().expect("first target succeeds");
    assert_eq!(critical.business_severity(), Severity::Critical);

    let missing = result.entries[1]
        .outcome
        .as_ref()
        .expect_err("unknown target fails alone");
    assert_eq!(missing.kind, EngineErrorKind::NotFound);

    let low = result.entries[2].outcome.as_ref().expect("third target succeeds");
    assert_eq!(low.business_severity(), Severity::Low);

    assert_eq!(result.succeeded(), 2);
    assert_eq!(result.failed(), 1);
    assert_eq!(result.tally.critical, 1);
    assert_eq!(result.tally.low, 1);
    assert_eq!(result.tally.high + result.tally.medium, 0);
}

#[tokio::test]
async fn slow_target_times_out_without_dragging_down_siblings() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .route("prod-users-db", vec![Behavior::Hang])
            .route("", vec![Behavior::Reply(verdict_json("MEDIUM", 20, false))]),
    );
    let pipeline = pipeline_with(
        backend,
        EngineLimits {
            target_budget_ms: Some(100),
            ..fast_limits()
        },
    );

    let result = pipeline
        .analyze_batch(&requests(&["prod-orders-db-01", "prod-users-db"]), 2)
        .await
        .expect("batch completes");

    let fast = result.entries[0].outcome.as_ref().expect("fast target succeeds");
    assert_eq!(fast.business_severity(), Severity::Medium);

    let slow = result.entries[1]
        .outcome
        .as_ref()
        .expect_err("hung target hits its per-target deadline");
    assert!(
        matches!(slow.kind, EngineErrorKind::Timeout | EngineErrorKind::Cancelled),
        "unexpected kind: {:?}",
        slow.kind
    );
    assert_eq!(result.succeeded(), 1);
}
