use dbimpact::engine::{EngineErrorKind, Severity, validator::validate};

use crate::support::verdict_json;

#[test]
fn valid_payload_with_markdown_fencing_is_accepted() {
    let raw = format!(
        "Here is my assessment:\n```json\n{}\n```\n",
        verdict_json("CRITICAL", 87, true)
    );
    let verdict = validate(&raw).expect("fenced but schema-valid output must validate");

    assert!(verdict.sla_violation());
    assert!(verdict.rto_violation());
    assert!(verdict.rpo_violation());
    assert_eq!(verdict.expected_outage_time_minutes(), 87);
    assert_eq!(verdict.business_severity(), Severity::Critical);
    assert_eq!(verdict.why(), ["scripted reasoning"]);
    assert_eq!(verdict.recommendations(), ["scripted recommendation"]);
    assert!((verdict.confidence() - 0.9).abs() < f64::EPSILON);
}

#[test]
fn serialized_verdict_uses_the_wire_field_names() {
    let verdict = validate(&verdict_json("LOW", 2, false)).expect("payload must validate");
    let wire = serde_json::to_value(&verdict).expect("verdict serializes");

    let object = wire.as_object().expect("verdict serializes to an object");
    for field in [
        "sla_violation",
        "rto_violation",
        "rpo_violation",
        "expected_outage_time_minutes",
        "business_severity",
        "why",
        "recommendations",
        "confidence",
    ] {
        assert!(object.contains_key(field), "missing wire field: {field}");
    }
    assert_eq!(object["business_severity"], "LOW");
}

#[test]
fn missing_field_names_the_field_and_keeps_the_raw_output() {
    let raw = r#"{"sla_violation": true, "rto_violation": true, "rpo_violation": false,
        "expected_outage_time_minutes": 30, "business_severity": "HIGH",
        "why": ["reason"], "recommendations": ["fix"]}"#;
    let err = validate(raw).expect_err("payload without confidence must fail");

    assert_eq!(err.kind, EngineErrorKind::SchemaViolation);
    assert!(err.message.contains("confidence"), "message: {}", err.message);
    assert_eq!(err.raw_output.as_deref(), Some(raw));
}

#[test]
fn unknown_severity_is_rejected() {
    let raw = verdict_json("SEVERE", 10, true);
    let err = validate(&raw).expect_err("severity outside the enum must fail");
    assert!(err.message.contains("business_severity"));
    assert!(err.message.contains("CRITICAL"), "message lists the permitted values");
}

#[test]
fn out_of_range_confidence_is_rejected() {
    let raw = r#"{"sla_violation": false, "rto_violation": false, "rpo_violation": false,
        "expected_outage_time_minutes": 0, "business_severity": "LOW",
        "why": ["reason"], "recommendations": ["fix"], "confidence": 1.7}"#;
    let err = validate(raw).expect_err("confidence above 1.0 must fail");
    assert!(err.message.contains("confidence"));
}

#[test]
fn negative_outage_time_is_rejected() {
    let raw = r#"{"sla_violation": false, "rto_violation": false, "rpo_violation": false,
        "expected_outage_time_minutes": -5, "business_severity": "LOW",
        "why": ["reason"], "recommendations": ["fix"], "confidence": 0.5}"#;
    let err = validate(raw).expect_err("negative outage time must fail");
    assert!(err.message.contains("expected_outage_time_minutes"));
}

#[test]
fn empty_reason_list_is_rejected() {
    let raw = r#"{"sla_violation": false, "rto_violation": false, "rpo_violation": false,
        "expected_outage_time_minutes": 0, "business_severity": "LOW",
        "why": [], "recommendations": ["fix"], "confidence": 0.5}"#;
    let err = validate(raw).expect_err("empty why array must fail");
    assert!(err.message.contains("'why'"));
}

#[test]
fn output_without_json_is_a_schema_violation() {
    let err = validate("I cannot answer that.").expect_err("prose-only output must fail");
    assert_eq!(err.kind, EngineErrorKind::SchemaViolation);
    assert_eq!(err.raw_output.as_deref(), Some("I cannot answer that."));
}
