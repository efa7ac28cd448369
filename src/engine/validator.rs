use serde_json::Value;

use crate::engine::{
    error::{EngineError, schema_violation},
    types::{ImpactVerdict, Severity},
};

/// Extracts, parses, and strictly validates raw inference output against
/// the fixed verdict schema. A failure is surfaced with a field-level
/// message (used verbatim in the repair instruction) and never papered
/// over with defaulted fields.
pub fn validate(raw: &str) -> Result<ImpactVerdict, EngineError> {
    let candidate = extract_first_json_object(raw).ok_or_else(|| {
        schema_violation("output contains no JSON object").with_raw_output(raw)
    })?;

    let value: Value = serde_json::from_str(candidate)
        .map_err(|err| schema_violation(format!("output is not valid JSON: {err}")).with_raw_output(raw))?;

    check_fields(&value).map_err(|message| schema_violation(message).with_raw_output(raw))
}

/// Locates the first balanced JSON object in text that may contain
/// surrounding commentary or markdown fencing. Brace counting is
/// string-aware so braces inside string literals do not unbalance the scan.
pub fn extract_first_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn check_fields(value: &Value) -> Result<ImpactVerdict, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "top-level JSON value must be an object".to_string())?;

    let sla_violation = require_bool(object, "sla_violation")?;
    let rto_violation = require_bool(object, "rto_violation")?;
    let rpo_violation = require_bool(object, "rpo_violation")?;

    let outage = require(object, "expected_outage_time_minutes")?;
    let expected_outage_time_minutes = outage
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            format!("'expected_outage_time_minutes' must be a non-negative integer, got {outage}")
        })?;

    let severity_raw = require(object, "business_severity")?;
    let business_severity = match severity_raw.as_str() {
        Some("LOW") => Severity::Low,
        Some("MEDIUM") => Severity::Medium,
        Some("HIGH") => Severity::High,
        Some("CRITICAL") => Severity::Critical,
        _ => {
            return Err(format!(
                "'business_severity' must be one of LOW, MEDIUM, HIGH, CRITICAL, got {severity_raw}"
            ));
        }
    };

    let why = require_string_list(object, "why")?;
    let recommendations = require_string_list(object, "recommendations")?;

    let confidence_raw = require(object, "confidence")?;
    let confidence = confidence_raw
        .as_f64()
        .ok_or_else(|| format!("'confidence' must be a number, got {confidence_raw}"))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(format!(
            "'confidence' must be within [0.0, 1.0], got {confidence}"
        ));
    }

    Ok(ImpactVerdict::from_validated(
        sla_violation,
        rto_violation,
        rpo_violation,
        expected_outage_time_minutes,
        business_severity,
        why,
        recommendations,
        confidence,
    ))
}

fn require<'a>(
    object: &'a serde_json::Map<String, Value>,
    field: &str,
) -> Result<&'a Value, String> {
    object
        .get(field)
        .ok_or_else(|| format!("missing required field '{field}'"))
}

fn require_bool(object: &serde_json::Map<String, Value>, field: &str) -> Result<bool, String> {
    let value = require(object, field)?;
    value
        .as_bool()
        .ok_or_else(|| format!("'{field}' must be a boolean, got {value}"))
}

fn require_string_list(
    object: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<Vec<String>, String> {
    let value = require(object, field)?;
    let items = value
        .as_array()
        .ok_or_else(|| format!("'{field}' must be an array of strings, got {value}"))?;
    if items.is_empty() {
        return Err(format!("'{field}' must not be empty"));
    }

    let mut strings = Vec::with_capacity(items.len());
    for item in items {
        let text = item
            .as_str()
            .ok_or_else(|| format!("'{field}' entries must be strings, got {item}"))?;
        if text.trim().is_empty() {
            return Err(format!("'{field}' entries must not be blank"));
        }
        strings.push(text.to_string());
    }
    Ok(strings)
}
