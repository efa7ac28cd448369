use std::collections::BTreeMap;

use serde_json::Value;

use crate::engine::{
    error::{EngineError, unknown_field},
    scenarios::Scenario,
    types::{AnalysisContext, ConfigurationSnapshot, PolicyContext},
};

/// Pairs one snapshot, one policy blob, and one scenario. Pure, no I/O.
pub fn assemble(
    snapshot: ConfigurationSnapshot,
    policy: PolicyContext,
    scenario: Scenario,
) -> AnalysisContext {
    AnalysisContext {
        snapshot,
        policy,
        scenario,
    }
}

/// Derives a hypothetical snapshot by applying an override map over a base.
/// The base is never mutated. Unknown keys and type-mismatched values are
/// rejected so a typo cannot produce a misleadingly unaffected what-if
/// result.
pub fn apply_overrides(
    base: &ConfigurationSnapshot,
    overrides: &BTreeMap<String, Value>,
) -> Result<ConfigurationSnapshot, EngineError> {
    let mut derived = base.clone();

    for (key, value) in overrides {
        match key.as_str() {
            "multi_az" => derived.multi_az = expect_bool(key, value)?,
            "backup_retention_days" => derived.backup_retention_days = expect_u32(key, value)?,
            "pitr_enabled" => derived.pitr_enabled = expect_bool(key, value)?,
            "engine" => derived.engine = expect_string(key, value)?,
            "instance_class" => derived.instance_class = expect_string(key, value)?,
            "read_replicas" => derived.read_replicas = expect_u32(key, value)?,
            "allocated_storage_gb" => derived.allocated_storage_gb = expect_u32(key, value)?,
            "max_allocated_storage_gb" => {
                derived.max_allocated_storage_gb = if value.is_null() {
                    None
                } else {
                    Some(expect_u32(key, value)?)
                };
            }
            "identifier" => {
                return Err(unknown_field(
                    "override key 'identifier' is not allowed: a what-if never retargets the analysis",
                ));
            }
            other => {
                return Err(unknown_field(format!(
                    "unknown override key '{other}'"
                )));
            }
        }
    }

    Ok(derived)
}

fn expect_bool(key: &str, value: &Value) -> Result<bool, EngineError> {
    value
        .as_bool()
        .ok_or_else(|| unknown_field(format!("override '{key}' must be a boolean, got {value}")))
}

fn expect_u32(key: &str, value: &Value) -> Result<u32, EngineError> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            unknown_field(format!(
                "override '{key}' must be a non-negative integer, got {value}"
            ))
        })
}

fn expect_string(key: &str, value: &Value) -> Result<String, EngineError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| unknown_field(format!("override '{key}' must be a string, got {value}")))
}
