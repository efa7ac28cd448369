use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::scenarios::Scenario;

/// One analysis target: which database, which failure scenario, and an
/// optional set of hypothetical configuration deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub identifier: String,
    pub scenario: Scenario,
    pub overrides: BTreeMap<String, Value>,
}

impl AnalysisRequest {
    pub fn new(identifier: impl Into<String>, scenario: Scenario) -> Self {
        Self {
            identifier: identifier.into(),
            scenario,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: BTreeMap<String, Value>) -> Self {
        self.overrides = overrides;
        self
    }
}

/// The infrastructure facts relevant to recoverability, as returned by the
/// configuration provider. Hypothetical snapshots are derived via
/// `context::apply_overrides`; the base value is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSnapshot {
    pub identifier: String,
    pub multi_az: bool,
    pub backup_retention_days: u32,
    pub pitr_enabled: bool,
    pub engine: String,
    pub instance_class: String,
    #[serde(default)]
    pub read_replicas: u32,
    #[serde(default)]
    pub allocated_storage_gb: u32,
    #[serde(default)]
    pub max_allocated_storage_gb: Option<u32>,
}

/// Concatenated policy text (SLA commitments, recovery objectives, incident
/// history). Opaque to the engine; its structure is the inference step's
/// problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyContext {
    pub text: String,
}

impl PolicyContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One snapshot, one policy blob, one scenario. Built per request and
/// discarded after the call completes; never shared across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisContext {
    pub snapshot: ConfigurationSnapshot,
    pub policy: PolicyContext,
    pub scenario: Scenario,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_provider_timeout_ms() -> u64 {
    5_000
}

fn default_provider_retry_backoff_ms() -> u64 {
    200
}

fn default_inference_budget_ms() -> u64 {
    60_000
}

fn default_max_repair_attempts() -> u8 {
    1
}

fn default_max_concurrency() -> usize {
    10
}

fn default_max_batch_size() -> usize {
    50
}

/// Time and retry budgets for one analysis pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineLimits {
    /// Timeout for each infrastructure/policy read attempt.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
    /// Backoff before the single provider-read retry.
    #[serde(default = "default_provider_retry_backoff_ms")]
    pub provider_retry_backoff_ms: u64,
    /// Wall-clock budget handed to the inference gateway per invocation.
    #[serde(default = "default_inference_budget_ms")]
    pub inference_budget_ms: u64,
    /// Bounded schema-repair round-trips; must be 0 or 1.
    #[serde(default = "default_max_repair_attempts")]
    pub max_repair_attempts: u8,
    /// Ceiling on in-flight targets in a batch.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Optional per-target deadline in batch mode; never batch-wide.
    #[serde(default)]
    pub target_budget_ms: Option<u64>,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            provider_timeout_ms: default_provider_timeout_ms(),
            provider_retry_backoff_ms: default_provider_retry_backoff_ms(),
            inference_budget_ms: default_inference_budget_ms(),
            max_repair_attempts: default_max_repair_attempts(),
            max_concurrency: default_max_concurrency(),
            max_batch_size: default_max_batch_size(),
            target_budget_ms: None,
        }
    }
}

/// The fixed-shape impact assessment record.
///
/// Fields are private: the only way to obtain a value is through the
/// response validator's factory, so "all fields present and well-typed" is
/// enforced structurally rather than by convention. Serialization uses the
/// exact wire names callers integrate against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactVerdict {
    sla_violation: bool,
    rto_violation: bool,
    rpo_violation: bool,
    expected_outage_time_minutes: u32,
    business_severity: Severity,
    why: Vec<String>,
    recommendations: Vec<String>,
    confidence: f64,
}

impl ImpactVerdict {
    /// Constructor reserved for the validating factory in
    /// `engine::validator`. All invariants must already hold.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_validated(
        sla_violation: bool,
        rto_violation: bool,
        rpo_violation: bool,
        expected_outage_time_minutes: u32,
        business_severity: Severity,
        why: Vec<String>,
        recommendations: Vec<String>,
        confidence: f64,
    ) -> Self {
        Self {
            sla_violation,
            rto_violation,
            rpo_violation,
            expected_outage_time_minutes,
            business_severity,
            why,
            recommendations,
            confidence,
        }
    }

    pub fn sla_violation(&self) -> bool {
        self.sla_violation
    }

    pub fn rto_violation(&self) -> bool {
        self.rto_violation
    }

    pub fn rpo_violation(&self) -> bool {
        self.rpo_violation
    }

    pub fn expected_outage_time_minutes(&self) -> u32 {
        self.expected_outage_time_minutes
    }

    pub fn business_severity(&self) -> Severity {
        self.business_severity
    }

    pub fn why(&self) -> &[String] {
        &self.why
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}
