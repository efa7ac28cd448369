use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::engine::{
    context::apply_overrides,
    error::EngineError,
    pipeline::AnalysisPipeline,
    scenarios::Scenario,
    types::{AnalysisRequest, ImpactVerdict},
};

/// How the hypothetical configuration changes the verdict relative to the
/// unmodified baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementSummary {
    pub severity_improved: bool,
    pub severity_change: String,
    pub outage_reduction_minutes: i64,
    pub sla_violation_prevented: bool,
    pub rto_violation_prevented: bool,
    pub rpo_violation_prevented: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhatIfComparison {
    pub baseline: ImpactVerdict,
    pub hypothetical: ImpactVerdict,
    pub improvement: ImprovementSummary,
}

impl AnalysisPipeline {
    /// Runs the unmodified single-analysis pipeline on a snapshot derived
    /// from the live base plus the override deltas. The base snapshot and
    /// all persisted state stay untouched; re-running the same overrides
    /// against an unchanged base produces content-identical contexts.
    pub async fn simulate(
        &self,
        identifier: &str,
        scenario: Scenario,
        overrides: &BTreeMap<String, Value>,
    ) -> Result<ImpactVerdict, EngineError> {
        let base = self.fetch_base_snapshot(identifier, None).await?;
        let derived = apply_overrides(&base, overrides)?;
        let request = AnalysisRequest::new(identifier, scenario);
        self.run_on_snapshot(&request, derived, None).await
    }

    /// Analyzes both the live configuration and the hypothetical one off a
    /// single base snapshot read, and summarizes the delta.
    pub async fn compare(
        &self,
        identifier: &str,
        scenario: Scenario,
        overrides: &BTreeMap<String, Value>,
    ) -> Result<WhatIfComparison, EngineError> {
        let base = self.fetch_base_snapshot(identifier, None).await?;
        let derived = apply_overrides(&base, overrides)?;
        let request = AnalysisRequest::new(identifier, scenario);

        let baseline = self.run_on_snapshot(&request, base, None).await?;
        let hypothetical = self.run_on_snapshot(&request, derived, None).await?;
        let improvement = summarize_improvement(&baseline, &hypothetical);

        Ok(WhatIfComparison {
            baseline,
            hypothetical,
            improvement,
        })
    }
}

fn summarize_improvement(
    baseline: &ImpactVerdict,
    hypothetical: &ImpactVerdict,
) -> ImprovementSummary {
    ImprovementSummary {
        severity_improved: hypothetical.business_severity() < baseline.business_severity(),
        severity_change: format!(
            "{} -> {}",
            baseline.business_severity(),
            hypothetical.business_severity()
        ),
        outage_reduction_minutes: i64::from(baseline.expected_outage_time_minutes())
            - i64::from(hypothetical.expected_outage_time_minutes()),
        sla_violation_prevented: baseline.sla_violation() && !hypothetical.sla_violation(),
        rto_violation_prevented: baseline.rto_violation() && !hypothetical.rto_violation(),
        rpo_violation_prevented: baseline.rpo_violation() && !hypothetical.rpo_violation(),
    }
}
