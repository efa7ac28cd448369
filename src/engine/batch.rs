use std::time::{Duration, Instant};

use futures_util::StreamExt;
use serde::Serialize;

use crate::engine::{
    error::{EngineError, internal_error, invalid_request},
    pipeline::AnalysisPipeline,
    types::{AnalysisRequest, ImpactVerdict, Severity},
};

/// One slot per requested target, in input order. A failed target carries
/// its terminal error descriptor; it never affects sibling slots.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub identifier: String,
    pub outcome: Result<ImpactVerdict, EngineError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityTally {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub entries: Vec<BatchEntry>,
    pub tally: SeverityTally,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.is_ok())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }
}

impl AnalysisPipeline {
    /// Fans the requests out across bounded concurrency. Each target runs
    /// the single-analysis pipeline independently under its own per-target
    /// deadline; the result always has one entry per input request.
    pub async fn analyze_batch(
        &self,
        requests: &[AnalysisRequest],
        max_concurrency: usize,
    ) -> Result<BatchResult, EngineError> {
        if requests.is_empty() {
            return Err(invalid_request("batch requires at least one target"));
        }
        let limit = self.limits().max_batch_size.max(1);
        if requests.len() > limit {
            return Err(invalid_request(format!(
                "batch size {} exceeds maximum of {limit}; split into multiple batches",
                requests.len()
            )));
        }

        let concurrency = max_concurrency.clamp(1, self.limits().max_concurrency.max(1));
        let target_budget = self.limits().target_budget_ms.map(Duration::from_millis);
        let started_at = Instant::now();
        tracing::info!(
            target: "engine",
            targets = requests.len(),
            concurrency = concurrency,
            "batch_started"
        );

        let completed: Vec<(usize, String, Result<ImpactVerdict, EngineError>)> =
            futures_util::stream::iter(requests.iter().enumerate().map(|(index, request)| {
                async move {
                    let deadline = target_budget.map(|budget| Instant::now() + budget);
                    let outcome = self.analyze_with_deadline(request, deadline).await;
                    (index, request.identifier.clone(), outcome)
                }
            }))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut slots: Vec<Option<BatchEntry>> = vec![None; requests.len()];
        let mut tally = SeverityTally::default();
        for (index, identifier, outcome) in completed {
            if let Ok(verdict) = &outcome {
                match verdict.business_severity() {
                    Severity::Critical => tally.critical += 1,
                    Severity::High => tally.high += 1,
                    Severity::Medium => tally.medium += 1,
                    Severity::Low => tally.low += 1,
                }
            }
            slots[index] = Some(BatchEntry {
                identifier,
                outcome,
            });
        }

        let entries = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| internal_error("batch completed with an unfilled result slot"))?;

        let result = BatchResult { entries, tally };
        tracing::info!(
            target: "engine",
            targets = result.entries.len(),
            succeeded = result.succeeded(),
            failed = result.failed(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "batch_completed"
        );
        Ok(result)
    }
}
