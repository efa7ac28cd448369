use std::{
    sync::{Arc, LazyLock},
    time::{Duration, Instant},
};

use regex::Regex;
use tokio::time::{sleep, timeout};

use crate::{
    engine::{
        context::{apply_overrides, assemble},
        error::{EngineError, EngineErrorKind, cancelled, invalid_request, stage_timeout, upstream_error},
        ports::{ConfigProvider, PolicyProvider},
        prompts::{render_instruction, render_repair_instruction},
        types::{AnalysisRequest, ConfigurationSnapshot, EngineLimits, ImpactVerdict},
        validator,
    },
    inference::{InferenceError, InferenceErrorKind, InferenceGateway},
};

/// RDS-style identifier: starts with a letter, alphanumeric and hyphens,
/// at most 63 characters.
static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9-]{0,62}$").expect("identifier pattern must compile")
});

/// The single-analysis pipeline: snapshot fetch, policy load, context
/// assembly, instruction render, inference invocation, strict validation,
/// and at most one corrective repair round-trip. Stateless between calls;
/// safe to share across concurrent targets.
pub struct AnalysisPipeline {
    config_provider: Arc<dyn ConfigProvider>,
    policy_provider: Arc<dyn PolicyProvider>,
    gateway: Arc<InferenceGateway>,
    limits: EngineLimits,
}

impl AnalysisPipeline {
    pub fn new(
        config_provider: Arc<dyn ConfigProvider>,
        policy_provider: Arc<dyn PolicyProvider>,
        gateway: Arc<InferenceGateway>,
        limits: EngineLimits,
    ) -> Result<Self, EngineError> {
        if limits.max_repair_attempts > 1 {
            return Err(invalid_request("max_repair_attempts must be 0 or 1"));
        }
        Ok(Self {
            config_provider,
            policy_provider,
            gateway,
            limits,
        })
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<ImpactVerdict, EngineError> {
        self.analyze_with_deadline(request, None).await
    }

    /// Runs one analysis under an optional caller deadline. Deadline expiry
    /// observed between stages aborts this target with `Cancelled`.
    pub async fn analyze_with_deadline(
        &self,
        request: &AnalysisRequest,
        deadline: Option<Instant>,
    ) -> Result<ImpactVerdict, EngineError> {
        let started_at = Instant::now();
        tracing::info!(
            target: "engine",
            identifier = %request.identifier,
            scenario = %request.scenario,
            override_count = request.overrides.len(),
            "analysis_started"
        );

        let base = self.fetch_base_snapshot(&request.identifier, deadline).await?;
        let snapshot = if request.overrides.is_empty() {
            base
        } else {
            apply_overrides(&base, &request.overrides).map_err(|err| err.with_stage("overrides"))?
        };

        let verdict = self.run_on_snapshot(request, snapshot, deadline).await?;
        tracing::info!(
            target: "engine",
            identifier = %request.identifier,
            scenario = %request.scenario,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            severity = %verdict.business_severity(),
            sla_violation = verdict.sla_violation(),
            "analysis_completed"
        );
        Ok(verdict)
    }

    /// Validates the identifier and reads the base snapshot from the
    /// configuration store. Transient read failures are retried once with a
    /// short backoff, then surfaced.
    pub(crate) async fn fetch_base_snapshot(
        &self,
        identifier: &str,
        deadline: Option<Instant>,
    ) -> Result<ConfigurationSnapshot, EngineError> {
        if !IDENTIFIER_PATTERN.is_match(identifier) {
            return Err(invalid_request(format!(
                "identifier '{identifier}' must start with a letter and contain only alphanumerics and hyphens (max 63 chars)"
            ))
            .with_stage("request"));
        }

        check_deadline(deadline, "config_fetch")?;
        self.read_with_retry("config_fetch", || self.config_provider.fetch(identifier))
            .await
    }

    /// Runs the pipeline stages downstream of snapshot acquisition. What-if
    /// analysis enters here with a derived snapshot; the base is untouched.
    pub(crate) async fn run_on_snapshot(
        &self,
        request: &AnalysisRequest,
        snapshot: ConfigurationSnapshot,
        deadline: Option<Instant>,
    ) -> Result<ImpactVerdict, EngineError> {
        check_deadline(deadline, "policy_load")?;
        let policy = self
            .read_with_retry("policy_load", || self.policy_provider.load())
            .await?;

        let context = assemble(snapshot, policy, request.scenario);
        let instruction = render_instruction(&context);

        check_deadline(deadline, "inference")?;
        let raw = self.invoke_gateway(&instruction, deadline).await?;

        let violation = match validator::validate(&raw) {
            Ok(verdict) => return Ok(verdict),
            Err(err) => err,
        };

        if self.limits.max_repair_attempts == 0 {
            return Err(violation.with_stage("validation"));
        }

        tracing::debug!(
            target: "engine",
            identifier = %request.identifier,
            violation = %violation.message,
            "schema_repair_attempt"
        );

        check_deadline(deadline, "repair")?;
        let repair_instruction = render_repair_instruction(&instruction, &violation.message);
        let repaired_raw = self.invoke_gateway(&repair_instruction, deadline).await?;

        validator::validate(&repaired_raw).map_err(|err| {
            EngineError::new(
                EngineErrorKind::SchemaViolation,
                format!(
                    "inference output failed validation after one repair attempt: {}",
                    err.message
                ),
            )
            .with_stage("validation")
            .with_raw_output(repaired_raw)
        })
    }

    async fn invoke_gateway(
        &self,
        instruction: &str,
        deadline: Option<Instant>,
    ) -> Result<String, EngineError> {
        let mut budget = Duration::from_millis(self.limits.inference_budget_ms.max(1));
        if let Some(deadline) = deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(cancelled("deadline expired before inference").with_stage("inference"));
            }
            budget = budget.min(remaining);
        }

        self.gateway
            .invoke(instruction, budget)
            .await
            .map_err(|err| map_inference_error(err).with_stage("inference"))
    }

    async fn read_with_retry<T, F, Fut>(
        &self,
        stage: &'static str,
        mut read: F,
    ) -> Result<T, EngineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        let attempt_timeout = Duration::from_millis(self.limits.provider_timeout_ms.max(1));
        let first = match timeout(attempt_timeout, read()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(_) => stage_timeout(format!(
                "{stage} exceeded {}ms",
                attempt_timeout.as_millis()
            )),
        };

        // Caller input errors are never retried; only transient classes get
        // the single short-backoff retry.
        if !matches!(first.kind, EngineErrorKind::Timeout | EngineErrorKind::Upstream) {
            return Err(first.with_stage(stage));
        }

        tracing::debug!(
            target: "engine",
            stage = stage,
            error = %first.message,
            "provider_read_retry"
        );
        sleep(Duration::from_millis(self.limits.provider_retry_backoff_ms)).await;

        match timeout(attempt_timeout, read()).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(err.with_stage(stage)),
            Err(_) => Err(stage_timeout(format!(
                "{stage} exceeded {}ms after retry",
                attempt_timeout.as_millis()
            ))
            .with_stage(stage)),
        }
    }
}

fn check_deadline(deadline: Option<Instant>, stage: &'static str) -> Result<(), EngineError> {
    if let Some(deadline) = deadline
        && Instant::now() >= deadline
    {
        return Err(cancelled("caller deadline expired").with_stage(stage));
    }
    Ok(())
}

fn map_inference_error(err: InferenceError) -> EngineError {
    match err.kind {
        InferenceErrorKind::Timeout => stage_timeout(err.message),
        _ => upstream_error(err.message),
    }
}
