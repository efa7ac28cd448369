use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::time::{sleep, timeout};

use crate::inference::{
    backend::InferenceBackend,
    error::{InferenceError, InferenceErrorKind},
    reliability::ReliabilityLayer,
    types::InferenceConfig,
};

/// Owns all interaction with the non-deterministic inference dependency:
/// per-attempt timeouts tighter than the caller budget, bounded retries for
/// transient failures only, and the circuit breaker.
pub struct InferenceGateway {
    backend: Arc<dyn InferenceBackend>,
    reliability: ReliabilityLayer,
    request_timeout: Duration,
}

impl InferenceGateway {
    pub fn new(config: &InferenceConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            reliability: ReliabilityLayer::new(config.reliability.clone()),
            request_timeout: Duration::from_millis(config.request_timeout_ms.max(1)),
        }
    }

    /// Invokes the backend once, retrying transient failures within the
    /// caller's wall-clock budget. Never retries malformed output: whether
    /// raw text satisfies the verdict schema is the response validator's
    /// concern, not the gateway's.
    pub async fn invoke(&self, instruction: &str, budget: Duration) -> Result<String, InferenceError> {
        let request_id = uuid::Uuid::now_v7().to_string();
        let deadline = Instant::now() + budget;
        let mut attempt = 0_u32;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(InferenceError::new(
                    InferenceErrorKind::Timeout,
                    "inference budget exhausted before a response was obtained",
                ));
            }

            self.reliability.ensure_backend_allowed().await?;

            let effective_timeout = remaining.min(self.request_timeout);
            let attempt_started_at = Instant::now();
            tracing::debug!(
                target: "inference",
                request_id = %request_id,
                attempt = attempt,
                effective_timeout_ms = effective_timeout.as_millis() as u64,
                instruction_bytes = instruction.len(),
                "attempt_invoke_start"
            );

            let outcome = timeout(
                effective_timeout,
                self.backend.complete(instruction, effective_timeout),
            )
            .await;

            let err = match outcome {
                Ok(Ok(raw)) => {
                    self.reliability.record_success().await;
                    tracing::debug!(
                        target: "inference",
                        request_id = %request_id,
                        attempt = attempt,
                        elapsed_ms = attempt_started_at.elapsed().as_millis() as u64,
                        output_bytes = raw.len(),
                        "attempt_completed"
                    );
                    return Ok(raw);
                }
                Ok(Err(err)) => err,
                Err(_) => InferenceError::new(
                    InferenceErrorKind::Timeout,
                    format!(
                        "inference attempt exceeded {}ms",
                        effective_timeout.as_millis()
                    ),
                ),
            };

            let can_retry = self.reliability.can_retry(&err, attempt);
            tracing::debug!(
                target: "inference",
                request_id = %request_id,
                attempt = attempt,
                kind = ?err.kind,
                retryable = err.retryable,
                can_retry = can_retry,
                elapsed_ms = attempt_started_at.elapsed().as_millis() as u64,
                error = %err.message,
                "attempt_failed"
            );
            self.reliability
                .record_failure(ReliabilityLayer::counts_toward_breaker(&err))
                .await;

            if !can_retry {
                return Err(err);
            }

            attempt += 1;
            let delay = self.reliability.backoff_delay(attempt);
            let remaining = deadline.saturating_duration_since(Instant::now());
            if delay >= remaining {
                // No budget left to wait out the backoff; surface the last failure.
                return Err(err);
            }
            sleep(delay).await;
        }
    }
}
