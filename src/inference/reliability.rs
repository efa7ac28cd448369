use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;

use crate::inference::{
    error::{InferenceError, InferenceErrorKind},
    types::ReliabilityConfig,
};

/// Retry and circuit-breaker policy for the single inference backend.
/// Retries apply only to transient failure classes; validation failures are
/// the response validator's problem, not the gateway's.
#[derive(Clone)]
pub struct ReliabilityLayer {
    config: ReliabilityConfig,
    breaker: Arc<Mutex<BreakerState>>,
}

#[derive(Debug, Clone, Default)]
struct BreakerState {
    failure_streak: u32,
    open_until: Option<Instant>,
    probe_in_flight: bool,
}

impl ReliabilityLayer {
    pub fn new(config: ReliabilityConfig) -> Self {
        Self {
            config,
            breaker: Arc::new(Mutex::new(BreakerState::default())),
        }
    }

    pub fn config(&self) -> &ReliabilityConfig {
        &self.config
    }

    pub async fn ensure_backend_allowed(&self) -> Result<(), InferenceError> {
        let now = Instant::now();
        let mut state = self.breaker.lock().await;

        if let Some(open_until) = state.open_until {
            if now < open_until {
                return Err(InferenceError::new(
                    InferenceErrorKind::CircuitOpen,
                    "circuit breaker is open for the inference backend",
                )
                .with_retryable(false));
            }

            if state.probe_in_flight {
                return Err(InferenceError::new(
                    InferenceErrorKind::CircuitOpen,
                    "circuit probe is already in-flight for the inference backend",
                )
                .with_retryable(false));
            }

            state.probe_in_flight = true;
        }

        Ok(())
    }

    pub async fn record_success(&self) {
        let mut state = self.breaker.lock().await;
        state.failure_streak = 0;
        state.open_until = None;
        state.probe_in_flight = false;
    }

    pub async fn record_failure(&self, count_toward_breaker: bool) {
        if !count_toward_breaker {
            return;
        }

        let mut state = self.breaker.lock().await;
        state.failure_streak = state.failure_streak.saturating_add(1);
        state.probe_in_flight = false;

        if state.failure_streak >= self.config.breaker_failure_threshold.max(1) {
            state.open_until =
                Some(Instant::now() + Duration::from_millis(self.config.breaker_open_ms.max(1)));
        }
    }

    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_base_ms.max(1) as f64;
        let max = self.config.backoff_max_ms.max(1) as f64;
        let exp = (attempt as i32).max(0);
        let without_jitter = (base * 2f64.powi(exp)).min(max);
        let jitter_factor = 0.9 + (attempt as f64 % 3.0) * 0.05;
        Duration::from_millis((without_jitter * jitter_factor) as u64)
    }

    pub fn can_retry(&self, err: &InferenceError, attempt: u32) -> bool {
        err.retryable && attempt < self.config.max_retries
    }

    pub fn counts_toward_breaker(err: &InferenceError) -> bool {
        matches!(
            err.kind,
            InferenceErrorKind::BackendTransient
                | InferenceErrorKind::Timeout
                | InferenceErrorKind::RateLimited
        )
    }
}
