#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use dbimpact::{
    engine::{
        AnalysisPipeline, EngineError, EngineLimits, FixtureConfigProvider, PolicyContext,
        PolicyProvider,
    },
    inference::{
        InferenceBackend, InferenceConfig, InferenceError, InferenceErrorKind, InferenceGateway,
        ReliabilityConfig,
    },
};

/// One scripted reaction of the fake backend.
#[derive(Clone)]
pub enum Behavior {
    Reply(String),
    Fail(InferenceErrorKind, &'static str),
    /// Sleeps past every test timeout so the gateway attempt times out.
    Hang,
}

struct Route {
    needle: String,
    behaviors: VecDeque<Behavior>,
}

/// Instruction-routed fake backend. The first route whose needle occurs in
/// the instruction text wins, so register specific needles before the ""
/// catch-all. A route with several behaviors consumes them in order and
/// repeats the last one.
pub struct ScriptedBackend {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn route(self, needle: &str, behaviors: Vec<Behavior>) -> Self {
        self.routes.lock().unwrap().push(Route {
            needle: needle.to_string(),
            behaviors: behaviors.into(),
        });
        self
    }

    pub fn always(needle: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self::new().route(needle, vec![behavior]))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn complete(
        &self,
        instruction: &str,
        _timeout: Duration,
    ) -> Result<String, InferenceError> {
        self.calls.lock().unwrap().push(instruction.to_string());

        let behavior = {
            let mut routes = self.routes.lock().unwrap();
            let route = routes
                .iter_mut()
                .find(|route| instruction.contains(&route.needle))
                .ok_or_else(|| {
                    InferenceError::new(InferenceErrorKind::Internal, "no scripted route matched")
                })?;
            if route.behaviors.len() > 1 {
                route.behaviors.pop_front()
            } else {
                route.behaviors.front().cloned()
            }
            .ok_or_else(|| {
                InferenceError::new(InferenceErrorKind::Internal, "scripted route is empty")
            })?
        };

        match behavior {
            Behavior::Reply(text) => Ok(text),
            Behavior::Fail(kind, message) => Err(InferenceError::new(kind, message)),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(InferenceError::new(
                    InferenceErrorKind::Internal,
                    "hang behavior woke up",
                ))
            }
        }
    }
}

/// Policy provider with fixed in-memory text; keeps the tests off the disk.
#[derive(Debug, Clone)]
pub struct StaticPolicyProvider {
    text: String,
}

impl Default for StaticPolicyProvider {
    fn default() -> Self {
        Self {
            text: "RTO: 30 minutes. RPO: 5 minutes. SLA breach after 15 minutes.".to_string(),
        }
    }
}

#[async_trait]
impl PolicyProvider for StaticPolicyProvider {
    async fn load(&self) -> Result<PolicyContext, EngineError> {
        Ok(PolicyContext::new(self.text.clone()))
    }
}

pub fn inference_config() -> InferenceConfig {
    InferenceConfig {
        endpoint: "http://127.0.0.1:0".to_string(),
        model: "scripted".to_string(),
        api_key_env: None,
        connect_timeout_ms: 1_000,
        request_timeout_ms: 1_000,
        max_output_tokens: 256,
        reliability: ReliabilityConfig {
            max_retries: 0,
            backoff_base_ms: 10,
            backoff_max_ms: 20,
            breaker_failure_threshold: 100,
            breaker_open_ms: 1_000,
        },
    }
}

pub fn fast_limits() -> EngineLimits {
    EngineLimits {
        provider_timeout_ms: 500,
        provider_retry_backoff_ms: 10,
        inference_budget_ms: 500,
        ..EngineLimits::default()
    }
}

/// Pipeline over the demo fleet, a static policy blob, and the scripted
/// backend. Callers keep their own Arc to the backend for call assertions.
pub fn pipeline_with(backend: Arc<ScriptedBackend>, limits: EngineLimits) -> AnalysisPipeline {
    let config = inference_config();
    let gateway = Arc::new(InferenceGateway::new(&config, backend));
    AnalysisPipeline::new(
        Arc::new(FixtureConfigProvider::with_demo_fleet()),
        Arc::new(StaticPolicyProvider::default()),
        gateway,
        limits,
    )
    .expect("pipeline limits are valid")
}

/// Minimal schema-valid verdict payload.
pub fn verdict_json(severity: &str, outage: u32, violated: bool) -> String {
    format!(
        concat!(
            "{{\"sla_violation\": {violated}, \"rto_violation\": {violated}, ",
            "\"rpo_violation\": {violated}, \"expected_outage_time_minutes\": {outage}, ",
            "\"business_severity\": \"{severity}\", ",
            "\"why\": [\"scripted reasoning\"], ",
            "\"recommendations\": [\"scripted recommendation\"], ",
            "\"confidence\": 0.9}}"
        ),
        violated = violated,
        outage = outage,
        severity = severity,
    )
}
