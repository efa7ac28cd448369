use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::{Value, json};

use crate::inference::{
    error::{InferenceError, InferenceErrorKind, internal_error, invalid_request},
    types::InferenceConfig,
};

/// The black-box decision function behind the gateway. Today an LLM
/// completion endpoint; the contract (instruction in, raw text out, within
/// a timeout) is all the engine depends on, so a deterministic rule engine
/// could be substituted without touching the pipeline.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn complete(
        &self,
        instruction: &str,
        timeout: Duration,
    ) -> Result<String, InferenceError>;
}

/// Non-streaming chat completion against any OpenAI-compatible endpoint.
pub struct OpenAiCompatibleBackend {
    client: Client,
    endpoint: String,
    model: String,
    auth_header: Option<String>,
    max_output_tokens: u32,
}

impl OpenAiCompatibleBackend {
    pub fn from_config(config: &InferenceConfig) -> Result<Self, InferenceError> {
        if config.endpoint.trim().is_empty() {
            return Err(invalid_request("inference.endpoint cannot be empty"));
        }
        if config.model.trim().is_empty() {
            return Err(invalid_request("inference.model cannot be empty"));
        }

        let auth_header = match &config.api_key_env {
            Some(var) => {
                let key = std::env::var(var).map_err(|_| {
                    invalid_request(format!(
                        "credential environment variable '{var}' is not set"
                    ))
                })?;
                Some(format!("Bearer {key}"))
            }
            None => None,
        };

        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms.max(1)))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| internal_error(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            auth_header,
            max_output_tokens: config.max_output_tokens,
        })
    }
}

#[async_trait]
impl InferenceBackend for OpenAiCompatibleBackend {
    async fn complete(
        &self,
        instruction: &str,
        timeout: Duration,
    ) -> Result<String, InferenceError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": instruction }],
            "max_tokens": self.max_output_tokens,
            "stream": false,
        });

        let mut request = self
            .client
            .post(url)
            .timeout(timeout)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(auth_header) = &self.auth_header {
            request = request.header(header::AUTHORIZATION, auth_header);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                InferenceError::new(
                    InferenceErrorKind::Timeout,
                    format!("inference request timed out: {err}"),
                )
            } else {
                InferenceError::new(
                    InferenceErrorKind::BackendTransient,
                    format!("inference request failed: {err}"),
                )
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }

        let payload = response.json::<Value>().await.map_err(|err| {
            InferenceError::new(
                InferenceErrorKind::ProtocolViolation,
                format!("inference body decode failed: {err}"),
            )
            .with_retryable(false)
        })?;

        payload
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                InferenceError::new(
                    InferenceErrorKind::ProtocolViolation,
                    "inference response missing choices[0].message.content",
                )
                .with_retryable(false)
            })
    }
}

fn map_http_error(status: u16, body: &str) -> InferenceError {
    let snippet: String = body.chars().take(200).collect();
    match status {
        401 | 403 => InferenceError::new(
            InferenceErrorKind::Authentication,
            format!("inference backend rejected credentials: {snippet}"),
        )
        .with_retryable(false)
        .with_provider_http_status(status),
        408 => InferenceError::new(
            InferenceErrorKind::Timeout,
            format!("inference backend timed out: {snippet}"),
        )
        .with_provider_http_status(status),
        429 => InferenceError::new(
            InferenceErrorKind::RateLimited,
            format!("inference backend throttled the request: {snippet}"),
        )
        .with_provider_http_status(status),
        500..=599 => InferenceError::new(
            InferenceErrorKind::BackendTransient,
            format!("inference backend returned {status}: {snippet}"),
        )
        .with_provider_http_status(status),
        _ => InferenceError::new(
            InferenceErrorKind::BackendPermanent,
            format!("inference backend returned {status}: {snippet}"),
        )
        .with_retryable(false)
        .with_provider_http_status(status),
    }
}
