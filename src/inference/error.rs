use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceErrorKind {
    InvalidRequest,
    Authentication,
    RateLimited,
    Timeout,
    CircuitOpen,
    BackendTransient,
    BackendPermanent,
    ProtocolViolation,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceError {
    pub kind: InferenceErrorKind,
    pub message: String,
    pub retryable: bool,
    pub provider_http_status: Option<u16>,
}

impl InferenceError {
    pub fn new(kind: InferenceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: matches!(
                kind,
                InferenceErrorKind::RateLimited
                    | InferenceErrorKind::Timeout
                    | InferenceErrorKind::BackendTransient
            ),
            provider_http_status: None,
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_provider_http_status(mut self, status: u16) -> Self {
        self.provider_http_status = Some(status);
        self
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.provider_http_status {
            Some(status) => write!(f, "{} (http_status={})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for InferenceError {}

pub fn invalid_request(message: impl Into<String>) -> InferenceError {
    InferenceError::new(InferenceErrorKind::InvalidRequest, message).with_retryable(false)
}

pub fn internal_error(message: impl Into<String>) -> InferenceError {
    InferenceError::new(InferenceErrorKind::Internal, message).with_retryable(false)
}
