use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// Unknown database identifier or scenario key.
    NotFound,
    /// Override map references a configuration field that does not exist.
    UnknownField,
    InvalidRequest,
    /// A dependency exceeded its time budget.
    Timeout,
    /// A dependency was reachable but failed.
    Upstream,
    /// Inference output could not be made schema-valid within the repair budget.
    SchemaViolation,
    /// The caller-supplied deadline expired mid-pipeline.
    Cancelled,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
    /// Pipeline stage that produced the error.
    pub stage: Option<&'static str>,
    /// For schema violations, the raw inference output kept for diagnosis.
    pub raw_output: Option<String>,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stage: None,
            raw_output: None,
        }
    }

    pub fn with_stage(mut self, stage: &'static str) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_raw_output(mut self, raw_output: impl Into<String>) -> Self {
        self.raw_output = Some(raw_output.into());
        self
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "{} (stage={})", self.message, stage),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for EngineError {}

pub fn not_found(message: impl Into<String>) -> EngineError {
    EngineError::new(EngineErrorKind::NotFound, message)
}

pub fn unknown_field(message: impl Into<String>) -> EngineError {
    EngineError::new(EngineErrorKind::UnknownField, message)
}

pub fn invalid_request(message: impl Into<String>) -> EngineError {
    EngineError::new(EngineErrorKind::InvalidRequest, message)
}

pub fn stage_timeout(message: impl Into<String>) -> EngineError {
    EngineError::new(EngineErrorKind::Timeout, message)
}

pub fn upstream_error(message: impl Into<String>) -> EngineError {
    EngineError::new(EngineErrorKind::Upstream, message)
}

pub fn schema_violation(message: impl Into<String>) -> EngineError {
    EngineError::new(EngineErrorKind::SchemaViolation, message)
}

pub fn cancelled(message: impl Into<String>) -> EngineError {
    EngineError::new(EngineErrorKind::Cancelled, message)
}

pub fn internal_error(message: impl Into<String>) -> EngineError {
    EngineError::new(EngineErrorKind::Internal, message)
}
