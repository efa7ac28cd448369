pub mod batch;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod prompts;
pub mod providers;
pub mod scenarios;
pub mod types;
pub mod validator;
pub mod what_if;

pub use batch::{BatchEntry, BatchResult, SeverityTally};
pub use error::{EngineError, EngineErrorKind};
pub use pipeline::AnalysisPipeline;
pub use ports::{ConfigProvider, PolicyProvider};
pub use providers::{FilePolicyProvider, FixtureConfigProvider};
pub use scenarios::{Scenario, ScenarioDescriptor};
pub use types::{
    AnalysisContext, AnalysisRequest, ConfigurationSnapshot, EngineLimits, ImpactVerdict,
    PolicyContext, Severity,
};
pub use what_if::{ImprovementSummary, WhatIfComparison};
