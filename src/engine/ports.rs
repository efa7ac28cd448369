use async_trait::async_trait;

use crate::engine::{
    error::EngineError,
    types::{ConfigurationSnapshot, PolicyContext},
};

/// Read-only view of the infrastructure configuration store. The engine
/// never writes through this seam.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    async fn fetch(&self, identifier: &str) -> Result<ConfigurationSnapshot, EngineError>;
}

/// Read-only view of the written reliability policies. Any caching of the
/// policy text is the store's concern, not the engine's.
#[async_trait]
pub trait PolicyProvider: Send + Sync {
    async fn load(&self) -> Result<PolicyContext, EngineError>;
}
