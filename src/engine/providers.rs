use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;

use crate::engine::{
    error::{EngineError, not_found, upstream_error},
    ports::{ConfigProvider, PolicyProvider},
    types::{ConfigurationSnapshot, PolicyContext},
};

/// In-memory configuration catalog. Used for synthetic databases so demo
/// and test analyses never touch a live infrastructure API.
#[derive(Debug, Clone, Default)]
pub struct FixtureConfigProvider {
    snapshots: BTreeMap<String, ConfigurationSnapshot>,
}

impl FixtureConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(mut self, snapshot: ConfigurationSnapshot) -> Self {
        self.snapshots.insert(snapshot.identifier.clone(), snapshot);
        self
    }

    /// Two synthetic databases: one with every recoverability safeguard
    /// disabled, one fully protected. Useful as demo targets.
    pub fn with_demo_fleet() -> Self {
        Self::new()
            .with_snapshot(ConfigurationSnapshot {
                identifier: "prod-orders-db-01".to_string(),
                multi_az: false,
                backup_retention_days: 1,
                pitr_enabled: false,
                engine: "mysql".to_string(),
                instance_class: "db.m5.large".to_string(),
                read_replicas: 0,
                allocated_storage_gb: 100,
                max_allocated_storage_gb: None,
            })
            .with_snapshot(ConfigurationSnapshot {
                identifier: "prod-users-db".to_string(),
                multi_az: true,
                backup_retention_days: 7,
                pitr_enabled: true,
                engine: "postgres".to_string(),
                instance_class: "db.m5.xlarge".to_string(),
                read_replicas: 2,
                allocated_storage_gb: 200,
                max_allocated_storage_gb: Some(500),
            })
    }
}

#[async_trait]
impl ConfigProvider for FixtureConfigProvider {
    async fn fetch(&self, identifier: &str) -> Result<ConfigurationSnapshot, EngineError> {
        self.snapshots
            .get(identifier)
            .cloned()
            .ok_or_else(|| not_found(format!("database '{identifier}' not found")))
    }
}

/// Loads the policy documents (SLA commitments, recovery objectives,
/// incident history) from disk and concatenates them with separators. The
/// text is passed through opaque; its structure is the inference step's
/// problem.
#[derive(Debug, Clone)]
pub struct FilePolicyProvider {
    doc_paths: Vec<PathBuf>,
}

impl FilePolicyProvider {
    pub fn new(doc_paths: Vec<PathBuf>) -> Self {
        Self { doc_paths }
    }
}

#[async_trait]
impl PolicyProvider for FilePolicyProvider {
    async fn load(&self) -> Result<PolicyContext, EngineError> {
        let mut sections = Vec::with_capacity(self.doc_paths.len());
        for path in &self.doc_paths {
            let text = tokio::fs::read_to_string(path).await.map_err(|err| {
                upstream_error(format!(
                    "failed to read policy document {}: {err}",
                    path.display()
                ))
            })?;
            sections.push(text);
        }
        Ok(PolicyContext::new(sections.join("\n---\n")))
    }
}
