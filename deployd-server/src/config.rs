//! Daemon configuration.

use deployd_client::{ClientConfig, ComponentServiceClient, FilterServiceClient};
use deployd_engine::{DeployResult, DeploymentManager};
use deployd_store::SqlitePlanStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything the daemon needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// HTTP port.
    pub port: u16,
    /// SQLite file holding published plans.
    pub database: PathBuf,
    pub filter_service: ClientConfig,
    pub component_service: ClientConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database: PathBuf::from("deployd.db"),
            filter_service: ClientConfig::default(),
            component_service: ClientConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Opens the plan store and connects the collaborator clients.
    pub fn build_manager(&self) -> DeployResult<DeploymentManager> {
        let store = Arc::new(SqlitePlanStore::open(&self.database)?);
        let filters = Arc::new(FilterServiceClient::new(self.filter_service.clone())?);
        let components = Arc::new(ComponentServiceClient::new(self.component_service.clone())?);
        Ok(DeploymentManager::new(
            store,
            filters.clone(),
            filters,
            components,
        ))
    }
}
