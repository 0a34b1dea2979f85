//! Component service client.

use async_trait::async_trait;
use deployd_engine::{ComponentCatalog, DeployError, DeployResult};
use reqwest::Client;

use crate::config::ClientConfig;
use crate::http::{build_client, existence};

/// Talks to the component service over HTTP.
#[derive(Clone)]
pub struct ComponentServiceClient {
    config: ClientConfig,
    client: Client,
}

impl ComponentServiceClient {
    pub fn new(config: ClientConfig) -> DeployResult<Self> {
        let client = build_client(&config).map_err(DeployError::ComponentService)?;
        Ok(Self { config, client })
    }

    async fn exists(&self, url: String) -> DeployResult<bool> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DeployError::ComponentService(format!("request to {url} failed: {e}")))?;
        existence(&response).map_err(DeployError::ComponentService)
    }
}

#[async_trait]
impl ComponentCatalog for ComponentServiceClient {
    async fn version_exists(
        &self,
        owner_id: &str,
        package_ref: &str,
        version_id: &str,
    ) -> DeployResult<bool> {
        self.exists(self.config.url(&[
            "owners",
            owner_id,
            "packages",
            package_ref,
            "versions",
            version_id,
        ]))
        .await
    }

    async fn package_exists(&self, owner_id: &str, package_ref: &str) -> DeployResult<bool> {
        self.exists(self.config.url(&["owners", owner_id, "packages", package_ref]))
            .await
    }
}
