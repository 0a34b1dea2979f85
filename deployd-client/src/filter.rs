//! Filter service client.

use async_trait::async_trait;
use deployd_engine::{DeployError, DeployResult, FilterCatalog, FilterMatcher};
use deployd_types::DeviceRequest;
use reqwest::Client;
use tracing::debug;

use crate::config::ClientConfig;
use crate::http::{build_client, existence};

/// Talks to the filter service over HTTP.
#[derive(Clone)]
pub struct FilterServiceClient {
    config: ClientConfig,
    client: Client,
}

impl FilterServiceClient {
    pub fn new(config: ClientConfig) -> DeployResult<Self> {
        let client = build_client(&config).map_err(DeployError::FilterService)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl FilterCatalog for FilterServiceClient {
    async fn filter_exists(&self, owner_id: &str, filter_name: &str) -> DeployResult<bool> {
        let url = self.config.url(&["owners", owner_id, "filters", filter_name]);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DeployError::FilterService(format!("filter lookup failed: {e}")))?;

        let exists = existence(&response).map_err(DeployError::FilterService)?;
        debug!(owner = owner_id, filter = filter_name, exists, "filter lookup");
        Ok(exists)
    }
}

#[async_trait]
impl FilterMatcher for FilterServiceClient {
    async fn matches(&self, request: &DeviceRequest, filters: &[String]) -> DeployResult<bool> {
        let url = self.config.url(&[
            "owners",
            &request.owner_id,
            "devices",
            &request.unit_id,
            "match",
        ]);
        let query: Vec<(&str, &str)> = filters.iter().map(|f| ("filter", f.as_str())).collect();

        let response = self
            .client
            .post(&url)
            .query(&query)
            .json(request)
            .send()
            .await
            .map_err(|e| DeployError::FilterService(format!("filter match failed: {e}")))?;

        let matched = existence(&response).map_err(DeployError::FilterService)?;
        debug!(unit = %request.unit_id, ?filters, matched, "filter match");
        Ok(matched)
    }
}
