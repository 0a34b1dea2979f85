//! A running API backed by an in-memory store and mocked collaborators.

#![allow(dead_code)]

use deployd_client::{ClientConfig, ComponentServiceClient, FilterServiceClient};
use deployd_engine::DeploymentManager;
use deployd_server::build_router;
use deployd_store::SqlitePlanStore;
use std::sync::Arc;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OWNER: &str = "owner-1";

pub struct TestApp {
    pub base: String,
    pub http: reqwest::Client,
    pub filters: MockServer,
    pub components: MockServer,
}

impl TestApp {
    /// Spin up the API on an OS-assigned port.
    ///
    /// Both collaborators answer 404 to anything not mounted afterwards.
    pub async fn spawn() -> Self {
        let filters = MockServer::start().await;
        let components = MockServer::start().await;

        let filter_client = Arc::new(FilterServiceClient::new(ClientConfig::new(filters.uri())).unwrap());
        let component_client =
            Arc::new(ComponentServiceClient::new(ClientConfig::new(components.uri())).unwrap());
        let manager = DeploymentManager::new(
            Arc::new(SqlitePlanStore::open_in_memory().unwrap()),
            filter_client.clone(),
            filter_client,
            component_client,
        );

        let app = build_router(Arc::new(manager));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://127.0.0.1:{port}"),
            http: reqwest::Client::new(),
            filters,
            components,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn publish(&self, plan: serde_json::Value) -> reqwest::Response {
        self.http
            .post(self.url(&format!("/owners/{OWNER}/plans")))
            .json(&plan)
            .send()
            .await
            .unwrap()
    }

    pub async fn resolve(&self, request: serde_json::Value) -> reqwest::Response {
        self.http
            .post(self.url("/packages/resolve"))
            .json(&request)
            .send()
            .await
            .unwrap()
    }

    /// Post a body verbatim, with the given content type.
    pub async fn post_raw(&self, path: &str, content_type: &str, body: &str) -> reqwest::Response {
        self.http
            .post(self.url(path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body.to_string())
            .send()
            .await
            .unwrap()
    }

    /// Every package and version of the owner exists.
    pub async fn mount_catalog(&self) {
        Mock::given(method("GET"))
            .and(path_regex(format!(r"^/owners/{OWNER}/packages/[^/]+$")))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.components)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(format!(r"^/owners/{OWNER}/packages/[^/]+/versions/[^/]+$")))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.components)
            .await;
    }

    /// Declares `name` as an existing filter of the owner.
    pub async fn mount_filter(&self, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/owners/{OWNER}/filters/{name}")))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.filters)
            .await;
    }

    /// Makes `unit_id` match any filter list that includes `name`.
    pub async fn mount_match(&self, unit_id: &str, name: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/owners/{OWNER}/devices/{unit_id}/match")))
            .and(query_param("filter", name))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.filters)
            .await;
    }
}
