//! HTTP API for deployd.
//!
//! | Route | Operation |
//! |---|---|
//! | `POST /owners/{userId}/plans` | publish a plan (201) |
//! | `GET /owners/{userId}/plans?filter=&page=&size=` | active plans using a filter |
//! | `GET /owners/{userId}/plans/{packageRef}` | active plan of a package |
//! | `GET /owners/{userId}/plans/{packageRef}/versions?onlyActive=` | deployed versions |
//! | `POST /packages/resolve` | packages a device may run |

mod config;
mod error;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorBody};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use deployd_engine::DeploymentManager;
use deployd_types::{DeviceRequest, Page, PageRequest, Plan, ResolvedPackages, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use std::sync::Arc;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
struct PlanSearch {
    filter: String,
    #[serde(default)]
    page: u32,
    #[serde(default = "default_page_size")]
    size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
struct VersionsQuery {
    #[serde(rename = "onlyActive", default = "default_only_active")]
    only_active: bool,
}

fn default_only_active() -> bool {
    true
}

async fn publish_plan(
    State(manager): State<Arc<DeploymentManager>>,
    Path(owner_id): Path<String>,
    body: Result<Json<Plan>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Plan>)> {
    let Json(plan) = body?;
    let stored = manager.publish_plan(&owner_id, plan).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn search_plans(
    State(manager): State<Arc<DeploymentManager>>,
    Path(owner_id): Path<String>,
    Query(search): Query<PlanSearch>,
) -> ApiResult<Json<Page<Plan>>> {
    let page = PageRequest::new(search.page, search.size);
    let plans = manager.plans_by_filter(&owner_id, &search.filter, page).await?;
    Ok(Json(plans))
}

async fn active_plan(
    State(manager): State<Arc<DeploymentManager>>,
    Path((owner_id, package_ref)): Path<(String, String)>,
) -> ApiResult<Json<Plan>> {
    Ok(Json(manager.active_plan(&owner_id, &package_ref).await?))
}

async fn deployed_versions(
    State(manager): State<Arc<DeploymentManager>>,
    Path((owner_id, package_ref)): Path<(String, String)>,
    Query(query): Query<VersionsQuery>,
) -> ApiResult<Json<Vec<String>>> {
    let versions = manager
        .deployed_versions(&owner_id, &package_ref, query.only_active)
        .await?;
    Ok(Json(versions))
}

async fn resolve_packages(
    State(manager): State<Arc<DeploymentManager>>,
    body: Result<Json<DeviceRequest>, JsonRejection>,
) -> ApiResult<Json<ResolvedPackages>> {
    let Json(request) = body?;
    Ok(Json(manager.resolve_packages(&request).await?))
}

/// Build the HTTP API router around a deployment manager.
pub fn build_router(manager: Arc<DeploymentManager>) -> Router {
    Router::new()
        .route("/owners/{owner_id}/plans", post(publish_plan).get(search_plans))
        .route("/owners/{owner_id}/plans/{package_ref}", get(active_plan))
        .route(
            "/owners/{owner_id}/plans/{package_ref}/versions",
            get(deployed_versions),
        )
        .route("/packages/resolve", post(resolve_packages))
        .with_state(manager)
}
