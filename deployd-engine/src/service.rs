//! Interfaces of the services the engine depends on.
//!
//! Every existence or match check answers `Ok(false)` for not-found and
//! `Err(..)` for any other failure. The engine never retries.

use async_trait::async_trait;
use deployd_types::{DeviceRequest, Page, PageRequest, Plan};
use std::collections::BTreeSet;

use crate::error::DeployResult;

/// Answers whether a named filter exists for an owner.
#[async_trait]
pub trait FilterCatalog: Send + Sync {
    async fn filter_exists(&self, owner_id: &str, filter_name: &str) -> DeployResult<bool>;
}

/// Answers whether a device matches a set of filters.
///
/// How several names combine is decided by the implementation.
#[async_trait]
pub trait FilterMatcher: Send + Sync {
    /// `filters` is never empty.
    async fn matches(&self, request: &DeviceRequest, filters: &[String]) -> DeployResult<bool>;
}

/// Answers whether packages and their versions exist.
#[async_trait]
pub trait ComponentCatalog: Send + Sync {
    async fn version_exists(
        &self,
        owner_id: &str,
        package_ref: &str,
        version_id: &str,
    ) -> DeployResult<bool>;

    async fn package_exists(&self, owner_id: &str, package_ref: &str) -> DeployResult<bool>;
}

/// Persistence for plans.
///
/// Plans are append-only; the most recently created plan of an
/// `(owner, package)` pair is its active plan.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Stores a plan, assigning its id and creation time.
    async fn insert(&self, plan: Plan) -> DeployResult<Plan>;

    /// The active plan of every package the owner has published.
    async fn active_plans_for(&self, owner_id: &str) -> DeployResult<Vec<Plan>>;

    /// The active plan of one package, if any plan was published.
    async fn active_plan(&self, owner_id: &str, package_ref: &str) -> DeployResult<Option<Plan>>;

    /// Versions named by any plan ever published for the package.
    async fn all_deployed_versions(
        &self,
        owner_id: &str,
        package_ref: &str,
    ) -> DeployResult<BTreeSet<String>>;

    /// Active plans that mention `filter_name` anywhere.
    async fn plans_referencing_filter(
        &self,
        owner_id: &str,
        filter_name: &str,
        page: PageRequest,
    ) -> DeployResult<Page<Plan>>;
}
