//! Deployment manager: the operations exposed to the HTTP boundary.
//!
//! Owns the plan store and the collaborator handles, and wires the
//! validator and the resolvers together. Holds no mutable state, so one
//! instance can be shared across requests behind an `Arc`.

use deployd_types::{DeviceRequest, Page, PageRequest, Plan, ResolvedPackages};
use std::sync::Arc;
use tracing::info;

use crate::batch::BatchResolver;
use crate::condition::ConditionEvaluator;
use crate::error::{DeployError, DeployResult};
use crate::resolver::PlanResolver;
use crate::service::{ComponentCatalog, FilterCatalog, FilterMatcher, PlanStore};
use crate::validator::PlanValidator;

/// Publishes, looks up and resolves deployment plans.
pub struct DeploymentManager {
    store: Arc<dyn PlanStore>,
    validator: PlanValidator,
    batch: BatchResolver,
}

impl DeploymentManager {
    pub fn new(
        store: Arc<dyn PlanStore>,
        filters: Arc<dyn FilterCatalog>,
        matcher: Arc<dyn FilterMatcher>,
        components: Arc<dyn ComponentCatalog>,
    ) -> Self {
        let resolver = PlanResolver::new(ConditionEvaluator::new(matcher));
        Self {
            validator: PlanValidator::new(filters, components),
            batch: BatchResolver::new(Arc::clone(&store), resolver),
            store,
        }
    }

    /// Validates `plan` on behalf of `owner_id` and stores it as the new
    /// active plan of its package.
    ///
    /// Nothing guards against a filter or version disappearing between
    /// validation and insert.
    pub async fn publish_plan(&self, owner_id: &str, plan: Plan) -> DeployResult<Plan> {
        let plan = plan.with_owner(owner_id);
        plan.validate()?;
        self.validator.validate(&plan).await?;

        let stored = self.store.insert(plan).await?;
        info!(
            owner = %stored.owner_id,
            package = %stored.package_ref,
            rules = stored.rules.len(),
            "published deployment plan"
        );
        Ok(stored)
    }

    /// Returns the active plan of a package.
    pub async fn active_plan(&self, owner_id: &str, package_ref: &str) -> DeployResult<Plan> {
        self.store
            .active_plan(owner_id, package_ref)
            .await?
            .ok_or_else(|| DeployError::UnknownPlan {
                owner_id: owner_id.to_string(),
                package_ref: package_ref.to_string(),
            })
    }

    /// Resolves which packages, and which versions, the device may use.
    pub async fn resolve_packages(&self, request: &DeviceRequest) -> DeployResult<ResolvedPackages> {
        request.validate()?;
        self.batch.resolve_all(request).await
    }

    /// Active plans that reference `filter_name`.
    pub async fn plans_by_filter(
        &self,
        owner_id: &str,
        filter_name: &str,
        page: PageRequest,
    ) -> DeployResult<Page<Plan>> {
        self.store
            .plans_referencing_filter(owner_id, filter_name, page.normalized())
            .await
    }

    /// Versions deployed for a package.
    ///
    /// With `only_active`, the versions of the active plan's rules in rule
    /// order, or nothing when no plan exists. Otherwise every version any
    /// plan of the package ever named, sorted.
    pub async fn deployed_versions(
        &self,
        owner_id: &str,
        package_ref: &str,
        only_active: bool,
    ) -> DeployResult<Vec<String>> {
        if only_active {
            let plan = self.store.active_plan(owner_id, package_ref).await?;
            return Ok(plan.map(|p| p.extract_versions()).unwrap_or_default());
        }
        let versions = self.store.all_deployed_versions(owner_id, package_ref).await?;
        Ok(versions.into_iter().collect())
    }
}
