//! Resolution of every package of an owner for one device.

use deployd_types::{DeviceRequest, Package, ResolvedPackages};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::info;

use crate::error::{DeployError, DeployResult};
use crate::resolver::PlanResolver;
use crate::service::PlanStore;

/// Resolves all active plans of the requesting device's owner.
#[derive(Clone)]
pub struct BatchResolver {
    store: Arc<dyn PlanStore>,
    resolver: PlanResolver,
}

impl BatchResolver {
    pub fn new(store: Arc<dyn PlanStore>, resolver: PlanResolver) -> Self {
        Self { store, resolver }
    }

    /// Splits the owner's packages into those the device may use and those
    /// it is denied.
    ///
    /// Plans are resolved concurrently; the first collaborator failure
    /// aborts the whole resolution.
    pub async fn resolve_all(&self, request: &DeviceRequest) -> DeployResult<ResolvedPackages> {
        let plans = self.store.active_plans_for(&request.owner_id).await?;

        let outcomes = try_join_all(plans.iter().map(|plan| async move {
            let package = self.resolver.resolve_package(request, plan).await?;
            Ok::<_, DeployError>((plan.package_ref.as_str(), package))
        }))
        .await?;

        let mut resolved = ResolvedPackages::default();
        for (package_ref, package) in outcomes {
            match package {
                Some(package) => resolved.present.push(package),
                None => resolved.absent.push(Package::unversioned(package_ref)),
            }
        }

        info!(
            owner = %request.owner_id,
            unit = %request.unit_id,
            present = resolved.present.len(),
            absent = resolved.absent.len(),
            "resolved packages"
        );
        Ok(resolved)
    }
}
