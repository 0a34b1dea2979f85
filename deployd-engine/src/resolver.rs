//! Version selection within a plan and package availability per plan.

use deployd_types::{DeviceRequest, Package, Plan, Rule};
use tracing::debug;

use crate::condition::ConditionEvaluator;
use crate::error::DeployResult;

/// Resolves a single plan for a device.
#[derive(Clone)]
pub struct PlanResolver {
    evaluator: ConditionEvaluator,
}

impl PlanResolver {
    pub fn new(evaluator: ConditionEvaluator) -> Self {
        Self { evaluator }
    }

    /// Returns the version of the first rule whose conditions admit the
    /// device. Rules after it are not evaluated.
    pub async fn select_version(
        &self,
        request: &DeviceRequest,
        rules: &[Rule],
    ) -> DeployResult<Option<String>> {
        for rule in rules {
            if self.evaluator.evaluate(request, &rule.conditions).await? {
                return Ok(Some(rule.version.clone()));
            }
        }
        Ok(None)
    }

    /// Resolves `plan` for the device.
    ///
    /// Returns `None` when the plan's own conditions reject the device. When
    /// they admit it, the package is returned with the selected version, or
    /// without one if no rule matched.
    pub async fn resolve_package(
        &self,
        request: &DeviceRequest,
        plan: &Plan,
    ) -> DeployResult<Option<Package>> {
        if !self.evaluator.evaluate(request, &plan.conditions).await? {
            debug!(package = %plan.package_ref, unit = %request.unit_id, "package denied");
            return Ok(None);
        }

        let package = match self.select_version(request, &plan.rules).await? {
            Some(version) => Package::versioned(&plan.package_ref, version),
            None => Package::unversioned(&plan.package_ref),
        };
        Ok(Some(package))
    }
}
