//! Publish-time validation of the references a plan makes.
//!
//! Checks run in three stages: filters, then rule versions, then the
//! package. A failing stage stops the sequence. Within the filter and
//! version stages every distinct name is checked in its own task and all
//! offending names are reported together.

use deployd_types::Plan;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{DeployError, DeployResult};
use crate::service::{ComponentCatalog, FilterCatalog};

/// Progress of a plan through validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Init,
    FiltersChecked,
    VersionsChecked,
    PackageChecked,
    Rejected,
    Accepted,
}

impl ValidationState {
    /// Moves to the next state given whether the current stage passed.
    /// `Rejected` and `Accepted` are terminal.
    #[must_use]
    pub fn advance(self, passed: bool) -> Self {
        match (self, passed) {
            (Self::Rejected, _) | (Self::Accepted, _) => self,
            (_, false) => Self::Rejected,
            (Self::Init, true) => Self::FiltersChecked,
            (Self::FiltersChecked, true) => Self::VersionsChecked,
            (Self::VersionsChecked, true) => Self::PackageChecked,
            (Self::PackageChecked, true) => Self::Accepted,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Accepted)
    }
}

/// Verifies that every filter, version and the package referenced by a
/// plan exist before it is stored.
#[derive(Clone)]
pub struct PlanValidator {
    filters: Arc<dyn FilterCatalog>,
    components: Arc<dyn ComponentCatalog>,
}

impl PlanValidator {
    pub fn new(filters: Arc<dyn FilterCatalog>, components: Arc<dyn ComponentCatalog>) -> Self {
        Self {
            filters,
            components,
        }
    }

    /// Runs all stages. Returns the first stage's rejection, or a
    /// collaborator failure as soon as a stage has finished.
    pub async fn validate(&self, plan: &Plan) -> DeployResult<()> {
        let mut state = ValidationState::Init;

        for stage in [Stage::Filters, Stage::Versions, Stage::Package] {
            let outcome = match stage {
                Stage::Filters => self.check_filters(plan).await,
                Stage::Versions => self.check_versions(plan).await,
                Stage::Package => self.check_package(plan).await,
            };
            state = state.advance(outcome.is_ok());
            debug!(package = %plan.package_ref, ?state, "validation stage done");
            if let Err(e) = outcome {
                if e.is_validation_failure() {
                    warn!(owner = %plan.owner_id, package = %plan.package_ref, "plan rejected: {e}");
                }
                return Err(e);
            }
        }

        state = state.advance(true);
        debug_assert_eq!(state, ValidationState::Accepted);
        Ok(())
    }

    /// Checks every distinct filter the plan mentions.
    pub async fn check_filters(&self, plan: &Plan) -> DeployResult<()> {
        let catalog = Arc::clone(&self.filters);
        let owner_id = plan.owner_id.clone();
        let missing = find_missing(distinct(plan.extract_filters()), move |name| {
            let catalog = Arc::clone(&catalog);
            let owner_id = owner_id.clone();
            async move { catalog.filter_exists(&owner_id, &name).await }
        })
        .await?;

        if missing.is_empty() {
            return Ok(());
        }
        Err(DeployError::InvalidFilters {
            owner_id: plan.owner_id.clone(),
            package_ref: plan.package_ref.clone(),
            filters: missing,
        })
    }

    /// Checks every distinct rule version against the plan's package.
    pub async fn check_versions(&self, plan: &Plan) -> DeployResult<()> {
        let catalog = Arc::clone(&self.components);
        let owner_id = plan.owner_id.clone();
        let package_ref = plan.package_ref.clone();
        let missing = find_missing(distinct(plan.extract_versions()), move |version| {
            let catalog = Arc::clone(&catalog);
            let owner_id = owner_id.clone();
            let package_ref = package_ref.clone();
            async move {
                catalog
                    .version_exists(&owner_id, &package_ref, &version)
                    .await
            }
        })
        .await?;

        if missing.is_empty() {
            return Ok(());
        }
        Err(DeployError::InvalidVersions {
            owner_id: plan.owner_id.clone(),
            package_ref: plan.package_ref.clone(),
            versions: missing,
        })
    }

    /// Checks that the plan's package exists.
    pub async fn check_package(&self, plan: &Plan) -> DeployResult<()> {
        if self
            .components
            .package_exists(&plan.owner_id, &plan.package_ref)
            .await?
        {
            return Ok(());
        }
        Err(DeployError::InvalidPackage {
            owner_id: plan.owner_id.clone(),
            package_ref: plan.package_ref.clone(),
        })
    }
}

#[derive(Clone, Copy)]
enum Stage {
    Filters,
    Versions,
    Package,
}

/// Drops repeated names, keeping the first occurrence.
fn distinct(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Runs `exists` for every name in its own task and waits for all of them.
///
/// Returns the names reported missing, in input order. If any check failed,
/// the first failure observed is returned instead, but only after every task
/// has completed.
async fn find_missing<F, Fut>(names: Vec<String>, exists: F) -> DeployResult<Vec<String>>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = DeployResult<bool>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for (index, name) in names.iter().enumerate() {
        let check = exists(name.clone());
        tasks.spawn(async move { (index, check.await) });
    }

    let mut found = vec![true; names.len()];
    let mut failure = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(exists))) => found[index] = exists,
            Ok((_, Err(e))) => {
                failure.get_or_insert(e);
            }
            Err(e) => {
                failure.get_or_insert(DeployError::Task(e.to_string()));
            }
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }

    Ok(names
        .into_iter()
        .zip(found)
        .filter_map(|(name, exists)| (!exists).then_some(name))
        .collect())
}
