//! Error types for the deployment engine.

use deployd_types::ModelError;
use thiserror::Error;

/// Result type for engine operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors that can occur while publishing, looking up or resolving plans.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The plan references filters that do not exist.
    #[error("invalid filters for package {package_ref} of owner {owner_id}: {}", .filters.join(", "))]
    InvalidFilters {
        owner_id: String,
        package_ref: String,
        filters: Vec<String>,
    },

    /// The plan's rules reference versions that do not exist.
    #[error("invalid versions for package {package_ref} of owner {owner_id}: {}", .versions.join(", "))]
    InvalidVersions {
        owner_id: String,
        package_ref: String,
        versions: Vec<String>,
    },

    /// The plan's package does not exist.
    #[error("package {package_ref} does not exist for owner {owner_id}")]
    InvalidPackage { owner_id: String, package_ref: String },

    /// No plan was ever published for this package.
    #[error("no deployment plan for package {package_ref} of owner {owner_id}")]
    UnknownPlan { owner_id: String, package_ref: String },

    /// The plan or request breaks a model invariant.
    #[error("invalid plan: {0}")]
    InvalidPlan(#[from] ModelError),

    /// Filter service failure (anything but not-found).
    #[error("filter service error: {0}")]
    FilterService(String),

    /// Component service failure (anything but not-found).
    #[error("component service error: {0}")]
    ComponentService(String),

    /// Plan store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// A fan-out task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),
}

impl DeployError {
    /// Returns true for rejections of the published plan, as opposed to
    /// infrastructure failures that abort the operation.
    #[must_use]
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilters { .. }
                | Self::InvalidVersions { .. }
                | Self::InvalidPackage { .. }
                | Self::InvalidPlan(_)
        )
    }

    /// Offending names carried by a rejection, empty for other errors.
    #[must_use]
    pub fn details(&self) -> &[String] {
        match self {
            Self::InvalidFilters { filters, .. } => filters,
            Self::InvalidVersions { versions, .. } => versions,
            _ => &[],
        }
    }
}
