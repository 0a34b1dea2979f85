//! Core type definitions for deployd.
//!
//! This crate defines the deployment model shared by the engine, the plan
//! store and the HTTP boundary:
//! - Plan identifiers (UUID v7)
//! - Allow/deny filter conditions, version rules and deployment plans
//! - Device requests and the resolved package sets returned to devices
//! - Paging types for plan searches
//!
//! Server-assigned plan fields (id, owner, creation time) never appear in
//! the JSON representation.

mod condition;
mod device;
mod ids;
mod package;
mod page;
mod plan;

pub use condition::{ConditionPair, FilterCondition};
pub use device::{DeviceRequest, InstalledPackage};
pub use ids::PlanId;
pub use package::{Package, ResolvedPackages};
pub use page::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use plan::{Plan, Rule};

/// Result type alias using the crate's error type.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Errors raised when a model value breaks one of its invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A required text field is empty or whitespace.
    #[error("{field} must not be blank")]
    Blank { field: String },

    /// A plan id could not be parsed.
    #[error("invalid plan id: {0}")]
    InvalidId(String),
}

/// Reads a list that may be missing or `null`; both mean empty.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    let list: Option<Vec<T>> = serde::Deserialize::deserialize(deserializer)?;
    Ok(list.unwrap_or_default())
}

impl ModelError {
    pub(crate) fn blank(field: impl Into<String>) -> Self {
        Self::Blank {
            field: field.into(),
        }
    }
}
