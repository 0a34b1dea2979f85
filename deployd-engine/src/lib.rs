//! Deployment plan engine for deployd.
//!
//! Decides, per device, which package versions it may run, and checks new
//! plans before they are stored.
//!
//! # Architecture
//!
//! Resolution flows leaf-first:
//!
//! - **ConditionEvaluator**: one allow/deny pair against a device
//! - **PlanResolver**: the plan-level gate, then the first eligible rule
//! - **BatchResolver**: every active plan of the device's owner
//!
//! Publishing goes through the **PlanValidator**, which checks filters,
//! then versions, then the package, each stage fanned out concurrently.
//!
//! The filter service, component service and plan store are reached only
//! through the traits in [`service`]; the engine never inspects device
//! attributes itself.
//!
//! # Example
//!
//! ```ignore
//! use deployd_engine::DeploymentManager;
//! use std::sync::Arc;
//!
//! let manager = DeploymentManager::new(store, filters.clone(), filters, components);
//! let resolved = manager.resolve_packages(&request).await?;
//! ```

mod batch;
mod condition;
mod error;
mod manager;
mod resolver;
pub mod service;
mod validator;

pub use batch::BatchResolver;
pub use condition::ConditionEvaluator;
pub use error::{DeployError, DeployResult};
pub use manager::DeploymentManager;
pub use resolver::PlanResolver;
pub use service::{ComponentCatalog, FilterCatalog, FilterMatcher, PlanStore};
pub use validator::{PlanValidator, ValidationState};
