//! SQLite storage layer for deployd.
//!
//! Plans are append-only rows holding the plan's JSON body. The filter
//! names and versions a plan references are indexed in side tables so
//! filter searches and version history never need to decode bodies.
//!
//! The most recently created plan of an `(owner, package)` pair is its
//! active plan; ties on creation time go to the later insert.

mod error;
mod plan_store;

pub use error::{StoreError, StoreResult};
pub use plan_store::SqlitePlanStore;
