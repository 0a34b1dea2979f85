//! HTTP collaborators for deployd.
//!
//! [`FilterServiceClient`] answers filter existence and device matching;
//! [`ComponentServiceClient`] answers package and version existence. Both
//! read the answer from the status code alone:
//!
//! | Status | Answer |
//! |---|---|
//! | 200 | `Ok(true)` |
//! | 404, other 2xx | `Ok(false)` |
//! | anything else, transport errors | `Err(..)` |

mod component;
mod config;
mod filter;
mod http;

pub use component::ComponentServiceClient;
pub use config::ClientConfig;
pub use filter::FilterServiceClient;
