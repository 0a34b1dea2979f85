//! Shared request plumbing.

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::warn;

use crate::config::ClientConfig;

pub(crate) fn build_client(config: &ClientConfig) -> Result<Client, String> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| format!("failed to create HTTP client: {e}"))
}

/// Reads an existence answer from the response status.
pub(crate) fn existence(response: &Response) -> Result<bool, String> {
    let status = response.status();
    match status {
        StatusCode::OK => Ok(true),
        StatusCode::NOT_FOUND => Ok(false),
        s if s.is_success() => Ok(false),
        s => {
            warn!(url = %response.url(), status = %s, "collaborator answered with an error status");
            Err(format!("{} answered {s}", response.url()))
        }
    }
}
