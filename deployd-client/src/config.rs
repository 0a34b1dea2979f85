use serde::{Deserialize, Serialize};

/// Connection settings for one collaborator service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service root, e.g. `http://filters.internal:8080`.
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Builds `{base_url}/{segments...}`, percent-encoding every segment.
    pub(crate) fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.trim_end_matches('/').to_string();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }
}
