//! Resolution results.

use serde::{Deserialize, Serialize};

/// A package a device is told about, with the version it should run when a
/// rule selected one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Package {
    /// A package without a targeted version.
    pub fn unversioned(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            version: None,
        }
    }

    /// A package pinned to `version`.
    pub fn versioned(reference: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            version: Some(version.into()),
        }
    }
}

/// Packages partitioned by whether the device may use them.
///
/// `absent` entries never carry a version. No order is guaranteed within
/// either list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPackages {
    #[serde(default)]
    pub present: Vec<Package>,
    #[serde(default)]
    pub absent: Vec<Package>,
}

impl ResolvedPackages {
    /// Looks up a package in either list by reference.
    #[must_use]
    pub fn find(&self, reference: &str) -> Option<&Package> {
        self.present
            .iter()
            .chain(self.absent.iter())
            .find(|p| p.reference == reference)
    }

    /// Total number of packages across both lists.
    #[must_use]
    pub fn len(&self) -> usize {
        self.present.len() + self.absent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.present.is_empty() && self.absent.is_empty()
    }
}
