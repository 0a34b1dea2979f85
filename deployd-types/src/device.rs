//! Device requests sent when a device asks which packages it may run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ModelError, ModelResult};

/// A package currently installed on the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub reference: String,
    pub version: String,
}

/// What a device reports about itself.
///
/// The engine never looks inside; the request is forwarded as-is to the
/// filter matching service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRequest {
    #[serde(rename = "userId", default)]
    pub owner_id: String,
    #[serde(rename = "unitId", default)]
    pub unit_id: String,
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Map::is_empty"
    )]
    pub additional_properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<InstalledPackage>,
}

impl DeviceRequest {
    /// Creates a request with no attributes and no installed packages.
    pub fn new(owner_id: impl Into<String>, unit_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            unit_id: unit_id.into(),
            additional_properties: Map::new(),
            packages: Vec::new(),
        }
    }

    /// Adds an opaque attribute.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.additional_properties.insert(key.into(), value);
        self
    }

    /// Adds an installed package.
    #[must_use]
    pub fn with_package(mut self, reference: impl Into<String>, version: impl Into<String>) -> Self {
        self.packages.push(InstalledPackage {
            reference: reference.into(),
            version: version.into(),
        });
        self
    }

    /// Checks that the owner and device are identified.
    pub fn validate(&self) -> ModelResult<()> {
        if self.owner_id.trim().is_empty() {
            return Err(ModelError::blank("userId"));
        }
        if self.unit_id.trim().is_empty() {
            return Err(ModelError::blank("unitId"));
        }
        Ok(())
    }
}
