//! Plan identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ModelError;

/// Identifier the plan store gives a plan when it is inserted.
///
/// A UUID v7, so ids issued by one store order like their inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(Uuid);

impl PlanId {
    /// Issues a fresh id stamped with the current time.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Reads back an id stored in its hyphenated text form.
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        Uuid::try_parse(text)
            .map(Self)
            .map_err(|e| ModelError::InvalidId(format!("{text}: {e}")))
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for PlanId {
    type Err = ModelError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}
