//! Deployment plans and their version rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::condition::ConditionPair;
use crate::ids::PlanId;
use crate::{ModelError, ModelResult};

/// Targets one version of a package at the devices its conditions admit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "version", default)]
    pub version: String,
    #[serde(flatten)]
    pub conditions: ConditionPair,
}

impl Rule {
    /// Creates a rule for `version` gated by `conditions`.
    pub fn new(version: impl Into<String>, conditions: ConditionPair) -> Self {
        Self {
            version: version.into(),
            conditions,
        }
    }

    /// Creates a rule that admits every device.
    pub fn unconditional(version: impl Into<String>) -> Self {
        Self::new(version, ConditionPair::unconstrained())
    }
}

/// A targeting policy for one package of one owner.
///
/// Plans are immutable once stored. Publishing again for the same
/// `(owner_id, package_ref)` supersedes the previous plan; the one with the
/// latest `created_at` is the active plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Assigned by the plan store.
    #[serde(skip)]
    pub id: Option<PlanId>,
    /// Taken from the request path, never from the body.
    #[serde(skip)]
    pub owner_id: String,
    #[serde(rename = "packageRef", default)]
    pub package_ref: String,
    /// Package-level gate.
    #[serde(flatten)]
    pub conditions: ConditionPair,
    /// Evaluated in order; the first eligible rule wins.
    #[serde(default, deserialize_with = "crate::null_as_empty")]
    pub rules: Vec<Rule>,
    /// Assigned by the plan store.
    #[serde(skip)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Plan {
    /// Creates an unsaved plan.
    pub fn new(package_ref: impl Into<String>, conditions: ConditionPair, rules: Vec<Rule>) -> Self {
        Self {
            id: None,
            owner_id: String::new(),
            package_ref: package_ref.into(),
            conditions,
            rules,
            created_at: None,
        }
    }

    /// Returns the plan with its owner set.
    #[must_use]
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    /// Checks the plan's own invariants: a non-blank package reference and
    /// a non-blank version on every rule.
    pub fn validate(&self) -> ModelResult<()> {
        if self.package_ref.trim().is_empty() {
            return Err(ModelError::blank("packageRef"));
        }
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.version.trim().is_empty() {
                return Err(ModelError::blank(format!("rules[{index}].version")));
            }
        }
        Ok(())
    }

    /// Every filter name referenced by the plan, its own conditions first and
    /// then each rule's, in document order. Duplicates are kept.
    #[must_use]
    pub fn extract_filters(&self) -> Vec<String> {
        self.conditions
            .filter_names()
            .chain(self.rules.iter().flat_map(|r| r.conditions.filter_names()))
            .cloned()
            .collect()
    }

    /// The version of each rule, in rule order.
    #[must_use]
    pub fn extract_versions(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.version.clone()).collect()
    }

    /// Returns true when the plan mentions `filter_name` on any side of any
    /// of its conditions.
    #[must_use]
    pub fn references_filter(&self, filter_name: &str) -> bool {
        self.conditions.filter_names().any(|f| f == filter_name)
            || self
                .rules
                .iter()
                .any(|r| r.conditions.filter_names().any(|f| f == filter_name))
    }
}
