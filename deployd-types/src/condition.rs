//! Allow/deny filter conditions.

use serde::{Deserialize, Serialize};

/// A set of filter names. Order and duplicates carry no meaning; an empty
/// set imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    #[serde(default, deserialize_with = "crate::null_as_empty")]
    pub filters: Vec<String>,
}

impl FilterCondition {
    /// Creates a condition over the given filter names.
    pub fn new<I, S>(filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filters: filters.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true when no filter is named.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Optional allow and deny sides gating a plan or a rule.
///
/// A missing side and a side with no filters are equivalent: neither
/// constrains the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<FilterCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny: Option<FilterCondition>,
}

impl ConditionPair {
    /// A pair with neither side configured.
    #[must_use]
    pub const fn unconstrained() -> Self {
        Self {
            allow: None,
            deny: None,
        }
    }

    /// A pair that only allows devices matching `filters`.
    pub fn allow<I, S>(filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: Some(FilterCondition::new(filters)),
            deny: None,
        }
    }

    /// A pair that rejects devices matching `filters`.
    pub fn deny<I, S>(filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: None,
            deny: Some(FilterCondition::new(filters)),
        }
    }

    /// Sets the deny side, keeping the allow side.
    #[must_use]
    pub fn and_deny<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny = Some(FilterCondition::new(filters));
        self
    }

    /// Filter names of the allow side, only when it is present and non-empty.
    #[must_use]
    pub fn allow_filters(&self) -> Option<&[String]> {
        configured(self.allow.as_ref())
    }

    /// Filter names of the deny side, only when it is present and non-empty.
    #[must_use]
    pub fn deny_filters(&self) -> Option<&[String]> {
        configured(self.deny.as_ref())
    }

    /// Returns true when neither side would constrain a device.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.allow_filters().is_none() && self.deny_filters().is_none()
    }

    /// All filter names, allow side first, duplicates kept.
    pub fn filter_names(&self) -> impl Iterator<Item = &String> {
        self.allow
            .iter()
            .chain(self.deny.iter())
            .flat_map(|c| c.filters.iter())
    }
}

fn configured(condition: Option<&FilterCondition>) -> Option<&[String]> {
    condition
        .filter(|c| !c.is_empty())
        .map(|c| c.filters.as_slice())
}
