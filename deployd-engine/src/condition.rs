//! Evaluation of one allow/deny condition pair against a device.

use deployd_types::{ConditionPair, DeviceRequest};
use std::sync::Arc;
use tracing::debug;

use crate::error::DeployResult;
use crate::service::FilterMatcher;

/// Decides whether a device satisfies a [`ConditionPair`].
///
/// The device must match the allow side and must not match the deny side.
/// A side that is absent or lists no filter always passes and is never sent
/// to the matcher.
#[derive(Clone)]
pub struct ConditionEvaluator {
    matcher: Arc<dyn FilterMatcher>,
}

impl ConditionEvaluator {
    pub fn new(matcher: Arc<dyn FilterMatcher>) -> Self {
        Self { matcher }
    }

    /// Evaluates `conditions` for `request`.
    ///
    /// Both configured sides are consulted, allow first.
    pub async fn evaluate(
        &self,
        request: &DeviceRequest,
        conditions: &ConditionPair,
    ) -> DeployResult<bool> {
        let allowed = match conditions.allow_filters() {
            Some(filters) => self.matcher.matches(request, filters).await?,
            None => true,
        };
        let denied = match conditions.deny_filters() {
            Some(filters) => self.matcher.matches(request, filters).await?,
            None => false,
        };

        if !allowed || denied {
            debug!(
                unit = %request.unit_id,
                allowed,
                denied,
                "device rejected by conditions"
            );
        }
        Ok(allowed && !denied)
    }
}
