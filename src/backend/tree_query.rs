//! Bulk-query discovery backend with transient-failure recovery.

use super::{
    top_level_windows, AccessibilityProvider, BackendKind, BackendStrategy, DescendantFilter,
    QueryCondition, RetryPolicy, MAX_QUERY_RESULTS,
};
use crate::errors::AutomationError;
use crate::handle::{ControlHandle, LatencyGauge};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Discovery via a single provider-side "find all descendants matching
/// condition" call per request, with properties cached in bulk.
///
/// Class-name filters are not expressible in this backend's condition
/// grammar; supplying one is a caller programming error, not a runtime
/// condition, and fails fast.
pub struct TreeQueryBackend {
    provider: Arc<dyn AccessibilityProvider>,
    retry: RetryPolicy,
}

impl TreeQueryBackend {
    pub fn new(provider: Arc<dyn AccessibilityProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(provider: Arc<dyn AccessibilityProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Issue the bulk query once and shape its result: cap the array, drop
    /// never-rendered nodes, and prime each handle so rectangle and name
    /// need no further round-trip.
    fn query_once(
        &self,
        root: &ControlHandle,
        condition: &QueryCondition,
    ) -> Result<Vec<ControlHandle>, AutomationError> {
        let nodes = self.provider.query_descendants(root.node(), condition)?;

        let gauge = LatencyGauge::new();
        let mut handles = Vec::new();
        for node in nodes.into_iter().take(MAX_QUERY_RESULTS) {
            // Cached reads; failures on individual nodes are skipped, the
            // rest of the batch is still useful.
            let (name, control_type, rect) =
                match (node.name(), node.control_type(), node.bounding_rect()) {
                    (Ok(n), Ok(t), Ok(r)) => (n, t, r),
                    _ => continue,
                };
            if rect.is_degenerate() {
                continue;
            }
            let handle = ControlHandle::new(node, BackendKind::TreeQuery, gauge.clone());
            handle.prime(name, control_type, rect);
            handles.push(handle);
        }
        Ok(handles)
    }
}

impl BackendStrategy for TreeQueryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::TreeQuery
    }

    fn enumerate_top_level_windows(
        &self,
        remove_empty: bool,
    ) -> Result<Vec<ControlHandle>, AutomationError> {
        top_level_windows(self.provider.as_ref(), BackendKind::TreeQuery, remove_empty)
    }

    fn find_descendants(
        &self,
        root: &ControlHandle,
        filter: &DescendantFilter,
    ) -> Result<Vec<ControlHandle>, AutomationError> {
        if !filter.class_names.is_empty() {
            return Err(AutomationError::InvalidArgument(
                "class-name filters are not supported by the tree-query backend".to_string(),
            ));
        }

        if !root.is_alive() {
            warn!("root window is no longer valid, skipping control search");
            return Ok(Vec::new());
        }

        let condition = QueryCondition {
            control_types: filter.control_types.clone(),
            is_visible: filter.is_visible,
            is_enabled: filter.is_enabled,
        };

        for attempt in 0..self.retry.max_attempts {
            match self.query_once(root, &condition) {
                Ok(handles) => {
                    debug!(
                        "bulk query returned {} controls on attempt {}",
                        handles.len(),
                        attempt + 1
                    );
                    return Ok(handles);
                }
                Err(err) if err.is_retryable() => {
                    if attempt + 1 >= self.retry.max_attempts {
                        error!(
                            "provider error after {} retries: {err}",
                            self.retry.max_attempts
                        );
                        return Ok(Vec::new());
                    }
                    warn!("provider error on attempt {}: {err}, retrying", attempt + 1);
                    std::thread::sleep(self.retry.backoff(attempt));
                    // The window may have died while we were backing off;
                    // probing a dead root cannot succeed.
                    if !root.is_alive() {
                        warn!("root window became invalid during retry, aborting");
                        return Ok(Vec::new());
                    }
                }
                Err(err) => {
                    if attempt + 1 >= self.retry.max_attempts {
                        error!("discovery failed after retries: {err}");
                        return Ok(Vec::new());
                    }
                    warn!("discovery error on attempt {}: {err}", attempt + 1);
                    std::thread::sleep(self.retry.other_error_delay);
                }
            }
        }

        Ok(Vec::new())
    }
}
