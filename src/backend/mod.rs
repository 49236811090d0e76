//! Backend strategies for control discovery.
//!
//! Two interchangeable implementations share one capability contract: the
//! [`TreeQueryBackend`] issues a single bulk descendant query against the
//! provider, while the [`EnumerationBackend`] walks the tree directly and
//! filters post-hoc. Discovery is best-effort against a live, externally
//! mutating tree: transient provider failures are retried with backoff and
//! then degrade to an empty result instead of propagating.

mod enumeration;
mod tree_query;

pub use enumeration::EnumerationBackend;
pub use tree_query::TreeQueryBackend;

use crate::errors::AutomationError;
use crate::handle::{ControlHandle, ControlNode, LatencyGauge};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Hard cap on a single bulk query result. Pathological trees (virtualized
/// lists, editors with one node per glyph) can return tens of thousands of
/// descendants; nothing downstream consumes more than this.
pub const MAX_QUERY_RESULTS: usize = 500;

/// Cap applied to the facade's uncached fallback walk.
pub const MAX_FALLBACK_RESULTS: usize = 100;

/// Window class names that are input-method chrome, not applications.
pub const IME_CLASS_NAMES: &[&str] = &["IME", "MSCTFIME UI"];

/// Identifies which discovery strategy produced a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    TreeQuery,
    Enumeration,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::TreeQuery => write!(f, "tree-query"),
            BackendKind::Enumeration => write!(f, "enumeration"),
        }
    }
}

/// Filter predicates for descendant discovery.
///
/// Each backend understands only part of this vocabulary: the tree-query
/// backend rejects class-name filters as a precondition failure, and the
/// enumeration backend is the only one that honors titles and depth.
#[derive(Debug, Clone)]
pub struct DescendantFilter {
    pub control_types: Vec<String>,
    pub class_names: Vec<String>,
    pub titles: Vec<String>,
    pub is_visible: bool,
    pub is_enabled: bool,
    /// Recursion bound for the enumeration walk; 0 means unbounded.
    pub depth: usize,
}

impl Default for DescendantFilter {
    fn default() -> Self {
        Self {
            control_types: Vec::new(),
            class_names: Vec::new(),
            titles: Vec::new(),
            is_visible: true,
            is_enabled: true,
            depth: 0,
        }
    }
}

impl DescendantFilter {
    pub fn with_control_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.control_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_class_names<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_names = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.titles = titles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

/// The condition a provider bulk query evaluates server-side: the
/// conjunction of enabled state, visibility (negated off-screen flag),
/// is-a-control, and a disjunction over control types.
#[derive(Debug, Clone)]
pub struct QueryCondition {
    pub control_types: Vec<String>,
    pub is_visible: bool,
    pub is_enabled: bool,
}

/// The seam to the OS accessibility provider.
///
/// Every call is a blocking foreign call that may stall or fail at any
/// time; there is no cancellation once a call is issued.
pub trait AccessibilityProvider: Send + Sync {
    /// Top-level desktop windows in z-order, unfiltered.
    fn desktop_windows(&self) -> Result<Vec<Arc<dyn ControlNode>>, AutomationError>;

    /// Bulk "find all descendants matching condition" with provider-side
    /// property caching, so name/type/rectangle reads on the returned
    /// nodes cost no further round-trips.
    fn query_descendants(
        &self,
        root: &Arc<dyn ControlNode>,
        condition: &QueryCondition,
    ) -> Result<Vec<Arc<dyn ControlNode>>, AutomationError>;
}

/// Retry schedule for transient provider failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    /// Backoff unit; attempt `n` waits `base_delay * (n + 1)`.
    pub base_delay: Duration,
    /// Fixed delay before retrying a non-provider failure.
    pub other_error_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            other_error_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: usize) -> Duration {
        self.base_delay * (attempt as u32 + 1)
    }
}

/// Capability contract shared by both discovery backends.
pub trait BackendStrategy: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// The ordered set of visible top-level windows. With `remove_empty`,
    /// windows with empty titles and IME chrome are dropped.
    fn enumerate_top_level_windows(
        &self,
        remove_empty: bool,
    ) -> Result<Vec<ControlHandle>, AutomationError>;

    /// Descendants of `root` matching `filter`, with rectangle and name
    /// populated eagerly on every returned handle.
    fn find_descendants(
        &self,
        root: &ControlHandle,
        filter: &DescendantFilter,
    ) -> Result<Vec<ControlHandle>, AutomationError>;
}

/// Shared top-level window enumeration: visible windows only, then the
/// empty-title and IME-class cut. Both backends produce identical window
/// sets; only descendant discovery differs.
pub(crate) fn top_level_windows(
    provider: &dyn AccessibilityProvider,
    kind: BackendKind,
    remove_empty: bool,
) -> Result<Vec<ControlHandle>, AutomationError> {
    let gauge = LatencyGauge::new();
    let mut windows = Vec::new();
    for node in provider.desktop_windows()? {
        if !node.is_visible().unwrap_or(false) {
            continue;
        }
        if remove_empty {
            let title = node.name().unwrap_or_default();
            if title.is_empty() {
                continue;
            }
            let class = node.class_name().unwrap_or_default();
            if IME_CLASS_NAMES.contains(&class.as_str()) {
                continue;
            }
        }
        windows.push(ControlHandle::new(node, kind, gauge.clone()));
    }
    debug!("found {} top-level windows", windows.len());
    Ok(windows)
}
