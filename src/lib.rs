//! Desktop accessibility-tree inspection and resilient click delivery
//! for Windows UI automation.
//!
//! Discovery runs through one of two interchangeable backends behind the
//! [`Inspector`] facade: a bulk tree query with provider-side property
//! caching, or a direct enumeration walk. Both survive a live, externally
//! mutating tree by retrying transient provider failures and degrading to
//! empty results rather than erroring out.
//!
//! Click delivery is handled by the [`SmartClickController`], which
//! judges each click by focus movement and, on a miss, probes a 24-point
//! grid around the intended coordinates.
//!
//! The platform seams ([`ControlNode`], [`AccessibilityProvider`],
//! [`FocusProbe`]) keep the discovery and retry logic host-neutral; the
//! Windows implementations live under [`platforms::windows`].

pub mod backend;
pub mod click;
pub mod errors;
pub mod geometry;
pub mod handle;
pub mod inspector;
pub mod platforms;
pub mod process;
pub mod records;

pub use backend::{
    AccessibilityProvider, BackendKind, BackendStrategy, DescendantFilter, EnumerationBackend,
    QueryCondition, RetryPolicy, TreeQueryBackend, IME_CLASS_NAMES, MAX_FALLBACK_RESULTS,
    MAX_QUERY_RESULTS,
};
pub use click::{
    is_element_not_enabled, should_trigger_smart_retry, ClickAttempt, ClickStatus,
    ElementStabilityChecker, FocusChangeDetector, FocusProbe, FocusSnapshot, RetryStatistics,
    SmartClickConfig, SmartClickController, SmartClickOutcome, RETRY_DIRECTIONS,
};
pub use errors::AutomationError;
pub use geometry::Rect;
pub use handle::{CheckState, ControlHandle, ControlNode, LatencyGauge};
pub use inspector::{BackendRegistry, Inspector, WindowSet};
pub use records::{ControlField, ControlInfoRecord};
