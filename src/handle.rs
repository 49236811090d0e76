//! The control-handle adapter over a live accessibility-tree node.
//!
//! A [`ControlHandle`] wraps one provider node and caches the expensive
//! property reads (name, rich text, class, control type, rectangle) after
//! the first lookup. Within one discovery pass the cached rectangle is
//! never recomputed, trading positional staleness for query speed.

use crate::backend::BackendKind;
use crate::errors::AutomationError;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tri-state check/selection status of a control.
///
/// `Unknown` is a value, not an error: many controls simply do not expose
/// a toggle or selection pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Checked,
    Selected,
    Unchecked,
    Unknown,
}

/// One live node of the accessibility tree, as the platform provider sees it.
///
/// The OS owns the underlying object; implementations hold a borrowed
/// reference that is only valid until the next tree mutation, so every
/// accessor can fail at any time.
pub trait ControlNode: Send + Sync {
    fn name(&self) -> Result<String, AutomationError>;
    fn rich_text(&self) -> Result<String, AutomationError>;
    fn class_name(&self) -> Result<String, AutomationError>;
    fn control_type(&self) -> Result<String, AutomationError>;
    fn bounding_rect(&self) -> Result<Rect, AutomationError>;
    fn is_enabled(&self) -> Result<bool, AutomationError>;
    /// Visibility derived from the provider's off-screen flag.
    fn is_visible(&self) -> Result<bool, AutomationError>;
    /// Whether this is a normal top-level application window.
    fn is_normal_window(&self) -> Result<bool, AutomationError>;
    fn check_state(&self) -> Result<CheckState, AutomationError>;
    fn process_id(&self) -> Result<u32, AutomationError>;
    /// Native window handle, for focus-baseline comparison.
    fn window_handle(&self) -> Result<isize, AutomationError>;
    /// Provider runtime identity, for focused-element comparison.
    fn runtime_id(&self) -> Result<Vec<i32>, AutomationError>;
    fn children(&self) -> Result<Vec<Arc<dyn ControlNode>>, AutomationError>;
    fn as_any(&self) -> &dyn std::any::Any;
}

const SLOW_CALL: Duration = Duration::from_millis(20);
const SUSPECT_CALL: Duration = Duration::from_millis(5);

/// Latency tracker for provider property reads.
///
/// UIA calls occasionally stall for tens of milliseconds, typically right
/// after a new process starts. The gauge remembers whether the most recent
/// read was slow so that the next voluntary pause can be stretched to let
/// the provider settle. One gauge is created per query pass and shared by
/// the handles that pass produced; there is no process-wide flag.
#[derive(Debug, Default)]
pub struct LatencyGauge {
    slow: AtomicBool,
}

impl LatencyGauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Classify one property read and update the slow marker.
    pub fn record(&self, what: &str, elapsed: Duration) {
        if elapsed > SLOW_CALL {
            warn!("{what} lookup took {:.2}ms", elapsed.as_secs_f64() * 1000.0);
            self.slow.store(true, Ordering::Relaxed);
        } else if elapsed > SUSPECT_CALL {
            debug!("{what} lookup took {:.2}ms", elapsed.as_secs_f64() * 1000.0);
            self.slow.store(true, Ordering::Relaxed);
        } else {
            self.slow.store(false, Ordering::Relaxed);
        }
    }

    pub fn is_slow(&self) -> bool {
        self.slow.load(Ordering::Relaxed)
    }

    /// Sleep for at least `ms` milliseconds, stretched to 20ms when the
    /// previous read was slow. Clears the marker.
    pub fn settle(&self, ms: u64) {
        let ms = if self.slow.swap(false, Ordering::Relaxed) {
            ms.max(20)
        } else {
            ms.max(1)
        };
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Borrowed reference to an accessibility-tree node plus its cached
/// properties and a provenance tag naming the backend that produced it.
#[derive(Clone)]
pub struct ControlHandle {
    node: Arc<dyn ControlNode>,
    source: BackendKind,
    gauge: Arc<LatencyGauge>,
    name: OnceLock<String>,
    rich_text: OnceLock<String>,
    class_name: OnceLock<String>,
    control_type: OnceLock<String>,
    rect: OnceLock<Rect>,
}

impl ControlHandle {
    pub fn new(node: Arc<dyn ControlNode>, source: BackendKind, gauge: Arc<LatencyGauge>) -> Self {
        Self {
            node,
            source,
            gauge,
            name: OnceLock::new(),
            rich_text: OnceLock::new(),
            class_name: OnceLock::new(),
            control_type: OnceLock::new(),
            rect: OnceLock::new(),
        }
    }

    pub fn node(&self) -> &Arc<dyn ControlNode> {
        &self.node
    }

    pub fn source(&self) -> BackendKind {
        self.source
    }

    pub fn gauge(&self) -> &Arc<LatencyGauge> {
        &self.gauge
    }

    /// Pre-populate the property cache from values the provider already
    /// delivered in bulk, so reading them later costs no extra round-trip.
    pub fn prime(&self, name: String, control_type: String, rect: Rect) {
        let _ = self.rich_text.set(name.clone());
        let _ = self.name.set(name);
        let _ = self.control_type.set(control_type);
        let _ = self.rect.set(rect);
    }

    fn timed<T>(
        &self,
        what: &str,
        read: impl FnOnce() -> Result<T, AutomationError>,
    ) -> Result<T, AutomationError> {
        let start = Instant::now();
        let out = read();
        self.gauge.record(what, start.elapsed());
        out
    }

    fn cached(
        &self,
        slot: &OnceLock<String>,
        what: &str,
        read: impl FnOnce() -> Result<String, AutomationError>,
    ) -> Result<String, AutomationError> {
        if let Some(v) = slot.get() {
            return Ok(v.clone());
        }
        let v = self.timed(what, read)?;
        let _ = slot.set(v.clone());
        Ok(v)
    }

    pub fn name(&self) -> Result<String, AutomationError> {
        self.cached(&self.name, "name", || self.node.name())
    }

    pub fn rich_text(&self) -> Result<String, AutomationError> {
        self.cached(&self.rich_text, "rich_text", || self.node.rich_text())
    }

    pub fn class_name(&self) -> Result<String, AutomationError> {
        self.cached(&self.class_name, "class_name", || self.node.class_name())
    }

    pub fn control_type(&self) -> Result<String, AutomationError> {
        self.cached(&self.control_type, "control_type", || {
            self.node.control_type()
        })
    }

    /// First-read-wins rectangle. Once computed it is never refreshed for
    /// the lifetime of this handle; use [`ControlHandle::live_rect`] when
    /// staleness matters.
    pub fn rect(&self) -> Result<Rect, AutomationError> {
        if let Some(r) = self.rect.get() {
            return Ok(*r);
        }
        let r = self.timed("rect", || self.node.bounding_rect())?;
        let _ = self.rect.set(r);
        Ok(r)
    }

    /// Re-read the rectangle from the live tree, bypassing the cache.
    pub fn live_rect(&self) -> Result<Rect, AutomationError> {
        self.timed("rect", || self.node.bounding_rect())
    }

    pub fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.node.is_enabled()
    }

    pub fn is_visible(&self) -> Result<bool, AutomationError> {
        self.node.is_visible()
    }

    pub fn is_normal_window(&self) -> Result<bool, AutomationError> {
        self.node.is_normal_window()
    }

    pub fn check_state(&self) -> Result<CheckState, AutomationError> {
        self.node.check_state()
    }

    pub fn process_id(&self) -> Result<u32, AutomationError> {
        self.node.process_id()
    }

    pub fn window_handle(&self) -> Result<isize, AutomationError> {
        self.node.window_handle()
    }

    /// Whether the underlying window is still alive enough to query: both
    /// the enabled flag and the rectangle must still resolve.
    pub fn is_alive(&self) -> bool {
        self.node.is_enabled().is_ok() && self.node.bounding_rect().is_ok()
    }
}

impl fmt::Debug for ControlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlHandle")
            .field("source", &self.source)
            .field("name", &self.name.get())
            .field("control_type", &self.control_type.get())
            .field("rect", &self.rect.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_settle_clears_marker() {
        let gauge = LatencyGauge::new();
        gauge.record("name", Duration::from_millis(25));
        assert!(gauge.is_slow());
        gauge.settle(1);
        assert!(!gauge.is_slow());
    }

    #[test]
    fn gauge_fast_call_resets_marker() {
        let gauge = LatencyGauge::new();
        gauge.record("name", Duration::from_millis(10));
        assert!(gauge.is_slow());
        gauge.record("name", Duration::from_millis(1));
        assert!(!gauge.is_slow());
    }
}
