//! Focus-change detection, the success oracle for click delivery.

use crate::handle::ControlHandle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// What the system reported focus to be at one instant. Either half can
/// be absent when the corresponding probe failed; absence is a value and
/// participates in comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSnapshot {
    /// Native handle of the foreground application window.
    pub window: Option<isize>,
    /// Runtime identity of the focused element.
    pub element: Option<Vec<i32>>,
}

/// Source of the currently focused element's identity.
pub trait FocusProbe: Send + Sync {
    fn focused_element(&self) -> Option<Vec<i32>>;
}

/// Compares focus snapshots around a click to decide whether the click
/// had any effect. Focus movement is a proxy, not proof: focus-neutral
/// clicks read as failures and background focus churn reads as success.
pub struct FocusChangeDetector {
    probe: Arc<dyn FocusProbe>,
}

impl FocusChangeDetector {
    pub fn new(probe: Arc<dyn FocusProbe>) -> Self {
        Self { probe }
    }

    /// Capture the current focus state relative to `window`.
    pub fn capture(&self, window: &ControlHandle) -> FocusSnapshot {
        FocusSnapshot {
            window: window.window_handle().ok(),
            element: self.probe.focused_element(),
        }
    }

    /// Whether focus has moved since `baseline` was captured: the window
    /// handle differs, the focused element appeared or disappeared, or
    /// both reads resolved to different elements.
    pub fn has_focus_changed(&self, baseline: &FocusSnapshot, window: &ControlHandle) -> bool {
        let current = self.capture(window);
        if current.window != baseline.window {
            debug!("foreground window changed: {:?} -> {:?}", baseline.window, current.window);
            return true;
        }
        match (&baseline.element, &current.element) {
            (None, Some(_)) | (Some(_), None) => true,
            (Some(before), Some(after)) => before != after,
            (None, None) => false,
        }
    }
}
