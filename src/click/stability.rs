//! Target-element stability probe used between retry probes.

use crate::geometry::Rect;
use crate::handle::ControlHandle;

/// Remembers where the target element was when retrying started and
/// reports whether it is still exactly there. Any movement, resize, or
/// read failure means the retry grid is probing around a stale position.
pub struct ElementStabilityChecker {
    reference: Option<Rect>,
}

impl ElementStabilityChecker {
    pub fn new(control: &ControlHandle) -> Self {
        Self {
            reference: control.live_rect().ok(),
        }
    }

    /// Exact four-edge comparison against the live rectangle. Approximate
    /// matches do not count: a one-pixel shift still invalidates every
    /// precomputed probe offset.
    pub fn is_element_stable(&self, control: &ControlHandle) -> bool {
        let Some(reference) = self.reference else {
            return false;
        };
        match control.live_rect() {
            Ok(current) => current == reference,
            Err(_) => false,
        }
    }
}
