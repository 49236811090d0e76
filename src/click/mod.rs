//! Grid-based click retry engine.
//!
//! When a click lands on a dead pixel (VDI scaling drift, stale
//! coordinates, decorative padding inside a control), retrying the exact
//! same point is useless. The [`SmartClickController`] probes a ring grid
//! around the intended point instead: three distance tiers, eight compass
//! directions each, judging every probe by whether system focus moved.

mod focus;
mod stability;

pub use focus::{FocusChangeDetector, FocusProbe, FocusSnapshot};
pub use stability::ElementStabilityChecker;

use crate::errors::AutomationError;
use crate::handle::ControlHandle;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

/// Probe directions in clockwise order starting at up. Combined with the
/// distance tiers this yields the 24-point retry grid.
pub const RETRY_DIRECTIONS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Tunables for the retry grid.
#[derive(Debug, Clone)]
pub struct SmartClickConfig {
    /// Upper bound on grid probes, not counting the original click.
    pub max_retries: usize,
    /// Distance tiers in pixels, probed nearest first.
    pub retry_offsets: Vec<i32>,
    pub wait_between_clicks: Duration,
    /// How long the focus oracle polls before calling a probe a miss.
    pub focus_change_timeout: Duration,
    pub focus_poll_interval: Duration,
    /// Run the stability check after this many consecutive misses.
    pub stability_check_every: usize,
}

impl Default for SmartClickConfig {
    fn default() -> Self {
        Self {
            max_retries: 24,
            retry_offsets: vec![5, 10, 15],
            wait_between_clicks: Duration::from_millis(200),
            focus_change_timeout: Duration::from_secs(1),
            focus_poll_interval: Duration::from_millis(50),
            stability_check_every: 3,
        }
    }
}

/// Record of one physical click, kept for post-hoc diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickAttempt {
    pub x: i32,
    pub y: i32,
    pub timestamp: SystemTime,
    pub success: bool,
    pub error_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickStatus {
    Clicked,
    Failed,
}

/// Final verdict of a retry session, with the full attempt log attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartClickOutcome {
    pub status: ClickStatus,
    pub message: String,
    pub attempts: Vec<ClickAttempt>,
}

impl SmartClickOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == ClickStatus::Clicked
    }
}

/// Aggregate view over an attempt log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryStatistics {
    pub total_attempts: usize,
    pub successful_attempts: usize,
    pub failure_rate: f64,
}

/// Drives one click through the original attempt and, on a miss, the
/// surrounding probe grid. One controller serves one click request at a
/// time; a new call resets the attempt log.
pub struct SmartClickController {
    config: SmartClickConfig,
    detector: FocusChangeDetector,
    attempts: Vec<ClickAttempt>,
}

impl SmartClickController {
    pub fn new(probe: Arc<dyn FocusProbe>) -> Self {
        Self::with_config(probe, SmartClickConfig::default())
    }

    pub fn with_config(probe: Arc<dyn FocusProbe>, config: SmartClickConfig) -> Self {
        Self {
            config,
            detector: FocusChangeDetector::new(probe),
            attempts: Vec::new(),
        }
    }

    /// The attempt log of the most recent retry session.
    pub fn attempts(&self) -> &[ClickAttempt] {
        &self.attempts
    }

    pub fn retry_statistics(&self) -> RetryStatistics {
        let total = self.attempts.len();
        let successful = self.attempts.iter().filter(|a| a.success).count();
        RetryStatistics {
            total_attempts: total,
            successful_attempts: successful,
            failure_rate: (total - successful) as f64 / total.max(1) as f64,
        }
    }

    /// Execute `click` once at the intended point and, if focus never
    /// moves, march the probe grid around it until a probe lands, the
    /// target element moves, or the grid is exhausted.
    ///
    /// `click` performs the physical click from window-relative fractional
    /// `x`/`y` values in `params`; each probe rewrites those before
    /// calling it again. `target` is the absolute grid center; when absent
    /// it is recovered from `params` and the window rectangle.
    pub fn smart_click_with_retry<F>(
        &mut self,
        mut click: F,
        params: &Map<String, Value>,
        control: Option<&ControlHandle>,
        window: &ControlHandle,
        target: Option<(i32, i32)>,
    ) -> SmartClickOutcome
    where
        F: FnMut(&Map<String, Value>) -> Result<String, AutomationError>,
    {
        self.attempts.clear();
        let baseline = self.detector.capture(window);
        let checker = control.map(ElementStabilityChecker::new);

        let center = target.or_else(|| extract_coordinates(params, window));
        info!("starting smart click, grid center {center:?}");

        let (x, y) = center.unwrap_or((0, 0));
        if let Some(message) = self.attempt_click(&mut click, params, x, y, &baseline, window) {
            debug!("original click succeeded");
            return self.outcome(ClickStatus::Clicked, message);
        }

        let Some((center_x, center_y)) = center else {
            warn!("cannot determine grid center, giving up after original click");
            let message = self
                .attempts
                .last()
                .map(|a| a.error_message.clone())
                .unwrap_or_default();
            return self.outcome(ClickStatus::Failed, message);
        };

        let mut grid_probes = 0usize;
        let mut consecutive_failures = 0usize;
        let offsets = self.config.retry_offsets.clone();
        for &distance in &offsets {
            debug!("probing at offset distance {distance}px");
            for (dx, dy) in RETRY_DIRECTIONS {
                if grid_probes >= self.config.max_retries {
                    break;
                }
                let probe_x = center_x + dx * distance;
                let probe_y = center_y + dy * distance;
                let probe_params = reproject_coordinates(params, probe_x, probe_y, window);

                grid_probes += 1;
                if let Some(message) =
                    self.attempt_click(&mut click, &probe_params, probe_x, probe_y, &baseline, window)
                {
                    info!("retry succeeded at offset ({}, {})", dx * distance, dy * distance);
                    return self.outcome(ClickStatus::Clicked, message);
                }

                consecutive_failures += 1;
                if consecutive_failures >= self.config.stability_check_every {
                    if let Some(checker) = &checker {
                        if !checker.is_element_stable(control.unwrap_or(window)) {
                            warn!("target element is no longer stable, stopping retry");
                            return self.outcome(
                                ClickStatus::Failed,
                                "Click aborted: target element moved during retry".to_string(),
                            );
                        }
                    }
                    consecutive_failures = 0;
                }

                std::thread::sleep(self.config.wait_between_clicks);
            }
            if grid_probes >= self.config.max_retries {
                break;
            }
        }

        let probes = self.attempts.len().saturating_sub(1);
        warn!("retry grid exhausted after {probes} probes");
        self.outcome(
            ClickStatus::Failed,
            format!("Click failed after {probes} retry attempts"),
        )
    }

    fn outcome(&self, status: ClickStatus, message: String) -> SmartClickOutcome {
        SmartClickOutcome {
            status,
            message,
            attempts: self.attempts.clone(),
        }
    }

    /// One physical click plus its focus verdict. Returns the click
    /// function's message on success, `None` on a miss; either way the
    /// attempt is logged.
    fn attempt_click<F>(
        &mut self,
        click: &mut F,
        params: &Map<String, Value>,
        x: i32,
        y: i32,
        baseline: &FocusSnapshot,
        window: &ControlHandle,
    ) -> Option<String>
    where
        F: FnMut(&Map<String, Value>) -> Result<String, AutomationError>,
    {
        let mut attempt = ClickAttempt {
            x,
            y,
            timestamp: SystemTime::now(),
            success: false,
            error_message: String::new(),
        };

        match click(params) {
            Ok(message) => {
                std::thread::sleep(self.config.wait_between_clicks);
                if self.wait_for_focus_change(baseline, window) {
                    attempt.success = true;
                    attempt.error_message = "Success".to_string();
                    self.attempts.push(attempt);
                    return Some(message);
                }
                attempt.error_message = "No focus change detected".to_string();
            }
            Err(err) => {
                warn!("click attempt at ({x}, {y}) failed: {err}");
                attempt.error_message = err.to_string();
            }
        }

        self.attempts.push(attempt);
        None
    }

    /// Poll the focus oracle until it reports a change or the timeout
    /// lapses. Always checks at least once, so a zero timeout still
    /// observes an already-moved focus.
    fn wait_for_focus_change(&self, baseline: &FocusSnapshot, window: &ControlHandle) -> bool {
        let deadline = Instant::now() + self.config.focus_change_timeout;
        loop {
            if self.detector.has_focus_changed(baseline, window) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(self.config.focus_poll_interval);
        }
    }
}

/// Recover the absolute grid center from fractional window-relative
/// `x`/`y` parameters.
fn extract_coordinates(params: &Map<String, Value>, window: &ControlHandle) -> Option<(i32, i32)> {
    let x = params.get("x")?.as_f64()?;
    let y = params.get("y")?.as_f64()?;
    let rect = window.rect().ok()?;
    let abs_x = rect.left + (x * rect.width() as f64) as i32;
    let abs_y = rect.top + (y * rect.height() as f64) as i32;
    Some((abs_x, abs_y))
}

/// Rewrite the fractional `x`/`y` parameters to aim at an absolute probe
/// point. When the window rectangle cannot be read the parameters are
/// returned unchanged and the probe repeats the previous point.
fn reproject_coordinates(
    params: &Map<String, Value>,
    abs_x: i32,
    abs_y: i32,
    window: &ControlHandle,
) -> Map<String, Value> {
    let mut out = params.clone();
    match window.live_rect() {
        Ok(rect) if rect.width() > 0 && rect.height() > 0 => {
            let rel_x = (abs_x - rect.left) as f64 / rect.width() as f64;
            let rel_y = (abs_y - rect.top) as f64 / rect.height() as f64;
            out.insert("x".to_string(), Value::from(rel_x));
            out.insert("y".to_string(), Value::from(rel_y));
        }
        _ => warn!("window rectangle unavailable, keeping previous coordinates"),
    }
    out
}

/// Whether an error indicates the target element was disabled at click
/// time, by variant or by message text.
pub fn is_element_not_enabled(err: &AutomationError) -> bool {
    if matches!(err, AutomationError::ElementNotEnabled(_)) {
        return true;
    }
    let message = err.to_string().to_lowercase();
    ["elementnotenabled", "element not enabled", "not enabled"]
        .iter()
        .any(|keyword| message.contains(keyword))
}

/// Whether a failed plain click should be escalated to the retry grid:
/// the element reported itself disabled, or plain clicks have already
/// missed three times in a row.
pub fn should_trigger_smart_retry(err: &AutomationError, consecutive_failures: usize) -> bool {
    is_element_not_enabled(err) || consecutive_failures >= 3
}
