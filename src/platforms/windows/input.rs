//! Physical pointer input.

use super::api_error;
use crate::errors::AutomationError;
use crate::handle::ControlHandle;
use serde_json::{Map, Value};
use tracing::debug;
use uiautomation::inputs::Mouse;
use uiautomation::types::Point;

/// Click at window-relative fractional coordinates.
///
/// `params` carries `x` and `y` in `[0, 1]` relative to the window
/// rectangle, the shape the retry controller rewrites between probes.
pub fn click_at_fraction(
    window: &ControlHandle,
    params: &Map<String, Value>,
) -> Result<String, AutomationError> {
    let x = params
        .get("x")
        .and_then(Value::as_f64)
        .ok_or_else(|| AutomationError::InvalidArgument("missing fractional x".to_string()))?;
    let y = params
        .get("y")
        .and_then(Value::as_f64)
        .ok_or_else(|| AutomationError::InvalidArgument("missing fractional y".to_string()))?;

    let rect = window.live_rect()?;
    let abs_x = rect.left + (x * rect.width() as f64) as i32;
    let abs_y = rect.top + (y * rect.height() as f64) as i32;

    debug!("clicking at ({abs_x}, {abs_y})");
    let mouse = Mouse::default();
    mouse
        .click(Point::new(abs_x, abs_y))
        .map_err(|e| api_error("Mouse.Click", e))?;
    Ok(format!("Clicked at ({abs_x}, {abs_y})"))
}
