//! ControlNode implementation over a live UIA element.

use super::{api_error, create_ui_automation_with_com_init, ThreadSafeWinUIElement};
use crate::errors::AutomationError;
use crate::geometry::Rect;
use crate::handle::{CheckState, ControlNode};
use std::sync::Arc;
use uiautomation::controls::ControlType;
use uiautomation::patterns;
use uiautomation::types::ToggleState;

pub struct WindowsControlNode {
    pub(crate) element: ThreadSafeWinUIElement,
}

impl WindowsControlNode {
    pub fn new(element: uiautomation::UIElement) -> Self {
        Self {
            element: ThreadSafeWinUIElement(Arc::new(element)),
        }
    }
}

impl ControlNode for WindowsControlNode {
    fn name(&self) -> Result<String, AutomationError> {
        self.element.0.get_name().map_err(|e| api_error("GetName", e))
    }

    // UIA exposes no separate rich-text property; the accessible name is
    // the display text.
    fn rich_text(&self) -> Result<String, AutomationError> {
        self.name()
    }

    fn class_name(&self) -> Result<String, AutomationError> {
        self.element
            .0
            .get_classname()
            .map_err(|e| api_error("GetClassName", e))
    }

    fn control_type(&self) -> Result<String, AutomationError> {
        self.element
            .0
            .get_control_type()
            .map(|ct| ct.to_string())
            .map_err(|e| api_error("GetControlType", e))
    }

    fn bounding_rect(&self) -> Result<Rect, AutomationError> {
        let rect = self
            .element
            .0
            .get_bounding_rectangle()
            .map_err(|e| api_error("GetBoundingRectangle", e))?;
        Ok(Rect::new(
            rect.get_left(),
            rect.get_top(),
            rect.get_left() + rect.get_width(),
            rect.get_top() + rect.get_height(),
        ))
    }

    fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.element
            .0
            .is_enabled()
            .map_err(|e| api_error("IsEnabled", e))
    }

    fn is_visible(&self) -> Result<bool, AutomationError> {
        self.element
            .0
            .is_offscreen()
            .map(|is_offscreen| !is_offscreen)
            .map_err(|e| api_error("IsOffscreen", e))
    }

    fn is_normal_window(&self) -> Result<bool, AutomationError> {
        if self
            .element
            .0
            .get_pattern::<patterns::UIWindowPattern>()
            .is_ok()
        {
            return Ok(true);
        }
        let control_type = self
            .element
            .0
            .get_control_type()
            .map_err(|e| api_error("GetControlType", e))?;
        Ok(control_type == ControlType::Window)
    }

    fn check_state(&self) -> Result<CheckState, AutomationError> {
        let mut togglable = false;
        if let Ok(toggle) = self.element.0.get_pattern::<patterns::UITogglePattern>() {
            if let Ok(state) = toggle.get_toggle_state() {
                if state == ToggleState::On {
                    return Ok(CheckState::Checked);
                }
                togglable = true;
            }
        }
        if let Ok(selection) = self
            .element
            .0
            .get_pattern::<patterns::UISelectionItemPattern>()
        {
            if let Ok(selected) = selection.is_selected() {
                return Ok(if selected {
                    CheckState::Selected
                } else {
                    CheckState::Unchecked
                });
            }
        }
        if togglable {
            return Ok(CheckState::Unchecked);
        }
        Ok(CheckState::Unknown)
    }

    fn process_id(&self) -> Result<u32, AutomationError> {
        self.element
            .0
            .get_process_id()
            .map_err(|e| api_error("GetProcessId", e))
    }

    fn window_handle(&self) -> Result<isize, AutomationError> {
        let handle = self
            .element
            .0
            .get_native_window_handle()
            .map_err(|e| api_error("GetNativeWindowHandle", e))?;
        let hwnd: windows::Win32::Foundation::HWND = handle.into();
        Ok(hwnd.0 as isize)
    }

    fn runtime_id(&self) -> Result<Vec<i32>, AutomationError> {
        self.element
            .0
            .get_runtime_id()
            .map_err(|e| api_error("GetRuntimeId", e))
    }

    fn children(&self) -> Result<Vec<Arc<dyn ControlNode>>, AutomationError> {
        let automation = create_ui_automation_with_com_init()?;
        let true_condition = automation
            .create_true_condition()
            .map_err(|e| api_error("CreateTrueCondition", e))?;
        let children = self
            .element
            .0
            .find_all(uiautomation::types::TreeScope::Children, &true_condition)
            .map_err(|e| api_error("FindAll", e))?;
        Ok(children
            .into_iter()
            .map(|ele| Arc::new(WindowsControlNode::new(ele)) as Arc<dyn ControlNode>)
            .collect())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
