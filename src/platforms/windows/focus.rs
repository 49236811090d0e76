//! Focus probe backed by the UIA focused-element query.

use super::{create_ui_automation_with_com_init, ThreadSafeWinUIAutomation};
use crate::click::FocusProbe;
use crate::errors::AutomationError;
use std::sync::Arc;
use tracing::debug;

pub struct UiaFocusProbe {
    automation: ThreadSafeWinUIAutomation,
}

impl UiaFocusProbe {
    pub fn new() -> Result<Self, AutomationError> {
        let automation = create_ui_automation_with_com_init()?;
        Ok(Self {
            automation: ThreadSafeWinUIAutomation(Arc::new(automation)),
        })
    }
}

impl FocusProbe for UiaFocusProbe {
    fn focused_element(&self) -> Option<Vec<i32>> {
        match self.automation.0.get_focused_element() {
            Ok(element) => element.get_runtime_id().ok(),
            Err(err) => {
                debug!("focused element query failed: {err}");
                None
            }
        }
    }
}
