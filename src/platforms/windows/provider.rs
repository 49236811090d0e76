//! AccessibilityProvider over the UIA desktop root.

use super::{
    api_error, create_ui_automation_with_com_init, map_control_type_name, ThreadSafeWinUIAutomation,
    WindowsControlNode,
};
use crate::backend::{AccessibilityProvider, QueryCondition};
use crate::errors::AutomationError;
use crate::handle::ControlNode;
use std::sync::Arc;
use uiautomation::controls::ControlType;
use uiautomation::types::{TreeScope, UIProperty};
use uiautomation::variants::Variant;

pub struct UiaProvider {
    automation: ThreadSafeWinUIAutomation,
}

impl UiaProvider {
    pub fn new() -> Result<Self, AutomationError> {
        let automation = create_ui_automation_with_com_init()?;
        Ok(Self {
            automation: ThreadSafeWinUIAutomation(Arc::new(automation)),
        })
    }
}

impl AccessibilityProvider for UiaProvider {
    fn desktop_windows(&self) -> Result<Vec<Arc<dyn ControlNode>>, AutomationError> {
        let automation = &self.automation.0;
        let root = automation
            .get_root_element()
            .map_err(|e| api_error("GetRootElement", e))?;

        // Top-level applications surface as Window or Pane children of
        // the desktop root.
        let condition_win = automation
            .create_property_condition(
                UIProperty::ControlType,
                Variant::from(ControlType::Window as i32),
                None,
            )
            .map_err(|e| api_error("CreatePropertyCondition", e))?;
        let condition_pane = automation
            .create_property_condition(
                UIProperty::ControlType,
                Variant::from(ControlType::Pane as i32),
                None,
            )
            .map_err(|e| api_error("CreatePropertyCondition", e))?;
        let condition = automation
            .create_or_condition(condition_win, condition_pane)
            .map_err(|e| api_error("CreateOrCondition", e))?;

        let elements = root
            .find_all(TreeScope::Children, &condition)
            .map_err(|e| api_error("FindAll", e))?;

        Ok(elements
            .into_iter()
            .map(|ele| Arc::new(WindowsControlNode::new(ele)) as Arc<dyn ControlNode>)
            .collect())
    }

    fn query_descendants(
        &self,
        root: &Arc<dyn ControlNode>,
        condition: &QueryCondition,
    ) -> Result<Vec<Arc<dyn ControlNode>>, AutomationError> {
        let node = root
            .as_any()
            .downcast_ref::<WindowsControlNode>()
            .ok_or_else(|| {
                AutomationError::Internal("query root is not a UIA element".to_string())
            })?;

        let automation = &self.automation.0;
        let property = |prop: UIProperty, value: Variant| {
            automation
                .create_property_condition(prop, value, None)
                .map_err(|e| api_error("CreatePropertyCondition", e))
        };

        // Equality clauses, not opt-in filters: is_enabled == false
        // selects disabled elements, and visibility is the negated
        // off-screen flag.
        let mut combined = property(UIProperty::IsControlElement, Variant::from(true))?;
        let clause = property(UIProperty::IsEnabled, Variant::from(condition.is_enabled))?;
        combined = automation
            .create_and_condition(combined, clause)
            .map_err(|e| api_error("CreateAndCondition", e))?;
        let clause = property(UIProperty::IsOffscreen, Variant::from(!condition.is_visible))?;
        combined = automation
            .create_and_condition(combined, clause)
            .map_err(|e| api_error("CreateAndCondition", e))?;

        if let Some((first, rest)) = condition.control_types.split_first() {
            let mut type_clause = property(
                UIProperty::ControlType,
                Variant::from(map_control_type_name(first) as i32),
            )?;
            for name in rest {
                let clause = property(
                    UIProperty::ControlType,
                    Variant::from(map_control_type_name(name) as i32),
                )?;
                type_clause = automation
                    .create_or_condition(type_clause, clause)
                    .map_err(|e| api_error("CreateOrCondition", e))?;
            }
            combined = automation
                .create_and_condition(combined, type_clause)
                .map_err(|e| api_error("CreateAndCondition", e))?;
        }

        let elements = node
            .element
            .0
            .find_all(TreeScope::Descendants, &combined)
            .map_err(|e| api_error("FindAll", e))?;

        Ok(elements
            .into_iter()
            .map(|ele| Arc::new(WindowsControlNode::new(ele)) as Arc<dyn ControlNode>)
            .collect())
    }
}
