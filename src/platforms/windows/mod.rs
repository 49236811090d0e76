//! Windows UI Automation provider.
//!
//! Everything here talks COM; the automation and element wrappers exist
//! because the raw COM pointers are not `Send`/`Sync` but are safe to use
//! across threads once COM is initialized multithreaded.

mod focus;
mod input;
mod node;
mod provider;

pub use focus::UiaFocusProbe;
pub use input::click_at_fraction;
pub use node::WindowsControlNode;
pub use provider::UiaProvider;

use crate::errors::{is_known_com_error, AutomationError};
use std::sync::Arc;
use uiautomation::controls::ControlType;
use uiautomation::UIAutomation;
use windows::core::HRESULT;
use windows::Win32::System::Com::{CoInitializeEx, COINIT_MULTITHREADED};

#[derive(Clone)]
pub struct ThreadSafeWinUIAutomation(pub Arc<UIAutomation>);

unsafe impl Send for ThreadSafeWinUIAutomation {}
unsafe impl Sync for ThreadSafeWinUIAutomation {}

#[derive(Clone)]
pub struct ThreadSafeWinUIElement(pub Arc<uiautomation::UIElement>);

unsafe impl Send for ThreadSafeWinUIElement {}
unsafe impl Sync for ThreadSafeWinUIElement {}

/// Create a UIAutomation instance with COM initialized multithreaded.
/// HRESULT 0x80010106 means the thread already initialized COM and is
/// not a failure.
pub(crate) fn create_ui_automation_with_com_init() -> Result<UIAutomation, AutomationError> {
    unsafe {
        let hr = CoInitializeEx(None, COINIT_MULTITHREADED);
        if hr.is_err() && hr != HRESULT(0x80010106u32 as i32) {
            return Err(AutomationError::PlatformError(format!(
                "Failed to initialize COM: {hr}"
            )));
        }
    }

    UIAutomation::new_direct().map_err(|e| AutomationError::PlatformError(e.to_string()))
}

/// Wrap a provider failure, tagging it with the COM code and whether the
/// discovery retry loop should bother trying again.
pub(crate) fn api_error(operation: &str, err: uiautomation::Error) -> AutomationError {
    let code = err.code();
    AutomationError::UIAutomationAPIError {
        message: err.to_string(),
        com_error: Some(code),
        operation: operation.to_string(),
        is_retryable: is_known_com_error(code),
    }
}

/// Maps control-type name strings to Windows ControlType values.
pub(crate) fn map_control_type_name(name: &str) -> ControlType {
    match name.to_lowercase().as_str() {
        "pane" | "app" | "application" => ControlType::Pane,
        "window" | "dialog" => ControlType::Window,
        "button" => ControlType::Button,
        "checkbox" => ControlType::CheckBox,
        "radiobutton" => ControlType::RadioButton,
        "menu" => ControlType::Menu,
        "menubar" => ControlType::MenuBar,
        "menuitem" => ControlType::MenuItem,
        "text" => ControlType::Text,
        "edit" | "textbox" => ControlType::Edit,
        "combobox" => ControlType::ComboBox,
        "list" => ControlType::List,
        "listitem" => ControlType::ListItem,
        "tree" => ControlType::Tree,
        "treeitem" => ControlType::TreeItem,
        "tab" => ControlType::Tab,
        "tabitem" => ControlType::TabItem,
        "hyperlink" | "link" => ControlType::Hyperlink,
        "image" => ControlType::Image,
        "slider" => ControlType::Slider,
        "spinner" => ControlType::Spinner,
        "progressbar" => ControlType::ProgressBar,
        "scrollbar" => ControlType::ScrollBar,
        "toolbar" => ControlType::ToolBar,
        "statusbar" => ControlType::StatusBar,
        "document" => ControlType::Document,
        "group" => ControlType::Group,
        "datagrid" => ControlType::DataGrid,
        "table" => ControlType::Table,
        "dataitem" => ControlType::DataItem,
        "header" => ControlType::Header,
        "headeritem" => ControlType::HeaderItem,
        "splitbutton" => ControlType::SplitButton,
        "titlebar" => ControlType::TitleBar,
        "separator" => ControlType::Separator,
        _ => ControlType::Custom,
    }
}
