//! Point-in-time snapshots of control metadata.

use crate::handle::CheckState;
use serde::{Deserialize, Serialize};

/// Fields a caller can request when projecting a control into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlField {
    ControlType,
    ControlClass,
    ControlName,
    ControlRect,
    ControlText,
    ControlTitle,
    Selected,
    Source,
}

impl ControlField {
    /// Every field, in record order. The projection used when a caller
    /// requests no fields in particular.
    pub const ALL: [ControlField; 8] = [
        ControlField::ControlType,
        ControlField::ControlClass,
        ControlField::ControlName,
        ControlField::ControlRect,
        ControlField::ControlText,
        ControlField::ControlTitle,
        ControlField::Selected,
        ControlField::Source,
    ];
}

fn is_empty_string(opt: &Option<String>) -> bool {
    match opt {
        Some(s) => s.is_empty(),
        None => true,
    }
}

/// Flat snapshot of one control, captured at a point in time.
///
/// All values are copied at capture; a record never holds a reference back
/// to the live tree and stays valid after the control vanishes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlInfoRecord {
    /// Caller-facing menu label; positional, reassigned on every
    /// enumeration and never to be cached across calls.
    #[serde(default, skip_serializing_if = "is_empty_string")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "is_empty_string")]
    pub control_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_empty_string")]
    pub control_class: Option<String>,
    #[serde(default, skip_serializing_if = "is_empty_string")]
    pub control_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_rect: Option<(i32, i32, i32, i32)>,
    #[serde(default, skip_serializing_if = "is_empty_string")]
    pub control_text: Option<String>,
    #[serde(default, skip_serializing_if = "is_empty_string")]
    pub control_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<CheckState>,
    #[serde(default, skip_serializing_if = "is_empty_string")]
    pub source: Option<String>,
}

impl ControlInfoRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
