//! Shared in-memory fakes for exercising discovery and click retry
//! without a live accessibility tree.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use winspect::{
    AccessibilityProvider, AutomationError, BackendKind, CheckState, ControlHandle, ControlNode,
    FocusProbe, LatencyGauge, QueryCondition, Rect,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Scriptable accessibility-tree node. All state is mutable behind
/// locks so tests can change the tree mid-operation.
pub struct FakeNode {
    pub name: Mutex<String>,
    pub class_name: Mutex<String>,
    pub control_type: Mutex<String>,
    pub rect: Mutex<Rect>,
    pub enabled: AtomicBool,
    pub visible: AtomicBool,
    pub normal_window: AtomicBool,
    pub check_state: Mutex<CheckState>,
    pub process_id: u32,
    pub window_handle: AtomicIsize,
    pub runtime_id: Mutex<Vec<i32>>,
    pub children: Mutex<Vec<Arc<dyn ControlNode>>>,
    /// When cleared, every accessor fails as if the element vanished.
    pub alive: AtomicBool,
}

impl FakeNode {
    pub fn new(name: &str, control_type: &str, rect: Rect) -> Arc<Self> {
        Arc::new(Self {
            name: Mutex::new(name.to_string()),
            class_name: Mutex::new(String::new()),
            control_type: Mutex::new(control_type.to_string()),
            rect: Mutex::new(rect),
            enabled: AtomicBool::new(true),
            visible: AtomicBool::new(true),
            normal_window: AtomicBool::new(true),
            check_state: Mutex::new(CheckState::Unknown),
            process_id: std::process::id(),
            window_handle: AtomicIsize::new(0x1000),
            runtime_id: Mutex::new(vec![42, 1]),
            children: Mutex::new(Vec::new()),
            alive: AtomicBool::new(true),
        })
    }

    pub fn window(name: &str) -> Arc<Self> {
        Self::new(name, "Window", Rect::new(0, 0, 800, 600))
    }

    pub fn with_class(self: Arc<Self>, class: &str) -> Arc<Self> {
        *self.class_name.lock().unwrap() = class.to_string();
        self
    }

    pub fn with_children(self: Arc<Self>, children: Vec<Arc<dyn ControlNode>>) -> Arc<Self> {
        *self.children.lock().unwrap() = children;
        self
    }

    pub fn set_rect(&self, rect: Rect) {
        *self.rect.lock().unwrap() = rect;
    }

    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<(), AutomationError> {
        if self.alive.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AutomationError::ElementDetached("fake node".to_string()))
        }
    }
}

impl ControlNode for FakeNode {
    fn name(&self) -> Result<String, AutomationError> {
        self.guard()?;
        Ok(self.name.lock().unwrap().clone())
    }

    fn rich_text(&self) -> Result<String, AutomationError> {
        self.name()
    }

    fn class_name(&self) -> Result<String, AutomationError> {
        self.guard()?;
        Ok(self.class_name.lock().unwrap().clone())
    }

    fn control_type(&self) -> Result<String, AutomationError> {
        self.guard()?;
        Ok(self.control_type.lock().unwrap().clone())
    }

    fn bounding_rect(&self) -> Result<Rect, AutomationError> {
        self.guard()?;
        Ok(*self.rect.lock().unwrap())
    }

    fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.guard()?;
        Ok(self.enabled.load(Ordering::SeqCst))
    }

    fn is_visible(&self) -> Result<bool, AutomationError> {
        self.guard()?;
        Ok(self.visible.load(Ordering::SeqCst))
    }

    fn is_normal_window(&self) -> Result<bool, AutomationError> {
        self.guard()?;
        Ok(self.normal_window.load(Ordering::SeqCst))
    }

    fn check_state(&self) -> Result<CheckState, AutomationError> {
        self.guard()?;
        Ok(*self.check_state.lock().unwrap())
    }

    fn process_id(&self) -> Result<u32, AutomationError> {
        self.guard()?;
        Ok(self.process_id)
    }

    fn window_handle(&self) -> Result<isize, AutomationError> {
        self.guard()?;
        Ok(self.window_handle.load(Ordering::SeqCst))
    }

    fn runtime_id(&self) -> Result<Vec<i32>, AutomationError> {
        self.guard()?;
        Ok(self.runtime_id.lock().unwrap().clone())
    }

    fn children(&self) -> Result<Vec<Arc<dyn ControlNode>>, AutomationError> {
        self.guard()?;
        Ok(self.children.lock().unwrap().clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Provider whose desktop and query results are canned, with optional
/// leading failures to drive the retry path.
pub struct FakeProvider {
    pub windows: Mutex<Vec<Arc<dyn ControlNode>>>,
    pub query_results: Mutex<Vec<Arc<dyn ControlNode>>>,
    /// Number of initial query calls that fail before results flow.
    pub failures_remaining: AtomicUsize,
    pub fail_retryable: AtomicBool,
    pub query_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            windows: Mutex::new(Vec::new()),
            query_results: Mutex::new(Vec::new()),
            failures_remaining: AtomicUsize::new(0),
            fail_retryable: AtomicBool::new(true),
            query_calls: AtomicUsize::new(0),
        })
    }

    pub fn with_windows(self: Arc<Self>, windows: Vec<Arc<dyn ControlNode>>) -> Arc<Self> {
        *self.windows.lock().unwrap() = windows;
        self
    }

    pub fn with_query_results(self: Arc<Self>, nodes: Vec<Arc<dyn ControlNode>>) -> Arc<Self> {
        *self.query_results.lock().unwrap() = nodes;
        self
    }

    pub fn fail_first(self: Arc<Self>, count: usize, retryable: bool) -> Arc<Self> {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self.fail_retryable.store(retryable, Ordering::SeqCst);
        self
    }
}

impl AccessibilityProvider for FakeProvider {
    fn desktop_windows(&self) -> Result<Vec<Arc<dyn ControlNode>>, AutomationError> {
        Ok(self.windows.lock().unwrap().clone())
    }

    fn query_descendants(
        &self,
        _root: &Arc<dyn ControlNode>,
        _condition: &QueryCondition,
    ) -> Result<Vec<Arc<dyn ControlNode>>, AutomationError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(AutomationError::UIAutomationAPIError {
                message: "provider failure".to_string(),
                com_error: Some(-2147467259),
                operation: "FindAll".to_string(),
                is_retryable: self.fail_retryable.load(Ordering::SeqCst),
            });
        }
        Ok(self.query_results.lock().unwrap().clone())
    }
}

/// Focus probe that plays back a script, repeating the final value once
/// the script runs out.
pub struct ScriptedFocusProbe {
    script: Mutex<VecDeque<Option<Vec<i32>>>>,
    last: Mutex<Option<Vec<i32>>>,
}

impl ScriptedFocusProbe {
    pub fn new(script: Vec<Option<Vec<i32>>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
        })
    }
}

impl FocusProbe for ScriptedFocusProbe {
    fn focused_element(&self) -> Option<Vec<i32>> {
        let mut script = self.script.lock().unwrap();
        match script.pop_front() {
            Some(value) => {
                *self.last.lock().unwrap() = value.clone();
                value
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

pub fn handle_for(node: &Arc<FakeNode>, kind: BackendKind) -> ControlHandle {
    ControlHandle::new(node.clone() as Arc<dyn ControlNode>, kind, LatencyGauge::new())
}
