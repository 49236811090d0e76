//! High-level discovery facade and backend registry.
//!
//! The [`Inspector`] is the surface callers script against: labeled window
//! maps, control snapshots, and descendant discovery that survives backend
//! failures by degrading to a capped direct walk. Backends are looked up
//! in an explicit [`BackendRegistry`] passed in by the caller.

use crate::backend::{
    BackendKind, BackendStrategy, DescendantFilter, MAX_FALLBACK_RESULTS,
};
use crate::errors::AutomationError;
use crate::handle::{ControlHandle, ControlNode, LatencyGauge};
use crate::process::process_name_for_pid;
use crate::records::{ControlField, ControlInfoRecord};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Labeled set of top-level application windows. Labels are positional
/// ("1", "2", ...) and only meaningful until the next enumeration.
pub type WindowSet = Vec<(String, ControlHandle)>;

/// Explicit mapping from backend kind to strategy instance.
///
/// Registration is first-wins per kind: registering a kind twice keeps
/// the original strategy, so every caller that resolves a kind observes
/// the same instance.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<BackendKind, Arc<dyn BackendStrategy>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a registry with both discovery backends wired to one
    /// shared platform provider.
    #[cfg(target_os = "windows")]
    pub fn with_default_backends() -> Result<Self, AutomationError> {
        use crate::backend::{EnumerationBackend, TreeQueryBackend};
        use crate::platforms::windows::UiaProvider;

        let provider: Arc<dyn crate::backend::AccessibilityProvider> =
            Arc::new(UiaProvider::new()?);
        let mut registry = Self::new();
        registry.register(Arc::new(TreeQueryBackend::new(provider.clone())));
        registry.register(Arc::new(EnumerationBackend::new(provider)));
        Ok(registry)
    }

    /// Register a strategy under its own kind, returning the instance
    /// that ends up registered (the existing one if the kind was taken).
    pub fn register(&mut self, backend: Arc<dyn BackendStrategy>) -> Arc<dyn BackendStrategy> {
        self.backends
            .entry(backend.kind())
            .or_insert(backend)
            .clone()
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn BackendStrategy>> {
        self.backends.get(&kind).cloned()
    }
}

/// Discovery facade bound to one backend strategy.
pub struct Inspector {
    backend: Arc<dyn BackendStrategy>,
}

impl Inspector {
    /// Resolve `kind` from the registry.
    pub fn from_registry(
        registry: &BackendRegistry,
        kind: BackendKind,
    ) -> Result<Self, AutomationError> {
        let backend = registry.get(kind).ok_or_else(|| {
            AutomationError::InvalidArgument(format!("no backend registered for {kind}"))
        })?;
        Ok(Self { backend })
    }

    pub fn new(backend: Arc<dyn BackendStrategy>) -> Self {
        Self { backend }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Visible top-level windows, optionally with untitled windows and
    /// IME chrome removed.
    pub fn desktop_windows(
        &self,
        remove_empty: bool,
    ) -> Result<Vec<ControlHandle>, AutomationError> {
        self.backend.enumerate_top_level_windows(remove_empty)
    }

    /// Label the normal application windows "1", "2", ... in enumeration
    /// order. Windows whose normal-window probe fails are dropped rather
    /// than guessed at.
    pub fn desktop_app_map(&self, windows: &[ControlHandle]) -> WindowSet {
        windows
            .iter()
            .filter(|w| w.is_normal_window().unwrap_or(false))
            .enumerate()
            .map(|(i, w)| ((i + 1).to_string(), w.clone()))
            .collect()
    }

    /// Enumerate and label in one step, degrading to an empty map when
    /// the desktop itself cannot be enumerated.
    pub fn safe_desktop_app_map(&self, remove_empty: bool) -> WindowSet {
        match self.desktop_windows(remove_empty) {
            Ok(windows) => self.desktop_app_map(&windows),
            Err(err) => {
                error!("desktop enumeration failed: {err}");
                Vec::new()
            }
        }
    }

    /// Snapshot the requested fields of one control. Only the named
    /// fields are read, with an empty list selecting every field; a
    /// control that dies mid-read yields an empty record instead of an
    /// error.
    pub fn control_info(&self, handle: &ControlHandle, fields: &[ControlField]) -> ControlInfoRecord {
        match self.try_control_info(handle, fields) {
            Ok(record) => record,
            Err(err) => {
                warn!("control info read failed: {err}");
                ControlInfoRecord::default()
            }
        }
    }

    fn try_control_info(
        &self,
        handle: &ControlHandle,
        fields: &[ControlField],
    ) -> Result<ControlInfoRecord, AutomationError> {
        let fields = if fields.is_empty() {
            &ControlField::ALL[..]
        } else {
            fields
        };
        let mut record = ControlInfoRecord::default();
        for field in fields {
            match field {
                ControlField::ControlType => {
                    record.control_type = Some(handle.control_type()?);
                }
                ControlField::ControlClass => {
                    record.control_class = Some(handle.class_name()?);
                }
                ControlField::ControlName => {
                    record.control_name = Some(handle.name()?);
                }
                ControlField::ControlRect => {
                    record.control_rect = Some(handle.rect()?.as_tuple());
                }
                ControlField::ControlText => {
                    record.control_text = Some(handle.rich_text()?);
                }
                ControlField::ControlTitle => {
                    record.control_title = Some(handle.name()?);
                }
                ControlField::Selected => {
                    record.selected = Some(handle.check_state()?);
                }
                ControlField::Source => {
                    record.source = Some(handle.source().to_string());
                }
            }
        }
        Ok(record)
    }

    /// Snapshot many controls; order is preserved and failed controls
    /// appear as empty records.
    pub fn control_info_batch(
        &self,
        handles: &[ControlHandle],
        fields: &[ControlField],
    ) -> Vec<ControlInfoRecord> {
        handles
            .iter()
            .map(|h| self.control_info(h, fields))
            .collect()
    }

    /// Snapshot a labeled window set, stamping each record with its
    /// positional label.
    pub fn desktop_app_info(
        &self,
        windows: &WindowSet,
        fields: &[ControlField],
    ) -> Vec<ControlInfoRecord> {
        windows
            .iter()
            .map(|(label, handle)| {
                let mut record = self.control_info(handle, fields);
                record.label = Some(label.clone());
                record
            })
            .collect()
    }

    /// Descendant discovery with the filter vocabulary adjusted to what
    /// the bound backend understands, and a capped uncached walk as the
    /// last resort when the backend itself fails.
    ///
    /// An [`AutomationError::InvalidArgument`] is a caller mistake and
    /// propagates; every other failure degrades.
    pub fn find_control_elements_in_descendants(
        &self,
        window: &ControlHandle,
        filter: &DescendantFilter,
    ) -> Result<Vec<ControlHandle>, AutomationError> {
        let routed = self.route_filter(filter);
        match self.backend.find_descendants(window, &routed) {
            Ok(handles) => Ok(handles),
            Err(err @ AutomationError::InvalidArgument(_)) => Err(err),
            Err(err) => {
                warn!("backend discovery failed: {err}, falling back to direct walk");
                Ok(self.fallback_walk(window, filter))
            }
        }
    }

    /// Restrict the filter to the vocabulary the bound backend speaks:
    /// the bulk query cannot express class names, the walk matches by
    /// class and leaves control types to post-filtering.
    fn route_filter(&self, filter: &DescendantFilter) -> DescendantFilter {
        let mut routed = filter.clone();
        match self.backend.kind() {
            BackendKind::TreeQuery => routed.class_names.clear(),
            BackendKind::Enumeration => routed.control_types.clear(),
        }
        routed
    }

    /// Uncached walk of the window's full subtree, capped at
    /// [`MAX_FALLBACK_RESULTS`] collected nodes and post-filtered by
    /// control type. This path exists so one poisoned provider query
    /// cannot blind a caller entirely.
    fn fallback_walk(&self, window: &ControlHandle, filter: &DescendantFilter) -> Vec<ControlHandle> {
        let children = match window.node().children() {
            Ok(children) => children,
            Err(err) => {
                error!("fallback walk failed: {err}");
                return Vec::new();
            }
        };

        let mut nodes = Vec::new();
        for child in children {
            if nodes.len() >= MAX_FALLBACK_RESULTS {
                break;
            }
            nodes.push(child.clone());
            collect_fallback_descendants(&child, &mut nodes);
        }

        let gauge = LatencyGauge::new();
        let mut handles = Vec::new();
        for node in nodes {
            if !filter.control_types.is_empty() {
                let keep = node
                    .control_type()
                    .map(|ct| filter.control_types.iter().any(|t| *t == ct))
                    .unwrap_or(false);
                if !keep {
                    continue;
                }
            }
            handles.push(ControlHandle::new(node, self.backend.kind(), gauge.clone()));
        }
        debug!("fallback walk produced {} controls", handles.len());
        handles
    }

    /// Executable name of the process owning `window`, with the `.exe`
    /// suffix removed. Empty when the window or its process is gone.
    pub fn application_root_name(&self, window: &ControlHandle) -> String {
        match window.process_id() {
            Ok(pid) => process_name_for_pid(pid),
            Err(err) => {
                warn!("process id lookup failed: {err}");
                String::new()
            }
        }
    }
}

/// Depth-first descendant collection for the salvage path, stopping as
/// soon as the cap is reached. Subtrees that vanish mid-walk contribute
/// nothing.
fn collect_fallback_descendants(
    node: &Arc<dyn ControlNode>,
    out: &mut Vec<Arc<dyn ControlNode>>,
) {
    if out.len() >= MAX_FALLBACK_RESULTS {
        return;
    }
    let Ok(children) = node.children() else {
        return;
    };
    for child in children {
        if out.len() >= MAX_FALLBACK_RESULTS {
            return;
        }
        out.push(child.clone());
        collect_fallback_descendants(&child, out);
    }
}
