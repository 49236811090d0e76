//! Direct-walk discovery backend.

use super::{
    top_level_windows, AccessibilityProvider, BackendKind, BackendStrategy, DescendantFilter,
};
use crate::errors::AutomationError;
use crate::handle::{ControlHandle, ControlNode, LatencyGauge};
use std::sync::Arc;
use tracing::debug;

/// Discovery by walking window descendants directly, then applying the
/// filter as a sequence of predicate passes. Slower than the bulk query
/// but understands class-name and depth restrictions, and is the only
/// backend that drops controls with empty display names.
pub struct EnumerationBackend {
    provider: Arc<dyn AccessibilityProvider>,
}

impl EnumerationBackend {
    pub fn new(provider: Arc<dyn AccessibilityProvider>) -> Self {
        Self { provider }
    }
}

/// Depth-first subtree collection. `max_depth` of 0 is unbounded; the
/// class restriction prunes what is kept, not what is walked, matching
/// how the provider's own class-filtered enumeration behaves.
fn collect_descendants(
    node: &Arc<dyn ControlNode>,
    class_names: &[String],
    max_depth: usize,
    depth: usize,
    out: &mut Vec<Arc<dyn ControlNode>>,
) {
    if max_depth != 0 && depth >= max_depth {
        return;
    }
    let children = match node.children() {
        Ok(children) => children,
        // A subtree that vanished mid-walk contributes nothing.
        Err(_) => return,
    };
    for child in children {
        let keep = class_names.is_empty()
            || child
                .class_name()
                .map(|c| class_names.iter().any(|want| *want == c))
                .unwrap_or(false);
        if keep {
            out.push(child.clone());
        }
        collect_descendants(&child, class_names, max_depth, depth + 1, out);
    }
}

impl BackendStrategy for EnumerationBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Enumeration
    }

    fn enumerate_top_level_windows(
        &self,
        remove_empty: bool,
    ) -> Result<Vec<ControlHandle>, AutomationError> {
        top_level_windows(
            self.provider.as_ref(),
            BackendKind::Enumeration,
            remove_empty,
        )
    }

    fn find_descendants(
        &self,
        root: &ControlHandle,
        filter: &DescendantFilter,
    ) -> Result<Vec<ControlHandle>, AutomationError> {
        let mut nodes = Vec::new();
        collect_descendants(root.node(), &filter.class_names, filter.depth, 0, &mut nodes);
        debug!("walk collected {} candidate nodes", nodes.len());

        if filter.is_visible {
            nodes.retain(|n| n.is_visible().unwrap_or(false));
        }
        if filter.is_enabled {
            nodes.retain(|n| n.is_enabled().unwrap_or(false));
        }
        if !filter.titles.is_empty() {
            nodes.retain(|n| {
                n.name()
                    .map(|name| filter.titles.iter().any(|t| *t == name))
                    .unwrap_or(false)
            });
        }
        if !filter.control_types.is_empty() {
            nodes.retain(|n| {
                n.control_type()
                    .map(|ct| filter.control_types.iter().any(|t| *t == ct))
                    .unwrap_or(false)
            });
        }

        let gauge = LatencyGauge::new();
        let mut handles = Vec::new();
        for node in nodes {
            let name = match node.name() {
                Ok(name) if !name.is_empty() => name,
                // Unnamed controls are not actionable for a caller picking
                // targets by label.
                _ => continue,
            };
            let (control_type, rect) = match (node.control_type(), node.bounding_rect()) {
                (Ok(t), Ok(r)) => (t, r),
                _ => continue,
            };
            if rect.is_degenerate() {
                continue;
            }
            let handle = ControlHandle::new(node, BackendKind::Enumeration, gauge.clone());
            handle.prime(name, control_type, rect);
            handles.push(handle);
        }
        Ok(handles)
    }
}
