//! Overlay stack for modal presentation.
//!
//! Overlays are organized into Z-layers, each holding a stack of entries:
//! - Base (0): Normal UI content
//! - Modal (3000): Dialog boxes, alerts
//!
//! An overlay configured to capture input blocks every node outside of it
//! while it is the topmost capturing entry. Pushes and pops must be paired
//! with the lifetime of the overlay's root node.
//!
//! # Example
//!
//! ```ignore
//! let id = core.overlays_mut().push(backdrop, OverlayConfig::modal());
//! assert!(core.overlays().captures_input());
//! core.overlays_mut().pop(id);
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use kestrel_core::alloc::HashMap;

use crate::tree::{NodeId, UiTree};

/// Global counter for generating unique overlay IDs.
static OVERLAY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an overlay entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

impl OverlayId {
    pub fn new() -> Self {
        Self(OVERLAY_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for OverlayId {
    fn default() -> Self {
        Self::new()
    }
}

/// Z-layer for overlay ordering. Higher values sit on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ZLayer {
    Base,
    Modal,
}

impl ZLayer {
    pub fn z_index(&self) -> u16 {
        match self {
            ZLayer::Base => 0,
            ZLayer::Modal => 3000,
        }
    }

    pub fn is_above(&self, other: &ZLayer) -> bool {
        self.z_index() > other.z_index()
    }
}

/// Configuration for an overlay entry.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub layer: ZLayer,
    /// Block input to everything outside this overlay while it is on top.
    pub capture_input: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            layer: ZLayer::Base,
            capture_input: false,
        }
    }
}

impl OverlayConfig {
    /// Configuration for a modal dialog.
    pub fn modal() -> Self {
        Self {
            layer: ZLayer::Modal,
            capture_input: true,
        }
    }
}

/// An active overlay entry.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub id: OverlayId,
    /// Root node of the overlay content.
    pub root_node: NodeId,
    pub config: OverlayConfig,
}

/// Stack of overlays, ordered by layer and then by push order.
#[derive(Default)]
pub struct OverlayStack {
    overlays: HashMap<OverlayId, Overlay>,
    layer_stacks: BTreeMap<u16, Vec<OverlayId>>,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, root_node: NodeId, config: OverlayConfig) -> OverlayId {
        let id = OverlayId::new();
        self.layer_stacks
            .entry(config.layer.z_index())
            .or_default()
            .push(id);
        tracing::debug!("overlay {:?} pushed for {} on {:?}", id, root_node, config.layer);
        self.overlays.insert(
            id,
            Overlay {
                id,
                root_node,
                config,
            },
        );
        id
    }

    /// Remove an entry. Returns `None` if it was already popped.
    pub fn pop(&mut self, id: OverlayId) -> Option<Overlay> {
        let overlay = self.overlays.remove(&id)?;
        let z_index = overlay.config.layer.z_index();
        if let Some(stack) = self.layer_stacks.get_mut(&z_index) {
            stack.retain(|&oid| oid != id);
            if stack.is_empty() {
                self.layer_stacks.remove(&z_index);
            }
        }
        tracing::debug!("overlay {:?} popped", id);
        Some(overlay)
    }

    /// Look up an entry that is still on the stack.
    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.get(&id)
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Entries from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.layer_stacks
            .values()
            .flat_map(|stack| stack.iter())
            .filter_map(|id| self.overlays.get(id))
    }

    /// Topmost entry that captures input.
    pub fn top_capturing(&self) -> Option<&Overlay> {
        self.iter().filter(|o| o.config.capture_input).last()
    }

    pub fn captures_input(&self) -> bool {
        self.top_capturing().is_some()
    }

    /// Whether input aimed at `node` may be delivered.
    pub fn accepts_input(&self, tree: &UiTree, node: NodeId) -> bool {
        match self.top_capturing() {
            Some(overlay) => tree.is_ancestor_or_self(overlay.root_node, node),
            None => true,
        }
    }
}
