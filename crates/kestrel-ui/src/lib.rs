//! Kestrel UI - headless widget tree with safe deferred destruction
//!
//! This crate provides:
//! - A generational node tree with tagged node kinds
//! - Typed events with per-node observers and bubbling dispatch
//! - A modal overlay stack with input capture
//! - A FIFO deferred task queue driven by a single-threaded event loop
//! - The [`MsgBox`] message-box widget
//!
//! ## Quick Start
//!
//! ```rust
//! use kestrel_ui::{EventLoop, InputEvent, MsgBox, UiCore};
//!
//! let mut lp = EventLoop::new(UiCore::new());
//! let screen = lp.core().screen();
//!
//! let msgbox = MsgBox::create(
//!     lp.core_mut(),
//!     Some(screen),
//!     Some("Delete file?"),
//!     Some("This cannot be undone."),
//!     &["Delete", "Cancel"],
//!     true,
//! )
//! .unwrap();
//!
//! let close = msgbox.close_button(lp.core()).unwrap().unwrap();
//! lp.push_input(InputEvent::click(close));
//! lp.run_once();
//!
//! assert!(!msgbox.is_alive(lp.core()));
//! ```

pub mod error;
pub mod event;
pub mod event_loop;
pub mod node;
pub mod overlay;
pub mod task;
pub mod tree;
pub mod widgets;

pub use error::{UiError, UiResult};
pub use event::{EventContext, EventHandler, EventKind, HandleStatus, ObserverId, UiEvent, handler};
pub use event_loop::{EventBatch, EventLoop, EventStats, InputEvent, InputQueue};
pub use node::{ButtonRow, Capabilities, Label, NodeKind};
pub use overlay::{Overlay, OverlayConfig, OverlayId, OverlayStack, ZLayer};
pub use task::TaskQueue;
pub use tree::{NodeId, TreeConfig, TreeStats, UiNode, UiTree};
pub use widgets::msgbox::{LifecycleState, MsgBox, MsgBoxOptions};

pub use kestrel_core::math::Vec2;

/// Render-agnostic UI core: the node tree, its roots and the overlay stack.
pub struct UiCore {
    tree: UiTree,
    overlays: OverlayStack,
    screen: NodeId,
    top_layer: NodeId,
}

impl UiCore {
    /// Create a core with an unbounded tree.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        let mut tree = UiTree::with_config(config);
        let screen = tree.create_root(NodeKind::Screen);
        let top_layer = tree.create_root(NodeKind::Layer);
        Self {
            tree,
            overlays: OverlayStack::new(),
            screen,
            top_layer,
        }
    }

    /// Root for ordinary content.
    pub fn screen(&self) -> NodeId {
        self.screen
    }

    /// Root stacked above the screen; modal overlays live here.
    pub fn top_layer(&self) -> NodeId {
        self.top_layer
    }

    pub fn tree(&self) -> &UiTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut UiTree {
        &mut self.tree
    }

    pub fn overlays(&self) -> &OverlayStack {
        &self.overlays
    }

    pub fn overlays_mut(&mut self) -> &mut OverlayStack {
        &mut self.overlays
    }

    /// Send an event straight to `target`, bypassing modality checks.
    pub fn send_event(
        &mut self,
        tasks: &mut TaskQueue,
        target: NodeId,
        event: UiEvent,
    ) -> UiResult<HandleStatus> {
        event::dispatch(self, tasks, target, event)
    }

    /// Destroy every child of the screen, leaving the screen itself alive.
    pub fn clean_screen(&mut self) -> UiResult<usize> {
        let children = self.tree.children(self.screen)?.to_vec();
        let mut freed = 0;
        for child in children {
            freed += self.tree.destroy_subtree(child)?;
        }
        Ok(freed)
    }
}

impl Default for UiCore {
    fn default() -> Self {
        Self::new()
    }
}
