//! Message box widget.
//!
//! A message box is a container composed of an optional header (title label
//! and close button), a content area with an optional text label, and an
//! optional row of buttons:
//!
//! ```text
//! msgbox ─┬─ header ─┬─ title label
//!         │          └─ close button ── "X" label
//!         ├─ content ── text label, caller content...
//!         └─ button row
//! ```
//!
//! Created without a parent, the box is modal: it is placed inside a
//! backdrop on the top layer and the backdrop is pushed onto the overlay
//! stack, blocking input to everything underneath until the box closes.
//!
//! # Closing
//!
//! [`MsgBox::close`] destroys the box immediately. It refuses to run while
//! one of the box's own nodes is dispatching an event, because that would
//! pull the node out from under the running handler. Handlers use
//! [`MsgBox::close_async`] instead, which marks the box
//! [`LifecycleState::PendingAsyncClose`] and schedules the destruction on the
//! loop's [`TaskQueue`]. When the task runs it re-checks the handle's
//! generation and state, so a box that was already destroyed (or whose slot
//! was reused) is left alone.

use crate::UiCore;
use crate::error::{UiError, UiResult};
use crate::event::{EventKind, HandleStatus, handler};
use crate::node::NodeKind;
use crate::overlay::{OverlayConfig, OverlayId};
use crate::task::TaskQueue;
use crate::tree::NodeId;
use kestrel_core::profiling::profile_function;

/// Caption of the close button.
pub const CLOSE_SYMBOL: &str = "X";

/// Where a message box is in its close lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Active,
    PendingAsyncClose,
    Destroyed,
}

/// Sub-node ids and state stored on the message box's root node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgBoxParts {
    state: LifecycleState,
    header: Option<NodeId>,
    title: Option<NodeId>,
    close_button: Option<NodeId>,
    content: NodeId,
    text: Option<NodeId>,
    buttons: Option<NodeId>,
    backdrop: Option<NodeId>,
    overlay: Option<OverlayId>,
}

/// Creation parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsgBoxOptions {
    pub title: Option<String>,
    pub text: Option<String>,
    pub buttons: Vec<String>,
    pub closable: bool,
}

impl MsgBoxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append one button caption.
    pub fn button(mut self, text: impl Into<String>) -> Self {
        self.buttons.push(text.into());
        self
    }

    /// Append button captions in left-to-right order.
    pub fn buttons<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buttons.extend(texts.into_iter().map(Into::into));
        self
    }

    /// Add a close button to the header.
    pub fn closable(mut self, closable: bool) -> Self {
        self.closable = closable;
        self
    }
}

/// Handle to a message box. Copyable; goes stale once the box is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MsgBox {
    root: NodeId,
}

impl MsgBox {
    /// Create a message box.
    ///
    /// With `parent == None` the box is modal. `buttons` become a button row
    /// in the given order; an empty slice creates no row.
    pub fn create(
        core: &mut UiCore,
        parent: Option<NodeId>,
        title: Option<&str>,
        text: Option<&str>,
        buttons: &[&str],
        closable: bool,
    ) -> UiResult<MsgBox> {
        let options = MsgBoxOptions {
            title: title.map(str::to_owned),
            text: text.map(str::to_owned),
            buttons: buttons.iter().map(|&b| b.to_owned()).collect(),
            closable,
        };
        Self::create_with(core, parent, &options)
    }

    /// Create a message box from [`MsgBoxOptions`].
    ///
    /// On failure nothing is left attached to `parent` or the top layer and
    /// no overlay is pushed.
    pub fn create_with(
        core: &mut UiCore,
        parent: Option<NodeId>,
        options: &MsgBoxOptions,
    ) -> UiResult<MsgBox> {
        profile_function!();
        if let Some(parent) = parent
            && !core.tree().is_alive(parent)
        {
            return Err(UiError::InvalidHandle(parent));
        }

        let top_layer = core.top_layer();
        let backdrop = match parent {
            Some(_) => None,
            None => Some(construction(
                core.tree_mut().create_node(top_layer, NodeKind::Container),
            )?),
        };
        let host = backdrop.or(parent).unwrap_or(core.screen());

        let root = match core.tree_mut().create_node(host, NodeKind::Container) {
            Ok(root) => root,
            Err(err) => {
                if let Some(backdrop) = backdrop {
                    core.tree_mut().destroy_subtree(backdrop)?;
                }
                return Err(UiError::ConstructionFailure(Box::new(err)));
            }
        };

        let mut parts = match Self::compose(core, root, options) {
            Ok(parts) => parts,
            Err(err) => {
                let top = backdrop.unwrap_or(root);
                let freed = core.tree_mut().destroy_subtree(top)?;
                tracing::debug!("message box construction failed, tore down {} nodes: {}", freed, err);
                return Err(UiError::ConstructionFailure(Box::new(err)));
            }
        };

        if let Some(backdrop) = backdrop {
            parts.backdrop = Some(backdrop);
            parts.overlay = Some(core.overlays_mut().push(backdrop, OverlayConfig::modal()));
        }
        core.tree_mut().set_kind(root, NodeKind::MsgBox(parts))?;

        tracing::debug!(
            "message box {} created ({})",
            root,
            if backdrop.is_some() { "modal" } else { "non-modal" }
        );
        Ok(MsgBox { root })
    }

    /// Build the sub-tree under `root` and wire the close button.
    fn compose(core: &mut UiCore, root: NodeId, options: &MsgBoxOptions) -> UiResult<MsgBoxParts> {
        let tree = core.tree_mut();

        let header = if options.title.is_some() || options.closable {
            Some(tree.create_node(root, NodeKind::Container)?)
        } else {
            None
        };

        let mut title = None;
        let mut close_button = None;
        if let Some(header) = header {
            if let Some(text) = &options.title {
                title = Some(tree.create_node(header, NodeKind::label(text.as_str()))?);
            }
            if options.closable {
                let button = tree.create_node(header, NodeKind::Button)?;
                tree.create_node(button, NodeKind::label(CLOSE_SYMBOL))?;
                close_button = Some(button);
            }
        }

        let content = tree.create_node(root, NodeKind::Container)?;
        let text = match &options.text {
            Some(text) => Some(tree.create_node(content, NodeKind::label(text.as_str()))?),
            None => None,
        };

        let buttons = if options.buttons.is_empty() {
            None
        } else {
            Some(tree.create_node(root, NodeKind::button_row(options.buttons.iter().cloned()))?)
        };

        if let Some(button) = close_button {
            let msgbox = MsgBox { root };
            tree.observe(
                button,
                Some(EventKind::Clicked),
                handler(move |ctx, _| match msgbox.close_async(ctx.core, ctx.tasks) {
                    Ok(()) => HandleStatus::handled(),
                    Err(err) => {
                        tracing::warn!("close button of {} ignored: {}", msgbox.root, err);
                        HandleStatus::ignored()
                    }
                }),
            )?;
        }

        Ok(MsgBoxParts {
            state: LifecycleState::Active,
            header,
            title,
            close_button,
            content,
            text,
            buttons,
            backdrop: None,
            overlay: None,
        })
    }

    /// Root node of the box.
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn parts(&self, core: &UiCore) -> UiResult<MsgBoxParts> {
        match &core.tree().node(self.root)?.kind {
            NodeKind::MsgBox(parts) => Ok(*parts),
            other => Err(UiError::WrongKind {
                node: self.root,
                expected: "message box",
                found: other.name(),
            }),
        }
    }

    fn parts_mut<'a>(&self, core: &'a mut UiCore) -> UiResult<&'a mut MsgBoxParts> {
        let root = self.root;
        match &mut core.tree_mut().node_mut(root)?.kind {
            NodeKind::MsgBox(parts) => Ok(parts),
            other => Err(UiError::WrongKind {
                node: root,
                expected: "message box",
                found: other.name(),
            }),
        }
    }

    /// Whether the box still exists. `false` once it has been destroyed.
    pub fn is_alive(&self, core: &UiCore) -> bool {
        self.parts(core).is_ok()
    }

    /// Current lifecycle state; a stale handle reports `Destroyed`.
    pub fn state(&self, core: &UiCore) -> LifecycleState {
        match self.parts(core) {
            Ok(parts) => parts.state,
            Err(_) => LifecycleState::Destroyed,
        }
    }

    /// Whether the box holds a capturing overlay on the stack.
    pub fn is_modal(&self, core: &UiCore) -> UiResult<bool> {
        Ok(self
            .parts(core)?
            .overlay
            .is_some_and(|id| core.overlays().get(id).is_some()))
    }

    /// Node id of the title label.
    pub fn title_label(&self, core: &UiCore) -> UiResult<Option<NodeId>> {
        Ok(self.parts(core)?.title)
    }

    /// Node id of the body text label.
    pub fn text_label(&self, core: &UiCore) -> UiResult<Option<NodeId>> {
        Ok(self.parts(core)?.text)
    }

    /// Title text, `None` if the box was created without a title.
    pub fn title<'a>(&self, core: &'a UiCore) -> UiResult<Option<&'a str>> {
        self.parts(core)?
            .title
            .map(|label| core.tree().label_text(label))
            .transpose()
    }

    /// Body text, `None` if the box was created without text.
    pub fn text<'a>(&self, core: &'a UiCore) -> UiResult<Option<&'a str>> {
        self.parts(core)?
            .text
            .map(|label| core.tree().label_text(label))
            .transpose()
    }

    /// Update the title. Returns `Ok(false)` if there is no title label.
    pub fn set_title(&self, core: &mut UiCore, title: &str) -> UiResult<bool> {
        match self.parts(core)?.title {
            Some(label) => core.tree_mut().set_label_text(label, title),
            None => Ok(false),
        }
    }

    /// Update the body text. Returns `Ok(false)` if there is no text label.
    pub fn set_text(&self, core: &mut UiCore, text: &str) -> UiResult<bool> {
        match self.parts(core)?.text {
            Some(label) => core.tree_mut().set_label_text(label, text),
            None => Ok(false),
        }
    }

    /// Header container, present when a title or close button was requested.
    pub fn header(&self, core: &UiCore) -> UiResult<Option<NodeId>> {
        Ok(self.parts(core)?.header)
    }

    /// The close button, `None` unless the box was created closable.
    pub fn close_button(&self, core: &UiCore) -> UiResult<Option<NodeId>> {
        Ok(self.parts(core)?.close_button)
    }

    /// Content container. Always present.
    pub fn content(&self, core: &UiCore) -> UiResult<NodeId> {
        Ok(self.parts(core)?.content)
    }

    /// Append caller content to the content area.
    pub fn add_content(&self, core: &mut UiCore, kind: NodeKind) -> UiResult<NodeId> {
        let content = self.parts(core)?.content;
        core.tree_mut().create_node(content, kind)
    }

    /// The button row, `None` if no buttons were requested.
    pub fn buttons(&self, core: &UiCore) -> UiResult<Option<NodeId>> {
        Ok(self.parts(core)?.buttons)
    }

    /// Caption of button `index`, `None` if out of range or there is no row.
    pub fn button_text<'a>(&self, core: &'a UiCore, index: usize) -> UiResult<Option<&'a str>> {
        match self.parts(core)?.buttons {
            Some(row) => core.tree().button_text(row, index),
            None => Ok(None),
        }
    }

    /// Every button caption, left to right. Empty when there is no row.
    pub fn button_texts<'a>(&self, core: &'a UiCore) -> UiResult<Vec<&'a str>> {
        match self.parts(core)?.buttons {
            Some(row) => core.tree().texts(row),
            None => Ok(Vec::new()),
        }
    }

    /// Index of the last clicked button, `None` until a button is clicked.
    pub fn active_button(&self, core: &UiCore) -> UiResult<Option<usize>> {
        match self.parts(core)?.buttons {
            Some(row) => core.tree().active_index(row),
            None => Ok(None),
        }
    }

    /// Caption of the active button.
    pub fn active_button_text<'a>(&self, core: &'a UiCore) -> UiResult<Option<&'a str>> {
        let Some(row) = self.parts(core)?.buttons else {
            return Ok(None);
        };
        match core.tree().active_index(row)? {
            Some(index) => core.tree().button_text(row, index),
            None => Ok(None),
        }
    }

    /// Destroy the box now.
    ///
    /// Fails with [`UiError::DispatchInProgress`] when called from a handler
    /// running on one of the box's nodes; use [`MsgBox::close_async`] there.
    pub fn close(&self, core: &mut UiCore) -> UiResult<()> {
        let parts = self.parts(core)?;
        let top = parts.backdrop.unwrap_or(self.root);
        if let Some(node) = core.tree().dispatching_within(top) {
            return Err(UiError::DispatchInProgress(node));
        }
        self.destroy(core, parts)
    }

    /// Schedule destruction for the next task-queue drain.
    ///
    /// A second call while the close is pending is a no-op.
    pub fn close_async(&self, core: &mut UiCore, tasks: &mut TaskQueue) -> UiResult<()> {
        let parts = self.parts_mut(core)?;
        if parts.state == LifecycleState::PendingAsyncClose {
            tracing::trace!("message box {} already closing", self.root);
            return Ok(());
        }
        parts.state = LifecycleState::PendingAsyncClose;

        let msgbox = *self;
        tasks.enqueue("msgbox.close_async", move |core, _| msgbox.run_deferred_close(core));
        tracing::debug!("message box {} close scheduled", self.root);
        Ok(())
    }

    fn run_deferred_close(&self, core: &mut UiCore) {
        match self.parts(core) {
            Ok(parts) if parts.state == LifecycleState::PendingAsyncClose => {
                if let Err(err) = self.destroy(core, parts) {
                    tracing::warn!("deferred close of {} failed: {}", self.root, err);
                }
            }
            _ => tracing::trace!("stale deferred close for {}, skipping", self.root),
        }
    }

    fn destroy(&self, core: &mut UiCore, parts: MsgBoxParts) -> UiResult<()> {
        profile_function!();
        if let Some(overlay) = parts.overlay
            && core.overlays_mut().pop(overlay).is_none()
        {
            tracing::warn!("overlay {:?} of {} was already popped", overlay, self.root);
        }
        let top = parts.backdrop.unwrap_or(self.root);
        let freed = core.tree_mut().destroy_subtree(top)?;
        tracing::debug!("message box {} destroyed ({} nodes)", self.root, freed);
        Ok(())
    }
}

/// Wrap an allocation error as a construction failure.
fn construction<T>(result: UiResult<T>) -> UiResult<T> {
    result.map_err(|err| UiError::ConstructionFailure(Box::new(err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeConfig;

    #[test]
    fn test_options_builder() {
        let options = MsgBoxOptions::new()
            .title("T")
            .text("X")
            .button("Apply")
            .buttons(["Cancel"])
            .closable(true);
        assert_eq!(options.title.as_deref(), Some("T"));
        assert_eq!(options.buttons, vec!["Apply", "Cancel"]);
        assert!(options.closable);
    }

    #[test]
    fn test_minimal_box_has_only_content() {
        let mut core = UiCore::new();
        let screen = core.screen();
        let msgbox = MsgBox::create(&mut core, Some(screen), None, None, &[], false).unwrap();

        assert_eq!(msgbox.header(&core).unwrap(), None);
        assert_eq!(msgbox.title(&core).unwrap(), None);
        assert_eq!(msgbox.text(&core).unwrap(), None);
        assert_eq!(msgbox.close_button(&core).unwrap(), None);
        assert_eq!(msgbox.buttons(&core).unwrap(), None);
        assert_eq!(msgbox.active_button(&core).unwrap(), None);
        assert_eq!(msgbox.active_button_text(&core).unwrap(), None);
        assert_eq!(core.tree().children(msgbox.root()).unwrap(), &[msgbox.content(&core).unwrap()]);
    }

    #[test]
    fn test_subtree_order() {
        let mut core = UiCore::new();
        let screen = core.screen();
        let msgbox =
            MsgBox::create(&mut core, Some(screen), Some("T"), Some("X"), &["A"], true).unwrap();

        let header = msgbox.header(&core).unwrap().unwrap();
        let content = msgbox.content(&core).unwrap();
        let row = msgbox.buttons(&core).unwrap().unwrap();
        assert_eq!(core.tree().children(msgbox.root()).unwrap(), &[header, content, row]);

        let title = msgbox.title_label(&core).unwrap().unwrap();
        let close = msgbox.close_button(&core).unwrap().unwrap();
        assert_eq!(core.tree().children(header).unwrap(), &[title, close]);

        let caption = core.tree().children(close).unwrap()[0];
        assert_eq!(core.tree().label_text(caption).unwrap(), CLOSE_SYMBOL);
    }

    #[test]
    fn test_set_title_and_text() {
        let mut core = UiCore::new();
        let screen = core.screen();
        let msgbox = MsgBox::create(&mut core, Some(screen), Some("T"), None, &[], false).unwrap();

        assert!(msgbox.set_title(&mut core, "New").unwrap());
        assert_eq!(msgbox.title(&core).unwrap(), Some("New"));
        assert!(!msgbox.set_text(&mut core, "ignored").unwrap());
        assert_eq!(msgbox.text(&core).unwrap(), None);
    }

    #[test]
    fn test_parts_on_foreign_node() {
        let mut core = UiCore::new();
        let screen = core.screen();
        let container = core.tree_mut().create_node(screen, NodeKind::Container).unwrap();
        let fake = MsgBox { root: container };

        assert!(matches!(
            fake.content(&core),
            Err(UiError::WrongKind { expected: "message box", .. })
        ));
        assert!(!fake.is_alive(&core));
    }

    #[test]
    fn test_modal_backdrop_failure_is_construction_failure() {
        let mut core = UiCore::with_config(TreeConfig::with_max_nodes(0));
        let result = MsgBox::create(&mut core, None, Some("T"), None, &[], false);

        assert!(matches!(result, Err(UiError::ConstructionFailure(_))));
        assert!(core.overlays().is_empty());
        assert!(core.tree().children(core.top_layer()).unwrap().is_empty());
    }
}
