//! Node tree backed by generational slot storage.
//!
//! [`NodeId`]s are index + generation pairs. Destroying a node frees its slot
//! and bumps the generation, so every outstanding copy of the id becomes
//! detectably stale. Nothing in the tree dereferences a stale id.

use crate::error::{UiError, UiResult};
use crate::event::{EventHandler, EventKind, Observer, ObserverId};
use crate::node::{Capabilities, NodeKind};
use kestrel_core::alloc::{IndexSlot, SparseSet};
use kestrel_core::profiling::profile_function;
use std::fmt;

/// Generational node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(IndexSlot);

impl NodeId {
    /// Slot index inside the tree.
    pub fn index(&self) -> u32 {
        self.0.index()
    }

    /// Generation of the slot at the time this id was issued.
    pub fn generation(&self) -> u32 {
        self.0.generation()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index(), self.generation())
    }
}

/// Tree limits.
#[derive(Debug, Clone, Default)]
pub struct TreeConfig {
    /// Maximum number of non-root nodes. `None` means unbounded.
    pub max_nodes: Option<usize>,
}

impl TreeConfig {
    pub fn with_max_nodes(max_nodes: usize) -> Self {
        Self {
            max_nodes: Some(max_nodes),
        }
    }
}

/// Allocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes_created: u64,
    pub nodes_destroyed: u64,
}

/// A node in the tree.
pub struct UiNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub(crate) observers: Vec<Observer>,
    is_root: bool,
}

impl UiNode {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            observers: Vec::new(),
            is_root: parent.is_none(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }
}

/// Tree owning every live node.
pub struct UiTree {
    nodes: SparseSet<UiNode>,
    config: TreeConfig,
    /// Nodes counted against `max_nodes`.
    counted: usize,
    stats: TreeStats,
    next_observer: u64,
    /// Nodes whose observers are currently running, innermost last.
    dispatch_stack: Vec<NodeId>,
}

impl UiTree {
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            nodes: SparseSet::new(),
            config,
            counted: 0,
            stats: TreeStats::default(),
            next_observer: 0,
            dispatch_stack: Vec::new(),
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    /// Number of live nodes, roots included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a parentless root node. Roots are not counted against `max_nodes`.
    pub fn create_root(&mut self, kind: NodeKind) -> NodeId {
        self.stats.nodes_created += 1;
        NodeId(self.nodes.push(UiNode::new(kind, None)))
    }

    /// Create a node as the last child of `parent`.
    pub fn create_node(&mut self, parent: NodeId, kind: NodeKind) -> UiResult<NodeId> {
        profile_function!();
        let parent_node = self.node(parent)?;
        if !parent_node.kind.has(Capabilities::CONTAINER) {
            return Err(UiError::WrongKind {
                node: parent,
                expected: "container",
                found: parent_node.kind.name(),
            });
        }
        if let Some(max_nodes) = self.config.max_nodes
            && self.counted >= max_nodes
        {
            return Err(UiError::CapacityExceeded { max_nodes });
        }

        let id = NodeId(self.nodes.push(UiNode::new(kind, Some(parent))));
        self.counted += 1;
        self.stats.nodes_created += 1;
        self.nodes.get_mut(parent.0).children.push(id);
        Ok(id)
    }

    pub fn is_alive(&self, node: NodeId) -> bool {
        self.nodes.contains(node.0)
    }

    pub fn get(&self, node: NodeId) -> Option<&UiNode> {
        self.nodes.try_get(node.0)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut UiNode> {
        self.nodes.try_get_mut(node.0)
    }

    /// Like [`UiTree::get`] but reports stale ids as [`UiError::InvalidHandle`].
    pub fn node(&self, node: NodeId) -> UiResult<&UiNode> {
        self.get(node).ok_or(UiError::InvalidHandle(node))
    }

    pub fn node_mut(&mut self, node: NodeId) -> UiResult<&mut UiNode> {
        self.get_mut(node).ok_or(UiError::InvalidHandle(node))
    }

    pub fn parent(&self, node: NodeId) -> UiResult<Option<NodeId>> {
        Ok(self.node(node)?.parent)
    }

    pub fn children(&self, node: NodeId) -> UiResult<&[NodeId]> {
        Ok(&self.node(node)?.children)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Unlink `node` from its parent's child list. Returns the former parent.
    pub fn detach_from_parent(&mut self, node: NodeId) -> UiResult<Option<NodeId>> {
        let parent = self.node_mut(node)?.parent.take();
        if let Some(parent) = parent
            && let Some(parent_node) = self.get_mut(parent)
        {
            parent_node.children.retain(|&child| child != node);
        }
        Ok(parent)
    }

    /// Detach `node` and free it together with all of its descendants.
    ///
    /// Returns the number of nodes freed.
    pub fn destroy_subtree(&mut self, node: NodeId) -> UiResult<usize> {
        profile_function!();
        self.detach_from_parent(node)?;

        let mut pending = vec![node];
        let mut freed = 0;
        while let Some(id) = pending.pop() {
            if let Some(removed) = self.nodes.try_remove(id.0) {
                if !removed.is_root {
                    self.counted -= 1;
                }
                pending.extend(removed.children);
                freed += 1;
            }
        }
        self.stats.nodes_destroyed += freed as u64;
        tracing::trace!("destroyed subtree at {} ({} nodes)", node, freed);
        Ok(freed)
    }

    /// Replace the kind of an existing node.
    pub fn set_kind(&mut self, node: NodeId, kind: NodeKind) -> UiResult<NodeKind> {
        Ok(std::mem::replace(&mut self.node_mut(node)?.kind, kind))
    }

    /// The nearest node at or above `node` that accepts clicks.
    pub fn clickable_target(&self, node: NodeId) -> UiResult<Option<NodeId>> {
        let mut current = Some(self.node(node)?);
        let mut id = node;
        while let Some(n) = current {
            if n.kind.has(Capabilities::CLICKABLE) {
                return Ok(Some(id));
            }
            match n.parent {
                Some(parent) => {
                    id = parent;
                    current = self.get(parent);
                }
                None => current = None,
            }
        }
        Ok(None)
    }

    /// Every string held by a text node, in display order.
    pub fn texts(&self, node: NodeId) -> UiResult<Vec<&str>> {
        let n = self.node(node)?;
        if !n.kind.has(Capabilities::TEXT_HOLDER) {
            return Err(wrong_kind(node, "text holder", &n.kind));
        }
        Ok(match &n.kind {
            NodeKind::Label(label) => vec![label.text()],
            NodeKind::ButtonRow(row) => row.texts().collect(),
            _ => Vec::new(),
        })
    }

    pub fn label_text(&self, node: NodeId) -> UiResult<&str> {
        let n = self.node(node)?;
        match &n.kind {
            NodeKind::Label(label) => Ok(label.text()),
            other => Err(wrong_kind(node, "label", other)),
        }
    }

    /// Returns `true` if the text changed.
    pub fn set_label_text(&mut self, node: NodeId, text: impl Into<String>) -> UiResult<bool> {
        let n = self.node_mut(node)?;
        match &mut n.kind {
            NodeKind::Label(label) => Ok(label.set_text(text)),
            other => Err(wrong_kind(node, "label", other)),
        }
    }

    pub fn button_text(&self, node: NodeId, index: usize) -> UiResult<Option<&str>> {
        let n = self.node(node)?;
        match &n.kind {
            NodeKind::ButtonRow(row) => Ok(row.button_text(index)),
            other => Err(wrong_kind(node, "button row", other)),
        }
    }

    pub fn active_index(&self, node: NodeId) -> UiResult<Option<usize>> {
        let n = self.node(node)?;
        match &n.kind {
            NodeKind::ButtonRow(row) => Ok(row.active()),
            other => Err(wrong_kind(node, "button row", other)),
        }
    }

    /// Returns `true` if the selection changed; out-of-range indices are ignored.
    pub fn set_active_index(&mut self, node: NodeId, index: Option<usize>) -> UiResult<bool> {
        let n = self.node_mut(node)?;
        match &mut n.kind {
            NodeKind::ButtonRow(row) => Ok(row.set_active(index)),
            other => Err(wrong_kind(node, "button row", other)),
        }
    }

    /// Register `handler` on `node`. A `filter` of `None` receives every event kind.
    pub fn observe(
        &mut self,
        node: NodeId,
        filter: Option<EventKind>,
        handler: EventHandler,
    ) -> UiResult<ObserverId> {
        let id = ObserverId(self.next_observer);
        self.node_mut(node)?.observers.push(Observer {
            id,
            filter,
            handler,
        });
        self.next_observer += 1;
        Ok(id)
    }

    /// Remove an observer. Returns `false` if it was not registered on `node`.
    pub fn unobserve(&mut self, node: NodeId, observer: ObserverId) -> UiResult<bool> {
        let observers = &mut self.node_mut(node)?.observers;
        let before = observers.len();
        observers.retain(|o| o.id != observer);
        Ok(observers.len() != before)
    }

    /// Snapshot the handlers on `node` interested in `kind`.
    ///
    /// Handlers are cloned out so they can mutate the tree while running.
    pub(crate) fn handlers_for(&self, node: NodeId, kind: EventKind) -> Vec<EventHandler> {
        self.get(node)
            .map(|n| {
                n.observers
                    .iter()
                    .filter(|o| o.filter.is_none_or(|f| f == kind))
                    .map(|o| o.handler.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn push_dispatch_frame(&mut self, node: NodeId) {
        self.dispatch_stack.push(node);
    }

    pub(crate) fn pop_dispatch_frame(&mut self) {
        self.dispatch_stack.pop();
    }

    /// Whether any event dispatch is in progress.
    pub fn is_dispatching(&self) -> bool {
        !self.dispatch_stack.is_empty()
    }

    /// The innermost dispatching node inside the sub-tree rooted at `root`, if any.
    pub fn dispatching_within(&self, root: NodeId) -> Option<NodeId> {
        self.dispatch_stack
            .iter()
            .rev()
            .copied()
            .find(|&node| self.is_ancestor_or_self(root, node))
    }

    /// Ids of every live node.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter_slots().map(|(slot, _)| NodeId(slot)).collect()
    }
}

impl Default for UiTree {
    fn default() -> Self {
        Self::new()
    }
}

fn wrong_kind(node: NodeId, expected: &'static str, found: &NodeKind) -> UiError {
    UiError::WrongKind {
        node,
        expected,
        found: found.name(),
    }
}
