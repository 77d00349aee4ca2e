//! Typed events, per-node observers and bubbling dispatch.
//!
//! Events are delivered to the target node's observers first and then bubble
//! up through its ancestors until a handler consumes them or the root is
//! reached. Observers receive an [`EventContext`] with mutable access to the
//! [`UiCore`] and the loop's [`TaskQueue`], so a handler may mutate or even
//! destroy the tree it is being dispatched from; dispatch re-validates every
//! node before touching it again.

use crate::UiCore;
use crate::error::UiResult;
use crate::node::NodeKind;
use crate::task::TaskQueue;
use crate::tree::NodeId;
use bitflags::bitflags;
use kestrel_core::math::Vec2;
use kestrel_core::profiling::profile_function;
use std::rc::Rc;

/// Event discriminant, used to filter observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Clicked,
    ValueChanged,
}

/// A UI event with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// The node was clicked. `item` is the sub-item hit on multi-item nodes
    /// such as button rows.
    Clicked { item: Option<usize>, position: Vec2 },
    /// The node's selection changed.
    ValueChanged { index: Option<usize> },
}

impl UiEvent {
    /// A click with no sub-item.
    pub fn click() -> Self {
        UiEvent::Clicked {
            item: None,
            position: Vec2::ZERO,
        }
    }

    /// A click on sub-item `item` (e.g. one button of a button row).
    pub fn click_item(item: usize) -> Self {
        UiEvent::Clicked {
            item: Some(item),
            position: Vec2::ZERO,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            UiEvent::Clicked { .. } => EventKind::Clicked,
            UiEvent::ValueChanged { .. } => EventKind::ValueChanged,
        }
    }
}

bitflags! {
    /// Result of handling an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HandleStatus: u8 {
        const HANDLED = 0b00000001;
        const CONSUMED = 0b00000010;
    }
}

impl HandleStatus {
    pub const fn is_consumed(&self) -> bool {
        self.contains(Self::CONSUMED)
    }

    pub const fn is_handled(&self) -> bool {
        self.contains(Self::HANDLED)
    }

    /// Handled and stops propagation.
    pub const fn consumed() -> Self {
        Self::from_bits_truncate(Self::HANDLED.bits() | Self::CONSUMED.bits())
    }

    pub const fn handled() -> Self {
        Self::from_bits_truncate(Self::HANDLED.bits())
    }

    pub const fn ignored() -> Self {
        Self::empty()
    }
}

/// Observer callback.
pub type EventHandler = Rc<dyn Fn(&mut EventContext<'_>, &UiEvent) -> HandleStatus>;

/// Identifies a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

pub(crate) struct Observer {
    pub(crate) id: ObserverId,
    pub(crate) filter: Option<EventKind>,
    pub(crate) handler: EventHandler,
}

/// What a handler can reach while it runs.
pub struct EventContext<'a> {
    pub core: &'a mut UiCore,
    pub tasks: &'a mut TaskQueue,
    target: NodeId,
    current_target: NodeId,
}

impl EventContext<'_> {
    /// Node the event was originally sent to.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose observer is running now.
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }
}

/// Build an [`EventHandler`] from a closure.
pub fn handler<F>(f: F) -> EventHandler
where
    F: Fn(&mut EventContext<'_>, &UiEvent) -> HandleStatus + 'static,
{
    Rc::new(f)
}

/// Send `event` to `target`, running built-in node behaviour first and then
/// bubbling through observers.
///
/// Clicks are delivered to the nearest clickable node at or above `target`;
/// a click with no clickable node on its path is ignored.
pub fn dispatch(
    core: &mut UiCore,
    tasks: &mut TaskQueue,
    target: NodeId,
    event: UiEvent,
) -> UiResult<HandleStatus> {
    profile_function!();
    let target = match event.kind() {
        EventKind::Clicked => match core.tree().clickable_target(target)? {
            Some(clickable) => clickable,
            None => {
                tracing::trace!("click on {} has no clickable target", target);
                return Ok(HandleStatus::ignored());
            }
        },
        EventKind::ValueChanged => target,
    };
    let node = core.tree().node(target)?;
    let mut status = HandleStatus::ignored();

    if let (NodeKind::ButtonRow(row), UiEvent::Clicked { item: Some(index), .. }) =
        (&node.kind, &event)
    {
        let index = *index;
        if index < row.len() {
            core.tree_mut().set_active_index(target, Some(index))?;
            tracing::trace!("button {} of {} activated", index, target);
            status |= bubble(
                core,
                tasks,
                target,
                &UiEvent::ValueChanged { index: Some(index) },
            );
            if !core.tree().is_alive(target) {
                return Ok(status);
            }
        } else {
            tracing::trace!("click on {} hit item {} out of range", target, index);
        }
    }

    status |= bubble(core, tasks, target, &event);
    Ok(status)
}

fn bubble(
    core: &mut UiCore,
    tasks: &mut TaskQueue,
    target: NodeId,
    event: &UiEvent,
) -> HandleStatus {
    let kind = event.kind();
    let mut status = HandleStatus::ignored();
    let mut current = Some(target);

    while let Some(node) = current {
        let handlers = core.tree().handlers_for(node, kind);
        core.tree_mut().push_dispatch_frame(node);
        for handler in handlers {
            let mut ctx = EventContext {
                core: &mut *core,
                tasks: &mut *tasks,
                target,
                current_target: node,
            };
            let result = handler(&mut ctx, event);
            status |= result;
            if result.is_consumed() || !core.tree().is_alive(node) {
                break;
            }
        }
        core.tree_mut().pop_dispatch_frame();

        if status.is_consumed() {
            break;
        }
        current = match core.tree().get(node) {
            Some(n) => n.parent,
            None => {
                tracing::warn!("{} was destroyed during its own dispatch; propagation stopped", node);
                None
            }
        };
    }
    status
}
