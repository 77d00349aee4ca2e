//! Single-threaded event loop driver.
//!
//! One iteration polls the input queue, dispatches the whole batch, then
//! drains the deferred task queue exactly once. Deferred work therefore runs
//! strictly after the batch that scheduled it and strictly before the next
//! poll.

use crate::UiCore;
use crate::error::UiResult;
use crate::event::{self, HandleStatus, UiEvent};
use crate::task::TaskQueue;
use crate::tree::NodeId;
use kestrel_core::math::Vec2;
use kestrel_core::profiling::{self, profile_function};
use std::collections::VecDeque;

/// Raw pointer input routed to a node.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Click {
        target: NodeId,
        item: Option<usize>,
        position: Vec2,
    },
}

impl InputEvent {
    pub fn click(target: NodeId) -> Self {
        InputEvent::Click {
            target,
            item: None,
            position: Vec2::ZERO,
        }
    }

    pub fn click_item(target: NodeId, item: usize) -> Self {
        InputEvent::Click {
            target,
            item: Some(item),
            position: Vec2::ZERO,
        }
    }

    pub fn target(&self) -> NodeId {
        match self {
            InputEvent::Click { target, .. } => *target,
        }
    }

    fn to_ui_event(&self) -> UiEvent {
        match self {
            InputEvent::Click { item, position, .. } => UiEvent::Clicked {
                item: *item,
                position: *position,
            },
        }
    }
}

/// Pending input collected between iterations.
#[derive(Default)]
pub struct InputQueue {
    pending: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.pending.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take everything queued so far as one batch.
    pub fn drain(&mut self) -> EventBatch {
        EventBatch {
            events: self.pending.drain(..).collect(),
        }
    }
}

/// Input events dispatched together in one iteration.
#[derive(Debug, Default)]
pub struct EventBatch {
    events: Vec<InputEvent>,
}

impl EventBatch {
    pub fn new(events: Vec<InputEvent>) -> Self {
        Self { events }
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Run `handler` over every event, keeping the ones it did not consume.
    pub fn dispatch<H>(&mut self, mut handler: H)
    where
        H: FnMut(&InputEvent) -> HandleStatus,
    {
        self.events.retain(|event| {
            let status = handler(event);
            !status.is_consumed()
        });
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct EventStats {
    pub iterations: u64,
    pub events_dispatched: u64,
    /// Dropped because the target was dead or outside a capturing overlay.
    pub events_blocked: u64,
    pub tasks_run: u64,
}

/// Owns the UI core, the input queue and the deferred task queue.
pub struct EventLoop {
    core: UiCore,
    input: InputQueue,
    tasks: TaskQueue,
    stats: EventStats,
}

impl EventLoop {
    pub fn new(core: UiCore) -> Self {
        Self {
            core,
            input: InputQueue::new(),
            tasks: TaskQueue::new(),
            stats: EventStats::default(),
        }
    }

    pub fn core(&self) -> &UiCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut UiCore {
        &mut self.core
    }

    pub fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    /// Split borrow of the core and the task queue.
    pub fn parts_mut(&mut self) -> (&mut UiCore, &mut TaskQueue) {
        (&mut self.core, &mut self.tasks)
    }

    pub fn stats(&self) -> &EventStats {
        &self.stats
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Send an event straight to `target`, bypassing modality checks.
    pub fn send_event(&mut self, target: NodeId, event: UiEvent) -> UiResult<HandleStatus> {
        event::dispatch(&mut self.core, &mut self.tasks, target, event)
    }

    /// Run every queued deferred task once.
    pub fn drain_tasks(&mut self) -> usize {
        let run = self.tasks.drain(&mut self.core);
        self.stats.tasks_run += run as u64;
        run
    }

    /// Poll the input queue, dispatch the batch, then drain deferred tasks.
    ///
    /// Returns the events nobody consumed.
    pub fn run_once(&mut self) -> EventBatch {
        profile_function!();
        profiling::new_frame();
        self.stats.iterations += 1;

        let mut batch = self.input.drain();
        let core = &mut self.core;
        let tasks = &mut self.tasks;
        let stats = &mut self.stats;
        batch.dispatch(|input| {
            let target = input.target();
            if !core.tree().is_alive(target) {
                tracing::trace!("dropping input for dead node {}", target);
                stats.events_blocked += 1;
                return HandleStatus::consumed();
            }
            if !core.overlays().accepts_input(core.tree(), target) {
                tracing::debug!("input to {} blocked by modal overlay", target);
                stats.events_blocked += 1;
                return HandleStatus::consumed();
            }
            stats.events_dispatched += 1;
            match event::dispatch(core, tasks, target, input.to_ui_event()) {
                Ok(status) => status,
                Err(err) => {
                    tracing::warn!("dispatch to {} failed: {}", target, err);
                    HandleStatus::consumed()
                }
            }
        });

        self.drain_tasks();
        batch
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new(UiCore::new())
    }
}
