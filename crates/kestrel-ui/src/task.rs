//! FIFO queue of deferred tasks.
//!
//! The event loop drains the queue once per iteration, after the input batch
//! has been dispatched and before the next poll. Tasks enqueued while the
//! queue is draining run on the following drain.

use crate::UiCore;
use kestrel_core::profiling::profile_function;
use std::collections::VecDeque;

/// Deferred work. Receives the core and the queue so it can schedule follow-ups.
pub type Task = Box<dyn FnOnce(&mut UiCore, &mut TaskQueue)>;

struct QueuedTask {
    label: &'static str,
    run: Task,
}

/// Loop-owned deferred task queue.
pub struct TaskQueue {
    tasks: VecDeque<QueuedTask>,
    total_run: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
            total_run: 0,
        }
    }

    /// Schedule `task` for the next drain. `label` is used for tracing only.
    pub fn enqueue<F>(&mut self, label: &'static str, task: F)
    where
        F: FnOnce(&mut UiCore, &mut TaskQueue) + 'static,
    {
        tracing::trace!("enqueue task {}", label);
        self.tasks.push_back(QueuedTask {
            label,
            run: Box::new(task),
        });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Total number of tasks run since creation.
    pub fn total_run(&self) -> u64 {
        self.total_run
    }

    /// Run every task queued before this call, in enqueue order.
    ///
    /// Returns the number of tasks run.
    pub fn drain(&mut self, core: &mut UiCore) -> usize {
        profile_function!();
        let batch = std::mem::take(&mut self.tasks);
        let count = batch.len();
        for task in batch {
            tracing::trace!("run task {}", task.label);
            (task.run)(core, self);
        }
        self.total_run += count as u64;
        count
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
