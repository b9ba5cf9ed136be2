//! Virtual-clock task queue.
//!
//! The session has three kinds of timed work: the render cycle, the
//! auto-step timer, and one decay timer per pulsing generator. They are all
//! entries in one [`Scheduler`]. The host advances the clock and the session
//! drains due tasks one at a time, so tasks never interleave.

use serde::Serialize;

use crate::error::{HarvestError, Result};

use super::MIN_TIMER_PERIOD_MS;

/// Cancellation handle for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskHandle(u64);

/// Work the session performs when a task comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "task", content = "component", rename_all = "snake_case")]
pub enum Task {
    RenderFrame,
    AutoStep,
    Decay(crate::circuit::ComponentId),
}

#[derive(Debug, Clone)]
struct Entry {
    handle: TaskHandle,
    task: Task,
    due_ms: f64,
    period_ms: Option<f64>,
}

/// Pending tasks and the clock they are measured against.
///
/// The clock only moves inside [`next_due`](Scheduler::next_due) and
/// [`settle`](Scheduler::settle).
#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: f64,
    next_handle: u64,
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock, in milliseconds.
    pub fn now(&self) -> f64 {
        self.now_ms
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending tasks with their due times, in no particular order.
    pub fn pending(&self) -> impl Iterator<Item = (TaskHandle, Task, f64)> + '_ {
        self.entries.iter().map(|e| (e.handle, e.task, e.due_ms))
    }

    /// Whether a handle still refers to a pending task.
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    fn push(&mut self, task: Task, delay_ms: f64, period_ms: Option<f64>) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(Entry {
            handle,
            task,
            due_ms: self.now_ms + delay_ms.max(0.0),
            period_ms,
        });
        handle
    }

    /// Run `task` once, `delay_ms` from now.
    pub fn schedule_once(&mut self, task: Task, delay_ms: f64) -> TaskHandle {
        self.push(task, delay_ms, None)
    }

    /// Run `task` every `period_ms`, first one period from now.
    ///
    /// Fails if the period is not accepted by [`check_period`].
    pub fn schedule_every(&mut self, task: Task, period_ms: f64) -> Result<TaskHandle> {
        check_period(period_ms)?;
        Ok(self.push(task, period_ms, Some(period_ms)))
    }

    /// Cancel a task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Pop the earliest task due at or before `until_ms`, moving the clock
    /// to its due time. Ties go to the task scheduled first. Repeating tasks
    /// are re-armed one period later.
    pub fn next_due(&mut self, until_ms: f64) -> Option<(TaskHandle, Task)> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= until_ms)
            .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms).then(a.handle.cmp(&b.handle)))
            .map(|(i, _)| i)?;

        let entry = &mut self.entries[index];
        self.now_ms = self.now_ms.max(entry.due_ms);
        let fired = (entry.handle, entry.task);
        if let Some(period) = entry.period_ms {
            entry.due_ms += period;
        } else {
            self.entries.remove(index);
        }
        Some(fired)
    }

    /// Move the clock forward to `until_ms` once nothing more is due.
    pub fn settle(&mut self, until_ms: f64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}

/// A repeating period must be finite and at least [`MIN_TIMER_PERIOD_MS`].
pub fn check_period(period_ms: f64) -> Result<()> {
    if period_ms.is_finite() && period_ms >= MIN_TIMER_PERIOD_MS {
        Ok(())
    } else {
        Err(HarvestError::invalid_parameter(
            "period",
            format!("must be at least {MIN_TIMER_PERIOD_MS}ms, got {period_ms}"),
        ))
    }
}
