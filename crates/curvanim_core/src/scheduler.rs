// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cooperative per-frame task scheduling.
//!
//! A task is a closure called once per tick with the frame's delta time.
//! It keeps running until it returns [`TaskStatus::Finished`] or is
//! cancelled. Nothing blocks: "waiting for the next frame" means returning
//! from the closure.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Unique identifier for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a new random task ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// What a task wants after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Call again next tick
    Continue,
    /// Remove the task
    Finished,
}

/// A per-tick callback
pub type TickTask = Box<dyn FnMut(f32) -> TaskStatus>;

/// Source of ticks for cooperative tasks
pub trait Scheduler {
    /// Register a task; it first runs on the next tick
    fn schedule(&self, task: TickTask) -> TaskId;

    /// Cancel a task; returns false if it was not scheduled
    fn cancel(&self, id: TaskId) -> bool;

    /// Whether a task is still scheduled
    fn is_scheduled(&self, id: TaskId) -> bool;
}

/// Maximum time scale
const MAX_TIME_SCALE: f32 = 10.0;

/// Single-threaded frame scheduler
///
/// The host calls [`FrameScheduler::tick`] once per frame. Tasks run in the
/// order they were scheduled.
pub struct FrameScheduler {
    tasks: RefCell<IndexMap<TaskId, Rc<RefCell<TickTask>>>>,
    time_scale: Cell<f32>,
    frame_count: Cell<u64>,
    elapsed: Cell<f64>,
}

impl FrameScheduler {
    /// Create an idle scheduler
    pub fn new() -> Self {
        Self {
            tasks: RefCell::new(IndexMap::new()),
            time_scale: Cell::new(1.0),
            frame_count: Cell::new(0),
            elapsed: Cell::new(0.0),
        }
    }

    /// Create a shared scheduler
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Advance one frame
    ///
    /// Negative deltas are treated as zero. Tasks scheduled during this tick
    /// wait for the next one; tasks cancelled during this tick do not run.
    pub fn tick(&self, delta_time: f32) {
        let delta = delta_time.max(0.0) * self.time_scale.get();
        self.frame_count.set(self.frame_count.get() + 1);
        self.elapsed.set(self.elapsed.get() + f64::from(delta));

        let pending: Vec<TaskId> = self.tasks.borrow().keys().copied().collect();
        for id in pending {
            let Some(task) = self.tasks.borrow().get(&id).cloned() else {
                continue;
            };

            let status = match task.try_borrow_mut() {
                Ok(mut task) => (*task)(delta),
                Err(_) => {
                    tracing::warn!("Task {:?} ticked re-entrantly, skipping", id.0);
                    TaskStatus::Continue
                }
            };

            if status == TaskStatus::Finished {
                self.tasks.borrow_mut().shift_remove(&id);
            }
        }
    }

    /// Run `frames` ticks of a fixed delta
    pub fn run_frames(&self, frames: u32, delta_time: f32) {
        for _ in 0..frames {
            self.tick(delta_time);
        }
    }

    /// Number of scheduled tasks
    pub fn task_count(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Frames ticked so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count.get()
    }

    /// Scaled time ticked so far, in seconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed.get()
    }

    /// Current time scale
    pub fn time_scale(&self) -> f32 {
        self.time_scale.get()
    }

    /// Set time scale (clamped to [0, 10])
    pub fn set_time_scale(&self, scale: f32) {
        self.time_scale.set(scale.clamp(0.0, MAX_TIME_SCALE));
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for FrameScheduler {
    fn schedule(&self, task: TickTask) -> TaskId {
        let id = TaskId::new();
        self.tasks.borrow_mut().insert(id, Rc::new(RefCell::new(task)));
        id
    }

    fn cancel(&self, id: TaskId) -> bool {
        self.tasks.borrow_mut().shift_remove(&id).is_some()
    }

    fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.borrow().contains_key(&id)
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("tasks", &self.task_count())
            .field("time_scale", &self.time_scale.get())
            .field("frame_count", &self.frame_count.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_runs_until_finished() {
        let scheduler = FrameScheduler::new();
        let total = Rc::new(Cell::new(0.0_f32));

        let t = Rc::clone(&total);
        let id = scheduler.schedule(Box::new(move |dt| {
            t.set(t.get() + dt);
            if t.get() >= 1.0 {
                TaskStatus::Finished
            } else {
                TaskStatus::Continue
            }
        }));

        scheduler.run_frames(3, 0.25);
        assert!(scheduler.is_scheduled(id));
        scheduler.tick(0.25);
        assert!(!scheduler.is_scheduled(id));
        assert_eq!(total.get(), 1.0);
        assert_eq!(scheduler.frame_count(), 4);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let scheduler = FrameScheduler::new();
        let id = scheduler.schedule(Box::new(|_| TaskStatus::Continue));
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert_eq!(scheduler.task_count(), 0);
    }

    #[test]
    fn test_task_cancelled_mid_tick_does_not_run() {
        let scheduler = Rc::new(FrameScheduler::new());
        let victim = Rc::new(Cell::new(None::<TaskId>));
        let victim_runs = Rc::new(Cell::new(0));

        let s = Rc::clone(&scheduler);
        let v = Rc::clone(&victim);
        scheduler.schedule(Box::new(move |_| {
            if let Some(id) = v.get() {
                s.cancel(id);
            }
            TaskStatus::Finished
        }));
        let runs = Rc::clone(&victim_runs);
        victim.set(Some(scheduler.schedule(Box::new(move |_| {
            runs.set(runs.get() + 1);
            TaskStatus::Continue
        }))));

        scheduler.tick(0.1);
        assert_eq!(victim_runs.get(), 0);
        assert_eq!(scheduler.task_count(), 0);
    }

    #[test]
    fn test_task_scheduled_mid_tick_waits() {
        let scheduler = Rc::new(FrameScheduler::new());
        let late_runs = Rc::new(Cell::new(0));

        let s = Rc::clone(&scheduler);
        let runs = Rc::clone(&late_runs);
        scheduler.schedule(Box::new(move |_| {
            let runs = Rc::clone(&runs);
            s.schedule(Box::new(move |_| {
                runs.set(runs.get() + 1);
                TaskStatus::Finished
            }));
            TaskStatus::Finished
        }));

        scheduler.tick(0.1);
        assert_eq!(late_runs.get(), 0);
        scheduler.tick(0.1);
        assert_eq!(late_runs.get(), 1);
    }

    #[test]
    fn test_time_scale_and_negative_delta() {
        let scheduler = FrameScheduler::new();
        scheduler.set_time_scale(50.0);
        assert_eq!(scheduler.time_scale(), 10.0);
        scheduler.set_time_scale(2.0);

        let seen = Rc::new(Cell::new(0.0_f32));
        let s = Rc::clone(&seen);
        scheduler.schedule(Box::new(move |dt| {
            s.set(dt);
            TaskStatus::Continue
        }));

        scheduler.tick(0.5);
        assert_eq!(seen.get(), 1.0);
        scheduler.tick(-1.0);
        assert_eq!(seen.get(), 0.0);
        assert_eq!(scheduler.elapsed(), 1.0);
    }
}
