//! Deferred execution.
//!
//! A single [`Scheduler`] thread owns a deadline-ordered queue of tasks, fed
//! through a channel. [`Clock`] binds a box handle to the scheduler: when a
//! delay expires the box's [`Object::tick`](crate::Object::tick) runs only if
//! the box still exists in its patcher. There is no cancel operation; removing
//! the box is what cancels its pending delays.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::graph::BoxHandle;

type Task = Box<dyn FnOnce() + Send>;

/// Longest accepted delay (one year); longer requests are clamped.
pub const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

enum Command {
    Schedule(Pending),
    Shutdown,
}

struct Pending {
    deadline: Instant,
    seq: u64,
    task: Task,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // Reversed: BinaryHeap is a max-heap and the earliest deadline must pop first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Timer thread running deferred tasks in deadline order.
pub struct Scheduler {
    sender: Sender<Command>,
    thread: Mutex<Option<JoinHandle<()>>>,
    seq: AtomicU64,
    pending: Arc<AtomicUsize>,
}

impl Scheduler {
    /// Spawns the scheduler thread.
    pub fn new() -> std::io::Result<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let pending = Arc::new(AtomicUsize::new(0));
        let thread_pending = Arc::clone(&pending);
        let thread = std::thread::Builder::new()
            .name("kumiko-scheduler".into())
            .spawn(move || run(&receiver, &thread_pending))?;
        tracing::debug!("scheduler started");
        Ok(Self {
            sender,
            thread: Mutex::new(Some(thread)),
            seq: AtomicU64::new(0),
            pending,
        })
    }

    /// Runs `task` on the scheduler thread once `delay` has elapsed.
    ///
    /// Returns false if the scheduler has been shut down.
    pub fn schedule_after(&self, delay: Duration, task: impl FnOnce() + Send + 'static) -> bool {
        let pending = Pending {
            deadline: Instant::now() + delay.min(MAX_DELAY),
            seq: self.seq.fetch_add(1, AtomicOrdering::Relaxed),
            task: Box::new(task),
        };
        self.pending.fetch_add(1, AtomicOrdering::SeqCst);
        if self.sender.send(Command::Schedule(pending)).is_err() {
            self.pending.fetch_sub(1, AtomicOrdering::SeqCst);
            tracing::warn!("task scheduled after scheduler shutdown");
            return false;
        }
        true
    }

    /// Runs `f(owner)` after `delay` if `owner` is still alive then.
    ///
    /// Only a weak reference is held while the task waits.
    pub fn delay<T, F>(&self, owner: &Arc<T>, delay: Duration, f: F) -> bool
    where
        T: Send + Sync + 'static,
        F: FnOnce(Arc<T>) + Send + 'static,
    {
        let weak: Weak<T> = Arc::downgrade(owner);
        self.schedule_after(delay, move || {
            if let Some(owner) = weak.upgrade() {
                f(owner);
            }
        })
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.pending.load(AtomicOrdering::SeqCst)
    }

    /// Stops the thread and drops every pending task. Idempotent.
    pub fn shutdown(&self) {
        let Some(thread) = self.thread.lock().take() else {
            return;
        };
        let _ = self.sender.send(Command::Shutdown);
        // The last handle can be dropped by a task on the scheduler thread itself.
        if thread.thread().id() == std::thread::current().id() {
            return;
        }
        if thread.join().is_err() {
            tracing::error!("scheduler thread panicked");
        }
        self.pending.store(0, AtomicOrdering::SeqCst);
        tracing::debug!("scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

fn run(receiver: &Receiver<Command>, pending: &AtomicUsize) {
    let mut queue: BinaryHeap<Pending> = BinaryHeap::new();
    loop {
        let now = Instant::now();
        while queue.peek().is_some_and(|p| p.deadline <= now) {
            if let Some(due) = queue.pop() {
                pending.fetch_sub(1, AtomicOrdering::SeqCst);
                (due.task)();
            }
        }

        let command = match queue.peek() {
            Some(next) => {
                let wait = next.deadline.saturating_duration_since(Instant::now());
                match receiver.recv_timeout(wait) {
                    Ok(command) => command,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match receiver.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };

        match command {
            Command::Schedule(task) => queue.push(task),
            Command::Shutdown => break,
        }
    }
}

/// A box-bound one-shot timer.
///
/// Every call to [`delay`](Self::delay) schedules an independent tick.
#[derive(Clone)]
pub struct Clock {
    scheduler: Arc<Scheduler>,
    owner: BoxHandle,
}

impl Clock {
    /// Creates a clock ticking `owner` through `scheduler`.
    pub fn new(scheduler: Arc<Scheduler>, owner: BoxHandle) -> Self {
        Self { scheduler, owner }
    }

    /// Ticks the owner after `milliseconds`, if it still exists then.
    pub fn delay(&self, milliseconds: f64) -> bool {
        let seconds = if milliseconds.is_finite() {
            (milliseconds / 1000.0).clamp(0.0, MAX_DELAY.as_secs_f64())
        } else {
            0.0
        };
        self.delay_for(Duration::from_secs_f64(seconds))
    }

    /// Ticks the owner after `duration`, if it still exists then.
    pub fn delay_for(&self, duration: Duration) -> bool {
        let owner = self.owner.clone();
        self.scheduler.schedule_after(duration, move || {
            owner.tick();
        })
    }

    /// The box this clock ticks.
    pub fn owner(&self) -> &BoxHandle {
        &self.owner
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock").field("owner", &self.owner).finish()
    }
}
