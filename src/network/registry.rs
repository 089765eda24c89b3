//! Registry of cancelable in-flight tasks.
//!
//! Every network operation and every download driver runs as a spawned tokio
//! task tracked here, so a query change or a teardown can abort all of them in
//! one call.
//!
//! # Registration Protocol
//!
//! Registration is two-phase so the lock is never held across a spawn:
//!
//! 1. Reserve an id (entry is `Pending`)
//! 2. Spawn the task with a [`Deregister`] guard moved into its future
//! 3. Commit the abort handle, unless the entry is already gone
//!
//! If the entry vanished between steps 1 and 3, either the task already
//! finished (aborting it is a no-op) or [`TaskRegistry::cancel_all`] swept it
//! (aborting it is required). Both cases abort the fresh handle.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};

/// Identifier assigned to each registered task.
pub type TaskId = u64;

#[derive(Debug)]
enum Slot {
    Pending,
    Running(AbortHandle),
}

type Slots = Mutex<HashMap<TaskId, Slot>>;

/// Thread-safe set of cancelable task handles.
///
/// A single mutex serializes every add, remove, and cancel. The registry is
/// small (one search plus one driver or a handful of requests), so contention
/// is not a concern.
///
/// # Example
///
/// ```rust
/// use unsplash_grid::network::TaskRegistry;
///
/// # #[tokio::main]
/// # async fn main() {
/// let registry = TaskRegistry::new();
/// let handle = tokio::runtime::Handle::current();
///
/// let task = registry.spawn(&handle, async { 42 });
/// assert_eq!(task.await.unwrap(), 42);
/// assert_eq!(registry.in_flight(), 0);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct TaskRegistry {
    slots: Arc<Slots>,
    next_id: AtomicU64,
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `future` on `handle` and tracks it until it completes.
    ///
    /// The task deregisters itself on success, failure, panic, or abort.
    pub fn spawn<F>(&self, handle: &Handle, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.slots).insert(id, Slot::Pending);

        let guard = Deregister {
            id,
            slots: Arc::downgrade(&self.slots),
        };
        let task = handle.spawn(async move {
            let _guard = guard;
            future.await
        });

        let abort = task.abort_handle();
        let committed = match lock(&self.slots).get_mut(&id) {
            Some(slot) => {
                *slot = Slot::Running(abort.clone());
                true
            }
            None => false,
        };
        if !committed {
            abort.abort();
        }

        task
    }

    /// Aborts every tracked task and clears the registry.
    ///
    /// Idempotent. Aborted tasks observe cancellation at their next yield
    /// point; their [`JoinHandle`]s resolve to a cancelled `JoinError`.
    pub fn cancel_all(&self) {
        let drained: Vec<Slot> = lock(&self.slots).drain().map(|(_, slot)| slot).collect();
        let count = drained.len();

        for slot in drained {
            if let Slot::Running(abort) = slot {
                abort.abort();
            }
        }

        if count > 0 {
            tracing::debug!(count, "cancelled registered tasks");
        }
    }

    /// Number of tasks currently registered.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        lock(&self.slots).len()
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Removes a task's entry when its future is dropped.
struct Deregister {
    id: TaskId,
    slots: std::sync::Weak<Slots>,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            lock(&slots).remove(&self.id);
        }
    }
}

// The map holds no invariants a panicking holder could break.
fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<TaskId, Slot>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}
