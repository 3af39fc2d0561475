//! Ordered connection-state observers.
//!
//! Notification is split in two steps so that observers see transitions in
//! exactly the order the manager made them:
//!
//! 1. [`ObserverList::enqueue`] is called while the manager still holds its
//!    state lock.  It only appends to a FIFO queue and updates the `watch`
//!    channel.
//! 2. [`ObserverList::drain`] runs after the lock is released and invokes
//!    observers, in registration order, for every queued transition.
//!
//! Only one caller drains at a time.  If an observer re-enters the manager
//! (say, calls `disconnect()` from inside a CLOSED notification), the
//! resulting transitions are queued and delivered by the drain already in
//! progress once the current round of observers has returned.

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use explorer_core::ConnectionState;
use tokio::sync::watch;

/// Handle returned when registering an observer; used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Arc<dyn Fn(ConnectionState) + Send + Sync>;

#[derive(Default)]
struct Queue {
    pending: VecDeque<ConnectionState>,
    draining: bool,
}

pub struct ObserverList {
    entries: Mutex<Vec<(ObserverId, Observer)>>,
    queue: Mutex<Queue>,
    watch: watch::Sender<ConnectionState>,
    next_id: AtomicU64,
}

impl ObserverList {
    pub fn new(initial: ConnectionState) -> Self {
        let (watch, _) = watch::channel(initial);
        Self {
            entries: Mutex::new(Vec::new()),
            queue: Mutex::new(Queue::default()),
            watch,
            next_id: AtomicU64::new(0),
        }
    }

    /// Appends `observer` to the end of the notification order.
    pub fn add<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.entries).push((id, Arc::new(observer)));
        id
    }

    /// Removes the observer registered as `id`.  Unknown ids are ignored.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A fresh receiver for the latest queued state.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.watch.subscribe()
    }

    /// Records a transition for delivery by the next [`drain`](Self::drain).
    pub fn enqueue(&self, state: ConnectionState) {
        lock(&self.queue).pending.push_back(state);
        self.watch.send_replace(state);
    }

    /// Delivers every queued transition to every observer.
    ///
    /// Emptiness is checked and `draining` cleared under the same queue lock,
    /// so a transition enqueued by another thread is either popped here or
    /// drained by that thread's own call.
    pub fn drain(&self) {
        {
            let mut queue = lock(&self.queue);
            if queue.draining {
                return;
            }
            queue.draining = true;
        }
        let mut reset = DrainGuard {
            queue: &self.queue,
            armed: true,
        };

        loop {
            let state = {
                let mut queue = lock(&self.queue);
                match queue.pending.pop_front() {
                    Some(state) => state,
                    None => {
                        queue.draining = false;
                        reset.armed = false;
                        return;
                    }
                }
            };
            // Snapshot so observers can add or remove observers.
            let snapshot: Vec<Observer> = lock(&self.entries)
                .iter()
                .map(|(_, observer)| Arc::clone(observer))
                .collect();
            for observer in snapshot {
                observer(state);
            }
        }
    }
}

/// Clears the `draining` flag if an observer panics mid-drain.
struct DrainGuard<'a> {
    queue: &'a Mutex<Queue>,
    armed: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.queue).draining = false;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
