//! FIFO admission to a single active slot.
//!
//! The queue enforces two invariants:
//!
//! 1. At most one item is current at any instant; a current item is never
//!    also in the waiting list.
//! 2. Items are activated in the order their entries were appended, subject
//!    only to removal of not-yet-activated entries.
//!
//! The admission check is never run inline inside [`AdmissionQueue::add`] or
//! [`AdmissionQueue::remove`]; it is spawned onto the executor and runs after
//! the current synchronous call stack unwinds. On a cooperative runtime this
//! guarantees that a synchronous burst of `add` calls from independent call
//! sites is fully recorded before the first of them can be promoted, which is
//! what makes admission fair across "simultaneous" requests.
//!
//! Items are referenced, never owned: the queue holds `Arc` handles and
//! compares identity with `Arc::ptr_eq`, so the item's lifetime and behavior
//! remain the caller's responsibility. There is no timeout built into the
//! queue; an item that never calls `remove` after activation holds the slot
//! forever.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::topic;
use crate::error::Revoked;
use crate::events::{EventRegistry, ListenerId, OnceEvent};
use crate::runtime::Spawn;

/// Record delivered when an item is promoted to the active slot.
pub struct Admitted<T> {
    /// The item now occupying the slot.
    pub item: Arc<T>,
}

impl<T> Clone for Admitted<T> {
    fn clone(&self) -> Self {
        Self {
            item: Arc::clone(&self.item),
        }
    }
}

impl<T> fmt::Debug for Admitted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admitted").finish_non_exhaustive()
    }
}

/// Notification published by the queue through its event registry.
///
/// The queue never inspects items, so the payload carries only the `Arc`
/// handle (or nothing, for [`QueueEvent::Empty`]).
pub enum QueueEvent<T> {
    /// A waiting entry was recorded for this item.
    Added(Arc<T>),
    /// Entries matching this item were removed (waiting, current, or both).
    Removed(Arc<T>),
    /// This item was promoted to the active slot.
    Activated(Admitted<T>),
    /// An admission check ran with nothing waiting and no current item.
    Empty,
}

impl<T> Clone for QueueEvent<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Added(item) => Self::Added(Arc::clone(item)),
            Self::Removed(item) => Self::Removed(Arc::clone(item)),
            Self::Activated(admitted) => Self::Activated(admitted.clone()),
            Self::Empty => Self::Empty,
        }
    }
}

impl<T> fmt::Debug for QueueEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added(_) => f.write_str("Added"),
            Self::Removed(_) => f.write_str("Removed"),
            Self::Activated(_) => f.write_str("Activated"),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

struct WaitingEntry<T> {
    item: Arc<T>,
    activate: oneshot::Sender<Admitted<T>>,
}

struct QueueState<T> {
    waiting: VecDeque<WaitingEntry<T>>,
    current: Option<Arc<T>>,
}

struct QueueCore<T> {
    state: Mutex<QueueState<T>>,
    registry: EventRegistry<QueueEvent<T>>,
}

enum CheckOutcome<T> {
    Busy,
    Promoted(WaitingEntry<T>),
    Idle,
}

impl<T> QueueCore<T>
where
    T: Send + Sync + 'static,
{
    fn run_admission_check(&self) {
        let outcome = {
            let mut state = self.state.lock();
            if state.current.is_some() {
                CheckOutcome::Busy
            } else if let Some(entry) = state.waiting.pop_front() {
                state.current = Some(Arc::clone(&entry.item));
                CheckOutcome::Promoted(entry)
            } else {
                CheckOutcome::Idle
            }
        };

        // State lock released: listeners may re-enter the queue.
        match outcome {
            CheckOutcome::Busy => tracing::trace!("admission check: slot occupied"),
            CheckOutcome::Promoted(entry) => {
                let admitted = Admitted {
                    item: Arc::clone(&entry.item),
                };
                // The awaiting side may already be gone; activation is then
                // delivered to subscribers only.
                let _ = entry.activate.send(admitted.clone());
                tracing::debug!("slot granted to head of queue");
                self.registry
                    .emit(topic::ACTIVATED, &QueueEvent::Activated(admitted));
            }
            CheckOutcome::Idle => {
                tracing::trace!("admission check: queue idle");
                self.registry.emit(topic::EMPTY, &QueueEvent::Empty);
            }
        }
    }
}

/// FIFO queue serializing exclusive access to a single active slot.
///
/// `T` is the item type; items are handled as `Arc<T>` and matched by pointer
/// identity. `S` is the [`Spawn`] implementation used to schedule the
/// deferred admission check (the built-in [`TokioSpawner`] under the default
/// `tokio-runtime` feature).
///
/// The queue is cheap to clone; clones share the same slot, waiting list, and
/// event registry.
///
/// [`TokioSpawner`]: crate::runtime::TokioSpawner
pub struct AdmissionQueue<T, S> {
    core: Arc<QueueCore<T>>,
    spawner: S,
}

impl<T, S: Clone> Clone for AdmissionQueue<T, S> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            spawner: self.spawner.clone(),
        }
    }
}

#[cfg(feature = "tokio-runtime")]
impl<T> AdmissionQueue<T, crate::runtime::TokioSpawner>
where
    T: Send + Sync + 'static,
{
    /// Creates a queue that schedules its admission checks on the ambient
    /// tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_spawner(crate::runtime::TokioSpawner::current())
    }
}

#[cfg(feature = "tokio-runtime")]
impl<T> Default for AdmissionQueue<T, crate::runtime::TokioSpawner>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> AdmissionQueue<T, S>
where
    T: Send + Sync + 'static,
    S: Spawn,
{
    /// Creates a queue that schedules its admission checks with `spawner`.
    pub fn with_spawner(spawner: S) -> Self {
        Self {
            core: Arc::new(QueueCore {
                state: Mutex::new(QueueState {
                    waiting: VecDeque::new(),
                    current: None,
                }),
                registry: EventRegistry::new(),
            }),
            spawner,
        }
    }

    /// Appends a waiting entry for `item` and returns a future that resolves
    /// once the item occupies the active slot.
    ///
    /// The admission check is deferred, never run inside `add` itself: a
    /// synchronous burst of `add` calls is fully recorded before the first
    /// entry can be promoted. Emits `"added"` synchronously.
    ///
    /// Nothing prevents the same identity from being added twice while still
    /// waiting; the two entries activate independently and
    /// [`remove`](Self::remove) purges both. Callers that need uniqueness
    /// must enforce it themselves.
    ///
    /// The returned future resolves with [`Revoked`] if the entry is removed
    /// (or the queue dropped) before activation.
    pub fn add(&self, item: Arc<T>) -> Admission<T> {
        let (tx, rx) = oneshot::channel();
        let depth = {
            let mut state = self.core.state.lock();
            state.waiting.push_back(WaitingEntry {
                item: Arc::clone(&item),
                activate: tx,
            });
            state.waiting.len()
        };
        tracing::debug!(waiting = depth, "admission request recorded");
        self.core.registry.emit(topic::ADDED, &QueueEvent::Added(item));
        self.schedule_check();
        Admission { rx }
    }

    /// Removes every entry whose item is pointer-equal to `item`, waiting or
    /// current, then schedules an admission check.
    ///
    /// Waiting entries that are dropped resolve their [`Admission`] futures
    /// with [`Revoked`]. If the current item matched, the slot is freed and
    /// the next waiting item (if any) is admitted by the deferred check.
    /// `"removed"` is emitted only when something actually matched; removing
    /// an unknown item or removing twice is a silent no-op beyond the check.
    pub fn remove(&self, item: &Arc<T>) {
        let (dropped, was_current) = {
            let mut state = self.core.state.lock();
            let before = state.waiting.len();
            state
                .waiting
                .retain(|entry| !Arc::ptr_eq(&entry.item, item));
            let dropped = before - state.waiting.len();
            let was_current = state
                .current
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, item));
            if was_current {
                state.current = None;
            }
            (dropped, was_current)
        };

        if dropped > 0 || was_current {
            tracing::debug!(dropped, was_current, "queue entry removed");
            self.core
                .registry
                .emit(topic::REMOVED, &QueueEvent::Removed(Arc::clone(item)));
        } else {
            tracing::trace!("remove: no matching entry");
        }
        self.schedule_check();
    }

    /// Schedules an admission check without mutating queue state.
    ///
    /// On an idle queue the check publishes `"empty"`; otherwise it admits
    /// the head entry if the slot is free. Useful for probing a fresh queue.
    pub fn kick(&self) {
        self.schedule_check();
    }

    /// Number of entries currently waiting (excludes the current item).
    pub fn waiting_len(&self) -> usize {
        self.core.state.lock().waiting.len()
    }

    /// The item currently occupying the slot, if any.
    pub fn current(&self) -> Option<Arc<T>> {
        self.core.state.lock().current.clone()
    }

    /// Registers a durable listener on the queue's event registry.
    ///
    /// See [`topic`] for the published names. Pass-through to
    /// [`EventRegistry::subscribe`].
    pub fn subscribe(
        &self,
        event: impl Into<String>,
        listener: impl Fn(&QueueEvent<T>) + Send + Sync + 'static,
    ) -> ListenerId {
        self.core.registry.subscribe(event, listener)
    }

    /// Returns a future resolving with the payload of the next emission of
    /// `event`. Pass-through to [`EventRegistry::subscribe_once`].
    pub fn subscribe_once(&self, event: impl Into<String>) -> OnceEvent<QueueEvent<T>> {
        self.core.registry.subscribe_once(event)
    }

    /// Removes a durable listener. Pass-through to
    /// [`EventRegistry::unsubscribe`].
    pub fn unsubscribe(&self, id: ListenerId) {
        self.core.registry.unsubscribe(id);
    }

    fn schedule_check(&self) {
        let core = Arc::clone(&self.core);
        self.spawner.spawn(async move {
            core.run_admission_check();
        });
    }
}

/// Future returned by [`AdmissionQueue::add`].
///
/// Resolves with [`Admitted`] once the item occupies the active slot, or with
/// [`Revoked`] if the entry was removed (or its queue dropped) before
/// activation. Admission cannot otherwise fail, only be delayed.
#[must_use = "futures do nothing unless awaited"]
pub struct Admission<T> {
    rx: oneshot::Receiver<Admitted<T>>,
}

impl<T> Future for Admission<T> {
    type Output = Result<Admitted<T>, Revoked>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map_err(|_| Revoked)
    }
}

impl<T> fmt::Debug for Admission<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admission").finish_non_exhaustive()
    }
}
