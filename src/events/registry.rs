//! Named-event store with durable and single-use listeners.
//!
//! [`EventRegistry`] maps an event name to an ordered list of listeners.
//! Listeners are stored as `Arc<dyn Fn(&E)>`, so taking a snapshot for a
//! delivery pass is cheap. Snapshot-on-emit semantics mean:
//!
//! - A listener removed *during* a pass is still called in that pass.
//! - A listener added *during* a pass is not called until the next `emit`.
//! - Removing a single-use listener never perturbs the position of listeners
//!   not yet visited in the current pass.
//!
//! Panics inside a listener propagate to the caller of [`EventRegistry::emit`]
//! and abort delivery to the remaining listeners in that pass. The registry
//! does not isolate listeners from each other; one bad subscriber can break
//! delivery to the subscribers after it. This is a deliberate simplicity
//! trade-off, stated here rather than hidden.
//!
//! All methods take `&self` (interior mutability via `parking_lot::Mutex`),
//! and the lock is never held while a listener runs, so listeners may call
//! back into the registry during delivery without deadlocking.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::EventClosed;

/// Identifier for a registered listener, accepted by
/// [`EventRegistry::unsubscribe`].
pub type ListenerId = u64;

type ListenerFn<E> = dyn Fn(&E) + Send + Sync;

struct ListenerEntry<E> {
    id: ListenerId,
    once: bool,
    call: Arc<ListenerFn<E>>,
}

/// Named-event publish/subscribe store.
///
/// `E` is the payload type delivered to listeners. Events are addressed by
/// name; within one name, listeners are invoked in registration order.
///
/// ```
/// use turnstile::EventRegistry;
///
/// let registry = EventRegistry::new();
/// registry.subscribe("closed", |n: &u32| assert_eq!(*n, 7));
/// registry.emit("closed", &7);
/// ```
pub struct EventRegistry<E> {
    listeners: Mutex<HashMap<String, Vec<ListenerEntry<E>>>>,
    next_id: AtomicU64,
}

impl<E> EventRegistry<E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a durable listener for `event`.
    ///
    /// The listener stays registered until [`EventRegistry::unsubscribe`] is
    /// called with the returned id.
    pub fn subscribe(
        &self,
        event: impl Into<String>,
        listener: impl Fn(&E) + Send + Sync + 'static,
    ) -> ListenerId {
        self.push(event.into(), false, Arc::new(listener))
    }

    /// Registers a single-use listener and returns a future that resolves
    /// with a clone of the payload of the first `emit` of `event`.
    ///
    /// The listener is removed after the delivery pass that invoked it. The
    /// future suspends its awaiter, never the emitter; it resolves with
    /// [`EventClosed`] only if the registry is dropped before the event fires.
    pub fn subscribe_once(&self, event: impl Into<String>) -> OnceEvent<E>
    where
        E: Clone + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let slot = Mutex::new(Some(tx));
        self.push(
            event.into(),
            true,
            Arc::new(move |payload: &E| {
                // The sender is consumed on first call, so a re-entrant emit
                // that snapshots this entry again delivers nothing twice.
                if let Some(tx) = slot.lock().take() {
                    let _ = tx.send(payload.clone());
                }
            }),
        );
        OnceEvent { rx }
    }

    /// Removes the listener with the given id from every event.
    ///
    /// No-op if the id is absent; safe to call more than once.
    pub fn unsubscribe(&self, id: ListenerId) {
        let mut map = self.listeners.lock();
        for entries in map.values_mut() {
            entries.retain(|entry| entry.id != id);
        }
        map.retain(|_, entries| !entries.is_empty());
    }

    /// Synchronously invokes every listener currently registered for `event`,
    /// in registration order, with `payload`.
    ///
    /// Delivery iterates a snapshot taken at the start of the call; single-use
    /// listeners invoked during the pass are removed after the full pass
    /// completes. With no listeners registered this is a no-op.
    ///
    /// A panicking listener aborts the pass and propagates to the caller; see
    /// the module docs for the isolation trade-off.
    pub fn emit(&self, event: &str, payload: &E) {
        let snapshot: Vec<(ListenerId, bool, Arc<ListenerFn<E>>)> = {
            let map = self.listeners.lock();
            let Some(entries) = map.get(event) else { return };
            entries
                .iter()
                .map(|entry| (entry.id, entry.once, Arc::clone(&entry.call)))
                .collect()
        };

        let mut spent = Vec::new();
        for (id, once, call) in &snapshot {
            call(payload);
            if *once {
                spent.push(*id);
            }
        }

        if !spent.is_empty() {
            let mut map = self.listeners.lock();
            if let Some(entries) = map.get_mut(event) {
                entries.retain(|entry| !spent.contains(&entry.id));
                if entries.is_empty() {
                    map.remove(event);
                }
            }
        }
    }

    /// Number of listeners currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }

    fn push(&self, event: String, once: bool, call: Arc<ListenerFn<E>>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .entry(event)
            .or_default()
            .push(ListenerEntry { id, once, call });
        id
    }
}

impl<E> Default for EventRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`EventRegistry::subscribe_once`].
///
/// Resolves with a clone of the payload of the first matching `emit`, or with
/// [`EventClosed`] if the registry is dropped before the event fires.
#[must_use = "futures do nothing unless awaited"]
pub struct OnceEvent<E> {
    rx: oneshot::Receiver<E>,
}

impl<E> Future for OnceEvent<E> {
    type Output = Result<E, EventClosed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map_err(|_| EventClosed)
    }
}
