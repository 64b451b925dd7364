//! # Turnstile
//!
//! A single-slot admission queue with asynchronous activation and a minimal
//! named-event publish/subscribe primitive.
//!
//! Turnstile serializes access to one "active" slot among any number of
//! concurrently requesting items. Callers submit an item with
//! [`AdmissionQueue::add`] and receive a future that resolves once the item
//! occupies the slot; when the item is done it calls
//! [`AdmissionQueue::remove`], which frees the slot and admits the next
//! waiting item in FIFO order.
//!
//! ## Core Problem Solved
//!
//! Many interactive and resource-gated systems need exactly-one-at-a-time
//! semantics with fair ordering:
//!
//! - **Modal surfaces**: only one dialog, prompt, or overlay may be on screen
//! - **Exclusive devices**: one client at a time may hold a scanner or port
//! - **Serialized phases**: pipeline stages that must not overlap
//!
//! The queue never inspects what an item does while active; items are opaque
//! values with stable identity (`Arc` pointer identity).
//!
//! ## Key Properties
//!
//! - **Single-active invariant**: at most one item occupies the slot at any
//!   instant across the queue's lifetime.
//! - **FIFO fairness**: the admission check is *deferred* to a later turn of
//!   the executor rather than run inline inside `add`, so a synchronous burst
//!   of `add` calls is fully recorded before the first promotion happens.
//! - **Asynchronous readiness**: activation is delivered through a one-shot
//!   future with no error channel beyond explicit revocation.
//! - **Lifecycle notifications**: `"added"`, `"removed"`, `"activated"`, and
//!   `"empty"` events are published through a composable [`EventRegistry`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turnstile::AdmissionQueue;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let queue = AdmissionQueue::new();
//!
//!     let dialog = Arc::new(Dialog::open("settings"));
//!     let admitted = queue.add(Arc::clone(&dialog)).await.unwrap();
//!
//!     // The item now owns the active slot; do its work, then release.
//!     admitted.item.run().await;
//!     queue.remove(&admitted.item);
//! }
//! ```
//!
//! The [`EventRegistry`] is also usable standalone: any type may compose an
//! instance to gain `subscribe` / `subscribe_once` / `emit`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Error types for admission and event delivery.
pub mod error;
/// Named-event publish/subscribe primitives.
pub mod events;
/// The single-slot admission queue.
pub mod queue;
/// Executor abstraction for scheduling deferred work.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use error::{EventClosed, Revoked};
pub use events::{EventRegistry, ListenerId, OnceEvent};
pub use queue::{Admission, AdmissionQueue, Admitted, QueueEvent};
pub use runtime::Spawn;
#[cfg(feature = "tokio-runtime")]
pub use runtime::TokioSpawner;
