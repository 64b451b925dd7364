//! Executor abstraction for scheduling deferred work.
//!
//! The queue's admission check must run after the current synchronous batch
//! of calls settles, not inline. [`Spawn`] abstracts over how that deferred
//! work is scheduled so the queue is not tied to one runtime; the built-in
//! [`TokioSpawner`] covers the common case.

use std::future::Future;

#[cfg(feature = "tokio-runtime")]
pub mod tokio_spawner;

#[cfg(feature = "tokio-runtime")]
pub use tokio_spawner::TokioSpawner;

/// Abstraction for spawning fire-and-forget work on an async runtime.
pub trait Spawn {
    /// Spawns a future onto the runtime.
    ///
    /// Implementations must not poll the future inline; the whole point of
    /// the indirection is that the work runs on a later turn of the executor.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
