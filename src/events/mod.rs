//! Named-event publish/subscribe primitives.

pub mod registry;

pub use registry::{EventRegistry, ListenerId, OnceEvent};
