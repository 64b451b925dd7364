//! The single-slot admission queue.
//!
//! An [`AdmissionQueue`] holds a FIFO list of waiting items and at most one
//! *current* item. Callers [`add`](AdmissionQueue::add) an item and await the
//! returned future; when it resolves the item occupies the active slot. Once
//! the item is finished, calling [`remove`](AdmissionQueue::remove) frees the
//! slot and admits the next waiting item.
//!
//! ```rust,ignore
//! let queue = AdmissionQueue::new();
//!
//! let first = Arc::new(Popup::open("welcome"));
//! let admitted = queue.add(Arc::clone(&first)).await?;
//! // ...only this popup is visible; when it closes:
//! queue.remove(&admitted.item);
//! ```

pub mod admission;

pub use admission::{Admission, AdmissionQueue, Admitted, QueueEvent};

/// Topic names under which the queue publishes its lifecycle notifications.
pub mod topic {
    /// A waiting entry was recorded. Payload: [`QueueEvent::Added`](super::QueueEvent::Added).
    pub const ADDED: &str = "added";
    /// A matching entry was removed. Payload: [`QueueEvent::Removed`](super::QueueEvent::Removed).
    pub const REMOVED: &str = "removed";
    /// An item was promoted to the active slot. Payload: [`QueueEvent::Activated`](super::QueueEvent::Activated).
    pub const ACTIVATED: &str = "activated";
    /// An admission check found nothing waiting and no current item.
    pub const EMPTY: &str = "empty";
}
