//! Error types for admission and event delivery.

use thiserror::Error;

/// The admission request was removed before its item could be activated.
///
/// Returned by an [`Admission`](crate::Admission) future when
/// [`AdmissionQueue::remove`](crate::AdmissionQueue::remove) dropped the
/// waiting entry, or when the queue itself was dropped while the entry was
/// still waiting. This is the explicit cancel path: admission cannot fail,
/// only be delayed or withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("admission request was removed before activation")]
pub struct Revoked;

/// The event source was dropped before the awaited event fired.
///
/// Returned by a [`OnceEvent`](crate::OnceEvent) future when the
/// [`EventRegistry`](crate::EventRegistry) it was created from no longer
/// exists, so the event can never be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event source closed before the event fired")]
pub struct EventClosed;
