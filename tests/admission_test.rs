//! Integration tests for the admission queue on a tokio runtime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use turnstile::queue::topic;
use turnstile::{AdmissionQueue, QueueEvent, Revoked};

/// Long enough for every scheduled admission check to run, short enough to
/// keep the suite fast.
const TICK: Duration = Duration::from_millis(20);

struct Panel(&'static str);

fn panel(label: &'static str) -> Arc<Panel> {
    Arc::new(Panel(label))
}

#[tokio::test]
async fn test_fifo_activation_across_synchronous_burst() {
    turnstile::util::init_tracing();
    let queue = AdmissionQueue::new();
    let a = panel("a");
    let b = panel("b");
    let c = panel("c");

    // Three adds in one synchronous burst: all recorded before any promotion.
    let fut_a = queue.add(Arc::clone(&a));
    let mut fut_b = queue.add(Arc::clone(&b));
    let mut fut_c = queue.add(Arc::clone(&c));

    let admitted = fut_a.await.expect("a activates first");
    assert!(Arc::ptr_eq(&admitted.item, &a));
    assert_eq!(admitted.item.0, "a");

    // The slot is held: later requests stay pending.
    assert!(timeout(TICK, &mut fut_b).await.is_err());
    assert!(timeout(TICK, &mut fut_c).await.is_err());

    queue.remove(&a);
    let admitted = fut_b.await.expect("b activates after a releases");
    assert!(Arc::ptr_eq(&admitted.item, &b));
    assert!(timeout(TICK, &mut fut_c).await.is_err());

    queue.remove(&b);
    let admitted = fut_c.await.expect("c activates last");
    assert!(Arc::ptr_eq(&admitted.item, &c));
}

#[tokio::test]
async fn test_single_active_invariant() {
    let queue = AdmissionQueue::new();
    let activations = Arc::new(AtomicUsize::new(0));
    {
        let activations = Arc::clone(&activations);
        queue.subscribe(topic::ACTIVATED, move |_| {
            activations.fetch_add(1, Ordering::SeqCst);
        });
    }

    let a = panel("a");
    let b = panel("b");
    let fut_a = queue.add(Arc::clone(&a));
    let mut fut_b = queue.add(Arc::clone(&b));

    fut_a.await.expect("a admitted");
    tokio::time::sleep(TICK).await;
    assert_eq!(activations.load(Ordering::SeqCst), 1);
    assert!(timeout(TICK, &mut fut_b).await.is_err());
    assert_eq!(queue.waiting_len(), 1);

    queue.remove(&a);
    fut_b.await.expect("b admitted");
    tokio::time::sleep(TICK).await;
    assert_eq!(activations.load(Ordering::SeqCst), 2);
    assert!(Arc::ptr_eq(&queue.current().expect("b current"), &b));
}

#[tokio::test]
async fn test_remove_of_current_advances_then_empty() {
    let queue = AdmissionQueue::new();
    let a = panel("a");
    let b = panel("b");

    let fut_a = queue.add(Arc::clone(&a));
    let fut_b = queue.add(Arc::clone(&b));
    fut_a.await.expect("a admitted");

    queue.remove(&a);
    fut_b.await.expect("b admitted after a removed");

    let empty = queue.subscribe_once(topic::EMPTY);
    queue.remove(&b);
    let event = empty.await.expect("empty fires once nothing remains");
    assert!(matches!(event, QueueEvent::Empty));
    assert!(queue.current().is_none());
    assert_eq!(queue.waiting_len(), 0);
}

#[tokio::test]
async fn test_remove_of_waiting_entry_is_inert_to_current() {
    let queue = AdmissionQueue::new();
    let activations = Arc::new(AtomicUsize::new(0));
    {
        let activations = Arc::clone(&activations);
        queue.subscribe(topic::ACTIVATED, move |_| {
            activations.fetch_add(1, Ordering::SeqCst);
        });
    }

    let a = panel("a");
    let b = panel("b");
    let fut_a = queue.add(Arc::clone(&a));
    let fut_b = queue.add(Arc::clone(&b));
    fut_a.await.expect("a admitted");

    queue.remove(&b);
    assert!(matches!(fut_b.await, Err(Revoked)));
    tokio::time::sleep(TICK).await;

    assert!(Arc::ptr_eq(&queue.current().expect("a still current"), &a));
    assert_eq!(activations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_check_on_fresh_queue() {
    let queue = AdmissionQueue::<Panel, _>::new();
    let empty = queue.subscribe_once(topic::EMPTY);
    queue.kick();
    assert!(matches!(empty.await, Ok(QueueEvent::Empty)));
    assert!(queue.current().is_none());
}

#[tokio::test]
async fn test_remove_of_unknown_item_emits_nothing() {
    let queue = AdmissionQueue::new();
    let removals = Arc::new(AtomicUsize::new(0));
    {
        let removals = Arc::clone(&removals);
        queue.subscribe(topic::REMOVED, move |_| {
            removals.fetch_add(1, Ordering::SeqCst);
        });
    }

    let ghost = panel("ghost");
    queue.remove(&ghost);
    queue.remove(&ghost);
    tokio::time::sleep(TICK).await;
    assert_eq!(removals.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_added_and_removed_notifications_carry_the_item() {
    let queue = AdmissionQueue::new();
    let a = panel("a");

    let added = queue.subscribe_once(topic::ADDED);
    let fut_a = queue.add(Arc::clone(&a));
    match added.await.expect("added fires synchronously inside add") {
        QueueEvent::Added(item) => assert!(Arc::ptr_eq(&item, &a)),
        other => panic!("unexpected event: {other:?}"),
    }

    fut_a.await.expect("a admitted");
    let removed = queue.subscribe_once(topic::REMOVED);
    queue.remove(&a);
    match removed.await.expect("removed fires for a real match") {
        QueueEvent::Removed(item) => assert!(Arc::ptr_eq(&item, &a)),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_admission_revoked_when_queue_dropped_while_waiting() {
    let queue = AdmissionQueue::new();
    let a = panel("a");
    let b = panel("b");

    let fut_a = queue.add(Arc::clone(&a));
    let fut_b = queue.add(Arc::clone(&b));
    fut_a.await.expect("a admitted");

    drop(queue);
    assert!(matches!(fut_b.await, Err(Revoked)));
}

#[tokio::test]
async fn test_listener_reentering_queue_during_event() {
    let queue = AdmissionQueue::new();
    let a = panel("a");
    let b = panel("b");

    // A subscriber reacting to "activated" by removing the activated item:
    // the slot frees up again and the next entry is admitted.
    {
        let releaser = queue.clone();
        queue.subscribe(topic::ACTIVATED, move |event| {
            if let QueueEvent::Activated(admitted) = event {
                releaser.remove(&admitted.item);
            }
        });
    }

    let fut_a = queue.add(Arc::clone(&a));
    let fut_b = queue.add(Arc::clone(&b));
    fut_a.await.expect("a admitted");
    fut_b.await.expect("b admitted after subscriber released a");
    tokio::time::sleep(TICK).await;
    assert!(queue.current().is_none());
}

#[tokio::test]
async fn test_clones_share_the_same_slot() {
    let queue = AdmissionQueue::new();
    let worker = queue.clone();

    let a = panel("a");
    let b = panel("b");
    let fut_a = queue.add(Arc::clone(&a));
    let mut fut_b = worker.add(Arc::clone(&b));

    fut_a.await.expect("a admitted");
    assert!(timeout(TICK, &mut fut_b).await.is_err());

    worker.remove(&a);
    fut_b.await.expect("b admitted through the clone");
}
