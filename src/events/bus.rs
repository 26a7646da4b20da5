//! # Event bus broadcasting lifecycle events to live observers.
//!
//! [`EventBus`] is a thin wrapper around [`tokio::sync::broadcast`] that lets
//! the monitor publish [`JobEvent`]s without ever blocking on a subscriber.
//!
//! ## Architecture
//! ```text
//! Publisher (monitor):              Subscribers (any number):
//!                                     ┌──► SSE endpoint stream
//!   JobMonitor ───► EventBus ────────┼──► SubscriberSet bridge (logging, ...)
//!                 (broadcast chan)   └──► tests / ad-hoc observers
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` calls `broadcast::Sender::send`
//!   and returns immediately.
//! - **Bounded memory**: a single ring buffer of `capacity` recent events is
//!   shared by all receivers; memory never grows with subscriber count or lag.
//! - **Drop-oldest on lag**: a receiver that falls more than `capacity`
//!   events behind observes `RecvError::Lagged(n)` and skips the `n` oldest
//!   events. This is the documented backpressure policy for slow subscribers.
//! - **Per-receiver ordering**: each receiver observes events in publish
//!   order (minus any skipped prefix after a lag).
//! - **No persistence**: events published with no active receivers are lost.

use tokio::sync::broadcast;

use super::event::JobEvent;

/// Broadcast channel for job lifecycle events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender). Dropping a
/// receiver returned by [`EventBus::subscribe`] unsubscribes it immediately.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<JobEvent>,
}

impl EventBus {
    /// Creates a new bus with the given ring-buffer capacity (min 1, clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<JobEvent>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// Takes ownership; the channel clones the event for each receiver. With
    /// no receivers the event is dropped and this still returns immediately.
    pub fn publish(&self, ev: JobEvent) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver observing all subsequently published
    /// events. Dropping the receiver stops delivery.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.tx.subscribe()
    }

    /// Number of currently attached receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::JobStatus;
    use crate::queue::Job;

    fn event(status: JobStatus) -> JobEvent {
        JobEvent::for_job(status, &Job::new("j-1", "analyze-project", "analysis"))
    }

    #[tokio::test]
    async fn test_subscriber_receives_in_publish_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(event(JobStatus::Waiting));
        bus.publish(event(JobStatus::Processing));
        bus.publish(event(JobStatus::Completed));

        let statuses = [
            rx.recv().await.expect("first").status,
            rx.recv().await.expect("second").status,
            rx.recv().await.expect("third").status,
        ];
        assert_eq!(
            statuses,
            [JobStatus::Waiting, JobStatus::Processing, JobStatus::Completed]
        );
    }

    #[tokio::test]
    async fn test_slow_subscriber_drops_oldest() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        bus.publish(event(JobStatus::Waiting));
        bus.publish(event(JobStatus::Processing));
        bus.publish(event(JobStatus::Progress));
        bus.publish(event(JobStatus::Completed));

        match rx.recv().await {
            Err(broadcast::error::RecvError::Lagged(skipped)) => assert_eq!(skipped, 2),
            other => panic!("expected lag, got {other:?}"),
        }
        assert_eq!(rx.recv().await.expect("kept").status, JobStatus::Progress);
        assert_eq!(rx.recv().await.expect("kept").status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new(4);
        bus.publish(event(JobStatus::Waiting));
        assert_eq!(bus.receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_receiver_unsubscribes() {
        let bus = EventBus::new(4);
        let rx = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);
        drop(rx);
        assert_eq!(bus.receiver_count(), 0);
    }
}
