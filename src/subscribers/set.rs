//! # SubscriberSet: non-blocking fan-out over multiple subscribers.
//!
//! [`SubscriberSet`] distributes each [`JobEvent`] to multiple subscribers
//! **without awaiting** their processing, and bridges the broadcast bus to
//! them via [`SubscriberSet::spawn_bridge`].
//!
//! ## What it guarantees
//! - `emit(&JobEvent)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and logged (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow (events are dropped for
//!   that subscriber).
//!
//! ## Diagram
//! ```text
//!    EventBus ─► bridge ─► emit(&JobEvent)
//!        │                     (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::broadcast, sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::events::{EventBus, JobEvent};

use super::subscribe::Subscribe;

/// Per-subscriber channel with metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<JobEvent>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<JobEvent>>(cap);
            let s = Arc::clone(&sub);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = s.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        log::error!(
                            target: "jobwatch::subscribers",
                            "subscriber '{}' panicked: {panic_err:?}",
                            s.name()
                        );
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fans one event out to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is
    /// dropped for it and a warning is logged with the subscriber's name.
    pub fn emit(&self, event: &JobEvent) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        target: "jobwatch::subscribers",
                        "subscriber '{}' dropped event seq={}: queue full",
                        channel.name,
                        ev.seq
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::warn!(
                        target: "jobwatch::subscribers",
                        "subscriber '{}' dropped event seq={}: worker closed",
                        channel.name,
                        ev.seq
                    );
                }
            }
        }
    }

    /// Bridges the broadcast bus into this set on a background task.
    ///
    /// The task runs until the token is cancelled or the bus closes. When
    /// the bridge itself lags behind the bus it skips the oldest events and
    /// logs how many were lost.
    pub fn spawn_bridge(
        self: &Arc<Self>,
        bus: &EventBus,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let set = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            log::warn!(
                                target: "jobwatch::subscribers",
                                "subscriber bridge lagged; skipped {skipped} events"
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
            log::debug!(target: "jobwatch::subscribers", "subscriber bridge stopped");
        })
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::events::JobStatus;
    use crate::queue::Job;

    struct Recorder {
        seen: Arc<Mutex<Vec<JobStatus>>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &JobEvent) {
            self.seen.lock().expect("lock").push(event.status);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Panicker;

    #[async_trait]
    impl Subscribe for Panicker {
        async fn on_event(&self, _event: &JobEvent) {
            panic!("subscriber bug");
        }

        fn name(&self) -> &'static str {
            "panicker"
        }
    }

    fn event(status: JobStatus) -> JobEvent {
        JobEvent::for_job(status, &Job::new("j-1", "analyze-project", "analysis"))
    }

    #[tokio::test]
    async fn test_events_reach_all_subscribers_in_order() {
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));
        let set = SubscriberSet::new(vec![
            Arc::new(Recorder {
                seen: Arc::clone(&seen_a),
            }) as Arc<dyn Subscribe>,
            Arc::new(Recorder {
                seen: Arc::clone(&seen_b),
            }) as Arc<dyn Subscribe>,
        ]);
        assert_eq!(set.len(), 2);

        set.emit(&event(JobStatus::Waiting));
        set.emit(&event(JobStatus::Completed));
        set.shutdown().await;

        let expected = vec![JobStatus::Waiting, JobStatus::Completed];
        assert_eq!(*seen_a.lock().expect("lock"), expected);
        assert_eq!(*seen_b.lock().expect("lock"), expected);
    }

    #[tokio::test]
    async fn test_panicking_subscriber_does_not_poison_others() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = SubscriberSet::new(vec![
            Arc::new(Panicker) as Arc<dyn Subscribe>,
            Arc::new(Recorder {
                seen: Arc::clone(&seen),
            }) as Arc<dyn Subscribe>,
        ]);

        set.emit(&event(JobStatus::Waiting));
        set.emit(&event(JobStatus::Failed));
        set.shutdown().await;

        assert_eq!(
            *seen.lock().expect("lock"),
            vec![JobStatus::Waiting, JobStatus::Failed]
        );
    }

    #[tokio::test]
    async fn test_bridge_forwards_bus_events_until_cancelled() {
        let bus = EventBus::new(16);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = Arc::new(SubscriberSet::new(vec![Arc::new(Recorder {
            seen: Arc::clone(&seen),
        }) as Arc<dyn Subscribe>]));

        let token = CancellationToken::new();
        let bridge = set.spawn_bridge(&bus, token.clone());

        bus.publish(event(JobStatus::Waiting));
        bus.publish(event(JobStatus::Processing));

        // Wait for fan-out workers to drain.
        for _ in 0..50 {
            if seen.lock().expect("lock").len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(
            *seen.lock().expect("lock"),
            vec![JobStatus::Waiting, JobStatus::Processing]
        );

        token.cancel();
        bridge.await.expect("bridge joins");
    }
}
