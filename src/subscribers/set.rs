//! # SubscriberSet: per-subscriber queues between the bus listener and subscribers
//!
//! The node's bus listener hands every lifecycle [`Event`] to [`SubscriberSet::emit`],
//! which enqueues it for each subscriber and returns without waiting. One worker task
//! per subscriber drains its queue in order.
//!
//! - A slow subscriber only fills its own queue; overflow drops the event for that
//!   subscriber and is counted.
//! - A panicking `on_event` is caught and logged with the event that triggered it;
//!   the worker keeps going with the next event.
//! - [`SubscriberSet::shutdown`] closes the queues, lets workers drain what is
//!   queued and reports how many events each subscriber missed.
//!
//! ```text
//!  bus listener ─► emit(&Event) ─┬─► [queue: LogWriter] ─► worker ─► on_event()
//!                                └─► [queue: custom]    ─► worker ─► on_event()
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::events::Event;

use super::Subscribe;

struct Lane {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
    dropped: AtomicU64,
    worker: JoinHandle<()>,
}

/// Fan-out of lifecycle events to a fixed list of subscribers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Must be called from within a tokio runtime.
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let lanes = subs.into_iter().map(Self::lane).collect();
        Self { lanes }
    }

    fn lane(sub: Arc<dyn Subscribe>) -> Lane {
        let name = sub.name();
        let (queue, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

        let worker = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let handled = std::panic::AssertUnwindSafe(sub.on_event(&ev))
                    .catch_unwind()
                    .await;
                if handled.is_err() {
                    tracing::error!(
                        subscriber = name,
                        seq = ev.seq,
                        kind = ?ev.kind,
                        service = ev.service.as_deref().unwrap_or("-"),
                        "subscriber panicked while handling event"
                    );
                }
            }
        });

        Lane {
            name,
            queue,
            dropped: AtomicU64::new(0),
            worker,
        }
    }

    /// Enqueues `event` for every subscriber without waiting.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for lane in &self.lanes {
            let reason = match lane.queue.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "queue full",
                Err(TrySendError::Closed(_)) => "worker gone",
            };
            lane.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                subscriber = lane.name,
                kind = ?event.kind,
                reason,
                "lifecycle event dropped"
            );
        }
    }

    /// Closes the queues and waits for workers to drain them.
    pub async fn shutdown(self) {
        for lane in self.lanes {
            let Lane {
                name,
                queue,
                dropped,
                worker,
            } = lane;
            drop(queue);
            let _ = worker.await;

            let dropped = dropped.into_inner();
            if dropped > 0 {
                tracing::warn!(subscriber = name, dropped, "subscriber missed events");
            }
        }
    }

    /// Events dropped so far for the subscriber called `name`.
    pub fn dropped(&self, name: &str) -> Option<u64> {
        self.lanes
            .iter()
            .find(|lane| lane.name == name)
            .map(|lane| lane.dropped.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Recorder {
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().push(event.kind);
        }
    }

    struct Panicker;

    #[async_trait]
    impl Subscribe for Panicker {
        async fn on_event(&self, _event: &Event) {
            panic!("subscriber failure");
        }

        fn name(&self) -> &'static str {
            "panicker"
        }
    }

    #[tokio::test]
    async fn test_fan_out_survives_panicking_subscriber() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = SubscriberSet::new(vec![
            Arc::new(Panicker),
            Arc::new(Recorder { seen: seen.clone() }),
        ]);

        set.emit(&Event::new(EventKind::NodeStarting));
        set.emit(&Event::new(EventKind::NodeStopped));
        set.shutdown().await;

        assert_eq!(
            *seen.lock(),
            vec![EventKind::NodeStarting, EventKind::NodeStopped]
        );
    }

    struct Narrow;

    #[async_trait]
    impl Subscribe for Narrow {
        async fn on_event(&self, _event: &Event) {}

        fn name(&self) -> &'static str {
            "narrow"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_overflow_is_counted_per_subscriber() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = SubscriberSet::new(vec![
            Arc::new(Narrow),
            Arc::new(Recorder { seen: seen.clone() }),
        ]);

        // Workers cannot run between these calls on the test's single thread.
        for kind in [
            EventKind::NodeStarting,
            EventKind::NodeStarted,
            EventKind::NodeStopped,
        ] {
            set.emit(&Event::new(kind));
        }
        assert_eq!(set.dropped("narrow"), Some(2));
        assert_eq!(set.dropped("missing"), None);

        set.shutdown().await;
        assert_eq!(seen.lock().len(), 3);
    }
}
