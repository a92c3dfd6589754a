//! Progress Bus (§4.3): a per-generation event queue fanned out to any
//! number of streaming subscribers. Grounded on the teacher's SSE chat
//! handler (`routes::chat::chat_handler`), generalized from one response
//! stream per request into one fan-out bus per generation held in a
//! process-wide registry, per §9's "Shared global state" redesign note.

use crate::domain::{AgentInteraction, ProgressEvent};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

/// Either flavor that can ride the bus (§4.3).
#[derive(Debug, Clone)]
pub enum BusEvent {
    Progress(ProgressEvent),
    Interaction(AgentInteraction),
}

/// The ring buffer backing one subscriber. Shared between the `Subscriber`
/// entry the bus writes into and the `ProgressReceiver` handed back to the
/// caller, so the bus itself can evict the true oldest entry on overflow
/// rather than merely refusing to enqueue the newest one.
struct SubscriberInner {
    buffer: Mutex<VecDeque<BusEvent>>,
    capacity: usize,
    notify: Notify,
    closed: AtomicBool,
}

struct Subscriber {
    inner: Arc<SubscriberInner>,
}

/// Handle returned by `subscribe`. Pulls from the shared ring buffer;
/// `recv` returns `None` once the bus has closed the generation's queue
/// and the buffer has drained.
pub struct ProgressReceiver {
    inner: Arc<SubscriberInner>,
}

impl ProgressReceiver {
    pub async fn recv(&mut self) -> Option<BusEvent> {
        loop {
            {
                let mut buffer = self.inner.buffer.lock().await;
                if let Some(event) = buffer.pop_front() {
                    return Some(event);
                }
            }
            if self.inner.closed.load(Ordering::SeqCst) {
                return None;
            }
            self.inner.notify.notified().await;
        }
    }
}

struct Queue {
    subscribers: Vec<Subscriber>,
    closed: bool,
}

impl Queue {
    fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            closed: false,
        }
    }
}

/// Process-wide registry of per-generation queues (§9). `Init`/`Shutdown`
/// are implicit: `new()` constructs the registry, `Close` tears down one
/// generation's queue.
#[derive(Clone)]
pub struct ProgressBus {
    queues: Arc<Mutex<HashMap<Uuid, Queue>>>,
    buffer_depth: usize,
}

impl ProgressBus {
    pub fn new(buffer_depth: usize) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            buffer_depth,
        }
    }

    /// Idempotent: returns the existing queue if one was already created,
    /// e.g. by a subscriber that connected first (Property 7, Scenario D).
    pub async fn create(&self, generation_id: Uuid) {
        let mut queues = self.queues.lock().await;
        queues.entry(generation_id).or_insert_with(Queue::new);
    }

    /// Enqueue an event for every active subscriber. Non-blocking: if a
    /// subscriber's ring buffer is full, the oldest queued event for that
    /// subscriber is evicted to make room for the new one, and a warning is
    /// logged, so the producer never blocks and a slow reader never stalls
    /// the pipeline (§4.3, §5 Backpressure).
    pub async fn publish(&self, generation_id: Uuid, event: BusEvent) {
        let queues = self.queues.lock().await;
        let Some(queue) = queues.get(&generation_id) else {
            return;
        };
        if queue.closed {
            return;
        }
        for sub in &queue.subscribers {
            let mut buffer = sub.inner.buffer.lock().await;
            if buffer.len() >= sub.inner.capacity {
                buffer.pop_front();
                tracing::warn!(
                    generation_id = %generation_id,
                    "progress bus subscriber buffer full, dropping oldest queued event"
                );
            }
            buffer.push_back(event.clone());
            drop(buffer);
            sub.inner.notify.notify_one();
        }
    }

    /// Returns a receive-only handle backed by a ring buffer. Creates the
    /// queue if it does not yet exist, so a subscriber may arrive before the
    /// producer (Scenario D). Replays nothing: only events published after
    /// this call are seen.
    pub async fn subscribe(&self, generation_id: Uuid) -> ProgressReceiver {
        let inner = Arc::new(SubscriberInner {
            buffer: Mutex::new(VecDeque::with_capacity(self.buffer_depth)),
            capacity: self.buffer_depth,
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        });
        let mut queues = self.queues.lock().await;
        let queue = queues.entry(generation_id).or_insert_with(Queue::new);
        queue.subscribers.push(Subscriber { inner: inner.clone() });
        ProgressReceiver { inner }
    }

    /// Signals end-of-stream to all subscribers and releases resources
    /// (called on terminal transition, §3, §4.3).
    pub async fn close(&self, generation_id: Uuid) {
        let mut queues = self.queues.lock().await;
        if let Some(mut queue) = queues.remove(&generation_id) {
            queue.closed = true;
            for sub in &queue.subscribers {
                sub.inner.closed.store(true, Ordering::SeqCst);
                sub.inner.notify.notify_one();
            }
            queue.subscribers.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProgressStatus, ProgressStep};

    #[tokio::test]
    async fn idempotent_queue_creation() {
        let bus = ProgressBus::new(8);
        let id = Uuid::new_v4();
        bus.create(id).await;
        bus.create(id).await;
        let queues = bus.queues.lock().await;
        assert_eq!(queues.len(), 1);
    }

    #[tokio::test]
    async fn subscriber_sees_events_in_publish_order() {
        let bus = ProgressBus::new(8);
        let id = Uuid::new_v4();
        let mut rx = bus.subscribe(id).await;

        let e1 = ProgressEvent::new(ProgressStep::Init, ProgressStatus::InProgress, 0, "a");
        let e2 = ProgressEvent::new(ProgressStep::Upload, ProgressStatus::InProgress, 5, "b");
        bus.publish(id, BusEvent::Progress(e1)).await;
        bus.publish(id, BusEvent::Progress(e2)).await;

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        match (first, second) {
            (BusEvent::Progress(a), BusEvent::Progress(b)) => {
                assert_eq!(a.step, ProgressStep::Init);
                assert_eq!(b.step, ProgressStep::Upload);
            }
            _ => panic!("expected progress events"),
        }
    }

    #[tokio::test]
    async fn late_subscriber_sees_only_events_after_subscribe() {
        let bus = ProgressBus::new(8);
        let id = Uuid::new_v4();
        // No subscriber yet; publish goes nowhere because the queue does
        // not exist until create() or subscribe() is called.
        bus.create(id).await;
        bus.publish(
            id,
            BusEvent::Progress(ProgressEvent::new(ProgressStep::Init, ProgressStatus::InProgress, 0, "early")),
        )
        .await;

        let mut rx = bus.subscribe(id).await;
        bus.publish(
            id,
            BusEvent::Progress(ProgressEvent::new(ProgressStep::Upload, ProgressStatus::InProgress, 5, "late")),
        )
        .await;

        let event = rx.recv().await.unwrap();
        match event {
            BusEvent::Progress(p) => assert_eq!(p.message, "late"),
            _ => panic!("expected progress event"),
        }
    }

    #[tokio::test]
    async fn close_ends_stream() {
        let bus = ProgressBus::new(8);
        let id = Uuid::new_v4();
        let mut rx = bus.subscribe(id).await;
        bus.close(id).await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn overflow_drops_oldest_not_newest() {
        let bus = ProgressBus::new(2);
        let id = Uuid::new_v4();
        let mut rx = bus.subscribe(id).await;

        for i in 0..3u32 {
            bus.publish(
                id,
                BusEvent::Progress(ProgressEvent::new(ProgressStep::Story, ProgressStatus::InProgress, i, &i.to_string())),
            )
            .await;
        }

        // Buffer capacity is 2; event "0" (the oldest) should have been
        // evicted, leaving "1" then "2" — never silently keeping "0" while
        // dropping the just-published "2".
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        match (first, second) {
            (BusEvent::Progress(a), BusEvent::Progress(b)) => {
                assert_eq!(a.message, "1");
                assert_eq!(b.message, "2");
            }
            _ => panic!("expected progress events"),
        }
    }
}
