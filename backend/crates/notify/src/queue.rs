//! Message Queue
//!
//! At-least-once delivery with manual acknowledgment. A [`Delivery`] must be
//! settled with [`Delivery::ack`] or [`Delivery::nack`]; one dropped unsettled
//! goes back on the queue, as a broker does when a consumer disconnects.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::error::{NotifyError, NotifyResult};

/// Queue seam used by publishers and consumers
#[trait_variant::make(MessageQueue: Send)]
pub trait LocalMessageQueue {
    /// Enqueue a message body
    async fn publish(&self, body: Vec<u8>) -> NotifyResult<()>;

    /// Wait for the next message. `None` once the queue is closed and drained.
    async fn next_delivery(&self) -> Option<Delivery>;
}

/// Settles deliveries on behalf of a queue
pub trait Acknowledger: Send + Sync {
    fn ack(&self, tag: u64);
    fn nack(&self, tag: u64, body: Vec<u8>, requeue: bool);
}

/// A message handed to a consumer
pub struct Delivery {
    pub tag: u64,
    pub body: Vec<u8>,
    pub redelivered: bool,
    acker: Option<Arc<dyn Acknowledger>>,
}

impl Delivery {
    pub fn new(tag: u64, body: Vec<u8>, redelivered: bool, acker: Arc<dyn Acknowledger>) -> Self {
        Self {
            tag,
            body,
            redelivered,
            acker: Some(acker),
        }
    }

    pub fn ack(mut self) {
        if let Some(acker) = self.acker.take() {
            acker.ack(self.tag);
        }
    }

    pub fn nack(mut self, requeue: bool) {
        if let Some(acker) = self.acker.take() {
            acker.nack(self.tag, std::mem::take(&mut self.body), requeue);
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if let Some(acker) = self.acker.take() {
            tracing::warn!(tag = self.tag, "delivery dropped unsettled, requeueing");
            acker.nack(self.tag, std::mem::take(&mut self.body), true);
        }
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("tag", &self.tag)
            .field("len", &self.body.len())
            .field("redelivered", &self.redelivered)
            .finish()
    }
}

/// Counters for observing queue behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub published: u64,
    pub acked: u64,
    pub requeued: u64,
    pub dead_lettered: u64,
}

// ============================================================================
// In-memory queue
// ============================================================================

struct Envelope {
    body: Vec<u8>,
    redelivered: bool,
}

struct QueueState {
    sender: Mutex<Option<mpsc::UnboundedSender<Envelope>>>,
    next_tag: AtomicU64,
    published: AtomicU64,
    acked: AtomicU64,
    requeued: AtomicU64,
    dead_lettered: AtomicU64,
}

impl QueueState {
    fn push(&self, envelope: Envelope) -> NotifyResult<()> {
        let guard = self
            .sender
            .lock()
            .map_err(|_| NotifyError::Publish("queue lock poisoned".to_string()))?;
        let sender = guard.as_ref().ok_or(NotifyError::QueueClosed)?;
        sender.send(envelope).map_err(|_| NotifyError::QueueClosed)
    }
}

impl Acknowledger for QueueState {
    fn ack(&self, _tag: u64) {
        self.acked.fetch_add(1, Ordering::Relaxed);
    }

    fn nack(&self, tag: u64, body: Vec<u8>, requeue: bool) {
        if requeue
            && self
                .push(Envelope {
                    body,
                    redelivered: true,
                })
                .is_ok()
        {
            self.requeued.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(tag, "message dead-lettered");
    }
}

/// Single-process queue over a tokio channel
///
/// Consumers take turns (prefetch of one per `next_delivery` call).
#[derive(Clone)]
pub struct InMemoryQueue {
    state: Arc<QueueState>,
    receiver: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Envelope>>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(QueueState {
                sender: Mutex::new(Some(sender)),
                next_tag: AtomicU64::new(1),
                published: AtomicU64::new(0),
                acked: AtomicU64::new(0),
                requeued: AtomicU64::new(0),
                dead_lettered: AtomicU64::new(0),
            }),
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
        }
    }

    /// Stop accepting messages. Consumers drain what is left, then see `None`.
    pub fn close(&self) {
        if let Ok(mut sender) = self.state.sender.lock() {
            sender.take();
        }
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            published: self.state.published.load(Ordering::Relaxed),
            acked: self.state.acked.load(Ordering::Relaxed),
            requeued: self.state.requeued.load(Ordering::Relaxed),
            dead_lettered: self.state.dead_lettered.load(Ordering::Relaxed),
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageQueue for InMemoryQueue {
    async fn publish(&self, body: Vec<u8>) -> NotifyResult<()> {
        self.state.push(Envelope {
            body,
            redelivered: false,
        })?;
        self.state.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn next_delivery(&self) -> Option<Delivery> {
        let envelope = self.receiver.lock().await.recv().await?;
        let tag = self.state.next_tag.fetch_add(1, Ordering::Relaxed);
        let acker: Arc<dyn Acknowledger> = self.state.clone();
        Some(Delivery::new(tag, envelope.body, envelope.redelivered, acker))
    }
}
