//! Queue worker: the single sequential drain loop.
//!
//! At most one drain task exists at a time. `enqueue` appends and, when the
//! worker is idle, flips the running flag and spawns the drain task. The
//! task pops items in FIFO order, retries each one in place, pauses for
//! the item spacing after every item, and goes idle once the queue is empty.

use crate::{ChannelSender, DeliveryOutcome, DeliveryQueue};
use futures_util::FutureExt;
use post_store::Post;
use postrelay_core::QueueConfig;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Attempts per item, including the first.
    pub max_attempts: u32,
    /// Pause after each resolved item, whatever its outcome.
    pub item_spacing: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            item_spacing: Duration::from_secs(1),
        }
    }
}

impl WorkerConfig {
    pub fn from_queue(config: &QueueConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            item_spacing: config.item_spacing(),
        }
    }
}

/// Snapshot of the worker for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Items waiting in the queue (excludes the one being delivered).
    pub pending: usize,
    /// Whether a drain task is active.
    pub running: bool,
    /// Items delivered since startup.
    pub delivered: u64,
    /// Items given up on since startup.
    pub dropped: u64,
}

/// Owns the delivery queue and drives it through a [`ChannelSender`].
pub struct QueueWorker {
    queue: DeliveryQueue,
    sender: Arc<dyn ChannelSender>,
    config: WorkerConfig,
    running: AtomicBool,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl QueueWorker {
    pub fn new(sender: Arc<dyn ChannelSender>, config: WorkerConfig) -> Arc<Self> {
        Arc::new(Self {
            queue: DeliveryQueue::new(),
            sender,
            config,
            running: AtomicBool::new(false),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    /// Append a post and make sure a drain task is running.
    ///
    /// Returns as soon as the post is queued; never waits for delivery.
    /// Must be called from within a Tokio runtime.
    pub async fn enqueue(self: &Arc<Self>, post: Post) {
        debug!(post_id = %post.id, tag = %post.tag, "Queued post for relay");
        self.queue.enqueue(post).await;
        self.trigger();
    }

    fn trigger(self: &Arc<Self>) {
        if self.try_acquire() {
            let worker = Arc::clone(self);
            tokio::spawn(async move { worker.drain().await });
        }
    }

    fn try_acquire(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    async fn drain(&self) {
        let pending = self.queue.len().await;
        info!(pending, "Processing delivery queue");

        loop {
            while let Some(post) = self.queue.dequeue_oldest().await {
                self.process(post).await;
                tokio::time::sleep(self.config.item_spacing).await;
            }

            self.running.store(false, Ordering::SeqCst);

            // A producer that appended after our last pop may have seen the
            // flag still set and skipped spawning.
            if self.queue.is_empty().await || !self.try_acquire() {
                break;
            }
        }

        info!("Delivery queue drained");
    }

    async fn process(&self, post: Post) {
        let (outcome, attempts) = self.deliver_with_retry(&post).await;
        let summary = post.summary();

        if outcome.is_delivered() {
            self.delivered.fetch_add(1, Ordering::Relaxed);
            info!(
                post_id = %post.id,
                tag = %post.tag,
                summary = %summary,
                attempts,
                "Relayed post"
            );
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            error!(
                post_id = %post.id,
                tag = %post.tag,
                summary = %summary,
                attempts,
                reason = %outcome,
                "Dropping post after failed relay"
            );
        }
    }

    /// Deliver one post, retrying in place.
    ///
    /// Rate limits wait for the platform's delay before the next attempt;
    /// transient failures retry immediately; permanent failures stop at
    /// once, and so does a sender that panics. Returns the final outcome and
    /// the number of attempts made.
    pub async fn deliver_with_retry(&self, post: &Post) -> (DeliveryOutcome, u32) {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let outcome = match AssertUnwindSafe(self.sender.send(post)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => DeliveryOutcome::Permanent(format!(
                    "sender panicked: {}",
                    panic_message(panic.as_ref())
                )),
            };
            if !outcome.is_retryable() || attempts >= max_attempts {
                return (outcome, attempts);
            }

            match &outcome {
                DeliveryOutcome::RateLimited { retry_after } => {
                    warn!(
                        post_id = %post.id,
                        attempt = attempts,
                        delay_ms = retry_after.as_millis() as u64,
                        "Rate limited, waiting before retry"
                    );
                    tokio::time::sleep(*retry_after).await;
                }
                DeliveryOutcome::Transient(reason) => {
                    warn!(
                        post_id = %post.id,
                        attempt = attempts,
                        error = %reason,
                        "Relay attempt failed, retrying"
                    );
                }
                DeliveryOutcome::Delivered | DeliveryOutcome::Permanent(_) => {}
            }
        }
    }

    pub async fn status(&self) -> QueueStatus {
        QueueStatus {
            pending: self.queue.len().await,
            running: self.is_running(),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
