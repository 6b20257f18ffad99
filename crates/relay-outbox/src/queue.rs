//! In-memory FIFO of posts awaiting delivery.
//!
//! Unbounded and not persisted: a restart loses whatever is still queued.
//! Any number of producers may append concurrently; the worker is the only
//! consumer.

use post_store::Post;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Delivery queue.
#[derive(Debug, Default)]
pub struct DeliveryQueue {
    items: Mutex<VecDeque<Post>>,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail. Never rejects.
    pub async fn enqueue(&self, post: Post) {
        self.items.lock().await.push_back(post);
    }

    /// Pop the head, if any.
    pub async fn dequeue_oldest(&self) -> Option<Post> {
        self.items.lock().await.pop_front()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }
}
