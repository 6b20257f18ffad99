//! Outbound relay of accepted posts to the channel platform.
//!
//! This crate provides:
//! - [`DeliveryQueue`]: unbounded FIFO of posts awaiting relay
//! - [`ChannelSender`]: one classified delivery attempt per call, with
//!   [`DiscordSender`] as the HTTP implementation
//! - [`QueueWorker`]: the single sequential drain loop with per-item retry
//!   and fixed spacing between items
//!
//! Accepting a post and delivering it are decoupled: callers get control
//! back as soon as the post is appended, and delivery failures never reach
//! them. They are logged and counted.
//!
//! ```ignore
//! let sender = Arc::new(DiscordSender::new(SenderConfig::from_discord(&config.discord))?);
//! let worker = QueueWorker::new(sender, WorkerConfig::from_queue(&config.queue));
//! worker.enqueue(post).await;
//! ```

mod error;
mod outcome;
mod queue;
mod sender;
mod worker;

#[cfg(test)]
mod tests;

pub use error::{OutboxError, OutboxResult};
pub use outcome::DeliveryOutcome;
pub use queue::DeliveryQueue;
pub use sender::{
    render_message, ChannelSender, DiscordSender, SenderConfig, DEFAULT_RATE_LIMIT_DELAY,
};
pub use worker::{QueueStatus, QueueWorker, WorkerConfig};
