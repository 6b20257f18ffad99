//! SQLite-backed post store for the relay service.
//!
//! This crate provides:
//! - [`PostStore`], an async handle running every query on one dedicated
//!   SQLite thread
//! - Schema migrations
//! - The [`Post`] / [`NewPost`] models
//! - Standalone query helpers in [`queries`]
//!
//! The store is capped: after each insert only the newest `max_posts` rows
//! survive.
//!
//! ```ignore
//! let store = PostStore::open(&path, 100).await?;
//! let post = store.insert(NewPost::new("Hack", "CTF this weekend")).await?;
//! let recent = store.list().await?;
//! ```

mod error;
mod migrations;
mod models;
pub mod queries;
mod store;

pub use error::{StoreError, StoreResult};
pub use migrations::run_migrations;
pub use models::{NewPost, Post, DEFAULT_SOURCE, WEBSITE_SOURCE};
pub use store::PostStore;
