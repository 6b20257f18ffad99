//! Core types, configuration, and utilities shared by the postrelay crates.

mod category;
mod config;
mod error;
mod logging;
mod paths;

pub use category::Category;
pub use config::{
    Config, DiscordConfig, QueueConfig, ServerConfig, StoreConfig, DEFAULT_DISCORD_API_BASE_URL,
    DEFAULT_LISTEN_ADDR, DEFAULT_LOG_LEVEL, DEFAULT_MAX_POSTS,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
