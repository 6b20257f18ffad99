//! Configuration management.
//!
//! Settings come from three layers, later ones winning:
//! built-in defaults, an optional JSON file (`~/.postrelay/config.json`),
//! and environment variables.

use crate::{Category, CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default HTTP listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Default Discord REST API base.
pub const DEFAULT_DISCORD_API_BASE_URL: &str = "https://discord.com/api/v10";

/// Number of most recent posts the store keeps.
pub const DEFAULT_MAX_POSTS: usize = 100;

const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_ITEM_SPACING_MS: u64 = 1000;

/// Main service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the gateway binds to.
    pub listen_addr: String,
    /// Single origin allowed by CORS.
    pub allowed_origin: String,
    /// Directory of static client files. Skipped when missing on disk.
    pub static_dir: Option<PathBuf>,
}

/// Post store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file. Defaults to `Paths::database_file()`.
    pub database_path: Option<PathBuf>,
    /// Cap on stored posts; inserting beyond it evicts the oldest.
    pub max_posts: usize,
}

/// Channel platform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub api_base_url: String,
    /// Bot credential. When absent every send is a permanent failure.
    pub bot_token: Option<String>,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Destination channel id per category.
    pub channels: BTreeMap<Category, String>,
}

/// Delivery worker tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Attempts per item, including the first.
    pub max_attempts: u32,
    /// Pause after each resolved item, in milliseconds.
    pub item_spacing_ms: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            discord: DiscordConfig::default(),
            queue: QueueConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            static_dir: Some(PathBuf::from("public")),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            max_posts: DEFAULT_MAX_POSTS,
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_DISCORD_API_BASE_URL.to_string(),
            bot_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            channels: BTreeMap::new(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            item_spacing_ms: DEFAULT_ITEM_SPACING_MS,
        }
    }
}

impl DiscordConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl QueueConfig {
    pub fn item_spacing(&self) -> Duration {
        Duration::from_millis(self.item_spacing_ms)
    }
}

impl Config {
    /// Load configuration from the default file location, falling back to
    /// defaults, then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            debug!(path = %config_path.display(), "Loading config file");
            Self::load_from_file(&config_path)?
        } else {
            debug!(path = %config_path.display(), "No config file, using defaults");
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override configuration from the process environment.
    pub fn load_from_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Override configuration from an arbitrary variable lookup.
    ///
    /// Blank values are ignored. Recognised variables: `POSTRELAY_LOG_LEVEL`,
    /// `PORT`, `ALLOWED_ORIGIN`, `DISCORD_BOT_TOKEN`, `DISCORD_API_BASE_URL`
    /// and `DISCORD_CHANNEL_<CATEGORY>`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(level) = get("POSTRELAY_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(port) = get("PORT") {
            self.server.listen_addr = with_port(&self.server.listen_addr, &port);
        }
        if let Some(origin) = get("ALLOWED_ORIGIN") {
            self.server.allowed_origin = origin;
        }
        if let Some(token) = get("DISCORD_BOT_TOKEN") {
            self.discord.bot_token = Some(token);
        }
        if let Some(url) = get("DISCORD_API_BASE_URL") {
            self.discord.api_base_url = url;
        }
        for category in Category::ALL {
            let key = format!("DISCORD_CHANNEL_{}", category.env_suffix());
            if let Some(channel_id) = get(&key) {
                self.discord.channels.insert(category, channel_id);
            }
        }
    }

    /// Reject settings the service cannot start with.
    pub fn validate(&self) -> CoreResult<()> {
        self.listen_addr()?;
        if self.queue.max_attempts == 0 {
            return Err(CoreError::Config(
                "queue.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.store.max_posts == 0 {
            return Err(CoreError::Config(
                "store.max_posts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings that degrade delivery without preventing startup.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.discord.bot_token.as_deref().map_or(true, str::is_empty) {
            warnings.push("no Discord bot token configured; every relay will fail".to_string());
        }
        for category in Category::ALL {
            if !self.discord.channels.contains_key(&category) {
                warnings.push(format!("no channel configured for category {}", category));
            }
        }
        warnings
    }

    /// Parsed listen address.
    pub fn listen_addr(&self) -> CoreResult<SocketAddr> {
        self.server.listen_addr.parse().map_err(|e| {
            CoreError::Config(format!(
                "invalid listen address {:?}: {}",
                self.server.listen_addr, e
            ))
        })
    }

    /// Database path, falling back to the standard location.
    pub fn database_path(&self, paths: &Paths) -> PathBuf {
        self.store
            .database_path
            .clone()
            .unwrap_or_else(|| paths.database_file())
    }
}

/// Replace the port of a `host:port` string, keeping the host.
fn with_port(addr: &str, port: &str) -> String {
    let host = addr.rsplit_once(':').map_or("0.0.0.0", |(host, _)| host);
    format!("{}:{}", host, port)
}
