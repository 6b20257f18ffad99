//! Channel sender: one delivery attempt per call, classified.

use crate::{DeliveryOutcome, OutboxError, OutboxResult};
use async_trait::async_trait;
use post_store::Post;
use postrelay_core::{Category, DiscordConfig, DEFAULT_DISCORD_API_BASE_URL};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Delay used when a rate-limit response carries no usable wait time.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_millis(1000);

/// Performs a single delivery attempt for one post.
///
/// Implementations never retry and never panic on platform errors; every
/// result is expressed as a [`DeliveryOutcome`].
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn send(&self, post: &Post) -> DeliveryOutcome;
}

/// Sender configuration.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Base URL of the platform REST API.
    pub api_base_url: String,
    /// Bot credential. `None` makes every send a permanent failure.
    pub bot_token: Option<String>,
    /// Upper bound on one HTTP attempt.
    pub timeout: Duration,
    /// Destination channel per category.
    pub channels: BTreeMap<Category, String>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_DISCORD_API_BASE_URL.to_string(),
            bot_token: None,
            timeout: Duration::from_secs(10),
            channels: BTreeMap::new(),
        }
    }
}

impl SenderConfig {
    pub fn from_discord(config: &DiscordConfig) -> Self {
        Self {
            api_base_url: config.api_base_url.clone(),
            bot_token: config.bot_token.clone(),
            timeout: config.request_timeout(),
            channels: config.channels.clone(),
        }
    }
}

/// Request body for creating a channel message.
#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    content: &'a str,
}

/// Body of a 429 response. `retry_after` is in seconds.
#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    #[serde(default)]
    retry_after: Option<f64>,
}

/// Build the outbound message text.
///
/// A heading line from the topic (when present), a quoted line with the
/// description, and the raw link on its own line when it is non-blank.
pub fn render_message(post: &Post) -> String {
    let mut lines = Vec::with_capacity(3);
    if !post.topic.trim().is_empty() {
        lines.push(format!("# {}", post.topic));
    }
    lines.push(format!("> {}", post.description));
    if !post.link.trim().is_empty() {
        lines.push(post.link.clone());
    }
    lines.join("\n")
}

/// Convert a platform wait time in seconds into a delay, rounding up to the
/// next millisecond.
fn rate_limit_delay(retry_after_secs: Option<f64>) -> Duration {
    match retry_after_secs {
        Some(secs) if secs.is_finite() && secs > 0.0 => {
            Duration::from_millis((secs * 1000.0).ceil() as u64)
        }
        _ => DEFAULT_RATE_LIMIT_DELAY,
    }
}

/// HTTP sender for the Discord REST API.
pub struct DiscordSender {
    config: SenderConfig,
    client: Client,
}

impl DiscordSender {
    /// Create a new sender.
    pub fn new(config: SenderConfig) -> OutboxResult<Self> {
        if config.timeout.is_zero() {
            return Err(OutboxError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    fn channel_for(&self, tag: &str) -> Option<&str> {
        let category = Category::parse(tag)?;
        self.config.channels.get(&category).map(String::as_str)
    }

    fn message_url(&self, channel_id: &str) -> String {
        format!(
            "{}/channels/{}/messages",
            self.config.api_base_url.trim_end_matches('/'),
            channel_id
        )
    }
}

#[async_trait]
impl ChannelSender for DiscordSender {
    async fn send(&self, post: &Post) -> DeliveryOutcome {
        let Some(channel_id) = self.channel_for(&post.tag) else {
            return DeliveryOutcome::Permanent("unconfigured category".to_string());
        };
        let Some(token) = self
            .config
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        else {
            return DeliveryOutcome::Permanent("missing credential".to_string());
        };

        let url = self.message_url(channel_id);
        let content = render_message(post);

        debug!(post_id = %post.id, tag = %post.tag, channel_id, "Sending message");

        let response = match self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bot {}", token))
            .json(&CreateMessageRequest { content: &content })
            .send()
            .await
        {
            Ok(response) => response,
            // The request could not be built, e.g. a token that is not a
            // valid header value. Retrying cannot fix that.
            Err(e) if e.is_builder() => {
                return DeliveryOutcome::Permanent("invalid credential".to_string())
            }
            Err(e) if e.is_timeout() => {
                return DeliveryOutcome::Transient("request timed out".to_string())
            }
            Err(e) => return DeliveryOutcome::Transient(format!("request failed: {}", e)),
        };

        let status = response.status();
        if status.is_success() {
            return DeliveryOutcome::Delivered;
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .json::<RateLimitResponse>()
                    .await
                    .ok()
                    .and_then(|body| body.retry_after);
                DeliveryOutcome::RateLimited {
                    retry_after: rate_limit_delay(retry_after),
                }
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                DeliveryOutcome::Permanent(format!("HTTP {}", status))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                DeliveryOutcome::Transient(format!("HTTP {}: {}", status, body))
            }
        }
    }
}
