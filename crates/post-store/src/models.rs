//! Post model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source value of posts submitted through the web client. Only these are
/// relayed to the channel platform.
pub const WEBSITE_SOURCE: &str = "website";

/// Source assumed when a submission does not name one.
pub const DEFAULT_SOURCE: &str = "discord";

/// A stored post.
///
/// `message` is the legacy name of `description`; both always hold the same
/// text so older clients keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub topic: String,
    pub description: String,
    pub message: String,
    pub link: String,
    /// Raw submitted category name. May not be a known category.
    pub tag: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl Post {
    /// Whether this post came from the interactive web client.
    pub fn is_from_website(&self) -> bool {
        self.source == WEBSITE_SOURCE
    }

    /// Short human-readable identification for logs: the topic, or the
    /// start of the description when there is no topic.
    pub fn summary(&self) -> String {
        let text = if self.topic.trim().is_empty() {
            self.description.trim()
        } else {
            self.topic.trim()
        };
        const MAX_CHARS: usize = 60;
        if text.chars().count() > MAX_CHARS {
            let cut: String = text.chars().take(MAX_CHARS).collect();
            format!("{}...", cut)
        } else {
            text.to_string()
        }
    }
}

/// Input for creating a post. The store assigns `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub topic: String,
    pub description: String,
    pub link: String,
    pub tag: String,
    pub source: String,
}

impl NewPost {
    /// A post with no topic or link from the default source.
    pub fn new(tag: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            topic: String::new(),
            description: description.into(),
            link: String::new(),
            tag: tag.into(),
            source: DEFAULT_SOURCE.to_string(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(topic: &str, description: &str, source: &str) -> Post {
        Post {
            id: "01J0000000000000000000000".to_string(),
            topic: topic.to_string(),
            description: description.to_string(),
            message: description.to_string(),
            link: String::new(),
            tag: "Hack".to_string(),
            source: source.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn website_source_detection() {
        assert!(post("", "d", "website").is_from_website());
        assert!(!post("", "d", "discord").is_from_website());
        assert!(!post("", "d", "Website").is_from_website());
    }

    #[test]
    fn summary_prefers_topic_and_truncates() {
        assert_eq!(post("Title", "body", "website").summary(), "Title");
        assert_eq!(post("  ", "body text", "website").summary(), "body text");

        let long = "x".repeat(100);
        let summary = post("", &long, "website").summary();
        assert_eq!(summary.len(), 63);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn new_post_builder_defaults() {
        let new = NewPost::new("Education", "Lecture notes")
            .with_topic("Week 3")
            .with_link("https://example.com");
        assert_eq!(new.source, DEFAULT_SOURCE);
        assert_eq!(new.topic, "Week 3");
        assert_eq!(new.link, "https://example.com");
    }

    #[test]
    fn post_serializes_both_body_fields() {
        let json = serde_json::to_value(post("T", "D", "website")).unwrap();
        assert_eq!(json["description"], "D");
        assert_eq!(json["message"], "D");
        assert!(json["timestamp"].is_string());
    }
}
