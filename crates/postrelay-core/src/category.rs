//! The fixed category enumeration a post is tagged with.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Post category. Determines the destination channel.
///
/// Serialized by its exact variant name (`"Hack"`, not `"hack"`), which is
/// also the form clients submit in the `tag` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Entertainment,
    Education,
    Website,
    Hack,
    Others,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 5] = [
        Category::Entertainment,
        Category::Education,
        Category::Website,
        Category::Hack,
        Category::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entertainment => "Entertainment",
            Self::Education => "Education",
            Self::Website => "Website",
            Self::Hack => "Hack",
            Self::Others => "Others",
        }
    }

    /// Exact-match parse of a submitted tag. Anything else is unrecognised.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == tag)
    }

    /// Suffix used for per-category environment variables
    /// (`DISCORD_CHANNEL_ENTERTAINMENT`, ...).
    pub fn env_suffix(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
