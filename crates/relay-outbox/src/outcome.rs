//! Classified result of a single delivery attempt.

use std::fmt;
use std::time::Duration;

/// What happened when one post was offered to the channel platform once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The platform accepted the message.
    Delivered,
    /// The platform asked us to wait before trying again.
    RateLimited { retry_after: Duration },
    /// Timeout, network failure or server error. Worth retrying.
    Transient(String),
    /// Configuration, credential or permission problem. Retrying cannot help.
    Permanent(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Whether another attempt could change the result.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transient(_))
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered => f.write_str("delivered"),
            Self::RateLimited { retry_after } => {
                write!(f, "rate limited (retry after {}ms)", retry_after.as_millis())
            }
            Self::Transient(reason) => write!(f, "transient failure: {}", reason),
            Self::Permanent(reason) => write!(f, "permanent failure: {}", reason),
        }
    }
}
