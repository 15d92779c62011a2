use std::time::Duration;
use thiserror::Error;

/// Result type alias for ipwarden operations
pub type Result<T> = std::result::Result<T, WardenError>;

/// Broad classification of a [`WardenError`].
///
/// A reconciliation pass treats every kind the same way (log and skip to the
/// next scheduled attempt); the kind only shapes the log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required settings are absent or malformed
    Config,
    /// Network, HTTP or provider API failure
    Transport,
    /// A value could not be converted (IDs, JSON, URLs)
    Conversion,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Transport => write!(f, "transport"),
            Self::Conversion => write!(f, "conversion"),
        }
    }
}

/// Errors that can occur while syncing firewall rules
#[derive(Error, Debug)]
pub enum WardenError {
    /// A required configuration key is missing or empty
    #[error("{key} is not set")]
    MissingConfig {
        /// Name of the missing key
        key: &'static str,
    },

    /// Configuration could not be loaded or holds a bad value
    #[error("configuration error: {0}")]
    Config(String),

    /// A task could not be scheduled
    #[error("schedule error: {0}")]
    Schedule(String),

    /// Authentication failed - invalid or expired token
    #[error("authentication failed: invalid API token")]
    Unauthorized,

    /// Rate limit exceeded
    #[error("rate limit exceeded, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying
        retry_after: Option<u64>,
    },

    /// Resource not found
    #[error("resource not found: {resource}")]
    NotFound {
        /// Description of the resource that wasn't found
        resource: String,
    },

    /// API returned an error response
    #[error("API error ({code}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from the API
        message: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request timed out
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Firewall identifier is not an integer
    #[error("invalid firewall ID {value:?}: {reason}")]
    InvalidFirewallId {
        /// The raw value that failed to parse
        value: String,
        /// Parser message
        reason: String,
    },

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A reconciliation pass stopped before touching remote state
    #[error("reconciliation pass aborted ({kind}): {message}")]
    PassAborted {
        /// Kind of the error that stopped the pass
        kind: ErrorKind,
        /// Rendered error
        message: String,
    },

    /// Some matching rules could not be updated
    #[error("{failed} of {matched} matching rules failed to update")]
    PartialUpdate {
        /// Rules whose update call failed
        failed: usize,
        /// Rules that matched the label prefix
        matched: usize,
    },
}

impl WardenError {
    /// Classify the error for logging
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingConfig { .. } | Self::Config(_) | Self::Schedule(_) => ErrorKind::Config,
            Self::Unauthorized
            | Self::RateLimited { .. }
            | Self::NotFound { .. }
            | Self::Api { .. }
            | Self::Http(_)
            | Self::Timeout(_)
            | Self::PartialUpdate { .. } => ErrorKind::Transport,
            Self::InvalidFirewallId { .. } | Self::Json(_) | Self::InvalidUrl(_) => {
                ErrorKind::Conversion
            }
            Self::PassAborted { kind, .. } => *kind,
        }
    }

    /// Returns true if the error is due to authentication
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns the HTTP status code if this came from an HTTP response
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::RateLimited { .. } => Some(429),
            Self::NotFound { .. } => Some(404),
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
