//! Error types for newsw
//!
//! All modules use `NewswResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for newsw operations
pub type NewswResult<T> = Result<T, NewswError>;

/// All errors that can occur in newsw
#[derive(Error, Debug)]
pub enum NewswError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Network errors
    #[error("Network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Response body for {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: u64 },

    // Cache errors
    #[error("Invalid cache name: {0}")]
    InvalidCacheName(String),

    #[error("Cache store not found: {0}")]
    CacheNotFound(String),

    #[error("Corrupt cache entry {path}: {reason}")]
    CacheEntryCorrupt { path: PathBuf, reason: String },

    #[error("Static asset {url} rejected with status {status}")]
    AssetRejected { url: String, status: u16 },

    // Worker errors
    #[error("Worker install failed for {cache_name}: {reason}")]
    InstallFailed { cache_name: String, reason: String },

    #[error("Worker {0} is redundant")]
    WorkerRedundant(String),

    #[error("Worker {0} is not active")]
    WorkerNotActive(String),

    #[error("Worker {0} stopped before responding")]
    WorkerGone(String),

    #[error("No response for {0}")]
    NoResponse(String),

    #[error("Feed {url} answered with status {status}")]
    FeedRejected { url: String, status: u16 },

    #[error("Invalid worker state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl NewswError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error came from the network rather than local state
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::BodyTooLarge { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InstallFailed { .. } => {
                Some("Check that worker.origin serves every path in worker.static_assets")
            }
            Self::InvalidCacheName(_) => Some("Cache names may only contain A-Z a-z 0-9 . _ -"),
            Self::ConfigInvalid { .. } => Some("Run: newsw config init --force"),
            Self::FeedRejected { status: 401, .. } => {
                Some("Run: newsw config set feed.api_key <key>")
            }
            Self::Network { .. } | Self::NoResponse(_) => {
                Some("You may be offline and nothing is cached for this request yet")
            }
            _ => None,
        }
    }
}
