//! Configuration schema for newsw
//!
//! Configuration is stored at `~/.config/newsw/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Background worker settings
    pub worker: WorkerConfig,

    /// Article feed settings
    pub feed: FeedConfig,

    /// Network client settings
    pub network: NetworkConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Record lifecycle events in the journal
    pub journal: bool,

    /// Override for the state directory (registration + cache stores)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            journal: true,
            state_dir: None,
        }
    }
}

/// Background worker configuration.
///
/// Loaded once at startup and shared read-only by every worker event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Script path the page registers
    pub script: String,

    /// Origin the worker is served from; requests to it are static
    pub origin: String,

    /// Cache store name, one per worker version
    pub cache_name: String,

    /// Paths precached at install, relative to `origin`
    pub static_assets: Vec<String>,

    /// Delete stores of other versions when a worker activates
    pub purge_stale_caches: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            script: "./sw.js".to_string(),
            origin: "http://localhost:8080".to_string(),
            cache_name: "news-v1".to_string(),
            static_assets: [
                "./",
                "./index.html",
                "./style.css",
                "./index.js",
                "./newsApi.js",
                "./manifest.webmanifest",
                "./news-article.js",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            purge_stale_caches: false,
        }
    }
}

/// Article feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Endpoint returning `{ "articles": [...] }`
    pub url: String,

    /// Sent as `X-Api-Key` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "https://newsapi.org/v2/everything?q=PWA&sortBy=publishedAt".to_string(),
            api_key: None,
        }
    }
}

/// Network client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// User-Agent header for outgoing requests
    pub user_agent: String,

    /// Largest response body read from the network
    pub max_body_bytes: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("newsw/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}
