//! On-disk representation of one cached request/response pair

use crate::error::{NewswError, NewswResult};
use crate::http::{Headers, Request, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use url::Url;

/// Cached request/response pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request method
    pub method: String,

    /// Absolute request URL
    pub url: String,

    /// Response status
    pub status: u16,

    /// Response status text
    pub status_text: String,

    /// Response headers in received order
    pub headers: Vec<(String, String)>,

    /// Request header values named by the response's `Vary` header
    #[serde(default)]
    pub vary: Vec<(String, Option<String>)>,

    /// Hex-encoded response body
    pub body: String,

    /// When the entry was written
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Build an entry, consuming the response handed to the cache
    pub fn new(request: &Request, response: Response) -> Self {
        let status = response.status();
        let status_text = response.status_text().to_string();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();

        let vary = response
            .headers()
            .get("vary")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(|name| {
                        (
                            name.to_ascii_lowercase(),
                            request.headers().get(name).map(str::to_string),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            method: request.method().to_string(),
            url: request.cache_url().to_string(),
            status,
            status_text,
            headers,
            vary,
            body: hex::encode(response.into_body()),
            cached_at: Utc::now(),
        }
    }

    /// Whether this entry answers `request`
    ///
    /// Method and URL must be identical, and every header the response varied
    /// on must carry the same value as when the entry was stored.
    pub fn matches(&self, request: &Request) -> bool {
        if self.method != request.method() || self.url != request.cache_url().as_str() {
            return false;
        }

        self.vary.iter().all(|(name, stored)| {
            name != "*" && request.headers().get(name) == stored.as_deref()
        })
    }

    /// Rebuild the response stored in this entry
    pub fn to_response(&self, path: &Path) -> NewswResult<Response> {
        let corrupt = |reason: String| NewswError::CacheEntryCorrupt {
            path: path.to_path_buf(),
            reason,
        };

        let url = Url::parse(&self.url).map_err(|e| corrupt(e.to_string()))?;
        let body = hex::decode(&self.body).map_err(|e| corrupt(e.to_string()))?;
        let headers: Headers = self.headers.iter().cloned().collect();

        Ok(Response::new(self.status, url, headers, body).with_status_text(&self.status_text))
    }

    /// Size of the stored body in bytes
    pub fn body_len(&self) -> usize {
        self.body.len() / 2
    }
}

/// File name for the entry keyed by `request`
pub fn entry_file_name(request: &Request) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.cache_key().as_bytes());
    format!("{}.json", hex::encode(hasher.finalize()))
}
