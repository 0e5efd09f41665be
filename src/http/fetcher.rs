//! Network access abstraction
//!
//! Provides a trait for performing requests so the worker can be driven by a
//! real HTTP client or by a scripted double in tests.

use crate::config::NetworkConfig;
use crate::error::{NewswError, NewswResult};
use crate::http::message::{Headers, Request, Response};
use async_trait::async_trait;
use tracing::debug;
use ureq::Agent;

/// Abstract network interface
///
/// Every HTTP status, including 4xx and 5xx, is a successful fetch. Only a
/// failure to obtain a response at all is an `Err`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request against the network
    async fn fetch(&self, request: &Request) -> NewswResult<Response>;
}

/// Blocking `ureq` agent driven from the tokio blocking pool
#[derive(Clone)]
pub struct UreqFetcher {
    agent: Agent,
    user_agent: String,
    max_body_bytes: u64,
}

impl UreqFetcher {
    /// Create a fetcher from network configuration
    pub fn new(config: &NetworkConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            user_agent: config.user_agent.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    fn fetch_blocking(&self, request: Request) -> NewswResult<Response> {
        let url = request.url().clone();

        let mut builder = ureq::http::Request::builder()
            .method(request.method())
            .uri(url.as_str());
        if request.headers().get("user-agent").is_none() {
            builder = builder.header("User-Agent", self.user_agent.as_str());
        }
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        let outgoing = builder
            .body(())
            .map_err(|e| NewswError::network(url.as_str(), e.to_string()))?;

        let mut response = self
            .agent
            .run(outgoing)
            .map_err(|e| NewswError::network(url.as_str(), e.to_string()))?;

        let status = response.status();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()
            .map_err(|e| match e {
                ureq::Error::BodyExceedsLimit(limit) => NewswError::BodyTooLarge {
                    url: url.to_string(),
                    limit,
                },
                other => NewswError::network(url.as_str(), other.to_string()),
            })?;

        debug!("{} {} -> {}", request.method(), url, status.as_u16());

        let response = Response::new(status.as_u16(), url, headers, body);
        Ok(match status.canonical_reason() {
            Some(reason) => response.with_status_text(reason),
            None => response,
        })
    }
}

#[async_trait]
impl Fetcher for UreqFetcher {
    async fn fetch(&self, request: &Request) -> NewswResult<Response> {
        let this = self.clone();
        let request = request.clone();

        tokio::task::spawn_blocking(move || this.fetch_blocking(request))
            .await
            .map_err(|e| NewswError::Internal(format!("fetch task failed: {}", e)))?
    }
}
