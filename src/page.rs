//! Page controller
//!
//! A page loads the article list and registers the worker at the same time.
//! Once a worker controls the page, every request the page makes goes
//! through that worker; until then it goes straight to the network.

use crate::config::FeedConfig;
use crate::error::{NewswError, NewswResult};
use crate::http::{Request, Response};
use crate::worker::{Registry, WorkerHandle};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// One article from the feed.
///
/// Articles are opaque JSON objects; accessors read the fields the
/// renderer knows about and ignore everything else.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Article(Value);

impl Article {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(Value::as_str)
    }

    pub fn url(&self) -> Option<&str> {
        self.0.get("url").and_then(Value::as_str)
    }

    pub fn published_at(&self) -> Option<&str> {
        self.0.get("publishedAt").and_then(Value::as_str)
    }

    /// Name of the publishing source, e.g. `source.name`
    pub fn source(&self) -> Option<&str> {
        self.0
            .get("source")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }
}

#[derive(Deserialize)]
struct Feed {
    articles: Vec<Article>,
}

/// Outcome of [`Page::load`]
#[derive(Debug)]
pub struct PageLoad {
    pub articles: NewswResult<Vec<Article>>,

    /// Whether the worker registration succeeded
    pub registered: bool,
}

/// A client of the worker
pub struct Page {
    id: Uuid,
    registry: Arc<Registry>,
    feed: FeedConfig,
}

impl Page {
    /// Open a page, controlled from the start if a worker is already active
    pub async fn open(registry: Arc<Registry>, feed: FeedConfig) -> Self {
        let controller = match registry.active().await {
            Ok(worker) => worker,
            Err(e) => {
                warn!("Could not restore worker registration: {}", e);
                None
            }
        };

        if let Some(ref worker) = controller {
            debug!("Page controlled by worker {}", worker.id());
        }

        let id = registry.clients().add(controller).await;
        Self { id, registry, feed }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The worker currently controlling this page
    pub async fn controller(&self) -> Option<WorkerHandle> {
        self.registry.clients().controller(self.id).await
    }

    /// Issue a request from this page.
    ///
    /// `Ok(None)` means the controlling worker had nothing to answer with.
    pub async fn fetch(&self, request: Request) -> NewswResult<Option<Response>> {
        match self.controller().await {
            Some(worker) => worker.fetch(request).await,
            None => self.registry.fetcher().fetch(&request).await.map(Some),
        }
    }

    /// Fetch and parse the article list
    pub async fn fetch_articles(&self) -> NewswResult<Vec<Article>> {
        let url =
            Url::parse(&self.feed.url).map_err(|e| NewswError::invalid_url(&self.feed.url, e))?;
        let mut request = Request::get(url);
        if let Some(ref key) = self.feed.api_key {
            request = request.with_header("X-Api-Key", key.as_str());
        }

        let response = self
            .fetch(request)
            .await?
            .ok_or_else(|| NewswError::NoResponse(self.feed.url.clone()))?;

        if !response.ok() {
            return Err(NewswError::FeedRejected {
                url: self.feed.url.clone(),
                status: response.status(),
            });
        }

        let feed: Feed = response.json()?;
        debug!("Feed returned {} articles", feed.articles.len());
        Ok(feed.articles)
    }

    /// Register the worker. Failures are logged, never returned.
    pub async fn register_worker(&self) -> bool {
        match self.registry.register().await {
            Ok(worker) => {
                info!("Worker {} registered ({})", worker.id(), worker.state());
                true
            }
            Err(e) => {
                warn!("Worker registration failed: {}", e);
                false
            }
        }
    }

    /// Load articles and register the worker concurrently
    pub async fn load(&self) -> PageLoad {
        let (articles, registered) = tokio::join!(self.fetch_articles(), self.register_worker());
        PageLoad {
            articles,
            registered,
        }
    }

    /// Close the page and drop it from the open page set
    pub async fn close(self) {
        self.registry.clients().remove(self.id).await;
    }
}
