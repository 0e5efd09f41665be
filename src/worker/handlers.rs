//! Worker event handlers and the read-only scope they run in

use crate::cache::CacheStorage;
use crate::config::WorkerConfig;
use crate::error::{NewswError, NewswResult};
use crate::http::{Fetcher, Request, Response};
use crate::worker::events::{ActivateOutcome, InstallOutcome, LifecycleObserver};
use crate::worker::router::{RequestClass, Router};
use crate::worker::state::WorkerRecord;
use crate::worker::strategy;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Everything a worker version can see. Built once, never mutated.
pub struct WorkerScope {
    pub id: Uuid,
    pub cache_name: String,
    pub origin: Url,
    pub static_assets: Vec<String>,
    pub purge_stale_caches: bool,
    pub router: Router,
    pub storage: CacheStorage,
    pub fetcher: Arc<dyn Fetcher>,
    pub observer: Arc<dyn LifecycleObserver>,
}

impl WorkerScope {
    /// Scope for the worker version described by `record`
    pub fn new(
        record: &WorkerRecord,
        config: &WorkerConfig,
        storage: CacheStorage,
        fetcher: Arc<dyn Fetcher>,
        observer: Arc<dyn LifecycleObserver>,
    ) -> NewswResult<Self> {
        let origin =
            Url::parse(&record.origin).map_err(|e| NewswError::invalid_url(&record.origin, e))?;

        Ok(Self {
            id: record.id,
            cache_name: record.cache_name.clone(),
            router: Router::new(&origin),
            origin,
            static_assets: config.static_assets.clone(),
            purge_stale_caches: config.purge_stale_caches,
            storage,
            fetcher,
            observer,
        })
    }

    /// Static asset paths resolved against the worker origin
    pub fn asset_requests(&self) -> NewswResult<Vec<Request>> {
        self.static_assets
            .iter()
            .map(|path| Request::parse("GET", path, &self.origin))
            .collect()
    }
}

/// Precache every static asset into this version's store
pub async fn on_install(scope: &WorkerScope) -> NewswResult<InstallOutcome> {
    let store = scope.storage.open(&scope.cache_name).await?;
    let requests = scope.asset_requests()?;

    store
        .add_all_with_progress(scope.fetcher.as_ref(), &requests, &|done, total, request| {
            scope.observer.asset_fetched(done, total, request.url())
        })
        .await?;

    info!(
        "Worker {} precached {} assets into {}",
        scope.id,
        requests.len(),
        scope.cache_name
    );
    Ok(InstallOutcome { skip_waiting: true })
}

/// Apply the stale-store policy and ask to claim every page
pub async fn on_activate(scope: &WorkerScope) -> NewswResult<ActivateOutcome> {
    let purged = if scope.purge_stale_caches {
        scope.storage.delete_all_except(&scope.cache_name).await?
    } else {
        vec![]
    };

    if !purged.is_empty() {
        info!("Worker {} purged stale caches: {}", scope.id, purged.join(", "));
    }

    Ok(ActivateOutcome {
        claim_clients: true,
        purged,
    })
}

/// Route one intercepted request through its strategy
pub async fn on_fetch(scope: &WorkerScope, request: &Request) -> NewswResult<Option<Response>> {
    let store = scope.storage.open(&scope.cache_name).await?;
    let class = scope.router.classify(request);
    debug!("Intercepted {} as {:?}", request, class);

    match class {
        RequestClass::Static => strategy::cache_first(&store, scope.fetcher.as_ref(), request)
            .await
            .map(Some),
        RequestClass::Dynamic => {
            strategy::network_first(&store, scope.fetcher.as_ref(), request).await
        }
    }
}
