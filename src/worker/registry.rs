//! Worker registration and lifecycle management
//!
//! The registry owns the persisted registration record and decides when a
//! worker version is installed, activated, revived or retired.

use crate::cache::CacheStorage;
use crate::config::WorkerConfig;
use crate::error::{NewswError, NewswResult};
use crate::http::Fetcher;
use crate::journal::Journal;
use crate::worker::clients::Clients;
use crate::worker::events::{InstallOutcome, LifecycleObserver, NoopObserver};
use crate::worker::handlers::WorkerScope;
use crate::worker::scheduler::{Worker, WorkerHandle};
use crate::worker::state::{fingerprint, Registration, WorkerRecord, WorkerState};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Lifecycle manager for the worker of one state directory
pub struct Registry {
    state_dir: PathBuf,
    config: Arc<WorkerConfig>,
    storage: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
    clients: Clients,
    journal: Journal,
    observer: Arc<dyn LifecycleObserver>,
    active: Mutex<Option<WorkerHandle>>,
}

impl Registry {
    pub fn new(state_dir: &Path, config: WorkerConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            state_dir: state_dir.to_path_buf(),
            config: Arc::new(config),
            storage: CacheStorage::new(state_dir),
            fetcher,
            clients: Clients::new(),
            journal: Journal::disabled(),
            observer: Arc::new(NoopObserver),
            active: Mutex::new(None),
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        self.fetcher.clone()
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Register the configured worker script.
    ///
    /// Registering an unchanged script returns the active worker without a
    /// new install. A changed script installs a new version; if that install
    /// fails, the previous version stays in control.
    pub async fn register(&self) -> NewswResult<WorkerHandle> {
        let mut active = self.active.lock().await;
        if active.is_none() {
            *active = self.revive_persisted().await?;
        }

        let wanted = fingerprint(&self.config);
        if let Some(current) = active.as_ref() {
            if current.state() == WorkerState::Activated && current.record()?.fingerprint == wanted
            {
                debug!("Worker {} already registered", current.id());
                return Ok(current.clone());
            }
        }

        let (installed, outcome) = self.install_version().await?;
        if !outcome.skip_waiting {
            info!("Worker {} installed and waiting", installed.id());
            return Ok(installed);
        }

        self.activate_version(&mut active, installed).await
    }

    /// The worker currently in control, reviving a persisted one if needed
    pub async fn active(&self) -> NewswResult<Option<WorkerHandle>> {
        let mut active = self.active.lock().await;
        if active.is_none() {
            *active = self.revive_persisted().await?;
        }
        Ok(active.clone())
    }

    /// Retire the active worker and forget the registration.
    ///
    /// Cache stores are kept. Returns false if nothing was registered.
    pub async fn unregister(&self) -> NewswResult<bool> {
        let mut active = self.active.lock().await;

        if let Some(worker) = active.take() {
            worker.mark_redundant();
            self.clients.release(worker.id()).await;
        }

        let removed = Registration::delete(&self.state_dir).await?;
        if removed {
            info!("Worker registration removed");
            self.journal.record("worker.unregistered", &json!({})).await;
        }
        Ok(removed)
    }

    async fn revive_persisted(&self) -> NewswResult<Option<WorkerHandle>> {
        let Some(registration) = Registration::load(&self.state_dir).await? else {
            return Ok(None);
        };

        let record = registration.active;
        if record.state != WorkerState::Activated {
            debug!("Ignoring registration in state {}", record.state);
            return Ok(None);
        }

        let scope = self.scope_for(&record)?;
        let worker = Worker::revive(scope, record);
        self.clients.claim(&worker).await;

        debug!("Revived worker {}", worker.id());
        Ok(Some(worker))
    }

    async fn install_version(&self) -> NewswResult<(WorkerHandle, InstallOutcome)> {
        let record = WorkerRecord::new(&self.config);
        let worker = Worker::spawn(self.scope_for(&record)?, record);
        info!(
            "Installing worker {} into {}",
            worker.id(),
            self.config.cache_name
        );

        match worker.install().await {
            Ok(outcome) => {
                self.journal
                    .record(
                        "worker.installed",
                        &json!({
                            "id": worker.id(),
                            "cache_name": self.config.cache_name,
                            "assets": self.config.static_assets.len(),
                        }),
                    )
                    .await;
                Ok((worker, outcome))
            }
            Err(e) => {
                worker.mark_redundant();
                self.journal
                    .record(
                        "worker.install_failed",
                        &json!({
                            "id": worker.id(),
                            "cache_name": self.config.cache_name,
                            "reason": e.to_string(),
                        }),
                    )
                    .await;
                Err(NewswError::InstallFailed {
                    cache_name: self.config.cache_name.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn activate_version(
        &self,
        active: &mut Option<WorkerHandle>,
        worker: WorkerHandle,
    ) -> NewswResult<WorkerHandle> {
        let outcome = match worker.activate().await {
            Ok(outcome) => outcome,
            Err(e) => {
                worker.mark_redundant();
                return Err(e);
            }
        };

        if outcome.claim_clients {
            let claimed = self.clients.claim(&worker).await;
            debug!("Worker {} claimed {} page(s)", worker.id(), claimed);
        }

        if let Some(previous) = active.replace(worker.clone()) {
            previous.mark_redundant();
            info!("Worker {} superseded by {}", previous.id(), worker.id());
        }

        Registration::new(worker.record()?)
            .save(&self.state_dir)
            .await?;

        if !outcome.purged.is_empty() {
            self.journal
                .record("cache.purged", &json!({ "caches": outcome.purged }))
                .await;
        }
        self.journal
            .record(
                "worker.activated",
                &json!({ "id": worker.id(), "cache_name": self.config.cache_name }),
            )
            .await;

        Ok(worker)
    }

    fn scope_for(&self, record: &WorkerRecord) -> NewswResult<WorkerScope> {
        WorkerScope::new(
            record,
            &self.config,
            self.storage.clone(),
            self.fetcher.clone(),
            self.observer.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::ScriptedFetcher;
    use crate::http::Request;
    use tempfile::TempDir;
    use url::Url;

    const ORIGIN: &str = "http://localhost:8080/";

    fn config(cache_name: &str) -> WorkerConfig {
        WorkerConfig {
            origin: ORIGIN.to_string(),
            cache_name: cache_name.to_string(),
            static_assets: vec!["./".to_string(), "./style.css".to_string()],
            ..WorkerConfig::default()
        }
    }

    fn serving_fetcher() -> Arc<ScriptedFetcher> {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher
            .respond("http://localhost:8080/", 200, "index")
            .respond("http://localhost:8080/style.css", 200, "css");
        fetcher
    }

    fn registry(temp: &TempDir, config: WorkerConfig, fetcher: Arc<ScriptedFetcher>) -> Registry {
        Registry::new(temp.path(), config, fetcher)
    }

    #[tokio::test]
    async fn register_installs_and_activates() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp, config("news-v1"), serving_fetcher());

        let worker = registry.register().await.unwrap();

        assert_eq!(worker.state(), WorkerState::Activated);
        let saved = Registration::load(temp.path()).await.unwrap().unwrap();
        assert_eq!(saved.active.id, worker.id());
        assert_eq!(saved.active.state, WorkerState::Activated);
    }

    #[tokio::test]
    async fn register_twice_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let fetcher = serving_fetcher();
        let registry = registry(&temp, config("news-v1"), fetcher.clone());

        let first = registry.register().await.unwrap();
        let second = registry.register().await.unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(fetcher.call_count("http://localhost:8080/style.css"), 1);
    }

    #[tokio::test]
    async fn registration_survives_restart() {
        let temp = TempDir::new().unwrap();
        let fetcher = serving_fetcher();

        let first = registry(&temp, config("news-v1"), fetcher.clone())
            .register()
            .await
            .unwrap()
            .id();
        let second = registry(&temp, config("news-v1"), fetcher.clone())
            .register()
            .await
            .unwrap()
            .id();

        assert_eq!(first, second);
        assert_eq!(fetcher.call_count("http://localhost:8080/"), 1);
    }

    #[tokio::test]
    async fn new_version_supersedes_old() {
        let temp = TempDir::new().unwrap();
        let fetcher = serving_fetcher();

        let old_registry = registry(&temp, config("news-v1"), fetcher.clone());
        let old = old_registry.register().await.unwrap();

        let new_registry = registry(&temp, config("news-v2"), fetcher.clone());
        let new = new_registry.register().await.unwrap();

        assert_ne!(old.id(), new.id());
        assert_eq!(new.record().unwrap().cache_name, "news-v2");
        let saved = Registration::load(temp.path()).await.unwrap().unwrap();
        assert_eq!(saved.active.id, new.id());
        // Stale stores stay unless purging is enabled
        assert!(new_registry.storage().has("news-v1"));
    }

    #[tokio::test]
    async fn failed_install_keeps_previous_worker() {
        let temp = TempDir::new().unwrap();
        let fetcher = serving_fetcher();
        let registry_v1 = registry(&temp, config("news-v1"), fetcher.clone());
        let old = registry_v1.register().await.unwrap();

        let mut broken = config("news-v2");
        broken.static_assets.push("./missing.js".to_string());
        let registry_v2 = registry(&temp, broken, fetcher.clone());

        let err = registry_v2.register().await.unwrap_err();
        assert!(matches!(err, NewswError::InstallFailed { .. }));

        let active = registry_v2.active().await.unwrap().unwrap();
        assert_eq!(active.id(), old.id());
        assert!(registry_v2
            .storage()
            .open("news-v2")
            .await
            .unwrap()
            .is_empty()
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn activation_claims_open_pages() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp, config("news-v1"), serving_fetcher());
        let page = registry.clients().add(None).await;
        assert!(registry.clients().controller(page).await.is_none());

        let worker = registry.register().await.unwrap();

        let controller = registry.clients().controller(page).await.unwrap();
        assert_eq!(controller.id(), worker.id());
    }

    #[tokio::test]
    async fn revived_worker_serves_offline() {
        let temp = TempDir::new().unwrap();
        let fetcher = serving_fetcher();
        registry(&temp, config("news-v1"), fetcher.clone())
            .register()
            .await
            .unwrap();

        fetcher.go_offline();
        let restarted = registry(&temp, config("news-v1"), fetcher.clone());
        let worker = restarted.active().await.unwrap().unwrap();

        let request = Request::get(Url::parse("http://localhost:8080/style.css").unwrap());
        let response = worker.fetch(request).await.unwrap().unwrap();
        assert_eq!(response.text(), "css");
    }

    #[tokio::test]
    async fn unregister_forgets_worker() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp, config("news-v1"), serving_fetcher());
        let worker = registry.register().await.unwrap();

        assert!(registry.unregister().await.unwrap());
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(registry.active().await.unwrap().is_none());
        assert!(registry.storage().has("news-v1"));
        assert!(!registry.unregister().await.unwrap());
    }

    #[tokio::test]
    async fn journal_records_lifecycle() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp, config("news-v1"), serving_fetcher())
            .with_journal(Journal::new(temp.path(), true));
        registry.register().await.unwrap();

        let content = std::fs::read_to_string(Journal::file_path(temp.path())).unwrap();
        assert!(content.contains("worker.installed"));
        assert!(content.contains("worker.activated"));
    }
}
