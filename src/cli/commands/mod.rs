//! CLI command implementations

pub mod articles;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod register;
pub mod status;
pub mod unregister;

pub use articles::execute as articles;
pub use cache::execute as cache;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use register::execute as register;
pub use status::execute as status;
pub use unregister::execute as unregister;

use crate::config::{Config, ConfigManager};
use crate::http::UreqFetcher;
use crate::journal::Journal;
use crate::worker::{LifecycleObserver, Registry};
use std::sync::Arc;

/// Registry for the configured state directory, talking to the real network
pub(crate) fn open_registry(
    config: &Config,
    observer: Option<Arc<dyn LifecycleObserver>>,
) -> Arc<Registry> {
    let state_dir = ConfigManager::state_dir(config);
    let fetcher = Arc::new(UreqFetcher::new(&config.network));
    let journal = Journal::new(&state_dir, config.general.journal);

    let mut registry =
        Registry::new(&state_dir, config.worker.clone(), fetcher).with_journal(journal);
    if let Some(observer) = observer {
        registry = registry.with_observer(observer);
    }
    Arc::new(registry)
}
