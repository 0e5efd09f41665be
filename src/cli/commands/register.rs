//! Register command - install and activate the configured worker

use crate::cli::commands::open_registry;
use crate::config::Config;
use crate::error::NewswResult;
use crate::ui::{report, PrecacheProgress, Terminal};
use std::sync::Arc;

/// Execute the register command
pub async fn execute(config: &Config) -> NewswResult<()> {
    let term = Terminal::detect();
    report::registration_started(&term, &config.worker.cache_name);

    let progress = Arc::new(PrecacheProgress::new(&term, &config.worker.cache_name));
    let registry = open_registry(config, Some(progress.clone()));
    let before = registry.active().await?.map(|w| w.id());

    let result = registry.register().await;
    progress.finish();
    let worker = result?;

    let record = worker.record()?;
    let installed = (before != Some(record.id)).then_some(config.worker.static_assets.len());
    report::registration_finished(&term, &record, worker.state(), installed);
    Ok(())
}
