//! Unregister command - retire the worker

use crate::cli::args::UnregisterArgs;
use crate::cli::commands::open_registry;
use crate::config::Config;
use crate::error::NewswResult;
use crate::ui::{report, Terminal};
use tracing::debug;

/// Execute the unregister command
pub async fn execute(args: UnregisterArgs, config: &Config) -> NewswResult<()> {
    let term = Terminal::detect().assume_yes(args.yes);
    let registry = open_registry(config, None);
    let storage = registry.storage();

    let doomed = if args.clear_caches {
        let stores = storage.keys().await?;
        if !term.confirm_removal("Unregistering the worker", &stores).await? {
            report::removal_aborted(&term);
            return Ok(());
        }
        stores
    } else {
        vec![]
    };

    report::worker_unregistered(&term, registry.unregister().await?);

    if args.clear_caches {
        let mut removed = 0;
        for name in &doomed {
            debug!("Deleting cache store {}", name);
            if storage.delete(name).await? {
                removed += 1;
            }
        }
        report::stores_cleared(&term, removed);
    }

    Ok(())
}
