//! Cache command - inspect and clean cache stores

use crate::cache::{CacheStorage, EntrySummary};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::{Config, ConfigManager};
use crate::error::NewswResult;
use crate::journal::Journal;
use crate::ui::{report, Terminal};
use crate::worker::Registration;
use console::style;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing::debug;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> NewswResult<()> {
    let state_dir = ConfigManager::state_dir(config);
    let storage = CacheStorage::new(&state_dir);
    let journal = Journal::new(&state_dir, config.general.journal);

    match args.action {
        CacheAction::List { format } => {
            let in_use = stores_in_use(&state_dir, config).await?;
            list_stores(&storage, &in_use, format).await
        }
        CacheAction::Show { name, format } => {
            let name = name.unwrap_or_else(|| config.worker.cache_name.clone());
            show_store(&storage, &name, format).await
        }
        CacheAction::Purge { dry_run } => {
            let in_use = stores_in_use(&state_dir, config).await?;
            purge_stale(&storage, &journal, &in_use, dry_run).await
        }
        CacheAction::Clear { name, yes } => clear_stores(&storage, name, yes).await,
    }
}

/// The configured store plus the one the registered worker still serves from.
///
/// They differ after `worker.cache_name` changes and before the next
/// registration installs the new version.
async fn stores_in_use(state_dir: &Path, config: &Config) -> NewswResult<Vec<String>> {
    let mut names = vec![config.worker.cache_name.clone()];
    if let Some(registration) = Registration::load(state_dir).await? {
        if registration.active.cache_name != config.worker.cache_name {
            names.push(registration.active.cache_name);
        }
    }
    Ok(names)
}

#[derive(Serialize)]
struct StoreRow {
    name: String,
    entries: usize,
    bytes: usize,
    current: bool,
}

async fn list_stores(
    storage: &CacheStorage,
    in_use: &[String],
    format: OutputFormat,
) -> NewswResult<()> {
    let mut rows = vec![];
    for name in storage.keys().await? {
        let entries = storage.get(&name).await?.entries().await?;
        rows.push(StoreRow {
            current: in_use.contains(&name),
            entries: entries.len(),
            bytes: entries.iter().map(|e| e.size).sum(),
            name,
        });
    }

    if rows.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => println!("No cache stores found."),
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => {
            println!(
                "{:<24} {:<10} {:<12} {:<10}",
                style("NAME").bold(),
                style("ENTRIES").bold(),
                style("SIZE").bold(),
                style("STATE").bold()
            );
            println!("{}", "-".repeat(58));
            for row in &rows {
                let state = if row.current {
                    style("current").green().to_string()
                } else {
                    style("stale").dim().to_string()
                };
                println!(
                    "{:<24} {:<10} {:<12} {:<10}",
                    row.name,
                    row.entries,
                    format_size(row.bytes),
                    state
                );
            }
            println!();
            println!("Total: {} store(s)", rows.len());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }

    Ok(())
}

async fn show_store(storage: &CacheStorage, name: &str, format: OutputFormat) -> NewswResult<()> {
    let entries = storage.get(name).await?.entries().await?;

    match format {
        OutputFormat::Table => print_entries(name, &entries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{} {}", entry.method, entry.url);
            }
        }
    }

    Ok(())
}

fn print_entries(name: &str, entries: &[EntrySummary]) {
    if entries.is_empty() {
        println!("Cache store {} is empty.", name);
        return;
    }

    println!(
        "{:<7} {:<6} {:<10} {:<17} {}",
        style("METHOD").bold(),
        style("STATUS").bold(),
        style("SIZE").bold(),
        style("CACHED").bold(),
        style("URL").bold()
    );
    for entry in entries {
        let status = if (200..300).contains(&entry.status) {
            style(entry.status).green()
        } else {
            style(entry.status).yellow()
        };
        println!(
            "{:<7} {:<6} {:<10} {:<17} {}",
            entry.method,
            status,
            format_size(entry.size),
            entry.cached_at.format("%Y-%m-%d %H:%M"),
            entry.url
        );
    }
    println!();
    println!("{}: {} entries", name, entries.len());
}

/// Delete every store no worker version uses
async fn purge_stale(
    storage: &CacheStorage,
    journal: &Journal,
    in_use: &[String],
    dry_run: bool,
) -> NewswResult<()> {
    let stale: Vec<String> = storage
        .keys()
        .await?
        .into_iter()
        .filter(|name| !in_use.contains(name))
        .collect();

    if stale.is_empty() {
        println!("No stale cache stores.");
        return Ok(());
    }

    println!(
        "Stale cache store(s), keeping {}:",
        style(in_use.join(", ")).green()
    );
    for name in &stale {
        println!("  {} {}", style("•").red(), name);
    }

    if dry_run {
        println!();
        println!("Dry run - no stores removed.");
        return Ok(());
    }

    let mut purged = vec![];
    for name in stale {
        if storage.delete(&name).await? {
            purged.push(name);
        }
    }
    journal
        .record("cache.purged", &json!({ "caches": purged }))
        .await;

    println!();
    println!("{} removed {} store(s)", style("✓").green(), purged.len());
    Ok(())
}

/// Delete one store, or all of them
async fn clear_stores(
    storage: &CacheStorage,
    name: Option<String>,
    skip_confirm: bool,
) -> NewswResult<()> {
    let term = Terminal::detect().assume_yes(skip_confirm);

    let targets = match name {
        Some(name) => {
            storage.get(&name).await?;
            vec![name]
        }
        None => storage.keys().await?,
    };

    if targets.is_empty() {
        println!("No cache stores to clear.");
        return Ok(());
    }

    if !term.confirm_removal("Clearing caches", &targets).await? {
        report::removal_aborted(&term);
        return Ok(());
    }

    let mut removed = 0;
    for name in &targets {
        debug!("Removing cache store {}", name);
        if storage.delete(name).await? {
            removed += 1;
        }
    }

    report::stores_cleared(&term, removed);
    Ok(())
}

fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::WorkerRecord;
    use tempfile::TempDir;

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    fn in_use(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn purge_keeps_current_store() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        storage.open("news-v0").await.unwrap();
        storage.open("news-v1").await.unwrap();

        let keep = stores_in_use(temp.path(), &Config::default()).await.unwrap();
        purge_stale(&storage, &Journal::disabled(), &keep, false)
            .await
            .unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["news-v1"]);
    }

    #[tokio::test]
    async fn purge_spares_store_of_registered_worker() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        storage.open("news-v0").await.unwrap();
        storage.open("news-v1").await.unwrap();

        // Registered as news-v1, then reconfigured without re-registering
        let registered = WorkerRecord::new(&Config::default().worker);
        Registration::new(registered).save(temp.path()).await.unwrap();
        let mut config = Config::default();
        config.worker.cache_name = "news-v2".to_string();

        let keep = stores_in_use(temp.path(), &config).await.unwrap();
        assert_eq!(keep, in_use(&["news-v2", "news-v1"]));

        purge_stale(&storage, &Journal::disabled(), &keep, false)
            .await
            .unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["news-v1"]);
    }

    #[tokio::test]
    async fn purge_dry_run_removes_nothing() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        storage.open("news-v0").await.unwrap();

        purge_stale(&storage, &Journal::disabled(), &in_use(&["news-v1"]), true)
            .await
            .unwrap();

        assert!(storage.has("news-v0"));
    }
}
