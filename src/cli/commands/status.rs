//! Status command - show the registration and cache stores

use crate::cache::CacheStorage;
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::{Config, ConfigManager};
use crate::error::NewswResult;
use crate::worker::{fingerprint, Registration, WorkerRecord};
use console::{style, Emoji};
use serde::Serialize;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");
static NONE: Emoji<'_, '_> = Emoji("○ ", "[-] ");

#[derive(Serialize)]
struct StoreStatus {
    name: String,
    entries: usize,
    current: bool,
}

#[derive(Serialize)]
struct Status {
    state_dir: String,
    worker: Option<WorkerRecord>,
    /// Registered version no longer matches the configuration
    outdated: bool,
    caches: Vec<StoreStatus>,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> NewswResult<()> {
    let status = collect(config).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Plain => print_plain(&status),
        OutputFormat::Table => print_table(&status),
    }

    Ok(())
}

async fn collect(config: &Config) -> NewswResult<Status> {
    let state_dir = ConfigManager::state_dir(config);
    let worker = Registration::load(&state_dir).await?.map(|r| r.active);
    let outdated = worker
        .as_ref()
        .is_some_and(|w| w.fingerprint != fingerprint(&config.worker));

    let storage = CacheStorage::new(&state_dir);
    let mut caches = vec![];
    for name in storage.keys().await? {
        let entries = storage.get(&name).await?.len().await?;
        caches.push(StoreStatus {
            current: name == config.worker.cache_name,
            name,
            entries,
        });
    }

    Ok(Status {
        state_dir: state_dir.display().to_string(),
        worker,
        outdated,
        caches,
    })
}

fn print_table(status: &Status) {
    println!("{}", style("newsw status").bold().cyan());
    println!();
    println!("{}", style("Worker:").bold());

    match status.worker {
        Some(ref worker) => {
            println!("  {} {} ({})", CHECK, worker.id, style(worker.state).green());
            println!("    script: {}", worker.script);
            println!("    origin: {}", worker.origin);
            println!("    cache:  {}", worker.cache_name);
            if let Some(at) = worker.activated_at {
                println!("    active since {}", at.format("%Y-%m-%d %H:%M"));
            }
            if status.outdated {
                println!(
                    "  {} {} - Run: newsw register",
                    WARN,
                    style("Configuration changed since registration").yellow()
                );
            }
        }
        None => println!("  {} {} - Run: newsw register", NONE, style("Not registered").dim()),
    }

    println!();
    println!("{}", style("Cache stores:").bold());
    if status.caches.is_empty() {
        println!("  {} {}", NONE, style("None").dim());
    }
    for cache in &status.caches {
        let marker = if cache.current {
            style("(current)").green().to_string()
        } else {
            style("(stale)").dim().to_string()
        };
        println!("  {} {} entries {}", cache.name, cache.entries, marker);
    }

    println!();
    println!("State directory: {}", style(&status.state_dir).dim());
}

fn print_plain(status: &Status) {
    match status.worker {
        Some(ref worker) => println!("worker\t{}\t{}", worker.id, worker.state),
        None => println!("worker\tnone"),
    }
    for cache in &status.caches {
        println!("cache\t{}\t{}", cache.name, cache.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn collect_flags_outdated_registration() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.general.state_dir = Some(temp.path().to_path_buf());

        let record = WorkerRecord::new(&config.worker);
        Registration::new(record).save(temp.path()).await.unwrap();
        CacheStorage::new(temp.path()).open("news-v1").await.unwrap();

        let status = collect(&config).await.unwrap();
        assert!(!status.outdated);
        assert_eq!(status.caches.len(), 1);
        assert!(status.caches[0].current);

        config.worker.cache_name = "news-v2".to_string();
        let status = collect(&config).await.unwrap();
        assert!(status.outdated);
        assert!(!status.caches[0].current);
    }
}
