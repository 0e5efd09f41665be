//! newsw - offline-capable news client
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use newsw::cli::{Cli, Commands, LogFormat};
use newsw::config::ConfigManager;
use newsw::error::{NewswError, NewswResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> NewswResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| NewswError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let mut config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    if let Some(ref state_dir) = cli.state_dir {
        config.general.state_dir = Some(state_dir.clone());
    }

    let json_logs = match cli.log_format {
        Some(format) => format == LogFormat::Json,
        None => config.general.log_format == "json",
    };
    init_logging(cli.verbose, json_logs);

    if let Some(ref path) = local_config_path {
        debug!("Merged local config: {}", path.display());
    }

    // Config commands work without a state directory
    if let Commands::Config(args) = cli.command {
        return newsw::cli::commands::config(args, &config_manager, &config).await;
    }

    let state_dir = ConfigManager::state_dir(&config);
    ConfigManager::ensure_state_dirs(&state_dir).await?;
    debug!("State directory: {}", state_dir.display());

    match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::Articles(args) => newsw::cli::commands::articles(args, &config).await,
        Commands::Fetch(args) => newsw::cli::commands::fetch(args, &config).await,
        Commands::Register => newsw::cli::commands::register(&config).await,
        Commands::Unregister(args) => newsw::cli::commands::unregister(args, &config).await,
        Commands::Status(args) => newsw::cli::commands::status(args, &config).await,
        Commands::Cache(args) => newsw::cli::commands::cache(args, &config).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; logs go to stderr
fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("newsw=warn"),
        1 => EnvFilter::new("newsw=info"),
        _ => EnvFilter::new("newsw=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.with_target(false).without_time().init();
    }
}
