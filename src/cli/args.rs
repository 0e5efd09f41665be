//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// newsw - offline-capable news client
///
/// Loads a news feed through a background worker that precaches static
/// assets and keeps serving cached responses when the network is gone.
#[derive(Parser, Debug)]
#[command(name = "newsw")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "NEWSW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .newsw.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// State directory holding the registration and cache stores
    #[arg(long, global = true, env = "NEWSW_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Log output format (overrides general.log_format)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the article feed and register the worker
    Articles(ArticlesArgs),

    /// Request a URL as a page would, through the worker if one is active
    Fetch(FetchArgs),

    /// Register the worker, precaching static assets
    Register,

    /// Retire the active worker and remove its registration
    Unregister(UnregisterArgs),

    /// Show the registration and cache stores
    Status(StatusArgs),

    /// Inspect or clean cache stores
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the articles command
#[derive(Parser, Debug)]
pub struct ArticlesArgs {
    /// Maximum number of articles to show (0 = all)
    #[arg(short = 'n', long, default_value = "0")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Load articles without registering the worker
    #[arg(long)]
    pub no_register: bool,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Absolute URL, or a path relative to worker.origin
    pub url: String,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request headers (Name: value)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Print status line and response headers before the body
    #[arg(short, long)]
    pub include: bool,
}

/// Arguments for the unregister command
#[derive(Parser, Debug)]
pub struct UnregisterArgs {
    /// Also delete every cache store
    #[arg(long)]
    pub clear_caches: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., worker.cache_name)
        key: String,
        /// Value to set
        value: String,
        /// Write to project-local .newsw.toml instead of global config
        #[arg(long)]
        local: bool,
    },
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cache stores
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List the entries of one store (defaults to worker.cache_name)
    Show {
        /// Store name
        name: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete every store except the current worker.cache_name
    Purge {
        /// Show what would be removed
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete cache stores
    Clear {
        /// Store to delete (all stores if omitted)
        name: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Parse a header in `Name: value` format
fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid header format: no ':' found in '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid header format: empty name in '{s}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_header_valid() {
        let (k, v) = parse_header("Accept: application/json").unwrap();
        assert_eq!(k, "Accept");
        assert_eq!(v, "application/json");
    }

    #[test]
    fn parse_header_keeps_colons_in_value() {
        let (_, v) = parse_header("Referer: http://localhost:8080/").unwrap();
        assert_eq!(v, "http://localhost:8080/");
    }

    #[test]
    fn parse_header_invalid() {
        assert!(parse_header("Accept").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn cli_parses_fetch() {
        let cli = Cli::parse_from([
            "newsw",
            "fetch",
            "-X",
            "post",
            "-H",
            "X-Api-Key: k",
            "https://api.example.com/data",
        ]);
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.method, "post");
                assert_eq!(args.headers, vec![("X-Api-Key".to_string(), "k".to_string())]);
                assert!(!args.include);
            }
            _ => panic!("expected Fetch command"),
        }
    }

    #[test]
    fn cli_parses_articles() {
        let cli = Cli::parse_from(["newsw", "articles", "-n", "5", "--no-register"]);
        match cli.command {
            Commands::Articles(args) => {
                assert_eq!(args.limit, 5);
                assert!(args.no_register);
            }
            _ => panic!("expected Articles command"),
        }
    }

    #[test]
    fn cli_parses_cache_clear() {
        let cli = Cli::parse_from(["newsw", "cache", "clear", "news-v1", "--yes"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Clear { name, yes },
            }) => {
                assert_eq!(name.as_deref(), Some("news-v1"));
                assert!(yes);
            }
            _ => panic!("expected Cache Clear command"),
        }
    }

    #[test]
    fn cli_global_flags() {
        let cli = Cli::parse_from([
            "newsw",
            "--no-local",
            "--state-dir",
            "/tmp/newsw",
            "--log-format",
            "json",
            "register",
        ]);
        assert!(cli.no_local);
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/newsw")));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(matches!(cli.command, Commands::Register));
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["newsw", "register"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["newsw", "-v", "register"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["newsw", "-vv", "register"]);
        assert_eq!(cli.verbose, 2);
    }
}
