//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, LOCAL_CONFIG_NAME};
use crate::error::{NewswError, NewswResult};
use crate::ui::{report, Terminal};
use std::path::PathBuf;
use tokio::fs;

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "general.journal",
    "general.state_dir",
    "worker.script",
    "worker.origin",
    "worker.cache_name",
    "worker.static_assets",
    "worker.purge_stale_caches",
    "feed.url",
    "feed.api_key",
    "network.user_agent",
    "network.max_body_bytes",
];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    manager: &ConfigManager,
    config: &Config,
) -> NewswResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value, local }) => {
            if local {
                set_local_value(&key, &value).await?
            } else {
                set_value(manager, &key, &value).await?
            }
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> NewswResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> NewswResult<()> {
    let term = Terminal::detect();
    let path = manager.path();

    if path.exists() && !force {
        report::config_exists(&term, path);
        return Ok(());
    }

    manager.save(&Config::default()).await?;

    report::config_written(&term, path);
    Ok(())
}

/// Set a key in the global config file.
///
/// Only the global file is rewritten, so values merged in from a local
/// `.newsw.toml` do not leak into it.
async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> NewswResult<()> {
    let term = Terminal::detect();
    let mut config = manager.load().await?;
    apply_value(&mut config, key, value)?;

    manager.save(&config).await?;
    report::config_key_set(&term, key, value, None);
    Ok(())
}

/// Apply `key = value` to a typed config
fn apply_value(config: &mut Config, key: &str, value: &str) -> NewswResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => config.general.log_format = parse_log_format(value)?,
        ["general", "journal"] => config.general.journal = parse_bool(value)?,
        ["general", "state_dir"] => config.general.state_dir = Some(PathBuf::from(value)),

        ["worker", "script"] => config.worker.script = value.to_string(),
        ["worker", "origin"] => {
            url::Url::parse(value).map_err(|e| NewswError::invalid_url(value, e))?;
            config.worker.origin = value.to_string()
        }
        ["worker", "cache_name"] => {
            crate::cache::validate_cache_name(value)?;
            config.worker.cache_name = value.to_string()
        }
        ["worker", "static_assets"] => config.worker.static_assets = parse_list(value),
        ["worker", "purge_stale_caches"] => config.worker.purge_stale_caches = parse_bool(value)?,

        ["feed", "url"] => config.feed.url = value.to_string(),
        ["feed", "api_key"] => config.feed.api_key = Some(value.to_string()),

        ["network", "user_agent"] => config.network.user_agent = value.to_string(),
        ["network", "max_body_bytes"] => config.network.max_body_bytes = parse_u64(value)?,

        _ => return Err(unknown_key(key)),
    }

    Ok(())
}

async fn set_local_value(key: &str, value: &str) -> NewswResult<()> {
    let term = Terminal::detect();

    let cwd =
        std::env::current_dir().map_err(|e| NewswError::io("getting current directory", e))?;
    let local_path = cwd.join(LOCAL_CONFIG_NAME);

    // Validate against the typed schema before touching the file
    apply_value(&mut Config::default(), key, value)?;

    let mut doc: toml::Value = if local_path.exists() {
        let content = fs::read_to_string(&local_path)
            .await
            .map_err(|e| NewswError::io(format!("reading {}", local_path.display()), e))?;
        content
            .parse()
            .map_err(|e: toml::de::Error| NewswError::ConfigInvalid {
                path: local_path.clone(),
                reason: e.to_string(),
            })?
    } else {
        toml::Value::Table(toml::map::Map::new())
    };

    set_toml_value(&mut doc, key, value)?;

    // Write back only the keys the user has explicitly set
    let content = toml::to_string_pretty(&doc)?;
    fs::write(&local_path, content)
        .await
        .map_err(|e| NewswError::io(format!("writing {}", local_path.display()), e))?;

    report::config_key_set(&term, key, value, Some(&local_path));
    Ok(())
}

/// Set a dot-separated key in a TOML tree, creating intermediate tables as needed
fn set_toml_value(doc: &mut toml::Value, key: &str, value: &str) -> NewswResult<()> {
    let (path, leaf) = match key.rsplit_once('.') {
        Some((path, leaf)) => (path.split('.').collect::<Vec<_>>(), leaf),
        None => (vec![], key),
    };

    let mut current = doc;
    for part in path {
        current = current
            .as_table_mut()
            .ok_or_else(|| NewswError::User(format!("Expected table at key: {}", part)))?
            .entry(part)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    let table = current
        .as_table_mut()
        .ok_or_else(|| NewswError::User(format!("Expected table for key: {}", key)))?;

    let toml_value = if key == "worker.static_assets" {
        toml::Value::Array(parse_list(value).into_iter().map(toml::Value::String).collect())
    } else if let Ok(b) = value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(n) = value.parse::<i64>() {
        toml::Value::Integer(n)
    } else {
        toml::Value::String(value.to_string())
    };

    table.insert(leaf.to_string(), toml_value);
    Ok(())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_log_format(value: &str) -> NewswResult<String> {
    match value {
        "text" | "json" => Ok(value.to_string()),
        _ => Err(NewswError::User(format!(
            "Invalid log format: {}. Use text or json",
            value
        ))),
    }
}

fn parse_bool(value: &str) -> NewswResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(NewswError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> NewswResult<u64> {
    value
        .parse()
        .map_err(|_| NewswError::User(format!("Invalid number: {}", value)))
}

fn unknown_key(key: &str) -> NewswError {
    NewswError::User(format!(
        "Unknown config key: {}. Valid keys: {}",
        key,
        VALID_KEYS.join(", ")
    ))
}
