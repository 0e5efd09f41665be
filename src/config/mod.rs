//! Configuration management for newsw

pub mod schema;

pub use schema::{Config, FeedConfig, GeneralConfig, NetworkConfig, WorkerConfig};

use crate::error::{NewswError, NewswResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File name of the project-local configuration
pub const LOCAL_CONFIG_NAME: &str = ".newsw.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newsw")
            .join("config.toml")
    }

    /// Get the default state directory path
    pub fn default_state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newsw")
    }

    /// Resolve the state directory, honoring `general.state_dir`
    pub fn state_dir(config: &Config) -> PathBuf {
        config
            .general
            .state_dir
            .clone()
            .unwrap_or_else(Self::default_state_dir)
    }

    /// Walk up from `start` looking for a project-local config file
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> NewswResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load the global config with an optional local file merged on top.
    ///
    /// Keys present in the local file win; tables are merged key by key.
    pub async fn load_merged(&self, local: Option<&Path>) -> NewswResult<Config> {
        let mut merged = if self.config_path.exists() {
            read_toml(&self.config_path).await?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        if let Some(local) = local {
            let overlay = read_toml(local).await?;
            merge_toml(&mut merged, overlay);
            debug!("Merged local config {}", local.display());
        }

        merged.try_into().map_err(|e: toml::de::Error| {
            NewswError::ConfigInvalid {
                path: local.map_or_else(|| self.config_path.clone(), Path::to_path_buf),
                reason: e.to_string(),
            }
        })
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> NewswResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| NewswError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| NewswError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> NewswResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            NewswError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> NewswResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| NewswError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure the state directory and its cache root exist
    pub async fn ensure_state_dirs(state_dir: &Path) -> NewswResult<()> {
        let dirs = [state_dir.to_path_buf(), state_dir.join("caches")];

        for dir in &dirs {
            fs::create_dir_all(dir).await.map_err(|e| {
                NewswError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }

        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_toml(path: &Path) -> NewswResult<toml::Value> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| NewswError::io(format!("reading config from {}", path.display()), e))?;

    content
        .parse()
        .map_err(|e: toml::de::Error| NewswError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Deep-merge `overlay` into `base`. Non-table values are replaced.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.worker.cache_name, "news-v1");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.worker.cache_name = "news-v9".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.worker.cache_name, "news-v9");
    }

    #[tokio::test]
    async fn local_config_overrides_global_keys() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        std::fs::write(
            &global,
            "[worker]\ncache_name = \"news-v1\"\norigin = \"http://global.test\"\n",
        )
        .unwrap();
        let local = temp.path().join(LOCAL_CONFIG_NAME);
        std::fs::write(&local, "[worker]\ncache_name = \"news-v2\"\n").unwrap();

        let manager = ConfigManager::with_path(global);
        let config = manager.load_merged(Some(&local)).await.unwrap();

        assert_eq!(config.worker.cache_name, "news-v2");
        assert_eq!(config.worker.origin, "http://global.test");
    }

    #[test]
    fn find_local_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_NAME), "").unwrap();

        let found = ConfigManager::find_local_config(&nested).unwrap();
        assert_eq!(found, temp.path().join(LOCAL_CONFIG_NAME));
    }

    #[test]
    fn state_dir_override() {
        let mut config = Config::default();
        config.general.state_dir = Some(PathBuf::from("/tmp/newsw-state"));
        assert_eq!(
            ConfigManager::state_dir(&config),
            PathBuf::from("/tmp/newsw-state")
        );
    }
}
