//! Named cache stores under one root directory

use crate::cache::store::CacheStore;
use crate::error::{NewswError, NewswResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// The set of named cache stores
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    /// Cache storage rooted at `<state_dir>/caches`
    pub fn new(state_dir: &Path) -> Self {
        Self::with_root(state_dir.join("caches"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open a store, creating it if it does not exist
    pub async fn open(&self, name: &str) -> NewswResult<CacheStore> {
        validate_cache_name(name)?;
        let dir = self.root.join(name);

        if !dir.exists() {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| NewswError::io(format!("creating cache {}", name), e))?;
            debug!("Created cache store {}", name);
        }

        Ok(CacheStore::new(name.to_string(), dir))
    }

    /// Open an existing store without creating it
    pub async fn get(&self, name: &str) -> NewswResult<CacheStore> {
        if !self.has(name) {
            return Err(NewswError::CacheNotFound(name.to_string()));
        }
        self.open(name).await
    }

    /// Check if a store exists
    pub fn has(&self, name: &str) -> bool {
        validate_cache_name(name).is_ok() && self.root.join(name).is_dir()
    }

    /// Delete a store and all its entries. Returns false if it did not exist.
    pub async fn delete(&self, name: &str) -> NewswResult<bool> {
        if !self.has(name) {
            return Ok(false);
        }

        fs::remove_dir_all(self.root.join(name))
            .await
            .map_err(|e| NewswError::io(format!("deleting cache {}", name), e))?;

        info!("Deleted cache store {}", name);
        Ok(true)
    }

    /// Names of every store, sorted
    pub async fn keys(&self) -> NewswResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut names = vec![];
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| NewswError::io("reading cache storage", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| NewswError::io("reading cache storage entry", e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_cache_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Delete every store except `keep`, returning the deleted names
    pub async fn delete_all_except(&self, keep: &str) -> NewswResult<Vec<String>> {
        let mut deleted = vec![];
        for name in self.keys().await? {
            if name != keep && self.delete(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }
}

/// Store names become directory names, so they are restricted.
pub fn validate_cache_name(name: &str) -> NewswResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(NewswError::InvalidCacheName(name.to_string()))
    }
}
