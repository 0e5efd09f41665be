//! Worker lifecycle states and the persisted registration record

use crate::config::WorkerConfig;
use crate::error::{NewswError, NewswResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Spawned, no lifecycle event handled yet
    Parsed,
    /// Install event running
    Installing,
    /// Installed, not yet controlling pages
    Installed,
    /// Activate event running
    Activating,
    /// Controlling pages and intercepting requests
    Activated,
    /// Install failed, replaced, or unregistered
    Redundant,
}

impl WorkerState {
    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Parsed, Installing)
                | (Installing, Installed)
                | (Installed, Activating)
                | (Activating, Activated)
                | (_, Redundant)
        ) && self != Redundant
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", s)
    }
}

/// One worker version as recorded on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Unique worker ID
    pub id: Uuid,

    /// Registered script path
    pub script: String,

    /// Origin the worker serves static assets from
    pub origin: String,

    /// Cache store owned by this version
    pub cache_name: String,

    /// Fingerprint of the registered script and its configuration
    pub fingerprint: String,

    /// Lifecycle state when last saved
    pub state: WorkerState,

    /// When install completed
    pub installed_at: Option<DateTime<Utc>>,

    /// When the worker took control
    pub activated_at: Option<DateTime<Utc>>,
}

impl WorkerRecord {
    /// Record for a freshly spawned worker version
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            script: config.script.clone(),
            origin: config.origin.clone(),
            cache_name: config.cache_name.clone(),
            fingerprint: fingerprint(config),
            state: WorkerState::Parsed,
            installed_at: None,
            activated_at: None,
        }
    }
}

/// Registration record persisted at `<state_dir>/registration.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// The active worker version
    pub active: WorkerRecord,

    /// When the registration was last updated
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(active: WorkerRecord) -> Self {
        Self {
            active,
            updated_at: Utc::now(),
        }
    }

    /// Get registration file path
    pub fn file_path(state_dir: &Path) -> PathBuf {
        state_dir.join("registration.json")
    }

    /// Load the registration, if any
    pub async fn load(state_dir: &Path) -> NewswResult<Option<Self>> {
        let path = Self::file_path(state_dir);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await.map_err(|e| {
            NewswError::io(format!("reading registration {}", path.display()), e)
        })?;

        let registration: Registration = serde_json::from_str(&content)?;
        Ok(Some(registration))
    }

    /// Save the registration, replacing the previous file atomically
    pub async fn save(&self, state_dir: &Path) -> NewswResult<()> {
        fs::create_dir_all(state_dir)
            .await
            .map_err(|e| NewswError::io("creating state directory", e))?;

        let path = Self::file_path(state_dir);
        let temp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(self)?;

        fs::write(&temp, content)
            .await
            .map_err(|e| NewswError::io(format!("writing registration {}", temp.display()), e))?;
        fs::rename(&temp, &path)
            .await
            .map_err(|e| NewswError::io(format!("writing registration {}", path.display()), e))?;

        Ok(())
    }

    /// Delete the registration file
    pub async fn delete(state_dir: &Path) -> NewswResult<bool> {
        let path = Self::file_path(state_dir);
        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).await.map_err(|e| {
            NewswError::io(format!("deleting registration {}", path.display()), e)
        })?;
        Ok(true)
    }
}

/// SHA-256 over everything that defines a worker version.
///
/// Registering with an unchanged fingerprint is a no-op.
pub fn fingerprint(config: &WorkerConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config.script.as_bytes());
    hasher.update([0]);
    hasher.update(config.origin.as_bytes());
    hasher.update([0]);
    hasher.update(config.cache_name.as_bytes());
    for asset in &config.static_assets {
        hasher.update([0]);
        hasher.update(asset.as_bytes());
    }
    hex::encode(&hasher.finalize()[..16])
}
