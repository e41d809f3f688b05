//! Local preference store
//!
//! A plain JSON file holding the handful of values the app persists: the
//! auth token, the signed-in username, the custom folder list, and the
//! onboarding-completion flag. Whole-file load/save with last-writer-wins
//! semantics; there is no locking discipline across instances.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::types::error::{Result, SkiffError};
use crate::types::CustomFolder;

/// Persisted preference values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Bearer token attached to every API request
    #[serde(default)]
    pub auth_token: String,

    /// Address of the signed-in user, used as the From field
    #[serde(default)]
    pub username: String,

    /// User-created folders, in creation order
    #[serde(default)]
    pub custom_folders: Vec<CustomFolder>,

    /// Whether onboarding has been completed
    #[serde(default)]
    pub onboarding_complete: bool,
}

/// Handle to the preference file
#[derive(Debug, Clone)]
pub struct PrefStore {
    path: PathBuf,
}

impl PrefStore {
    /// Open the store at the platform default location
    pub fn open_default() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| SkiffError::Config("Failed to determine config directory".to_string()))?
            .join("skiff");

        fs::create_dir_all(&dir)?;

        Ok(Self {
            path: dir.join("prefs.json"),
        })
    }

    /// Open the store at an explicit path
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load preferences, falling back to defaults when the file is missing
    /// or unreadable
    pub fn load(&self) -> Preferences {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Preferences::default(),
        }
    }

    /// Write preferences back to disk
    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        let content = serde_json::to_string_pretty(prefs)?;
        fs::write(&self.path, content)?;
        info!("Preferences saved to {:?}", self.path);
        Ok(())
    }
}
