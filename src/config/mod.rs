//! Configuration loading and management

mod io;
mod settings;

pub use io::DEFAULT_CONFIG_TEMPLATE;
pub use settings::{EngineSettings, ServerSettings, StorageSettings};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, else `~/.edoquest/config.toml`, else defaults.
    ///
    /// An explicit path that does not exist is an error; a missing global
    /// file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let global_path = Self::global_config_path();
        if global_path.exists() {
            Self::from_file(&global_path)
        } else {
            tracing::debug!("No config at {}, using defaults", global_path.display());
            Ok(Self::default())
        }
    }

    /// Resolved database location
    pub fn db_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("edoquest.db"))
    }

    fn validate(&self) -> Result<()> {
        if self.engine.chapter_completion_points < 0 {
            bail!(
                "engine.chapter_completion_points must not be negative (got {})",
                self.engine.chapter_completion_points
            );
        }
        Ok(())
    }
}
