//! Configuration file I/O operations

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use fs2::FileExt;

use super::Config;

/// Written by `edoquest init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# edoquest configuration

[storage]
# Database file (default: ~/.edoquest/edoquest.db)
# path = "/var/lib/edoquest/edoquest.db"
busy_timeout_ms = 5000

[engine]
# Extra attempts when the database is busy
max_conflict_retries = 5
# "first_correct_only" or "every_correct"
credit_policy = "first_correct_only"
# Points for completing a chapter the first time (0 disables)
chapter_completion_points = 50

[server]
host = "127.0.0.1"
port = 9877
# Shared secret sent as X-Edoquest-Token. Empty disables auth.
auth_token = ""
"#;

impl Config {
    /// Get the global config directory path (~/.edoquest/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".edoquest")
    }

    /// Get the global config file path (~/.edoquest/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Write the commented default config to `path`.
    ///
    /// Refuses to replace an existing file unless `force` is set.
    pub fn init_file(path: &Path, force: bool) -> Result<()> {
        write_locked(path, DEFAULT_CONFIG_TEMPLATE, force)?;
        tracing::info!("Created {}", path.display());
        Ok(())
    }
}

/// Atomic write (temp file + rename) under an exclusive lock on a sibling
/// `.lock` file, so concurrent `init` calls never interleave.
fn write_locked(path: &Path, content: &str, overwrite: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
    }

    // Separate from the config so the rename does not drop the lock
    let lock_path = path.with_extension("toml.lock");
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

    lock_file
        .lock_exclusive()
        .with_context(|| "Failed to acquire config lock")?;

    // Re-check under the lock: another process may have created it
    if !overwrite && path.exists() {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let temp_path = path.with_extension("toml.tmp");
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| "Failed to write config content")?;

    temp_file
        .sync_all()
        .with_context(|| "Failed to sync config file")?;

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename config file: {}", path.display()))?;

    // Lock is released when lock_file is dropped
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::CreditPolicy;
    use tempfile::tempdir;

    #[test]
    fn test_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.engine.chapter_completion_points, 50);
        assert_eq!(config.engine.credit_policy, CreditPolicy::FirstCorrectOnly);
        assert_eq!(config.storage.path, None);
    }

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        Config::init_file(&path, false).unwrap();
        assert!(path.exists());

        std::fs::write(&path, "[server]\nport = 1\n").unwrap();
        assert!(Config::init_file(&path, false).is_err());
        assert_eq!(Config::from_file(&path).unwrap().server.port, 1);

        Config::init_file(&path, true).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().server.port, 9877);
        assert!(!path.with_extension("toml.tmp").exists());
    }
}
