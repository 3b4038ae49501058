//! Settings sections of the config file

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gamification::CreditPolicy;

/// `[storage]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Database file. Defaults to `~/.edoquest/edoquest.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// How long a connection waits on a locked database before reporting busy
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StorageSettings {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// `[engine]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Extra attempts for a write that hit a busy/locked database
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,

    #[serde(default)]
    pub credit_policy: CreditPolicy,

    /// Points credited the first time a chapter is completed (0 disables)
    #[serde(default)]
    pub chapter_completion_points: i64,
}

fn default_max_conflict_retries() -> u32 {
    5
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_conflict_retries: default_max_conflict_retries(),
            credit_policy: CreditPolicy::default(),
            chapter_completion_points: 0,
        }
    }
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret required on every request (sent as `X-Edoquest-Token`)
    ///
    /// If empty, the server accepts unauthenticated requests.
    #[serde(default)]
    pub auth_token: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9877
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_token: String::new(),
        }
    }
}
