// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::DEFAULT_TASK;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [session]
/// default_task = "default"
/// shutdown_timeout_secs = 30
/// poll_interval_ms = 1000
/// ```
///
/// All sections and keys are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub session: SessionConfig,
}

/// Validated configuration. Build one with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    session: SessionConfig,
}

impl ConfigFile {
    /// Construct without validation; used by `TryFrom` once checks pass.
    pub(crate) fn new_unchecked(session: SessionConfig) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }
}

/// `[session]` section: shutdown behaviour and the implicit root task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Task run when no task names are requested.
    #[serde(default = "default_default_task")]
    pub default_task: String,

    /// How long `cancel` waits for running actions before giving up.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// How often `cancel` re-checks running actions.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_default_task() -> String {
    DEFAULT_TASK.to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_task: default_default_task(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl SessionConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
