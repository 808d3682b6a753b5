// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, SessionConfig};
use crate::errors::{Result, SlurpError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SlurpError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_session_config(&raw.session)?;
        Ok(ConfigFile::new_unchecked(raw.session))
    }
}

/// Check the invariants of a `[session]` section.
pub fn validate_session_config(session: &SessionConfig) -> Result<()> {
    if session.default_task.trim().is_empty() {
        return Err(SlurpError::ConfigError(
            "[session].default_task must not be empty".to_string(),
        ));
    }

    if session.shutdown_timeout_secs == 0 {
        return Err(SlurpError::ConfigError(
            "[session].shutdown_timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }

    if session.poll_interval_ms == 0 {
        return Err(SlurpError::ConfigError(
            "[session].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if session.poll_interval() > session.shutdown_timeout() {
        return Err(SlurpError::ConfigError(format!(
            "[session].poll_interval_ms ({}) must not exceed the shutdown timeout ({}s)",
            session.poll_interval_ms, session.shutdown_timeout_secs
        )));
    }

    Ok(())
}
