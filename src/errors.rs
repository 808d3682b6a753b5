// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlurpError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Duplicate task: {0}")]
    DuplicateTask(String),

    #[error("Missing task {dependency}. Required by task {task}.")]
    MissingDependency { task: String, dependency: String },

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("No such task: {0}")]
    TaskNotFound(String),

    #[error("Task cancelled. Reason: failed dependency ({}).", .0.join(","))]
    DependencyFailed(Vec<String>),

    /// Error returned by a task action, kept as-is.
    #[error(transparent)]
    Action(anyhow::Error),

    #[error("Tasks failed: {}", .0.join(","))]
    TasksFailed(Vec<String>),

    #[error("Already cancelled.")]
    AlreadyCancelled,

    #[error("Shutdown timed out; tasks did not honour cancellation: {}", .0.join(","))]
    ShutdownTimeout(Vec<String>),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl SlurpError {
    /// Whether this error reflects a wiring mistake (bad task definitions,
    /// unknown names, unreadable config) rather than a runtime outcome.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SlurpError::ConfigError(_)
                | SlurpError::DuplicateTask(_)
                | SlurpError::MissingDependency { .. }
                | SlurpError::DagCycle(_)
                | SlurpError::TaskNotFound(_)
                | SlurpError::IoError(_)
                | SlurpError::TomlError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SlurpError>;
