// src/context.rs

//! Per-call context threaded through tasks and pipeline stages.
//!
//! A [`Context`] bundles a prefixed [`Logger`] with the session's
//! [`CancelSignal`]. Child contexts only extend the logger prefix; the signal
//! is always the same one-shot session signal.

use std::fmt;

use tracing::{error, info, warn};

use crate::engine::CancelSignal;

/// Levelled logger with an accumulated prefix, backed by `tracing`.
///
/// Every method takes any `Display`; use `format_args!` for formatted
/// output, e.g. `log.info(format_args!("copied {n} files"))`.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefix: String,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derive a logger whose prefix is this one's followed by `prefix`.
    pub fn child(&self, prefix: &str) -> Logger {
        Logger {
            prefix: format!("{}{}", self.prefix, prefix),
        }
    }

    pub fn info(&self, msg: impl fmt::Display) {
        info!(target: "slurp::task", "{}{}", self.prefix, msg);
    }

    pub fn warn(&self, msg: impl fmt::Display) {
        warn!(target: "slurp::task", "{}{}", self.prefix, msg);
    }

    pub fn error(&self, msg: impl fmt::Display) {
        error!(target: "slurp::task", "{}{}", self.prefix, msg);
    }

    /// Log at error level and terminate the process with status 1.
    ///
    /// Reserved for configuration mistakes that make continuing pointless.
    pub fn fatal(&self, msg: impl fmt::Display) -> ! {
        error!(target: "slurp::task", "{}{}", self.prefix, msg);
        std::process::exit(1)
    }
}

#[derive(Debug, Clone)]
pub struct Context {
    log: Logger,
    signal: CancelSignal,
}

impl Context {
    pub fn new(log: Logger, signal: CancelSignal) -> Self {
        Self { log, signal }
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    /// Derive a child context with `prefix` appended to the logger prefix.
    pub fn child(&self, prefix: &str) -> Context {
        Context {
            log: self.log.child(prefix),
            signal: self.signal.clone(),
        }
    }

    /// The session cancellation signal. Successive calls observe the same
    /// underlying signal.
    pub fn done(&self) -> &CancelSignal {
        &self.signal
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.is_cancelled()
    }

    /// Resolves once the session has been cancelled.
    pub async fn cancelled(&self) {
        self.signal.cancelled().await
    }
}
