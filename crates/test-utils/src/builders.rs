use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use slurp::{Context, Task};
use slurp::config::SessionConfig;
use slurp::dag::Action;

/// Shared, ordered log of events produced by test actions and records.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.lock().unwrap().iter().position(|e| e == event)
    }

    /// Action that records `event` and succeeds.
    pub fn action(&self, event: &str) -> impl Action + use<> {
        let recorder = self.clone();
        let event = event.to_string();
        move |_ctx: Context| {
            recorder.push(event.clone());
            async { anyhow::Ok(()) }
        }
    }

    /// Action that records `event` and then fails with `message`.
    pub fn failing_action(&self, event: &str, message: &'static str) -> impl Action + use<> {
        let recorder = self.clone();
        let event = event.to_string();
        move |_ctx: Context| {
            recorder.push(event.clone());
            async move { Err::<(), _>(anyhow!(message)) }
        }
    }
}

/// Task with a generated usage text.
pub fn task(name: &str, deps: &[&str], action: impl Action) -> Task {
    Task::new(name)
        .usage(format!("run {name}"))
        .deps(deps.iter().copied())
        .action(action)
}

pub fn noop() -> impl Action {
    |_ctx: Context| async { anyhow::Ok(()) }
}

pub fn failing(message: &'static str) -> impl Action {
    move |_ctx: Context| async move { Err::<(), _>(anyhow!(message)) }
}

/// Session config with the given shutdown bound and poll interval.
pub fn session_config(shutdown_timeout_secs: u64, poll_interval_ms: u64) -> SessionConfig {
    SessionConfig {
        shutdown_timeout_secs,
        poll_interval_ms,
        ..SessionConfig::default()
    }
}
