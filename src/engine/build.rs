// src/engine/build.rs

//! Setup phase: task registration and cleanup registration.

use std::fmt;

use crate::config::SessionConfig;
use crate::dag::{Action, Registry, Task};
use crate::engine::session::{Cleanup, Session};
use crate::engine::signal::CancelSignal;
use crate::errors::Result;

/// Mutable build harness used while wiring tasks.
///
/// Registration takes `&mut self`, so it is serialised by construction.
/// Once wiring is complete, [`Build::into_session`] freezes the registry
/// into a shareable [`Session`].
pub struct Build {
    registry: Registry,
    signal: CancelSignal,
    cleanups: Vec<Cleanup>,
    config: SessionConfig,
}

impl fmt::Debug for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Build")
            .field("tasks", &self.registry.len())
            .field("cleanups", &self.cleanups.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for Build {
    fn default() -> Self {
        Self::new()
    }
}

impl Build {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let signal = CancelSignal::new();
        Self {
            registry: Registry::new(config.default_task.clone(), signal.clone()),
            signal,
            cleanups: Vec::new(),
            config,
        }
    }

    /// Register tasks. Dependencies must be registered before dependents.
    ///
    /// Fails without modifying the registry if any task in the batch is
    /// invalid, duplicated, depends on an unknown task, or closes a cycle.
    pub fn register<I>(&mut self, tasks: I) -> Result<()>
    where
        I: IntoIterator<Item = Task>,
    {
        self.registry.register(tasks)
    }

    /// Shorthand for registering a task whose usage text is its name.
    pub fn task(&mut self, name: &str, deps: &[&str], action: impl Action) -> Result<()> {
        self.register([Task::new(name)
            .usage(name)
            .deps(deps.iter().copied())
            .action(action)])
    }

    /// Register a function to run once when the session shuts down.
    pub fn defer(&mut self, cleanup: impl FnOnce() + Send + 'static) {
        self.cleanups.push(Box::new(cleanup));
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn into_session(self) -> Session {
        Session::new(self.registry, self.signal, self.cleanups, self.config)
    }
}
