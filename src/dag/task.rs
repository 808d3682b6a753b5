// src/dag/task.rs

//! Task definitions as supplied by callers during setup.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::context::Context;
use crate::types::{BoxFuture, TaskName};

/// The work a task performs once all of its dependencies succeeded.
///
/// Implemented for any `Fn(Context) -> impl Future<Output = anyhow::Result<()>>`,
/// so closures and async functions can be used directly.
pub trait Action: Send + Sync + 'static {
    fn call(&self, ctx: Context) -> BoxFuture<'static, anyhow::Result<()>>;
}

impl<F, Fut> Action for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture<'static, anyhow::Result<()>> {
        Box::pin(self(ctx))
    }
}

/// Definition of a named unit of work.
///
/// Usage text and action are optional while building so that registration
/// can reject incomplete definitions with a proper error.
#[derive(Clone, Default)]
pub struct Task {
    name: TaskName,
    usage: Option<String>,
    description: Option<String>,
    deps: Vec<TaskName>,
    action: Option<Arc<dyn Action>>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("deps", &self.deps)
            .field("has_action", &self.action.is_some())
            .finish_non_exhaustive()
    }
}

impl Task {
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Short, one-line usage text shown in task listings.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    /// Longer explanation of what the task does.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a dependency; it must already be registered.
    pub fn after(mut self, dep: impl Into<TaskName>) -> Self {
        self.deps.push(dep.into());
        self
    }

    pub fn deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn action(mut self, action: impl Action) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage_text(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn dependencies(&self) -> &[TaskName] {
        &self.deps
    }

    pub(crate) fn action_handle(&self) -> Option<Arc<dyn Action>> {
        self.action.clone()
    }
}
