// src/types.rs

use std::future::Future;
use std::pin::Pin;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Name of the task run when no task names are requested.
///
/// This task is also exempt from log prefixing and from the shutdown
/// diagnostic, since it usually only aggregates other tasks.
pub const DEFAULT_TASK: &str = "default";

/// Boxed, sendable future used at the trait seams (actions, stages).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
