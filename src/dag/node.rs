// src/dag/node.rs

//! Runtime nodes and the recursive, concurrent task executor.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::context::Context;
use crate::dag::task::Action;
use crate::engine::CancelSignal;
use crate::errors::{Result, SlurpError};
use crate::types::{BoxFuture, TaskName};

type DependencyReport = (TaskName, Result<()>);

/// A registered task: its definition plus resolved dependencies and run
/// state.
pub struct Node {
    name: TaskName,
    usage: String,
    description: Option<String>,
    action: Arc<dyn Action>,
    /// Resolved dependencies, in declaration order.
    deps: Vec<Arc<Node>>,
    /// The implicit root task is not prefixed in logs.
    root: bool,
    /// Held for the whole of `run`, serialising invocations of this node.
    lock: Mutex<()>,
    /// Set only while the action executes.
    running: AtomicBool,
    signal: CancelSignal,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("deps", &self.dependency_names())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Node {
    pub(crate) fn new(
        name: TaskName,
        usage: String,
        description: Option<String>,
        action: Arc<dyn Action>,
        deps: Vec<Arc<Node>>,
        root: bool,
        signal: CancelSignal,
    ) -> Self {
        Self {
            name,
            usage,
            description,
            action,
            deps,
            root,
            lock: Mutex::new(()),
            running: AtomicBool::new(false),
            signal,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn dependency_names(&self) -> Vec<&str> {
        self.deps.iter().map(|d| d.name()).collect()
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Whether the action is executing right now.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run every dependency concurrently, then this node's action.
    ///
    /// - Cancellation observed while waiting for dependencies returns `Ok(())`
    ///   without running the action.
    /// - If any dependency fails, all in-flight dependencies are still drained
    ///   and the returned [`SlurpError::DependencyFailed`] names each failure.
    /// - An error from the action is returned as [`SlurpError::Action`].
    pub fn run(self: Arc<Self>, ctx: Context) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move { self.run_inner(ctx).await })
    }

    async fn run_inner(&self, ctx: Context) -> Result<()> {
        let _serial = self.lock.lock().await;

        let ctx = if self.root {
            ctx
        } else {
            let child = ctx.child(&format!("{}: ", self.name));
            child.log().info("Starting.");
            child
        };

        debug!(task = %self.name, deps = self.deps.len(), "running task");

        let (results_tx, mut results_rx) = mpsc::channel::<DependencyReport>(self.deps.len().max(1));
        for dep in &self.deps {
            if self.signal.is_cancelled() {
                break;
            }
            ctx.log().info(format_args!("Waiting for {}", dep.name()));
            spawn_dependency(Arc::clone(dep), ctx.clone(), results_tx.clone());
        }
        drop(results_tx);

        let mut failed: Vec<TaskName> = Vec::new();
        loop {
            tokio::select! {
                biased;

                // Once a failure has been seen we only drain, so the reported
                // list is complete regardless of a concurrent cancellation.
                _ = self.signal.cancelled(), if failed.is_empty() => {
                    ctx.log().warn("Task cancelled. Reason: cancelled build.");
                    return Ok(());
                }

                report = results_rx.recv() => match report {
                    Some((name, Ok(()))) => {
                        debug!(task = %self.name, dep = %name, "dependency finished");
                    }
                    Some((name, Err(err))) => {
                        ctx.log().error(&err);
                        failed.push(name);
                    }
                    None => break,
                }
            }
        }

        if !failed.is_empty() {
            return Err(SlurpError::DependencyFailed(failed));
        }

        let outcome = {
            let _running = RunningGuard::set(&self.running);
            self.action.call(ctx.clone()).await
        };

        match outcome {
            Ok(()) => {
                ctx.log().info("Done.");
                Ok(())
            }
            Err(err) => Err(SlurpError::Action(err)),
        }
    }
}

/// Run `dep` on its own worker and report its outcome on `results`.
///
/// The dependency runs in a separate tokio task so that a panicking action
/// still produces a report instead of silently vanishing.
fn spawn_dependency(dep: Arc<Node>, ctx: Context, results: mpsc::Sender<DependencyReport>) {
    let name = dep.name.clone();
    tokio::spawn(async move {
        let outcome = match tokio::spawn(dep.run(ctx)).await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(SlurpError::Action(anyhow!(
                "task {name} panicked: {join_err}"
            ))),
        };
        // The dependent may have stopped listening after a cancellation.
        let _ = results.send((name, outcome)).await;
    });
}

/// Clears the `running` flag on every exit path, including unwinding.
struct RunningGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunningGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
