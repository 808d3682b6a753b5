// src/engine/session.rs

//! Execution phase: starting tasks, cancellation and cleanup.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::context::{Context, Logger};
use crate::dag::{Node, Registry};
use crate::engine::signal::CancelSignal;
use crate::errors::{Result, SlurpError};
use crate::types::TaskName;

pub(crate) type Cleanup = Box<dyn FnOnce() + Send>;

/// A frozen build: immutable registry, one cancellation signal, and the
/// deferred cleanups. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    registry: Registry,
    signal: CancelSignal,
    /// `None` once the cleanups have run.
    cleanups: Mutex<Option<Vec<Cleanup>>>,
    config: SessionConfig,
    log: Logger,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("tasks", &self.inner.registry.len())
            .field("cancelled", &self.inner.signal.is_cancelled())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(
        registry: Registry,
        signal: CancelSignal,
        cleanups: Vec<Cleanup>,
        config: SessionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                registry,
                signal,
                cleanups: Mutex::new(Some(cleanups)),
                config,
                log: Logger::new(),
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.signal.is_cancelled()
    }

    /// Root context: unprefixed logger and the session signal.
    pub fn context(&self) -> Context {
        Context::new(self.inner.log.clone(), self.inner.signal.clone())
    }

    /// Start every named task concurrently.
    ///
    /// All names are checked before anything is spawned; an unknown name is
    /// a [`SlurpError::TaskNotFound`].
    pub fn start<I, S>(&self, ctx: &Context, names: I) -> Result<Waiter>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nodes = names
            .into_iter()
            .map(|name| self.node(name.as_ref()).cloned())
            .collect::<Result<Vec<Arc<Node>>>>()?;

        let workers = nodes
            .into_iter()
            .map(|node| {
                let name = node.name().to_string();
                let handle = tokio::spawn(node.run(ctx.clone()));
                (name, handle)
            })
            .collect();

        Ok(Waiter {
            workers,
            log: ctx.log().clone(),
        })
    }

    /// [`Session::start`] followed by [`Waiter::wait`].
    pub async fn run<I, S>(&self, ctx: &Context, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.start(ctx, names)?.wait().await
    }

    /// Run a single task in the current worker and return its own outcome.
    pub async fn run_task(&self, ctx: &Context, name: &str) -> Result<()> {
        let node = Arc::clone(self.node(name)?);
        node.run(ctx.clone()).await
    }

    /// Register a function to run once at shutdown.
    ///
    /// If the cleanups have already run, `cleanup` runs immediately.
    pub fn defer(&self, cleanup: impl FnOnce() + Send + 'static) {
        let mut guard = self
            .inner
            .cleanups
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(cleanups) => cleanups.push(Box::new(cleanup)),
            None => {
                drop(guard);
                debug!("cleanup deferred after shutdown; running it now");
                cleanup();
            }
        }
    }

    /// Signal cancellation and wait for running actions to finish.
    ///
    /// Polls every `poll_interval` until no action is running or
    /// `shutdown_timeout` elapses. On timeout the still-running tasks (other
    /// than the implicit root task) are reported in
    /// [`SlurpError::ShutdownTimeout`]. A second call returns
    /// [`SlurpError::AlreadyCancelled`] without waiting.
    pub async fn cancel(&self) -> Result<()> {
        if !self.inner.signal.cancel() {
            self.inner.log.warn("Already cancelled.");
            return Err(SlurpError::AlreadyCancelled);
        }

        let timeout = self.inner.config.shutdown_timeout();
        let interval = self.inner.config.poll_interval();
        let deadline = Instant::now() + timeout;
        info!(?timeout, ?interval, "cancellation signalled; waiting for running tasks");

        let mut running = self.inner.registry.running_tasks();
        while !running.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return self.report_timeout(running);
            }

            sleep(interval.min(deadline - now)).await;

            running = self.inner.registry.running_tasks();
            for name in &running {
                self.inner
                    .log
                    .info(format_args!("Waiting for {name} to finish."));
            }
        }

        debug!("no running tasks left after cancellation");
        Ok(())
    }

    fn report_timeout(&self, running: Vec<TaskName>) -> Result<()> {
        let root = self.inner.registry.root_task();
        let stuck: Vec<TaskName> = running.into_iter().filter(|name| name != root).collect();
        if stuck.is_empty() {
            return Ok(());
        }

        let err = SlurpError::ShutdownTimeout(stuck);
        self.inner.log.error(&err);
        Err(err)
    }

    /// Run every deferred cleanup once, in registration order.
    ///
    /// Later calls are no-ops.
    pub fn cleanup(&self) {
        let cleanups = self
            .inner
            .cleanups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(cleanups) = cleanups else {
            debug!("cleanups already ran; ignoring");
            return;
        };

        debug!(count = cleanups.len(), "running cleanups");
        for cleanup in cleanups {
            cleanup();
        }
    }

    /// Cancel, then run cleanups regardless of how the wait ended.
    pub async fn stop(&self) -> Result<()> {
        let outcome = self.cancel().await;
        if let Err(err) = &outcome {
            if !matches!(err, SlurpError::AlreadyCancelled) {
                warn!(error = %err, "cleaning up anyway");
            }
        }
        self.cleanup();
        outcome
    }

    fn node(&self, name: &str) -> Result<&Arc<Node>> {
        self.inner
            .registry
            .get(name)
            .ok_or_else(|| SlurpError::TaskNotFound(name.to_string()))
    }
}

/// Handle over tasks launched by [`Session::start`].
#[derive(Debug)]
pub struct Waiter {
    workers: Vec<(TaskName, JoinHandle<Result<()>>)>,
    log: Logger,
}

impl Waiter {
    /// Wait for every started task. Failures are logged; if any task failed
    /// the result is [`SlurpError::TasksFailed`] naming each of them.
    pub async fn wait(self) -> Result<()> {
        let mut failed = Vec::new();

        for (name, handle) in self.workers {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    self.log.error(&err);
                    failed.push(name);
                }
                Err(join_err) => {
                    self.log
                        .error(format_args!("task {name} panicked: {join_err}"));
                    failed.push(name);
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(SlurpError::TasksFailed(failed))
        }
    }
}
