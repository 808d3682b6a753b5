// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod help;
pub mod logging;
pub mod pipeline;
pub mod stages;
pub mod types;

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

pub use crate::cli::CliArgs;
pub use crate::context::{Context, Logger};
pub use crate::dag::{Action, Node, Registry, Task};
pub use crate::engine::{Build, CancelSignal, Session, Waiter};
pub use crate::errors::SlurpError;
pub use crate::pipeline::{BoxedStage, Content, File, Inlet, Outlet, Pipe, Stage, boxed};

use crate::config::load_or_default;

/// High-level entry point used by a program's `main`.
///
/// This wires together:
/// - config loading
/// - task registration through `setup`
/// - `--list` / `--dry-run`
/// - running the requested tasks (or the default task)
/// - ctrl+c / SIGTERM handling
pub async fn run<F>(args: CliArgs, setup: F) -> Result<()>
where
    F: FnOnce(&mut Build) -> errors::Result<()>,
{
    let cfg = load_or_default(args.config.as_deref().map(Path::new))?;

    let mut build = Build::with_config(cfg.session().clone());
    setup(&mut build)?;
    let session = build.into_session();

    let names = if args.tasks.is_empty() {
        vec![session.config().default_task.clone()]
    } else {
        args.tasks.clone()
    };

    if args.list {
        let out = if args.tasks.is_empty() {
            help::render_task_list(session.registry())?
        } else {
            help::render_tasks(session.registry(), &names)?
        };
        print!("{out}");
        return Ok(());
    }

    if args.dry_run {
        print!("{}", help::render_plan(session.registry(), &names)?);
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    let ctx = session.context();
    info!(tasks = %names.join(","), "Running: {}", names.join(","));

    let waiter = session.start(&ctx, &names)?;

    tokio::select! {
        outcome = waiter.wait() => {
            session.cleanup();
            outcome?;
            Ok(())
        }
        () = shutdown_signal() => {
            ctx.log().warn("Press ctrl+c again to force exit.");
            tokio::select! {
                stopped = session.stop() => {
                    stopped?;
                    Ok(())
                }
                () = shutdown_signal() => {
                    warn!("second signal received; exiting immediately");
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Resolves on ctrl+c, or SIGTERM on unix.
///
/// A listener that cannot be installed never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
