// src/engine/mod.rs

//! Orchestration engine.
//!
//! - [`build`]: the setup phase (`Build`) where tasks and cleanups are
//!   registered.
//! - [`session`]: the execution phase (`Session`) that starts tasks and owns
//!   cancellation and cleanup.
//! - [`signal`]: the one-shot cancellation signal shared by every context.

pub mod build;
pub mod session;
pub mod signal;

pub use build::Build;
pub use session::{Session, Waiter};
pub use signal::CancelSignal;
