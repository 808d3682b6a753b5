// src/pipeline/mod.rs

//! Streaming pipelines of file-like records.
//!
//! Stages are connected by rendezvous channels ([`channel`]) and each runs on
//! its own tokio task, so a slow consumer applies backpressure all the way
//! up the chain.

pub mod channel;
pub mod file;
pub mod pipe;
pub mod stage;

pub use channel::{Inlet, Outlet};
pub use file::{Content, File};
pub use pipe::Pipe;
pub use stage::{BoxedStage, Stage, boxed};
