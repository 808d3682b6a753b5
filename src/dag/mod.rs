// src/dag/mod.rs

//! Task definitions, the validated task graph, and execution.
//!
//! - [`task`] holds caller-facing task definitions and the [`Action`] trait.
//! - [`registry`] validates and stores registered tasks.
//! - [`node`] contains the runtime node and its recursive executor.

pub mod node;
pub mod registry;
pub mod task;

pub use node::Node;
pub use registry::Registry;
pub use task::{Action, Task};
