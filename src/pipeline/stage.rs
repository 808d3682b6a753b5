// src/pipeline/stage.rs

use std::future::Future;

use crate::pipeline::channel::{Inlet, Outlet};
use crate::types::BoxFuture;

/// A transform over a stream of files.
///
/// A stage reads from `input` and writes to `output` in whatever
/// relationship it likes: pass through, drop, split, or emit entirely new
/// files. The output ends when the stage returns.
///
/// Implemented for any `FnOnce(Inlet, Outlet) -> impl Future<Output = ()>`.
pub trait Stage: Send + 'static {
    fn run(self: Box<Self>, input: Inlet, output: Outlet) -> BoxFuture<'static, ()>;
}

impl<F, Fut> Stage for F
where
    F: FnOnce(Inlet, Outlet) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn run(self: Box<Self>, input: Inlet, output: Outlet) -> BoxFuture<'static, ()> {
        Box::pin((*self)(input, output))
    }
}

pub type BoxedStage = Box<dyn Stage>;

/// Box a stage so stages of different types can share a list.
pub fn boxed(stage: impl Stage) -> BoxedStage {
    Box::new(stage)
}
