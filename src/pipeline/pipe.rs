// src/pipeline/pipe.rs

use std::io;

use tracing::debug;

use crate::pipeline::channel::{Inlet, Outlet, channel};
use crate::pipeline::file::File;
use crate::pipeline::stage::{BoxedStage, Stage};

/// A lazy stream of files, produced by a source or by the last stage of a
/// chain.
///
/// Every operation that spawns workers must be called from within a tokio
/// runtime.
#[derive(Debug)]
pub struct Pipe {
    inlet: Inlet,
}

impl From<Inlet> for Pipe {
    fn from(inlet: Inlet) -> Self {
        Self { inlet }
    }
}

impl Pipe {
    /// A pipe that yields nothing.
    pub fn empty() -> Self {
        let (_output, inlet) = channel();
        Self { inlet }
    }

    /// A pipe that yields `files` in order.
    pub fn from_files<I>(files: I) -> Self
    where
        I: IntoIterator<Item = File>,
    {
        let files: Vec<File> = files.into_iter().collect();
        let (output, inlet) = channel();
        tokio::spawn(async move {
            for file in files {
                if let Err(file) = output.send(file).await {
                    let _ = file.close();
                    break;
                }
            }
        });
        Self { inlet }
    }

    /// Take the next file from the pipe.
    pub async fn recv(&mut self) -> Option<File> {
        self.inlet.recv().await
    }

    pub fn into_inlet(self) -> Inlet {
        self.inlet
    }

    /// Run `stage` on its own worker, reading from this pipe.
    pub fn pipe(self, stage: impl Stage) -> Pipe {
        self.pipe_boxed(Box::new(stage))
    }

    fn pipe_boxed(self, stage: BoxedStage) -> Pipe {
        let (output, inlet) = channel();
        tokio::spawn(stage.run(self.inlet, output));
        Pipe { inlet }
    }

    /// Chain `stages` left to right. No stages returns this pipe unchanged.
    pub fn pipe_all<I>(self, stages: I) -> Pipe
    where
        I: IntoIterator<Item = BoxedStage>,
    {
        let mut stages = stages.into_iter();
        match stages.next() {
            None => self,
            Some(first) => self.pipe_boxed(first).pipe_all(stages),
        }
    }

    /// Drain the pipe, closing every file that reaches the end.
    ///
    /// Keeps draining after a close error so no file is left open, then
    /// returns the first error seen.
    pub async fn wait(mut self) -> io::Result<()> {
        let mut first_err = None;
        while let Some(file) = self.inlet.recv().await {
            let path = file.path().to_path_buf();
            if let Err(err) = file.close() {
                debug!(path = %path.display(), error = %err, "closing file failed");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// [`Pipe::pipe_all`] followed by [`Pipe::wait`].
    pub async fn then<I>(self, stages: I) -> io::Result<()>
    where
        I: IntoIterator<Item = BoxedStage>,
    {
        self.pipe_all(stages).wait().await
    }

    /// Fan in every source concurrently. Interleaving is unordered; the
    /// result ends once every source is exhausted.
    pub fn merge<I>(pipes: I) -> Pipe
    where
        I: IntoIterator<Item = Pipe>,
    {
        let (output, inlet) = channel();
        for pipe in pipes {
            let output = output.clone();
            tokio::spawn(async move {
                forward(pipe, &output).await;
            });
        }
        Pipe { inlet }
    }

    /// Fan in sources one after another: a source is not read until the
    /// previous one is exhausted.
    pub fn queue<I>(pipes: I) -> Pipe
    where
        I: IntoIterator<Item = Pipe>,
    {
        let pipes: Vec<Pipe> = pipes.into_iter().collect();
        let (output, inlet) = channel();
        tokio::spawn(async move {
            for pipe in pipes {
                if !forward(pipe, &output).await {
                    break;
                }
            }
        });
        Pipe { inlet }
    }
}

/// Copy every file from `pipe` to `output`. Returns `false` if the consumer
/// went away.
async fn forward(mut pipe: Pipe, output: &Outlet) -> bool {
    while let Some(file) = pipe.recv().await {
        if let Err(file) = output.send(file).await {
            let _ = file.close();
            return false;
        }
    }
    true
}
