// src/pipeline/file.rs

//! File-like records flowing through pipelines.

use std::fmt;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

/// Readable, closeable content backing a [`File`].
///
/// `close` releases whatever the content holds; its error is what
/// [`crate::pipeline::Pipe::wait`] reports.
pub trait Content: AsyncRead + Send + Unpin {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl Content for Cursor<Vec<u8>> {}

impl Content for tokio::fs::File {}

/// A named record with a size hint and readable content.
pub struct File {
    path: PathBuf,
    size: Option<u64>,
    content: Box<dyn Content>,
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl File {
    pub fn new(path: impl Into<PathBuf>, size: Option<u64>, content: Box<dyn Content>) -> Self {
        Self {
            path: path.into(),
            size,
            content,
        }
    }

    /// In-memory file.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let size = bytes.len() as u64;
        Self::new(path, Some(size), Box::new(Cursor::new(bytes)))
    }

    /// Open a file on disk for reading.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        Ok(Self::new(path, Some(size), Box::new(file)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, or the whole path if it has none.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    /// Replace a trailing `old` suffix of the path with `new`.
    pub fn replace_ext(&mut self, old: &str, new: &str) {
        let path = self.path.to_string_lossy();
        let stem = path.strip_suffix(old).unwrap_or(&path);
        self.path = PathBuf::from(format!("{stem}{new}"));
    }

    /// Read the remaining content into memory.
    pub async fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.content.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Release the content.
    pub fn close(self) -> io::Result<()> {
        self.content.close()
    }
}

impl AsyncRead for File {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut *self.content).poll_read(cx, buf)
    }
}
