use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{Context, Poll};

use slurp::pipeline::{Content, File};
use tokio::io::{AsyncRead, ReadBuf};

use crate::builders::Recorder;

/// In-memory content that reports its own close.
struct Tracked {
    inner: Cursor<Vec<u8>>,
    label: String,
    recorder: Option<Recorder>,
    close_error: Option<String>,
}

impl AsyncRead for Tracked {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl Content for Tracked {
    fn close(self: Box<Self>) -> io::Result<()> {
        if let Some(recorder) = &self.recorder {
            recorder.push(format!("closed {}", self.label));
        }
        match self.close_error {
            Some(message) => Err(io::Error::other(message)),
            None => Ok(()),
        }
    }
}

/// File whose close is recorded as `"closed {path}"`.
pub fn tracked_file(path: &str, bytes: &[u8], recorder: &Recorder) -> File {
    File::new(
        path,
        Some(bytes.len() as u64),
        Box::new(Tracked {
            inner: Cursor::new(bytes.to_vec()),
            label: path.to_string(),
            recorder: Some(recorder.clone()),
            close_error: None,
        }),
    )
}

/// File whose close fails with `message`.
pub fn failing_close_file(path: &str, message: &str) -> File {
    File::new(
        path,
        None,
        Box::new(Tracked {
            inner: Cursor::new(Vec::new()),
            label: path.to_string(),
            recorder: None,
            close_error: Some(message.to_string()),
        }),
    )
}
