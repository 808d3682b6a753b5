// src/engine/signal.rs

//! One-shot, broadcast-once cancellation signal.

use std::sync::Arc;

use tokio::sync::watch;

/// Session-wide cancellation signal.
///
/// Clones share the same underlying state: once cancelled, every past,
/// present and future observer sees it cancelled. Only the owning session
/// can fire it.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has fired (immediately if it already has).
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this can only fail if the
        // value never becomes true, which `wait_for` never reports.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Fire the signal. Returns `false` if it had already fired.
    pub(crate) fn cancel(&self) -> bool {
        self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        })
    }
}
