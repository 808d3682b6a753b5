// src/pipeline/channel.rs

//! Rendezvous channel between pipeline stages.
//!
//! `Outlet::send` only completes once an `Inlet` has taken the item, so a
//! producer never runs more than one item ahead of its consumer.

use tokio::sync::{mpsc, oneshot};

use crate::pipeline::file::File;

type Handoff = (File, oneshot::Sender<()>);

/// Create a connected outlet/inlet pair.
pub fn channel() -> (Outlet, Inlet) {
    let (tx, rx) = mpsc::channel(1);
    (Outlet { tx }, Inlet { rx })
}

/// Sending half. Cloning yields another producer into the same inlet; the
/// inlet ends once every outlet is dropped.
#[derive(Debug, Clone)]
pub struct Outlet {
    tx: mpsc::Sender<Handoff>,
}

impl Outlet {
    /// Hand `file` to the consumer, waiting until it has been received.
    ///
    /// Returns the file back if the consumer is gone.
    pub async fn send(&self, file: File) -> Result<(), File> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if let Err(mpsc::error::SendError((file, _))) = self.tx.send((file, ack_tx)).await {
            return Err(file);
        }
        // An error here means the inlet was dropped with the item still
        // queued; the item was dropped along with it.
        let _ = ack_rx.await;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half.
#[derive(Debug)]
pub struct Inlet {
    rx: mpsc::Receiver<Handoff>,
}

impl Inlet {
    /// Next item, or `None` once every outlet has been dropped.
    pub async fn recv(&mut self) -> Option<File> {
        let (file, ack) = self.rx.recv().await?;
        let _ = ack.send(());
        Some(file)
    }
}
