//! In-process transport between the bridge and its peer.
//!
//! Two bounded tokio channels: cut text the bridge sends out, and cut text
//! the peer pushes in. The network layer (or a test) holds the
//! [`RemoteEnd`].

use std::time::Duration;

use cutbridge_clipboard::{CutTextSender, TransportError};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

/// Create a connected link with `capacity` messages of buffering per
/// direction. An outbound send that cannot get buffer space within
/// `send_timeout` fails.
pub fn channel_link(capacity: usize, send_timeout: Duration) -> (PeerLink, RemoteEnd) {
    let (out_tx, out_rx) = mpsc::channel(capacity.max(1));
    let (in_tx, in_rx) = mpsc::channel(capacity.max(1));
    (
        PeerLink {
            sender: ChannelSender {
                tx: out_tx,
                send_timeout,
            },
            inbound: in_rx,
        },
        RemoteEnd {
            to_local: in_tx,
            from_local: out_rx,
        },
    )
}

/// The bridge's end of the link.
pub struct PeerLink {
    pub sender: ChannelSender,
    pub inbound: mpsc::Receiver<Vec<u8>>,
}

/// [`CutTextSender`] over a bounded channel.
///
/// Sends block while the channel is full, up to the send timeout, so it
/// must be called from a blocking task spawned on the runtime.
#[derive(Clone)]
pub struct ChannelSender {
    tx: mpsc::Sender<Vec<u8>>,
    send_timeout: Duration,
}

impl CutTextSender for ChannelSender {
    fn send(&self, text: &[u8]) -> Result<(), TransportError> {
        let runtime = Handle::try_current()
            .map_err(|e| TransportError::Failed(format!("no runtime for send: {e}")))?;
        runtime
            .block_on(self.tx.send_timeout(text.to_vec(), self.send_timeout))
            .map_err(|e| match e {
                SendTimeoutError::Closed(_) => TransportError::Closed,
                SendTimeoutError::Timeout(_) => TransportError::Failed(format!(
                    "peer did not accept cut text within {:?}",
                    self.send_timeout
                )),
            })
    }
}

/// The peer's end of the link.
pub struct RemoteEnd {
    to_local: mpsc::Sender<Vec<u8>>,
    from_local: mpsc::Receiver<Vec<u8>>,
}

impl RemoteEnd {
    /// Push cut text to the bridge.
    pub async fn send_cut_text(&self, text: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        self.to_local
            .send(text.into())
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Next cut text sent by the bridge; `None` once the bridge has torn
    /// the link down.
    pub async fn recv_cut_text(&mut self) -> Option<Vec<u8>> {
        self.from_local.recv().await
    }

    /// Split into the inbound sender and outbound receiver.
    pub fn into_parts(self) -> (mpsc::Sender<Vec<u8>>, mpsc::Receiver<Vec<u8>>) {
        (self.to_local, self.from_local)
    }
}
