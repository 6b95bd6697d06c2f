//! Clipboard synchronisation core for cutbridge.
//!
//! Keeps the local clipboard and a remote peer's clipboard in sync:
//! local changes are read through the [`ClipboardGuard`], converted to
//! LF line endings and handed to a [`CutTextSender`]; text from the peer
//! is converted to CRLF and installed locally. The OS clipboard itself is
//! reached only through the [`ClipboardPort`] trait.

use cutbridge_types::{ClipboardNotification, ClipboardText, OwnerId};

pub mod bridge;
pub mod error;
pub mod guard;
mod inbound;
mod outbound;
pub mod session;
pub mod transcode;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(feature = "native")]
pub mod native;

pub use bridge::{ClipboardBridge, IgnoreReason, InboundOutcome, OutboundOutcome};
pub use error::{
    AcquisitionFailure, ClipboardError, ClipboardOp, OsError, SyncError, TransportError,
};
pub use guard::{AccessLease, ClipboardGuard, RetryPolicy};
pub use session::{ClipboardSession, SyncPolicy};

/// Handle-style access to the OS clipboard.
///
/// Callers go through [`ClipboardGuard`], which pairs every successful
/// `open` with exactly one `close`.
pub trait ClipboardPort: Send {
    /// Open the clipboard on behalf of `owner`. Fails while another
    /// process holds it open.
    fn open(&mut self, owner: OwnerId) -> Result<(), OsError>;

    /// Current plain-text payload, up to its terminator. `None` when the
    /// clipboard holds no text.
    fn read_text(&mut self) -> Result<Option<Vec<u8>>, OsError>;

    /// Clear the clipboard and make the opener its owner.
    fn empty(&mut self) -> Result<(), OsError>;

    /// Allocate shared memory for `text` and publish it as the plain-text
    /// payload.
    fn publish_text(&mut self, text: &ClipboardText) -> Result<(), OsError>;

    fn close(&mut self) -> Result<(), OsError>;

    /// Identity of the current owner, if it is one this process handed out.
    fn owner(&mut self) -> Result<Option<OwnerId>, OsError>;
}

/// Outbound half of the transport collaborator.
pub trait CutTextSender: Send + Sync {
    /// Send LF-form cut text to the peer.
    fn send(&self, text: &[u8]) -> Result<(), TransportError>;
}

/// Next observer in the clipboard notification chain.
pub trait ViewerChain: Send + Sync {
    fn forward(&self, notification: &ClipboardNotification);
}

/// End of the notification chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoViewerChain;

impl ViewerChain for NoViewerChain {
    fn forward(&self, _notification: &ClipboardNotification) {}
}
