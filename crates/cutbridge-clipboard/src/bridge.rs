//! The clipboard bridge: session state plus guarded clipboard access.
//!
//! The two directions live in their own modules (`outbound`, `inbound`)
//! as further `impl` blocks on [`ClipboardBridge`].

use cutbridge_types::OwnerId;

use crate::error::ClipboardError;
use crate::guard::{ClipboardGuard, RetryPolicy};
use crate::session::{ClipboardSession, SyncPolicy};
use crate::ClipboardPort;

/// Why a local clipboard change was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The bridge itself wrote the clipboard.
    SelfTriggered,
    /// First notification after startup: pre-existing content.
    Initial,
    /// Clipboard sync is administratively disabled.
    Disabled,
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfTriggered => write!(f, "self-triggered"),
            Self::Initial => write!(f, "initial clipboard"),
            Self::Disabled => write!(f, "sync disabled"),
        }
    }
}

/// Result of handling one local clipboard change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundOutcome {
    Ignored(IgnoreReason),
    /// The clipboard holds no plain text.
    NoText,
    /// `len` bytes of LF text went to the peer.
    Sent { len: usize },
}

/// Result of handling one piece of remote text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Sync is disabled; the clipboard was not touched.
    Disabled,
    /// `len` bytes of CRLF text are now on the clipboard.
    Installed { len: usize },
}

/// Bidirectional bridge between the local clipboard and a peer.
///
/// Shared between the notification thread and the network thread; all
/// clipboard access goes through the inner [`ClipboardGuard`].
pub struct ClipboardBridge<P> {
    pub(crate) guard: ClipboardGuard<P>,
    pub(crate) session: ClipboardSession,
    max_size: usize,
}

impl<P: ClipboardPort> ClipboardBridge<P> {
    pub fn new(port: P, identity: OwnerId, policy: SyncPolicy, retry: RetryPolicy) -> Self {
        Self {
            guard: ClipboardGuard::new(port, retry),
            session: ClipboardSession::new(identity, policy),
            max_size: usize::MAX,
        }
    }

    /// Refuse to forward or install text longer than `max_size` bytes.
    #[must_use]
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn guard(&self) -> &ClipboardGuard<P> {
        &self.guard
    }

    pub fn session(&self) -> &ClipboardSession {
        &self.session
    }

    pub fn identity(&self) -> OwnerId {
        self.session.identity()
    }

    pub fn policy(&self) -> &SyncPolicy {
        self.session.policy()
    }

    pub(crate) fn check_size(&self, size: usize) -> Result<(), ClipboardError> {
        if size > self.max_size {
            return Err(ClipboardError::TooLarge {
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }
}
