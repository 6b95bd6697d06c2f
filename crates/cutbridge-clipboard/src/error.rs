//! Clipboard subsystem errors.

use thiserror::Error;

/// A failed call into the OS clipboard API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("os error {code:#x}: {detail}")]
pub struct OsError {
    pub code: u32,
    pub detail: String,
}

impl OsError {
    pub fn new(code: u32, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}

/// The clipboard stayed busy for every attempt of the retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to open clipboard after {attempts} attempts: {last}")]
pub struct AcquisitionFailure {
    pub attempts: u32,
    /// Error reported by the final attempt.
    pub last: OsError,
}

/// The clipboard call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardOp {
    Read,
    Owner,
    Empty,
    Publish,
    Close,
}

impl std::fmt::Display for ClipboardOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Owner => write!(f, "owner query"),
            Self::Empty => write!(f, "empty"),
            Self::Publish => write!(f, "publish"),
            Self::Close => write!(f, "close"),
        }
    }
}

/// Local clipboard failures. None of these end the session.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionFailure),

    #[error("clipboard {op} failed: {source}")]
    Os {
        op: ClipboardOp,
        #[source]
        source: OsError,
    },

    #[error("clipboard content too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("backend not available on this platform")]
    Unavailable,
}

impl ClipboardError {
    pub(crate) fn os(op: ClipboardOp) -> impl FnOnce(OsError) -> Self {
        move |source| Self::Os { op, source }
    }

    /// The OS error code behind this failure, if there is one.
    pub fn os_code(&self) -> Option<u32> {
        match self {
            Self::Acquisition(failure) => Some(failure.last.code),
            Self::Os { source, .. } => Some(source.code),
            Self::TooLarge { .. } | Self::Unavailable => None,
        }
    }
}

/// Failures reported by the transport carrying cut text to the peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("peer connection closed")]
    Closed,

    #[error("transport failure: {0}")]
    Failed(String),
}

/// Outcome of a failed sync attempt.
///
/// `Local` failures abandon the current attempt only; `Fatal` means the
/// connection to the peer has to be torn down.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Local(#[from] ClipboardError),

    #[error("failed to send clipboard text: {0}")]
    Fatal(#[from] TransportError),
}

impl SyncError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}
