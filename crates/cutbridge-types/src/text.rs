//! Clipboard text types.

use serde::{Deserialize, Serialize};

/// Line-ending convention of a piece of clipboard text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Bare `\n`, as exchanged with the remote peer.
    Lf,
    /// `\r\n`, as stored in the local clipboard.
    CrLf,
}

impl std::fmt::Display for LineEnding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lf => write!(f, "LF"),
            Self::CrLf => write!(f, "CRLF"),
        }
    }
}

/// Owned plain text with an explicit NUL terminator.
///
/// The buffer always ends with exactly one `0` byte and contains no other
/// NUL; [`len`](Self::len) excludes the terminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClipboardText {
    buf: Vec<u8>,
    ending: LineEnding,
}

impl ClipboardText {
    /// Take ownership of `bytes`, cutting it at the first embedded NUL and
    /// appending the terminator.
    #[must_use]
    pub fn new(mut bytes: Vec<u8>, ending: LineEnding) -> Self {
        if let Some(nul) = bytes.iter().position(|&b| b == 0) {
            bytes.truncate(nul);
        }
        bytes.push(0);
        Self { buf: bytes, ending }
    }

    /// Copy text out of an OS-owned slot, which ends at its first NUL.
    #[must_use]
    pub fn from_os_bytes(bytes: &[u8], ending: LineEnding) -> Self {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Self::new(bytes[..end].to_vec(), ending)
    }

    /// Number of text bytes, excluding the terminator.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The text bytes without the terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// The text bytes including the trailing NUL.
    #[must_use]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn line_ending(&self) -> LineEnding {
        self.ending
    }
}
