//! System clipboard port backed by `arboard`.
//!
//! `arboard` has no notion of an open clipboard or of an owner window, so
//! both are emulated: `open`/`close` track the opener locally, and the
//! owner is whoever last published through this port for as long as the
//! clipboard still holds exactly that text.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use arboard::Clipboard;
use cutbridge_types::{ClipboardText, OwnerId};
use tracing::warn;

use crate::error::{ClipboardError, OsError};
use crate::ClipboardPort;

const ERROR_ACCESS_DENIED: u32 = 5;
const ERROR_INVALID_DATA: u32 = 13;
const ERROR_GEN_FAILURE: u32 = 31;
const ERROR_NOT_SUPPORTED: u32 = 50;
const ERROR_CLIPBOARD_NOT_OPEN: u32 = 1418;

/// The desktop clipboard.
#[derive(Debug, Default)]
pub struct ArboardClipboard {
    opened_by: Option<OwnerId>,
    /// Last publisher and a hash of what it published.
    published: Option<(OwnerId, u64)>,
}

impl ArboardClipboard {
    /// Check that a system clipboard is reachable.
    pub fn new() -> Result<Self, ClipboardError> {
        match Clipboard::new() {
            Ok(_) => Ok(Self::default()),
            Err(e) => {
                warn!(error = %e, "system clipboard unavailable");
                Err(ClipboardError::Unavailable)
            }
        }
    }

    fn require_open(&self) -> Result<OwnerId, OsError> {
        self.opened_by
            .ok_or_else(|| OsError::new(ERROR_CLIPBOARD_NOT_OPEN, "clipboard not open"))
    }

    fn current_text() -> Result<Option<String>, OsError> {
        match Clipboard::new().map_err(os_error)?.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(os_error(e)),
        }
    }
}

impl ClipboardPort for ArboardClipboard {
    fn open(&mut self, owner: OwnerId) -> Result<(), OsError> {
        if self.opened_by.is_some() {
            return Err(OsError::new(ERROR_ACCESS_DENIED, "clipboard already open"));
        }
        Clipboard::new().map_err(os_error)?;
        self.opened_by = Some(owner);
        Ok(())
    }

    fn read_text(&mut self) -> Result<Option<Vec<u8>>, OsError> {
        self.require_open()?;
        Ok(Self::current_text()?.map(String::into_bytes))
    }

    fn empty(&mut self) -> Result<(), OsError> {
        self.require_open()?;
        Clipboard::new()
            .and_then(|mut clipboard| clipboard.clear())
            .map_err(os_error)?;
        self.published = None;
        Ok(())
    }

    fn publish_text(&mut self, text: &ClipboardText) -> Result<(), OsError> {
        let opener = self.require_open()?;
        let text = decode_text(text.as_bytes());
        let fingerprint = fingerprint(text.as_bytes());
        Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text))
            .map_err(os_error)?;
        self.published = Some((opener, fingerprint));
        Ok(())
    }

    fn close(&mut self) -> Result<(), OsError> {
        self.require_open()?;
        self.opened_by = None;
        Ok(())
    }

    fn owner(&mut self) -> Result<Option<OwnerId>, OsError> {
        let Some((publisher, published)) = self.published else {
            return Ok(None);
        };
        let current = Self::current_text()?;
        match current {
            Some(text) if fingerprint(text.as_bytes()) == published => Ok(Some(publisher)),
            _ => {
                self.published = None;
                Ok(None)
            }
        }
    }
}

/// Cut text is UTF-8 when it decodes as such and Latin-1 otherwise.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn fingerprint(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

fn os_error(err: arboard::Error) -> OsError {
    let code = match err {
        arboard::Error::ClipboardOccupied => ERROR_ACCESS_DENIED,
        arboard::Error::ClipboardNotSupported => ERROR_NOT_SUPPORTED,
        arboard::Error::ConversionFailure => ERROR_INVALID_DATA,
        _ => ERROR_GEN_FAILURE,
    };
    OsError::new(code, err.to_string())
}
