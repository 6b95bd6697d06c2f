//! In-memory clipboard and recording collaborators for testing.

use std::sync::Arc;

use cutbridge_types::{ClipboardNotification, ClipboardText, OwnerId};
use parking_lot::Mutex;

use crate::error::{OsError, TransportError};
use crate::{ClipboardPort, CutTextSender, ViewerChain};

/// `ERROR_ACCESS_DENIED`: the clipboard is held open elsewhere.
pub const ERROR_ACCESS_DENIED: u32 = 5;
/// `ERROR_NOT_ENOUGH_MEMORY`: shared allocation failed.
pub const ERROR_NOT_ENOUGH_MEMORY: u32 = 8;
/// `ERROR_CLIPBOARD_NOT_OPEN`.
pub const ERROR_CLIPBOARD_NOT_OPEN: u32 = 1418;

// ---------------------------------------------------------------------------
// MemoryClipboard
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryState {
    /// Stored payload, NUL-terminated like the OS slot.
    content: Option<Vec<u8>>,
    owner: Option<OwnerId>,
    opened_by: Option<OwnerId>,
    held_elsewhere: bool,
    busy_opens: u32,
    fail_empty: bool,
    fail_publish: bool,
    fail_close: bool,
    open_attempts: u32,
    opens: u32,
    closes: u32,
    publishes: u32,
}

impl MemoryState {
    fn require_open(&self) -> Result<OwnerId, OsError> {
        self.opened_by
            .ok_or_else(|| OsError::new(ERROR_CLIPBOARD_NOT_OPEN, "clipboard not open"))
    }
}

/// Clipboard port backed by process memory.
///
/// Models a single-owner OS clipboard: one opener at a time, ownership
/// passes to the opener on `empty`, and text is stored NUL-terminated.
pub struct MemoryClipboard {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    /// Get a clonable handle for observing and steering the clipboard.
    pub fn handle(&self) -> MemoryClipboardHandle {
        MemoryClipboardHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl ClipboardPort for MemoryClipboard {
    fn open(&mut self, owner: OwnerId) -> Result<(), OsError> {
        let mut state = self.state.lock();
        state.open_attempts += 1;
        if state.busy_opens > 0 {
            state.busy_opens -= 1;
            return Err(OsError::new(ERROR_ACCESS_DENIED, "clipboard busy"));
        }
        if state.held_elsewhere || state.opened_by.is_some() {
            return Err(OsError::new(ERROR_ACCESS_DENIED, "clipboard held open"));
        }
        state.opened_by = Some(owner);
        state.opens += 1;
        Ok(())
    }

    fn read_text(&mut self) -> Result<Option<Vec<u8>>, OsError> {
        let state = self.state.lock();
        state.require_open()?;
        Ok(state.content.as_ref().map(|buf| {
            let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            buf[..end].to_vec()
        }))
    }

    fn empty(&mut self) -> Result<(), OsError> {
        let mut state = self.state.lock();
        let opener = state.require_open()?;
        if state.fail_empty {
            return Err(OsError::new(ERROR_ACCESS_DENIED, "empty rejected"));
        }
        state.content = None;
        state.owner = Some(opener);
        Ok(())
    }

    fn publish_text(&mut self, text: &ClipboardText) -> Result<(), OsError> {
        let mut state = self.state.lock();
        state.require_open()?;
        if state.fail_publish {
            return Err(OsError::new(ERROR_NOT_ENOUGH_MEMORY, "allocation failed"));
        }
        let mut shared = Vec::with_capacity(text.len() + 1);
        shared.extend_from_slice(text.as_bytes());
        shared.push(0);
        state.content = Some(shared);
        state.publishes += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), OsError> {
        let mut state = self.state.lock();
        state.require_open()?;
        state.opened_by = None;
        state.closes += 1;
        if state.fail_close {
            return Err(OsError::new(ERROR_CLIPBOARD_NOT_OPEN, "close rejected"));
        }
        Ok(())
    }

    fn owner(&mut self) -> Result<Option<OwnerId>, OsError> {
        Ok(self.state.lock().owner)
    }
}

/// Clonable observer handle for [`MemoryClipboard`].
///
/// Tests use it to play the part of other processes (writing text,
/// holding the clipboard open) and to inspect what the bridge did.
#[derive(Clone)]
pub struct MemoryClipboardHandle {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryClipboardHandle {
    /// Current text without its terminator.
    pub fn text(&self) -> Option<Vec<u8>> {
        self.state.lock().content.as_ref().map(|buf| {
            let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            buf[..end].to_vec()
        })
    }

    /// Stored payload including the terminator.
    pub fn raw(&self) -> Option<Vec<u8>> {
        self.state.lock().content.clone()
    }

    /// Replace the content as another process would, leaving it unowned
    /// from this process's point of view.
    pub fn set_foreign_text(&self, text: &[u8]) {
        let mut state = self.state.lock();
        let mut buf = text.to_vec();
        buf.push(0);
        state.content = Some(buf);
        state.owner = None;
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.state.lock().owner
    }

    /// Make the next `n` open attempts fail as if another process held the
    /// clipboard.
    pub fn fail_next_opens(&self, n: u32) {
        self.state.lock().busy_opens = n;
    }

    /// Keep the clipboard held open by another process until cleared.
    pub fn hold_elsewhere(&self, held: bool) {
        self.state.lock().held_elsewhere = held;
    }

    pub fn fail_empty(&self, fail: bool) {
        self.state.lock().fail_empty = fail;
    }

    pub fn fail_publish(&self, fail: bool) {
        self.state.lock().fail_publish = fail;
    }

    pub fn fail_close(&self, fail: bool) {
        self.state.lock().fail_close = fail;
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().opened_by.is_some()
    }

    pub fn open_attempts(&self) -> u32 {
        self.state.lock().open_attempts
    }

    pub fn opens(&self) -> u32 {
        self.state.lock().opens
    }

    pub fn closes(&self) -> u32 {
        self.state.lock().closes
    }

    pub fn publishes(&self) -> u32 {
        self.state.lock().publishes
    }
}

// ---------------------------------------------------------------------------
// RecordingSender
// ---------------------------------------------------------------------------

/// Transport stand-in that records every cut text it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    failure: Arc<Mutex<Option<TransportError>>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every send fails with `err`.
    pub fn failing(err: TransportError) -> Self {
        let sender = Self::new();
        *sender.failure.lock() = Some(err);
        sender
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }
}

impl CutTextSender for RecordingSender {
    fn send(&self, text: &[u8]) -> Result<(), TransportError> {
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        self.sent.lock().push(text.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingChain
// ---------------------------------------------------------------------------

/// Notification chain link that records what was forwarded to it.
#[derive(Clone, Default)]
pub struct RecordingChain {
    forwarded: Arc<Mutex<Vec<ClipboardNotification>>>,
}

impl RecordingChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forwarded(&self) -> Vec<ClipboardNotification> {
        self.forwarded.lock().clone()
    }
}

impl ViewerChain for RecordingChain {
    fn forward(&self, notification: &ClipboardNotification) {
        self.forwarded.lock().push(*notification);
    }
}
