//! Serialised, retrying access to the OS clipboard.
//!
//! The OS lets one opener hold the clipboard at a time, and other
//! processes routinely hold it for a few milliseconds. [`ClipboardGuard`]
//! retries `open` under a [`RetryPolicy`] while holding a process-local
//! mutex, so at most one thread of this process ever has the clipboard
//! open. A successful acquisition yields an [`AccessLease`] that keeps the
//! mutex until it is released or dropped.

use std::time::Duration;

use cutbridge_types::{ClipboardText, LineEnding, OwnerId};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::{AcquisitionFailure, ClipboardError, ClipboardOp};
use crate::ClipboardPort;

/// How hard [`ClipboardGuard::acquire`] tries before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of `open` attempts, at least 1.
    pub max_attempts: u32,
    /// Sleep between failed attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Retry without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1000, Duration::from_millis(1))
    }
}

/// Owns the clipboard port and hands out exclusive leases on it.
pub struct ClipboardGuard<P> {
    port: Mutex<P>,
    retry: RetryPolicy,
}

impl<P: ClipboardPort> ClipboardGuard<P> {
    pub fn new(port: P, retry: RetryPolicy) -> Self {
        Self {
            port: Mutex::new(port),
            retry,
        }
    }

    /// Open the clipboard on behalf of `owner`.
    ///
    /// Blocks on the process-local lock first, then retries `open` until it
    /// succeeds or the policy is exhausted. On failure the lock is released
    /// and no lease exists.
    pub fn acquire(&self, owner: OwnerId) -> Result<AccessLease<'_, P>, AcquisitionFailure> {
        let mut port = self.port.lock();
        let mut attempts = 0;
        loop {
            attempts += 1;
            match port.open(owner) {
                Ok(()) => {
                    debug!(attempts, "clipboard opened");
                    return Ok(AccessLease { port, open: true });
                }
                Err(last) if attempts >= self.retry.max_attempts => {
                    return Err(AcquisitionFailure { attempts, last });
                }
                Err(_) => {
                    if !self.retry.backoff.is_zero() {
                        std::thread::sleep(self.retry.backoff);
                    }
                }
            }
        }
    }
}

/// Exclusive access to the open clipboard.
///
/// The clipboard is closed exactly once: by [`release`](Self::release) or,
/// failing that, when the lease is dropped.
pub struct AccessLease<'a, P: ClipboardPort> {
    port: MutexGuard<'a, P>,
    open: bool,
}

impl<P: ClipboardPort> AccessLease<'_, P> {
    /// Copy the current plain text out of the clipboard.
    pub fn read_text(&mut self) -> Result<Option<ClipboardText>, ClipboardError> {
        let bytes = self
            .port
            .read_text()
            .map_err(ClipboardError::os(ClipboardOp::Read))?;
        Ok(bytes.map(|b| ClipboardText::from_os_bytes(&b, LineEnding::CrLf)))
    }

    pub fn owner(&mut self) -> Result<Option<OwnerId>, ClipboardError> {
        self.port
            .owner()
            .map_err(ClipboardError::os(ClipboardOp::Owner))
    }

    /// Clear the clipboard, taking ownership of it.
    pub fn empty(&mut self) -> Result<(), ClipboardError> {
        self.port
            .empty()
            .map_err(ClipboardError::os(ClipboardOp::Empty))
    }

    /// Publish `text` as the new plain-text payload.
    pub fn publish(&mut self, text: &ClipboardText) -> Result<(), ClipboardError> {
        self.port
            .publish_text(text)
            .map_err(ClipboardError::os(ClipboardOp::Publish))
    }

    /// Close the clipboard and give up the lease.
    pub fn release(mut self) -> Result<(), ClipboardError> {
        self.close()
    }

    fn close(&mut self) -> Result<(), ClipboardError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.port
            .close()
            .map_err(ClipboardError::os(ClipboardOp::Close))
    }
}

impl<P: ClipboardPort> Drop for AccessLease<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close clipboard");
        }
    }
}
