//! Peer → local clipboard.

use tracing::{debug, error};

use crate::bridge::{ClipboardBridge, InboundOutcome};
use crate::error::ClipboardError;
use crate::{transcode, ClipboardPort};

impl<P: ClipboardPort> ClipboardBridge<P> {
    /// Install LF text received from the peer as the local clipboard text.
    ///
    /// The clipboard is emptied and then written under a single lease. A
    /// failure aborts the remaining steps and leaves the clipboard as the
    /// failed step left it; nothing is rolled back.
    ///
    /// The size limit applies to the CRLF text that would be installed.
    pub fn on_remote_text(&self, text: &[u8]) -> Result<InboundOutcome, ClipboardError> {
        if self.session.policy().is_disabled() {
            debug!(len = text.len(), "clipboard sync disabled, dropping remote text");
            return Ok(InboundOutcome::Disabled);
        }
        // The local form is never shorter than the wire form.
        if let Err(e) = self.check_size(text.len()) {
            error!(error = %e, "refusing remote clipboard text");
            return Err(e);
        }

        match self.install_remote_text(text) {
            Ok(len) => {
                debug!(len, "local clipboard updated");
                Ok(InboundOutcome::Installed { len })
            }
            Err(e) => {
                error!(error = %e, code = ?e.os_code(), "failed to update local clipboard");
                Err(e)
            }
        }
    }

    fn install_remote_text(&self, text: &[u8]) -> Result<usize, ClipboardError> {
        let mut lease = self.guard.acquire(self.session.identity())?;
        let local = transcode::to_local(text);
        self.check_size(local.len())?;
        debug!(len = local.len(), "installing remote clipboard text");
        lease.empty()?;
        lease.publish(&local)?;
        lease.release()?;
        Ok(local.len())
    }
}
