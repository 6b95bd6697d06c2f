//! Local clipboard → peer.

use cutbridge_types::{ClipboardNotification, ClipboardText};
use tracing::{debug, error, warn};

use crate::bridge::{ClipboardBridge, IgnoreReason, OutboundOutcome};
use crate::error::{ClipboardError, SyncError};
use crate::{transcode, ClipboardPort, CutTextSender, ViewerChain};

impl<P: ClipboardPort> ClipboardBridge<P> {
    /// Handle a "local clipboard changed" notification.
    ///
    /// Forwards the clipboard's text to `sender` unless the change was our
    /// own, is the initial one, or sync is disabled. The notification is
    /// always passed on to `chain` afterwards, whatever the outcome.
    ///
    /// Local failures come back as [`SyncError::Local`] and only abandon
    /// this attempt; [`SyncError::Fatal`] means the transport failed and
    /// the session should be torn down.
    pub fn on_local_change(
        &self,
        notification: &ClipboardNotification,
        sender: &dyn CutTextSender,
        chain: &dyn ViewerChain,
    ) -> Result<OutboundOutcome, SyncError> {
        debug!(owner = ?notification.owner, "clipboard changed");
        let result = self.forward_local_change(notification, sender);
        chain.forward(notification);
        result
    }

    fn forward_local_change(
        &self,
        notification: &ClipboardNotification,
        sender: &dyn CutTextSender,
    ) -> Result<OutboundOutcome, SyncError> {
        if let Some(reason) = self.ignore_reason(notification) {
            debug!(%reason, "not forwarding clipboard change");
            return Ok(OutboundOutcome::Ignored(reason));
        }

        let local = match self.copy_local_text() {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!("clipboard holds no text");
                return Ok(OutboundOutcome::NoText);
            }
            Err(e) => {
                warn!(error = %e, code = ?e.os_code(), "abandoning outbound clipboard sync");
                return Err(e.into());
            }
        };

        let wire = transcode::to_wire(local.as_bytes());
        if let Err(e) = self.check_size(wire.len()) {
            warn!(error = %e, "not forwarding clipboard text");
            return Err(e.into());
        }

        debug!(len = wire.len(), "sending clipboard text");
        if let Err(e) = sender.send(wire.as_bytes()) {
            error!(error = %e, "transport failed while sending clipboard text");
            return Err(SyncError::Fatal(e));
        }
        Ok(OutboundOutcome::Sent { len: wire.len() })
    }

    fn ignore_reason(&self, notification: &ClipboardNotification) -> Option<IgnoreReason> {
        if notification.is_owned_by(self.session.identity()) {
            Some(IgnoreReason::SelfTriggered)
        } else if self.session.consume_initial() {
            Some(IgnoreReason::Initial)
        } else if self.session.policy().is_disabled() {
            Some(IgnoreReason::Disabled)
        } else {
            None
        }
    }

    /// Copy the clipboard text out under a lease. The lease is gone by the
    /// time this returns.
    fn copy_local_text(&self) -> Result<Option<ClipboardText>, ClipboardError> {
        let mut lease = self.guard.acquire(self.session.identity())?;
        let text = lease.read_text()?;
        if let Err(e) = lease.release() {
            warn!(error = %e, "failed to close clipboard after reading");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use cutbridge_types::OwnerId;

    use crate::bridge::{ClipboardBridge, IgnoreReason, OutboundOutcome};
    use crate::error::{ClipboardError, SyncError, TransportError};
    use crate::guard::RetryPolicy;
    use crate::mock::{MemoryClipboard, MemoryClipboardHandle, RecordingChain, RecordingSender};
    use crate::session::SyncPolicy;
    use cutbridge_types::ClipboardNotification;

    fn bridge() -> (ClipboardBridge<MemoryClipboard>, MemoryClipboardHandle) {
        let port = MemoryClipboard::new();
        let handle = port.handle();
        let bridge = ClipboardBridge::new(
            port,
            OwnerId::new(),
            SyncPolicy::default(),
            RetryPolicy::immediate(1000),
        );
        (bridge, handle)
    }

    /// A bridge that has already seen its initial notification.
    fn primed() -> (ClipboardBridge<MemoryClipboard>, MemoryClipboardHandle) {
        let (bridge, handle) = bridge();
        assert!(bridge.session().consume_initial());
        (bridge, handle)
    }

    #[test]
    fn initial_notification_is_never_sent() {
        let (bridge, handle) = bridge();
        handle.set_foreign_text(b"already here");
        let sender = RecordingSender::new();
        let chain = RecordingChain::new();

        let outcome = bridge
            .on_local_change(&ClipboardNotification::foreign(), &sender, &chain)
            .unwrap();

        assert_eq!(outcome, OutboundOutcome::Ignored(IgnoreReason::Initial));
        assert!(sender.sent().is_empty());
        assert_eq!(handle.open_attempts(), 0);
        assert_eq!(chain.forwarded().len(), 1);

        let outcome = bridge
            .on_local_change(&ClipboardNotification::foreign(), &sender, &chain)
            .unwrap();
        assert_eq!(outcome, OutboundOutcome::Sent { len: 12 });
    }

    #[test]
    fn self_triggered_change_is_never_sent() {
        let (bridge, handle) = bridge();
        handle.set_foreign_text(b"ours");
        let sender = RecordingSender::new();
        let chain = RecordingChain::new();
        let note = ClipboardNotification::owned_by(bridge.identity());

        for _ in 0..3 {
            let outcome = bridge.on_local_change(&note, &sender, &chain).unwrap();
            assert_eq!(outcome, OutboundOutcome::Ignored(IgnoreReason::SelfTriggered));
        }
        assert!(sender.sent().is_empty());
        // Our own writes do not use up the initial notification.
        assert!(!bridge.session().initial_notification_consumed());
        assert_eq!(chain.forwarded(), vec![note; 3]);
    }

    #[test]
    fn crlf_text_goes_out_as_lf() {
        let (bridge, handle) = primed();
        handle.set_foreign_text(b"hello\r\nworld");
        let sender = RecordingSender::new();

        let outcome = bridge
            .on_local_change(&ClipboardNotification::foreign(), &sender, &RecordingChain::new())
            .unwrap();

        assert_eq!(outcome, OutboundOutcome::Sent { len: 11 });
        assert_eq!(sender.sent(), vec![b"hello\nworld".to_vec()]);
        assert!(!handle.is_open());
        assert_eq!(handle.closes(), 1);
    }

    #[test]
    fn empty_clipboard_sends_nothing_and_closes() {
        let (bridge, handle) = primed();
        let sender = RecordingSender::new();

        let outcome = bridge
            .on_local_change(&ClipboardNotification::foreign(), &sender, &RecordingChain::new())
            .unwrap();

        assert_eq!(outcome, OutboundOutcome::NoText);
        assert!(sender.sent().is_empty());
        assert_eq!(handle.opens(), 1);
        assert_eq!(handle.closes(), 1);
    }

    #[test]
    fn disabled_policy_is_read_on_every_attempt() {
        let (bridge, handle) = primed();
        handle.set_foreign_text(b"text");
        let sender = RecordingSender::new();
        let chain = RecordingChain::new();
        let note = ClipboardNotification::foreign();

        bridge.policy().set_enabled(false);
        let outcome = bridge.on_local_change(&note, &sender, &chain).unwrap();
        assert_eq!(outcome, OutboundOutcome::Ignored(IgnoreReason::Disabled));
        assert!(sender.sent().is_empty());

        bridge.policy().set_enabled(true);
        let outcome = bridge.on_local_change(&note, &sender, &chain).unwrap();
        assert_eq!(outcome, OutboundOutcome::Sent { len: 4 });
    }

    #[test]
    fn acquisition_failure_abandons_without_sending() {
        let (bridge, handle) = primed();
        handle.set_foreign_text(b"text");
        handle.fail_next_opens(1000);
        let sender = RecordingSender::new();
        let chain = RecordingChain::new();

        let err = bridge
            .on_local_change(&ClipboardNotification::foreign(), &sender, &chain)
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Local(ClipboardError::Acquisition(ref f)) if f.attempts == 1000
        ));
        assert!(!err.is_fatal());
        assert!(sender.sent().is_empty());
        assert!(!handle.is_open());
        assert_eq!(chain.forwarded().len(), 1);
    }

    #[test]
    fn transport_failure_is_fatal_but_chain_still_runs() {
        let (bridge, handle) = primed();
        handle.set_foreign_text(b"text");
        let sender = RecordingSender::failing(TransportError::Closed);
        let chain = RecordingChain::new();

        let err = bridge
            .on_local_change(&ClipboardNotification::foreign(), &sender, &chain)
            .unwrap_err();

        assert!(matches!(err, SyncError::Fatal(TransportError::Closed)));
        assert!(!handle.is_open());
        assert_eq!(chain.forwarded().len(), 1);
    }

    #[test]
    fn oversized_text_is_not_forwarded() {
        let (bridge, handle) = primed();
        let bridge = bridge.with_max_size(4);
        handle.set_foreign_text(b"five!");
        let sender = RecordingSender::new();

        let err = bridge
            .on_local_change(&ClipboardNotification::foreign(), &sender, &RecordingChain::new())
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Local(ClipboardError::TooLarge { size: 5, max: 4 })
        ));
        assert!(sender.sent().is_empty());
    }

    #[test]
    fn close_failure_after_read_still_sends() {
        let (bridge, handle) = primed();
        handle.set_foreign_text(b"a\r\nb");
        handle.fail_close(true);
        let sender = RecordingSender::new();

        let outcome = bridge
            .on_local_change(&ClipboardNotification::foreign(), &sender, &RecordingChain::new())
            .unwrap();

        assert_eq!(outcome, OutboundOutcome::Sent { len: 3 });
        assert_eq!(handle.closes(), 1);
    }
}
