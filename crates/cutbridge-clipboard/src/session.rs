//! Per-bridge session state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cutbridge_types::OwnerId;

/// Live-toggleable "clipboard sync disabled" switch.
///
/// Clones share the flag, so the host can flip it while sync runs; the
/// bridge reads it at the start of every attempt.
#[derive(Debug, Clone, Default)]
pub struct SyncPolicy {
    disabled: Arc<AtomicBool>,
}

impl SyncPolicy {
    pub fn new(enabled: bool) -> Self {
        Self {
            disabled: Arc::new(AtomicBool::new(!enabled)),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.disabled.store(!enabled, Ordering::SeqCst);
    }
}

/// State that lives as long as the bridge: who we are, whether the
/// initial notification has been seen, and the sync policy.
#[derive(Debug)]
pub struct ClipboardSession {
    identity: OwnerId,
    initial_notification_consumed: AtomicBool,
    policy: SyncPolicy,
}

impl ClipboardSession {
    pub fn new(identity: OwnerId, policy: SyncPolicy) -> Self {
        Self {
            identity,
            initial_notification_consumed: AtomicBool::new(false),
            policy,
        }
    }

    /// Identity the bridge opens the clipboard under.
    pub fn identity(&self) -> OwnerId {
        self.identity
    }

    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    /// Mark the initial notification as seen. Returns `true` only for the
    /// first caller.
    pub fn consume_initial(&self) -> bool {
        self.initial_notification_consumed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn initial_notification_consumed(&self) -> bool {
        self.initial_notification_consumed.load(Ordering::SeqCst)
    }
}
