//! Notification chain link that fans out to in-process observers.

use cutbridge_clipboard::ViewerChain;
use cutbridge_types::ClipboardNotification;
use tokio::sync::broadcast;
use tracing::trace;

/// Passes every clipboard notification on to broadcast subscribers.
#[derive(Clone)]
pub struct BroadcastChain {
    tx: broadcast::Sender<ClipboardNotification>,
}

impl BroadcastChain {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Register a downstream observer.
    pub fn subscribe(&self) -> broadcast::Receiver<ClipboardNotification> {
        self.tx.subscribe()
    }
}

impl ViewerChain for BroadcastChain {
    fn forward(&self, notification: &ClipboardNotification) {
        if self.tx.send(*notification).is_err() {
            trace!("no downstream clipboard observers");
        }
    }
}
