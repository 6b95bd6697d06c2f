//! Polling clipboard watcher.
//!
//! Stands in for OS change notifications: the clipboard is sampled on an
//! interval and a [`BridgeEvent::LocalClipboardChanged`] is emitted
//! whenever its text changes. The first sample always emits, like the
//! notification a viewer receives when it registers.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use cutbridge_clipboard::{ClipboardBridge, ClipboardError, ClipboardPort};
use cutbridge_types::{ClipboardNotification, OwnerId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::daemon::BridgeEvent;

/// What one poll saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sample {
    fingerprint: Option<u64>,
    owner: Option<OwnerId>,
}

pub struct ClipboardWatcher<P> {
    bridge: Arc<ClipboardBridge<P>>,
    interval: Duration,
}

impl<P: ClipboardPort + 'static> ClipboardWatcher<P> {
    pub fn new(bridge: Arc<ClipboardBridge<P>>, interval: Duration) -> Self {
        Self { bridge, interval }
    }

    /// Start polling; stops once `events` is closed.
    pub fn spawn(self, events: mpsc::Sender<BridgeEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Option<u64>> = None;

            loop {
                ticker.tick().await;
                let bridge = Arc::clone(&self.bridge);
                let sample = match tokio::task::spawn_blocking(move || sample(&bridge)).await {
                    Ok(Ok(sample)) => sample,
                    Ok(Err(e)) => {
                        debug!(error = %e, "clipboard poll skipped");
                        continue;
                    }
                    Err(e) => {
                        warn!(error = %e, "clipboard poll task failed");
                        continue;
                    }
                };

                if last == Some(sample.fingerprint) {
                    continue;
                }
                last = Some(sample.fingerprint);

                let note = ClipboardNotification {
                    owner: sample.owner,
                };
                if events
                    .send(BridgeEvent::LocalClipboardChanged(note))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        })
    }
}

fn sample<P: ClipboardPort>(bridge: &ClipboardBridge<P>) -> Result<Sample, ClipboardError> {
    let mut lease = bridge.guard().acquire(bridge.identity())?;
    let text = lease.read_text()?;
    let owner = lease.owner()?;
    lease.release()?;
    Ok(Sample {
        fingerprint: text.map(|t| {
            let mut hasher = DefaultHasher::new();
            t.as_bytes().hash(&mut hasher);
            hasher.finish()
        }),
        owner,
    })
}
