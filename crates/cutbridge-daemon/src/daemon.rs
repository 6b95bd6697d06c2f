//! Bridge orchestration.

use std::sync::Arc;

use cutbridge_clipboard::{
    ClipboardBridge, ClipboardPort, CutTextSender, InboundOutcome, OutboundOutcome, SyncError,
    SyncPolicy, ViewerChain,
};
use cutbridge_types::{ClipboardNotification, OwnerId};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::DaemonError;
use crate::link::PeerLink;
use crate::state::SessionState;
use crate::watcher::ClipboardWatcher;

/// Events processed by the bridge's main loop.
pub enum BridgeEvent {
    /// The local clipboard changed.
    LocalClipboardChanged(ClipboardNotification),
    /// The peer sent cut text.
    RemoteCutText(Vec<u8>),
    /// Turn clipboard sync on or off.
    SetSyncEnabled(bool),
    /// The peer's side of the link went away.
    PeerDisconnected,
    /// Shutdown signal.
    Shutdown,
}

/// Snapshot of the bridge, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStatus {
    pub state: SessionState,
    /// Cut texts forwarded to the peer.
    pub sent: u64,
    /// Cut texts installed locally.
    pub received: u64,
    /// Changes and texts deliberately not synced.
    pub ignored: u64,
    /// Attempts abandoned on a local clipboard failure.
    pub failed: u64,
    pub sync_enabled: bool,
}

/// Runs a [`ClipboardBridge`] against a peer link.
pub struct BridgeDaemon<P> {
    config: Config,
    bridge: Arc<ClipboardBridge<P>>,
    sender: Option<Arc<dyn CutTextSender>>,
    inbound: Option<mpsc::Receiver<Vec<u8>>>,
    chain: Arc<dyn ViewerChain>,
    event_tx: mpsc::Sender<BridgeEvent>,
    event_rx: mpsc::Receiver<BridgeEvent>,
    status_tx: watch::Sender<BridgeStatus>,
    tasks: Vec<JoinHandle<()>>,
}

impl<P: ClipboardPort + 'static> BridgeDaemon<P> {
    /// Create a bridge over `port` talking to the peer through `link`.
    pub fn new(config: Config, port: P, link: PeerLink, chain: Arc<dyn ViewerChain>) -> Self {
        let policy = SyncPolicy::new(config.clipboard.enabled);
        let bridge = ClipboardBridge::new(port, OwnerId::new(), policy, config.retry.policy())
            .with_max_size(config.clipboard.max_size);
        let (event_tx, event_rx) = mpsc::channel(config.bridge.channel_capacity.max(1));
        let (status_tx, _) = watch::channel(BridgeStatus {
            sync_enabled: config.clipboard.enabled,
            ..BridgeStatus::default()
        });

        Self {
            config,
            bridge: Arc::new(bridge),
            sender: Some(Arc::new(link.sender)),
            inbound: Some(link.inbound),
            chain,
            event_tx,
            event_rx,
            status_tx,
            tasks: Vec::new(),
        }
    }

    /// Get a clone of the event sender for feeding events into the bridge.
    pub fn event_sender(&self) -> mpsc::Sender<BridgeEvent> {
        self.event_tx.clone()
    }

    pub fn status_receiver(&self) -> watch::Receiver<BridgeStatus> {
        self.status_tx.subscribe()
    }

    pub fn bridge(&self) -> Arc<ClipboardBridge<P>> {
        Arc::clone(&self.bridge)
    }

    /// Identity the bridge writes the clipboard under.
    pub fn identity(&self) -> OwnerId {
        self.bridge.identity()
    }

    /// Run the bridge event loop.
    ///
    /// Returns `Ok` on shutdown or peer disconnect, and
    /// [`DaemonError::SessionFatal`] when the transport failed.
    pub async fn run(&mut self) -> Result<(), DaemonError> {
        if let Some(mut inbound) = self.inbound.take() {
            let event_tx = self.event_tx.clone();
            self.tasks.push(tokio::spawn(async move {
                while let Some(text) = inbound.recv().await {
                    if event_tx
                        .send(BridgeEvent::RemoteCutText(text))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                let _ = event_tx.send(BridgeEvent::PeerDisconnected).await;
            }));
        }

        if let Some(interval) = self.config.bridge.poll_interval() {
            let watcher = ClipboardWatcher::new(Arc::clone(&self.bridge), interval);
            self.tasks.push(watcher.spawn(self.event_tx.clone()));
            debug!(?interval, "clipboard watcher started");
        }

        self.status_tx.send_modify(|s| s.state = SessionState::Running);
        info!(
            name = %self.config.identity.name,
            identity = %self.bridge.identity(),
            "clipboard bridge running"
        );

        let result = loop {
            match self.event_rx.recv().await {
                Some(BridgeEvent::LocalClipboardChanged(note)) => {
                    if let Err(e) = self.handle_local_change(note).await {
                        break Err(e);
                    }
                }
                Some(BridgeEvent::RemoteCutText(text)) => {
                    self.handle_remote_text(text).await;
                }
                Some(BridgeEvent::SetSyncEnabled(enabled)) => {
                    self.bridge.policy().set_enabled(enabled);
                    self.status_tx.send_modify(|s| s.sync_enabled = enabled);
                    info!(enabled, "clipboard sync toggled");
                }
                Some(BridgeEvent::PeerDisconnected) => {
                    info!("peer disconnected");
                    self.teardown();
                    break Ok(());
                }
                Some(BridgeEvent::Shutdown) | None => {
                    info!("shutting down");
                    break Ok(());
                }
            }
        };

        self.shutdown();
        result
    }

    async fn handle_local_change(&mut self, note: ClipboardNotification) -> Result<(), DaemonError> {
        let Some(sender) = self.sender.clone() else {
            return Ok(());
        };
        let bridge = Arc::clone(&self.bridge);
        let chain = Arc::clone(&self.chain);
        let joined = tokio::task::spawn_blocking(move || {
            bridge.on_local_change(&note, sender.as_ref(), chain.as_ref())
        })
        .await;

        match joined {
            Ok(Ok(OutboundOutcome::Sent { .. })) => self.status_tx.send_modify(|s| s.sent += 1),
            Ok(Ok(OutboundOutcome::Ignored(_))) => self.status_tx.send_modify(|s| s.ignored += 1),
            Ok(Ok(OutboundOutcome::NoText)) => {}
            Ok(Err(SyncError::Local(_))) => self.status_tx.send_modify(|s| s.failed += 1),
            Ok(Err(SyncError::Fatal(e))) => {
                error!(error = %e, "tearing down session");
                self.teardown();
                return Err(DaemonError::SessionFatal(e));
            }
            Err(e) => {
                warn!(error = %e, "outbound clipboard task failed");
                self.status_tx.send_modify(|s| s.failed += 1);
            }
        }
        Ok(())
    }

    async fn handle_remote_text(&mut self, text: Vec<u8>) {
        let bridge = Arc::clone(&self.bridge);
        let joined = tokio::task::spawn_blocking(move || bridge.on_remote_text(&text)).await;

        match joined {
            Ok(Ok(InboundOutcome::Installed { .. })) => {
                self.status_tx.send_modify(|s| s.received += 1);
            }
            Ok(Ok(InboundOutcome::Disabled)) => self.status_tx.send_modify(|s| s.ignored += 1),
            Ok(Err(_)) => self.status_tx.send_modify(|s| s.failed += 1),
            Err(e) => {
                warn!(error = %e, "inbound clipboard task failed");
                self.status_tx.send_modify(|s| s.failed += 1);
            }
        }
    }

    /// Drop both halves of the link; nothing more is synced.
    fn teardown(&mut self) {
        self.sender = None;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.status_tx
            .send_modify(|s| s.state = SessionState::TornDown);
    }

    fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.sender = None;
        self.status_tx.send_modify(|s| {
            if !s.state.is_finished() {
                s.state = SessionState::Stopped;
            }
        });
        info!("clipboard bridge stopped");
    }
}
