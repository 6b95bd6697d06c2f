//! Integration tests driving the bridge event loop over an in-process link.

use std::sync::Arc;
use std::time::Duration;

use cutbridge_clipboard::mock::{
    MemoryClipboard, MemoryClipboardHandle, RecordingChain, RecordingSender,
};
use cutbridge_clipboard::{
    ClipboardBridge, OutboundOutcome, RetryPolicy, SyncPolicy, TransportError,
};
use cutbridge_daemon::config::{BridgeConfig, Config, RetryConfig};
use cutbridge_daemon::{
    channel_link, BridgeDaemon, BridgeEvent, BridgeStatus, BroadcastChain, DaemonError,
    RemoteEnd, SessionState,
};
use cutbridge_types::{ClipboardNotification, OwnerId};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

/// A running bridge plus everything a test needs to poke at it.
struct Harness {
    identity: OwnerId,
    clipboard: MemoryClipboardHandle,
    events: mpsc::Sender<BridgeEvent>,
    status: watch::Receiver<BridgeStatus>,
    notifications: broadcast::Receiver<ClipboardNotification>,
    remote: RemoteEnd,
    handle: JoinHandle<Result<(), DaemonError>>,
}

impl Harness {
    async fn shutdown(self) -> Result<(), DaemonError> {
        let _ = self.events.send(BridgeEvent::Shutdown).await;
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("bridge did not stop")
            .expect("bridge task panicked")
    }
}

fn test_config() -> Config {
    Config {
        bridge: BridgeConfig {
            poll_interval_ms: 0,
            channel_capacity: 16,
            send_timeout_ms: 5000,
        },
        retry: RetryConfig {
            max_attempts: 3,
            backoff_ms: 0,
        },
        ..Config::default()
    }
}

fn start(config: Config) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();

    let port = MemoryClipboard::new();
    let clipboard = port.handle();
    let chain = BroadcastChain::new(16);
    let notifications = chain.subscribe();
    let (link, remote) = channel_link(
        config.bridge.channel_capacity,
        config.bridge.send_timeout(),
    );

    let mut daemon = BridgeDaemon::new(config, port, link, Arc::new(chain));
    let identity = daemon.identity();
    let events = daemon.event_sender();
    let status = daemon.status_receiver();
    let handle = tokio::spawn(async move { daemon.run().await });

    Harness {
        identity,
        clipboard,
        events,
        status,
        notifications,
        remote,
        handle,
    }
}

async fn wait_for_status(
    rx: &mut watch::Receiver<BridgeStatus>,
    timeout: Duration,
    pred: impl Fn(&BridgeStatus) -> bool,
) -> Result<BridgeStatus, &'static str> {
    tokio::time::timeout(timeout, async {
        loop {
            {
                let status = rx.borrow_and_update().clone();
                if pred(&status) {
                    return Ok(status);
                }
            }
            if rx.changed().await.is_err() {
                return Err("watch closed");
            }
        }
    })
    .await
    .map_err(|_| "timeout")?
}

async fn local_change(h: &Harness, owner: Option<OwnerId>) {
    h.events
        .send(BridgeEvent::LocalClipboardChanged(ClipboardNotification {
            owner,
        }))
        .await
        .unwrap();
}

/// Feed the registration notification and wait until it was swallowed.
async fn consume_initial(h: &mut Harness) {
    local_change(h, None).await;
    wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.ignored >= 1)
        .await
        .expect("initial notification");
}

#[tokio::test]
async fn test_initial_notification_is_not_sent() {
    let mut h = start(test_config());
    h.clipboard.set_foreign_text(b"already here");

    consume_initial(&mut h).await;

    let nothing = tokio::time::timeout(Duration::from_millis(100), h.remote.recv_cut_text()).await;
    assert!(nothing.is_err(), "initial notification must not be forwarded");
    assert_eq!(h.status.borrow().sent, 0);

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_local_change_reaches_peer_in_wire_form() {
    let mut h = start(test_config());
    consume_initial(&mut h).await;

    h.clipboard.set_foreign_text(b"a\r\nb");
    local_change(&h, None).await;

    let text = tokio::time::timeout(Duration::from_secs(5), h.remote.recv_cut_text())
        .await
        .expect("cut text")
        .expect("link open");
    assert_eq!(text, b"a\nb");

    let status = wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.sent == 1)
        .await
        .unwrap();
    assert_eq!(status.state, SessionState::Running);

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_every_notification_is_forwarded_down_the_chain() {
    let mut h = start(test_config());
    consume_initial(&mut h).await;
    local_change(&h, Some(h.identity)).await;

    let first = h.notifications.recv().await.unwrap();
    let second = h.notifications.recv().await.unwrap();
    assert_eq!(first, ClipboardNotification::foreign());
    assert_eq!(second, ClipboardNotification::owned_by(h.identity));

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_remote_text_is_installed_locally() {
    let mut h = start(test_config());

    h.remote.send_cut_text("foo\nbar").await.unwrap();

    wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.received == 1)
        .await
        .expect("remote text installed");
    assert_eq!(h.clipboard.text().unwrap(), b"foo\r\nbar");
    assert_eq!(h.clipboard.raw().unwrap().len(), 9);
    assert_eq!(h.clipboard.owner(), Some(h.identity));
    assert!(!h.clipboard.is_open());

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_installed_text_does_not_echo_back() {
    let mut h = start(test_config());
    consume_initial(&mut h).await;

    h.remote.send_cut_text("ping").await.unwrap();
    wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.received == 1)
        .await
        .unwrap();

    // The change notification our own write produces.
    local_change(&h, h.clipboard.owner()).await;
    wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.ignored == 2)
        .await
        .expect("self-triggered change ignored");

    let nothing = tokio::time::timeout(Duration::from_millis(100), h.remote.recv_cut_text()).await;
    assert!(nothing.is_err());

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_disabled_sync_ignores_both_directions() {
    let mut config = test_config();
    config.clipboard.enabled = false;
    let mut h = start(config);
    h.clipboard.set_foreign_text(b"local");
    consume_initial(&mut h).await;

    local_change(&h, None).await;
    h.remote.send_cut_text("remote").await.unwrap();

    let status = wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.ignored == 3)
        .await
        .unwrap();
    assert!(!status.sync_enabled);
    assert_eq!(status.sent, 0);
    assert_eq!(status.received, 0);
    assert_eq!(h.clipboard.text().unwrap(), b"local");

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sync_can_be_toggled_at_runtime() {
    let mut h = start(test_config());

    h.events.send(BridgeEvent::SetSyncEnabled(false)).await.unwrap();
    h.remote.send_cut_text("dropped").await.unwrap();
    wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.ignored == 1)
        .await
        .unwrap();
    assert!(h.clipboard.text().is_none());

    h.events.send(BridgeEvent::SetSyncEnabled(true)).await.unwrap();
    h.remote.send_cut_text("kept").await.unwrap();
    let status = wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.received == 1)
        .await
        .unwrap();
    assert!(status.sync_enabled);
    assert_eq!(h.clipboard.text().unwrap(), b"kept");

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_busy_clipboard_is_a_local_failure() {
    let mut h = start(test_config());
    h.clipboard.hold_elsewhere(true);

    h.remote.send_cut_text("blocked").await.unwrap();

    let status = wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.failed == 1)
        .await
        .unwrap();
    assert_eq!(status.state, SessionState::Running);
    assert_eq!(h.clipboard.open_attempts(), 3);

    h.clipboard.hold_elsewhere(false);
    h.remote.send_cut_text("later").await.unwrap();
    wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.received == 1)
        .await
        .expect("bridge keeps working after a local failure");

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_transport_failure_tears_session_down() {
    let mut h = start(test_config());
    consume_initial(&mut h).await;

    // Keep the inbound direction open so only the send fails.
    let Harness {
        clipboard,
        events,
        mut status,
        remote,
        handle,
        ..
    } = h;
    let (_to_local, from_local) = remote.into_parts();
    drop(from_local);

    clipboard.set_foreign_text(b"nobody listening");
    events
        .send(BridgeEvent::LocalClipboardChanged(
            ClipboardNotification::foreign(),
        ))
        .await
        .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("bridge did not stop")
        .expect("bridge task panicked");
    assert!(matches!(result, Err(DaemonError::SessionFatal(_))));

    let status = wait_for_status(&mut status, Duration::from_secs(1), |s| {
        s.state == SessionState::TornDown
    })
    .await
    .unwrap();
    assert_eq!(status.sent, 0);
}

#[tokio::test]
async fn test_stalled_peer_cannot_wedge_the_bridge() {
    let mut config = test_config();
    config.bridge.channel_capacity = 1;
    config.bridge.send_timeout_ms = 100;
    let mut h = start(config);
    consume_initial(&mut h).await;

    // The peer stays connected but never reads.
    let Harness {
        clipboard,
        events,
        mut status,
        remote: _remote,
        handle,
        ..
    } = h;
    clipboard.set_foreign_text(b"piling up");
    for _ in 0..3 {
        let _ = events
            .send(BridgeEvent::LocalClipboardChanged(
                ClipboardNotification::foreign(),
            ))
            .await;
    }
    let _ = events.send(BridgeEvent::Shutdown).await;

    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("bridge stuck behind a stalled peer")
        .expect("bridge task panicked");
    assert!(matches!(
        result,
        Err(DaemonError::SessionFatal(TransportError::Failed(_)))
    ));

    let status = wait_for_status(&mut status, Duration::from_secs(1), |s| {
        s.state == SessionState::TornDown
    })
    .await
    .unwrap();
    assert_eq!(status.sent, 1);
}

#[tokio::test]
async fn test_peer_disconnect_ends_the_session() {
    let h = start(test_config());
    let Harness {
        mut status,
        remote,
        handle,
        ..
    } = h;

    drop(remote);

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("bridge did not stop")
        .expect("bridge task panicked");
    assert!(result.is_ok());
    assert_eq!(status.borrow_and_update().state, SessionState::TornDown);
}

#[tokio::test]
async fn test_shutdown_stops_the_bridge() {
    let h = start(test_config());
    let mut status = h.status.clone();
    wait_for_status(&mut status, Duration::from_secs(5), |s| {
        s.state == SessionState::Running
    })
    .await
    .unwrap();

    h.shutdown().await.unwrap();
    assert_eq!(status.borrow_and_update().state, SessionState::Stopped);
}

#[tokio::test]
async fn test_watcher_drives_outbound_sync() {
    let mut config = test_config();
    config.bridge.poll_interval_ms = 10;
    let mut h = start(config);

    // The first poll plays the part of the registration notification.
    wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.ignored >= 1)
        .await
        .expect("first poll");

    h.clipboard.set_foreign_text(b"copied\r\nelsewhere");
    let text = tokio::time::timeout(Duration::from_secs(5), h.remote.recv_cut_text())
        .await
        .expect("cut text")
        .expect("link open");
    assert_eq!(text, b"copied\nelsewhere");

    h.shutdown().await.unwrap();
}

#[test]
fn test_concurrent_reads_and_writes_never_interleave() {
    let port = MemoryClipboard::new();
    let bridge = Arc::new(ClipboardBridge::new(
        port,
        OwnerId::new(),
        SyncPolicy::default(),
        RetryPolicy::new(1000, Duration::ZERO),
    ));
    bridge.on_remote_text(b"one\ntwo").unwrap();
    assert!(bridge.session().consume_initial());

    let writer = {
        let bridge = Arc::clone(&bridge);
        std::thread::spawn(move || {
            for i in 0..200 {
                let text: &[u8] = if i % 2 == 0 { b"x\ny\nz" } else { b"one\ntwo" };
                bridge.on_remote_text(text).unwrap();
            }
        })
    };

    let sender = RecordingSender::new();
    let chain = RecordingChain::new();
    for _ in 0..200 {
        let outcome = bridge
            .on_local_change(&ClipboardNotification::foreign(), &sender, &chain)
            .unwrap();
        assert!(matches!(outcome, OutboundOutcome::Sent { .. }));
    }
    writer.join().unwrap();

    for text in sender.sent() {
        assert!(
            text == b"x\ny\nz" || text == b"one\ntwo",
            "torn read: {text:?}"
        );
    }
    assert_eq!(chain.forwarded().len(), 200);
}
