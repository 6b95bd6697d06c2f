//! Host side of the cutbridge clipboard bridge.
//!
//! Wires a [`cutbridge_clipboard::ClipboardBridge`] to a peer link, a
//! clipboard watcher and a notification chain, and drives it from a tokio
//! event loop. Clipboard work runs on the blocking pool.

pub mod chain;
pub mod config;
pub mod daemon;
pub mod error;
pub mod link;
pub mod setup;
pub mod state;
pub mod watcher;

pub use chain::BroadcastChain;
pub use config::Config;
pub use daemon::{BridgeDaemon, BridgeEvent, BridgeStatus};
pub use error::DaemonError;
pub use link::{channel_link, ChannelSender, PeerLink, RemoteEnd};
pub use state::SessionState;
pub use watcher::ClipboardWatcher;
