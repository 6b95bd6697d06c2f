//! Daemon errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("session torn down: {0}")]
    SessionFatal(#[from] cutbridge_clipboard::TransportError),
}
