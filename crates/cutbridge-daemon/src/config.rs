//! Bridge configuration loaded from TOML.

use std::path::PathBuf;
use std::time::Duration;

use cutbridge_clipboard::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Event loop and watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Clipboard watcher period. 0 disables the watcher.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// How long an outbound send may wait for a peer that is not reading
    /// before the session is torn down.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

impl BridgeConfig {
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_ms > 0).then(|| Duration::from_millis(self.poll_interval_ms))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            channel_capacity: default_channel_capacity(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

/// Name used in logs for this end of the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
        }
    }
}

/// Clipboard sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipboardConfig {
    /// `false` disables clipboard sync in both directions.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_clipboard_size")]
    pub max_size: usize,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: default_max_clipboard_size(),
        }
    }
}

/// Clipboard acquisition retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file; the process id is appended to its stem.
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Keep existing log file content instead of truncating it.
    #[serde(default = "default_true")]
    pub append: bool,
    /// Also log to stderr while a log file is in use.
    #[serde(default = "default_true")]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            append: true,
            console: true,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_channel_capacity() -> usize {
    64
}

fn default_send_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "cutbridge".to_string())
}

fn default_max_clipboard_size() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

fn default_max_attempts() -> u32 {
    1000
}

fn default_backoff_ms() -> u64 {
    1
}
