//! Log output setup.
//!
//! Logs go to stderr, to a per-process log file, or both. A log file that
//! cannot be opened never stops the bridge: the error is reported on
//! stderr and logging carries on there.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::Context;
use cutbridge_daemon::config::LoggingConfig;
use cutbridge_daemon::setup::log_file_path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Install the global subscriber. `RUST_LOG` overrides the configured
/// level. The returned guard flushes the log file and must be held until
/// exit.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file, open_error) = match &config.file {
        Some(configured) => match open_log_file(configured, config.append, std::process::id()) {
            Ok(appender) => (Some(tracing_appender::non_blocking(appender)), None),
            Err(e) => (None, Some((configured.clone(), e))),
        },
        None => (None, None),
    };
    let console = config.console || file.is_none();
    let (file_writer, guard) = match file {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };

    let _ = registry()
        .with(filter)
        .with(console.then(|| fmt::layer().with_writer(std::io::stderr)))
        .with(file_writer.map(|writer| fmt::layer().with_writer(writer).with_ansi(false)))
        .try_init();

    if let Some((path, error)) = open_error {
        tracing::warn!(path = %path.display(), error = ?error, "error opening log file");
    }
    guard
}

/// Open `<stem>-<pid>.<ext>` next to `configured`, truncating it first
/// unless `append` is set.
fn open_log_file(configured: &Path, append: bool, pid: u32) -> anyhow::Result<RollingFileAppender> {
    let path = log_file_path(configured, pid);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("invalid log file path {}", path.display()))?
        .to_string_lossy()
        .into_owned();

    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    if !append {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("truncating {}", path.display()))?;
    }

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .with_context(|| format!("opening {}", path.display()))
}
