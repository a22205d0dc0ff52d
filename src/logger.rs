use std::fmt;
use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::error::LogError;

/// Local wall-clock prefix, `2024/01/31 13:37:00`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogClock;

impl FormatTime for LogClock {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y/%m/%d %H:%M:%S"))
    }
}

/*
    @@@
    @logs_tracing();
    . Picks the sink: stdout when no log file is configured, otherwise an append-only, never-rotating file (parent directory created first).
    . Wraps the sink in a non-blocking writer and installs an INFO-level subscriber with plain timestamped lines.
    . Keeps the appender alive by returning the guard.
*/
pub fn logs_tracing(log_file: Option<&Path>) -> Result<WorkerGuard, LogError> {
    let (non_blocking, guard) = match log_file {
        None => tracing_appender::non_blocking(std::io::stdout()),
        Some(path) => tracing_appender::non_blocking(file_appender(path)?),
    };

    let subscriber = SubscriberBuilder::default()
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_timer(LogClock)
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}

fn file_appender(path: &Path) -> Result<RollingFileAppender, LogError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LogError::NoFileName(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(dir).map_err(|source| LogError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)?;
    Ok(appender)
}
