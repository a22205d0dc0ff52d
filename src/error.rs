use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reasons the config file could not be turned into a `Config`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Launch failures reported by `ProcessHandle::start`.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("app already running (pid {pid})")]
    AlreadyRunning { pid: u32 },

    #[error("failed to launch app: {0}")]
    Spawn(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot prepare log directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("log file path {} has no file name", .0.display())]
    NoFileName(PathBuf),

    #[error("cannot open log file: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("cannot install log subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}
