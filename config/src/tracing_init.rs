//! Tracing subscriber setup shared by the bot binary.
//!
//! Reads `RUST_LOG` (default `info`). With a log file, events are appended there through a
//! non-blocking writer without ANSI colours; otherwise they go to stdout.

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Error, Debug)]
pub enum TracingInitError {
    #[error("log file path has no file name: {0}")]
    BadPath(String),
    #[error("create log directory: {0}")]
    CreateDir(std::io::Error),
    #[error("install subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Keeps the file writer flushing; hold it until the process exits.
pub struct TracingGuard {
    _file: Option<WorkerGuard>,
}

pub fn init_tracing(log_file: Option<&Path>) -> Result<TracingGuard, TracingInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| TracingInitError::BadPath(path.display().to_string()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir).map_err(TracingInitError::CreateDir)?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
            Ok(TracingGuard { _file: Some(guard) })
        }
        None => {
            let layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
            Ok(TracingGuard { _file: None })
        }
    }
}
