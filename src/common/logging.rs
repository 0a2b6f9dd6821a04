//! Logging and tracing configuration
//!
//! The interactive driver logs to a file so log lines do not tear the
//! prompt; batch and scenario runs log to stderr.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("replmark=info,warn"))
}

/// Initialize stderr logging for batch and scenario runs
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_stderr() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize file logging for the interactive driver
///
/// Uses `path` when given, otherwise the platform log directory. Falls back
/// to stderr when no log file can be opened. The returned guard must be kept
/// alive for the duration of the program or buffered lines are lost.
pub fn init_file(path: Option<&Path>) -> Option<WorkerGuard> {
    let target = match path.map(PathBuf::from).or_else(default_log_path) {
        Some(target) => target,
        None => {
            init_stderr();
            return None;
        }
    };

    if let Some(dir) = target.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Warning: could not create log directory: {}", e);
            init_stderr();
            return None;
        }
    }

    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&target)
    {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::registry()
                .with(env_filter())
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
            Some(guard)
        }
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {}", target.display(), e);
            init_stderr();
            None
        }
    }
}

/// Default log file under the platform data directory
pub fn default_log_path() -> Option<PathBuf> {
    paths::log_dir().map(|d| d.join("replmark.log"))
}
