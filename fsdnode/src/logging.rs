//! Logging infrastructure for the daemon.
//!
//! Structured logging with file and console output:
//! - Writes to `<base>/logs/fsd_output.log`, truncated at session start
//! - Also prints to stdout for interactive runs
//! - Configurable via the `RUST_LOG` environment variable
//!
//! `<base>` is normally the parent of the directory holding the
//! executable (an `/opt/fsd/bin/fsdnode` install logs to
//! `/opt/fsd/logs/`); the CLI can override it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log file name within the logs directory.
pub const LOG_FILE: &str = "fsd_output.log";

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping it flushes and closes the file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the logging system under `base_dir`.
///
/// Creates `<base>/logs` if needed, truncates the previous log file, and
/// installs a dual file + stdout subscriber.
///
/// # Errors
///
/// Returns an error when the logs directory cannot be created or the log
/// file cannot be truncated. Both are boot-fatal for a daemon that must
/// leave an audit trail.
pub fn init_logging(base_dir: &Path) -> Result<LoggingGuard, io::Error> {
    let log_dir = base_dir.join("logs");
    fs::create_dir_all(&log_dir)?;

    // Truncate the previous session's log.
    fs::write(log_dir.join(LOG_FILE), "")?;

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(io::stdout);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Default `<base>` directory: the parent of the directory containing the
/// running executable.
///
/// # Errors
///
/// Fails when the executable path cannot be resolved or has no parent;
/// boot-fatal, the caller must supply an explicit base directory instead.
pub fn default_base_dir() -> Result<PathBuf, io::Error> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "executable path has no grandparent directory",
            )
        })
}
