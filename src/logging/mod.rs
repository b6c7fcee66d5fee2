//! Logging infrastructure.
//!
//! This module provides:
//! - Per-job loggers with file + embedder callback dual output
//! - Compact mode with progress filtering
//! - Tail buffer replayed when an external tool fails
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use storyreel::logging::{JobLogger, LogConfig};
//!
//! let logger = JobLogger::new(
//!     "my_job",
//!     "/path/to/logs",
//!     LogConfig::default(),
//!     None,
//! ).unwrap();
//!
//! logger.info("Starting job");
//! logger.phase("Synthesize");
//! logger.command("ffmpeg -i audio.mp3 ...");
//! logger.progress(50);
//! logger.success("Job completed");
//! ```

mod job_logger;
mod types;

pub use job_logger::{JobLogger, JobLoggerBuilder};
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// Respects RUST_LOG, falling back to the provided default level.
/// Should be called once at startup by the embedding application.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Initialize tracing with a daily-rolling log file in addition to
/// stderr.
///
/// Returns the appender guard; dropping it stops the background writer,
/// so callers must keep it alive for the process lifetime.
pub fn init_file_tracing(
    log_dir: impl AsRef<std::path::Path>,
    default_level: LogLevel,
) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "storyreel.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_to_filter_works() {
        assert_eq!(level_to_filter_str(LogLevel::Debug), "debug");
        assert_eq!(level_to_filter_str(LogLevel::Info), "info");
    }
}
