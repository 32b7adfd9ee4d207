//! Logging setup: terse stderr output plus a daily-rolling log file.

use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

// Keeps the non-blocking file writer alive for the process lifetime.
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initializes tracing. Events go to stderr so stdout stays clean for
/// answers, and to `<log_dir>/ragbot.log.<date>`, rotated daily.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init(log_dir: &Path) {
    let _ = std::fs::create_dir_all(log_dir);

    let (file_writer, guard) =
        tracing_appender::non_blocking(rolling::daily(log_dir, "ragbot.log"));
    let _ = LOG_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
}
