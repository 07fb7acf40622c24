//! Subscriber setup for the `focus` binary.
//!
//! Logs go to a daily rolling file under `<root>/logs/` so they never
//! interleave with command output on stdout.

use std::env;
use std::path::Path;

use fs_err as fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "FOCUS_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "focus.log";

/// Installs the global subscriber. Hold the returned guard until exit so
/// buffered lines are flushed.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    let filter = filter_from_env(env::var(DEBUG_ENV).ok().as_deref());

    if let Err(err) = fs::create_dir_all(logs_dir) {
        // No log directory: fall back to stderr rather than losing warnings.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
        tracing::warn!(error = %err, "Log directory unavailable; logging to stderr");
        return None;
    }

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_ansi(false)
        .with_writer(writer)
        .try_init();
    Some(guard)
}

fn debug_forced(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}

fn filter_from_env(debug_value: Option<&str>) -> EnvFilter {
    if debug_forced(debug_value) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}
