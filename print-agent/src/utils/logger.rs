//! Logging Infrastructure
//!
//! Console logging by default, daily rolling files when a log directory is configured.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio_util::sync::CancellationToken;

/// Log file prefix used by the rolling appender
pub const LOG_FILE_PREFIX: &str = "print-agent";

/// How often the running agent prunes rolled log files
pub const LOG_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Initialize the logger with optional file output
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level.parse().unwrap_or(tracing::Level::INFO))
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    // Add file output if log_dir is provided
    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if std::fs::create_dir_all(log_path).is_ok()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, LOG_FILE_PREFIX);
            subscriber.with_ansi(false).with_writer(file_appender).init();
            return;
        }
    }

    subscriber.init();
}

/// Delete rolled log files older than `days`
///
/// Only files named after [`LOG_FILE_PREFIX`] are touched. Returns the number
/// of deleted files.
pub fn cleanup_old_logs(log_dir: impl AsRef<Path>, days: u64) -> std::io::Result<usize> {
    let max_age = Duration::from_secs(days * 24 * 60 * 60);
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(LOG_FILE_PREFIX) {
            continue;
        }

        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }

        let age = now
            .duration_since(metadata.modified()?)
            .unwrap_or(Duration::ZERO);
        if age > max_age {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    Ok(removed)
}

/// Run [`cleanup_old_logs`] and log the outcome
pub fn prune_logs(log_dir: impl AsRef<Path>, days: u64) {
    match cleanup_old_logs(log_dir, days) {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "Old log files removed"),
        Err(e) => tracing::warn!(error = %e, "Failed to clean up old logs"),
    }
}

/// Periodic cleanup task, prunes every `every` until `shutdown` fires
pub async fn periodic_cleanup(
    log_dir: PathBuf,
    days: u64,
    every: Duration,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(every) => {}
        }
        prune_logs(&log_dir, days);
    }
}
