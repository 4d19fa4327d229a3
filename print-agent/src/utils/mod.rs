//! Utilities

pub mod logger;

pub use logger::{
    LOG_CLEANUP_INTERVAL, cleanup_old_logs, init_logger_with_file, periodic_cleanup, prune_logs,
};
