use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

/// Default receipt time zone
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Ho_Chi_Minh;

/// Agent configuration
///
/// Built once at startup and passed by reference into every job cycle.
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | JOB_SOURCE_URL | https://api.mmenu.io/v2 | Job source base URL |
/// | RESTAURANT_ID | | Restaurant whose jobs are fetched |
/// | JOB_SOURCE_TOKEN | | Bearer token for the job source |
/// | JOB_SOURCE_APP_ID | mmenu-admin | `appid` request header |
/// | POLL_INTERVAL_MS | 5000 | Delay between job cycles |
/// | HTTP_TIMEOUT_MS | 10000 | Job source request timeout |
/// | JOB_FOLDER | ./jobs | Raster artifact folder (purged every job) |
/// | TIMEZONE | Asia/Ho_Chi_Minh | Time zone of printed timestamps |
/// | PRINT_TIMEOUT_MS | 20000 | Printer connect/write timeout |
/// | PROBE_TIMEOUT_MS | 500 | Printer liveness probe timeout |
/// | FONT_DIR | | Extra font directory for the rasterizer |
/// | LOG_LEVEL | info | Log level |
/// | LOG_DIR | | Daily rolling log directory (stdout when unset) |
/// | LOG_RETENTION_DAYS | 14 | Rolled log files older than this are deleted |
///
/// # Example
///
/// ```ignore
/// RESTAURANT_ID=abc JOB_SOURCE_TOKEN=... JOB_FOLDER=/var/lib/print-agent/jobs cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub job_source_url: String,
    pub restaurant_id: String,
    pub job_source_token: String,
    pub job_source_app_id: String,
    pub poll_interval_ms: u64,
    pub http_timeout_ms: u64,
    pub job_folder: PathBuf,
    pub timezone: Tz,
    pub print_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub font_dir: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub log_retention_days: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            job_source_url: std::env::var("JOB_SOURCE_URL")
                .unwrap_or_else(|_| "https://api.mmenu.io/v2".into()),
            restaurant_id: std::env::var("RESTAURANT_ID").unwrap_or_default(),
            job_source_token: std::env::var("JOB_SOURCE_TOKEN").unwrap_or_default(),
            job_source_app_id: std::env::var("JOB_SOURCE_APP_ID")
                .unwrap_or_else(|_| "mmenu-admin".into()),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS", 5000),
            http_timeout_ms: env_parse("HTTP_TIMEOUT_MS", 10000),
            job_folder: std::env::var("JOB_FOLDER")
                .unwrap_or_else(|_| "./jobs".into())
                .into(),
            timezone: std::env::var("TIMEZONE")
                .ok()
                .map(|tz| parse_timezone(&tz))
                .unwrap_or(DEFAULT_TIMEZONE),
            print_timeout_ms: env_parse("PRINT_TIMEOUT_MS", 20000),
            probe_timeout_ms: env_parse("PROBE_TIMEOUT_MS", 500),
            font_dir: std::env::var("FONT_DIR").ok().map(PathBuf::from),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            log_retention_days: env_parse("LOG_RETENTION_DAYS", 14),
        }
    }

    /// Override the job source and job folder
    ///
    /// Used by tests.
    pub fn with_overrides(job_source_url: impl Into<String>, job_folder: impl Into<PathBuf>) -> Self {
        let mut config = Self::from_env();
        config.job_source_url = job_source_url.into();
        config.job_folder = job_folder.into();
        config
    }

    /// Job source endpoint for this restaurant
    pub fn job_url(&self) -> String {
        format!(
            "{}/restaurants/{}/getPrinterJob",
            self.job_source_url.trim_end_matches('/'),
            self.restaurant_id
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn print_timeout(&self) -> Duration {
        Duration::from_millis(self.print_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an IANA time zone name, falling back to [`DEFAULT_TIMEZONE`]
pub fn parse_timezone(name: &str) -> Tz {
    name.parse().unwrap_or_else(|e| {
        tracing::warn!(
            "Invalid timezone '{}': {}, falling back to {}",
            name,
            e,
            DEFAULT_TIMEZONE
        );
        DEFAULT_TIMEZONE
    })
}
