//! Receipt print agent
//!
//! Polls the restaurant API for print jobs, lays each order out as a receipt,
//! rasterizes it and sends it to the networked thermal printers of the job.
//!
//! # Module structure
//!
//! ```text
//! print-agent/src/
//! ├── core/          # configuration, errors
//! ├── utils/         # logging
//! ├── receipt/       # order → receipt markup
//! ├── raster/        # markup → SVG → PNG
//! ├── transport.rs   # PNG → ESC/POS over TCP
//! ├── orchestrator.rs
//! ├── job_source.rs
//! └── agent.rs       # poll loop
//! ```

pub mod agent;
pub mod core;
pub mod job_source;
pub mod orchestrator;
pub mod raster;
pub mod receipt;
pub mod transport;
pub mod utils;

pub use agent::Agent;
pub use core::{AgentError, AgentResult, Config, JobSourceError, RenderError, RenderResult};
pub use job_source::{HttpJobSource, JobSource};
pub use orchestrator::{
    JobOrchestrator, JobReport, PrinterOutcome, PrinterReport, ReceiptRasterizer,
};
pub use raster::{RasterArtifact, Rasterizer};
pub use receipt::{ReceiptDocument, ReceiptRenderer};
pub use transport::{EscPosTransport, PrinterDriver, ReceiptTransport};

pub use utils::logger::{
    LOG_CLEANUP_INTERVAL, cleanup_old_logs, init_logger_with_file, periodic_cleanup, prune_logs,
};

/// Load `.env`, read the configuration and start logging
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    if let Some(dir) = config.log_dir.as_deref() {
        prune_logs(dir, config.log_retention_days);
    }
    config
}
