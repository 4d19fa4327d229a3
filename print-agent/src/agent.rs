//! Agent loop
//!
//! One cycle fetches a job and, if there is one, prints it on every printer.
//! Cycles repeat every poll interval until shutdown; a cycle in progress always
//! runs to completion.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::core::{AgentResult, Config};
use crate::job_source::JobSource;
use crate::orchestrator::{JobOrchestrator, JobReport, ReceiptRasterizer};
use crate::transport::ReceiptTransport;

/// Receipt print agent
pub struct Agent<S, R, T> {
    source: S,
    orchestrator: JobOrchestrator<R, T>,
}

impl<S, R, T> Agent<S, R, T>
where
    S: JobSource,
    R: ReceiptRasterizer,
    T: ReceiptTransport,
{
    pub fn new(source: S, orchestrator: JobOrchestrator<R, T>) -> Self {
        Self {
            source,
            orchestrator,
        }
    }

    /// Fetch and process one job
    ///
    /// Returns `Ok(None)` when the job source has nothing to print.
    #[instrument(skip_all)]
    pub async fn run_cycle(&self, config: &Config) -> AgentResult<Option<JobReport>> {
        let Some(task) = self.source.next_job().await? else {
            debug!("No print job");
            return Ok(None);
        };

        info!(
            bill_no = %task.order_session.bill_no,
            printers = task.printers.len(),
            is_preview = task.is_preview,
            "Print job received"
        );

        let report = self
            .orchestrator
            .process_order(
                &task.order_session,
                &task.printers,
                task.is_preview,
                &config.job_folder,
            )
            .await?;
        Ok(Some(report))
    }

    /// Run cycles until `shutdown` is cancelled
    pub async fn run(&self, config: &Config, shutdown: CancellationToken) {
        info!(
            url = %config.job_url(),
            interval_ms = config.poll_interval_ms,
            "Print agent started"
        );

        while !shutdown.is_cancelled() {
            match self.run_cycle(config).await {
                Ok(Some(report)) => info!(
                    delivered = report.delivered(),
                    failed = report.failed(),
                    "Print job finished"
                ),
                Ok(None) => {}
                Err(e) => error!(error = %e, "Print job cycle failed"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(config.poll_interval()) => {}
            }
        }

        info!("Print agent stopped");
    }
}
