//! Job orchestrator
//!
//! Runs render → rasterize → deliver for every printer of one job, strictly in
//! list order. A rasterization failure aborts the job; a delivery failure is
//! logged, recorded in the [`JobReport`] and the next printer is attempted.

use std::path::Path;

use shared::models::{OrderSession, PrinterProfile};
use tracing::{debug, error, info, instrument};

use crate::core::{AgentResult, RenderError, RenderResult};
use crate::raster::{RasterArtifact, Rasterizer};
use crate::receipt::{ReceiptDocument, ReceiptRenderer};
use crate::transport::ReceiptTransport;

/// Turns a receipt document into files the transport can send
#[allow(async_fn_in_trait)]
pub trait ReceiptRasterizer {
    async fn rasterize(
        &self,
        document: &ReceiptDocument,
        job_folder: &Path,
    ) -> RenderResult<RasterArtifact>;
}

impl ReceiptRasterizer for Rasterizer {
    /// Runs the font-backed render and file writes on the blocking pool
    async fn rasterize(
        &self,
        document: &ReceiptDocument,
        job_folder: &Path,
    ) -> RenderResult<RasterArtifact> {
        let rasterizer = self.clone();
        let document = document.clone();
        let job_folder = job_folder.to_path_buf();
        tokio::task::spawn_blocking(move || {
            Rasterizer::rasterize(&rasterizer, &document, &job_folder)
        })
        .await
        .map_err(|e| RenderError::Raster(format!("Rasterize task failed: {}", e)))?
    }
}

/// Result of one printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterOutcome {
    Delivered,
    DeliveryFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterReport {
    /// `host:port`
    pub printer: String,
    pub outcome: PrinterOutcome,
}

/// Per-printer outcomes of one job, in printer order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub printers: Vec<PrinterReport>,
}

impl JobReport {
    pub fn delivered(&self) -> usize {
        self.printers
            .iter()
            .filter(|p| p.outcome == PrinterOutcome::Delivered)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.printers.len() - self.delivered()
    }
}

/// Print job orchestrator
pub struct JobOrchestrator<R, T> {
    renderer: ReceiptRenderer,
    rasterizer: R,
    transport: T,
}

impl<R, T> JobOrchestrator<R, T>
where
    R: ReceiptRasterizer,
    T: ReceiptTransport,
{
    pub fn new(renderer: ReceiptRenderer, rasterizer: R, transport: T) -> Self {
        Self {
            renderer,
            rasterizer,
            transport,
        }
    }

    /// Print one order on every printer
    ///
    /// The job folder is created if missing and emptied before the first printer.
    #[instrument(skip_all, fields(bill_no = %session.bill_no, printers = printers.len(), is_preview = is_preview))]
    pub async fn process_order(
        &self,
        session: &OrderSession,
        printers: &[PrinterProfile],
        is_preview: bool,
        job_folder: &Path,
    ) -> AgentResult<JobReport> {
        let removed = purge_job_folder(job_folder)?;
        debug!(folder = %job_folder.display(), removed, "Job folder purged");

        let mut report = JobReport::default();
        for printer in printers {
            let document = self.renderer.render(session, printer, is_preview);
            let artifact = self.rasterizer.rasterize(&document, job_folder).await?;

            let outcome = match self.transport.deliver(&artifact, printer).await {
                Ok(()) => {
                    info!(printer = %printer.endpoint(), "Receipt printed");
                    PrinterOutcome::Delivered
                }
                Err(e) => {
                    error!(printer = %printer.endpoint(), error = %e, "Failed to print receipt");
                    PrinterOutcome::DeliveryFailed(e.to_string())
                }
            };
            report.printers.push(PrinterReport {
                printer: printer.endpoint(),
                outcome,
            });
        }

        Ok(report)
    }
}

/// Create `folder` if needed and delete every file in it
pub fn purge_job_folder(folder: &Path) -> std::io::Result<usize> {
    std::fs::create_dir_all(folder)?;

    let mut removed = 0;
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        std::fs::remove_file(entry.path())?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purge_creates_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("jobs");
        assert_eq!(purge_job_folder(&folder).unwrap(), 0);
        assert!(folder.is_dir());
    }

    #[test]
    fn test_purge_removes_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1.svg"), "<svg/>").unwrap();
        std::fs::write(dir.path().join("1.png"), [0u8; 4]).unwrap();
        std::fs::create_dir(dir.path().join("keep")).unwrap();

        assert_eq!(purge_job_folder(dir.path()).unwrap(), 2);
        let left: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(left.len(), 1);
    }

    #[tokio::test]
    async fn test_rasterizer_runs_off_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = Rasterizer::new(None);
        let document = ReceiptDocument {
            cpl: 32,
            markup: "|Phở bò | 50.000|\n".to_string(),
        };

        let artifact = ReceiptRasterizer::rasterize(&rasterizer, &document, dir.path())
            .await
            .unwrap();
        assert_eq!(artifact.width_dots, 384);
        assert!(artifact.png_path.exists());

        let bad = ReceiptDocument {
            cpl: 32,
            markup: "{border:thick}\n".to_string(),
        };
        let result = ReceiptRasterizer::rasterize(&rasterizer, &bad, dir.path()).await;
        assert!(matches!(result, Err(RenderError::Markup(_))));
    }

    #[test]
    fn test_report_counts() {
        let report = JobReport {
            printers: vec![
                PrinterReport {
                    printer: "a:9100".into(),
                    outcome: PrinterOutcome::Delivered,
                },
                PrinterReport {
                    printer: "b:9100".into(),
                    outcome: PrinterOutcome::DeliveryFailed("refused".into()),
                },
            ],
        };
        assert_eq!((report.delivered(), report.failed()), (1, 1));
    }
}
