use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use crab_printer::{PrintError, PrintResult};
use print_agent::{
    Agent, AgentError, Config, JobOrchestrator, JobSource, JobSourceError, PrinterOutcome,
    RasterArtifact, ReceiptDocument, ReceiptRasterizer, ReceiptRenderer, ReceiptTransport,
    RenderError, RenderResult,
};
use shared::models::{JobDescriptor, OrderSession, PaperSize, PrinterProfile};
use tokio_util::sync::CancellationToken;

/// Records every document; fails on the given call (0-based)
#[derive(Default)]
struct FakeRasterizer {
    calls: AtomicUsize,
    fail_on: Option<usize>,
}

impl ReceiptRasterizer for FakeRasterizer {
    async fn rasterize(
        &self,
        document: &ReceiptDocument,
        job_folder: &Path,
    ) -> RenderResult<RasterArtifact> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(n) {
            return Err(RenderError::Raster("pixmap allocation failed".into()));
        }
        Ok(RasterArtifact {
            svg_path: job_folder.join(format!("{}.svg", n)),
            png_path: job_folder.join(format!("{}.png", n)),
            width_dots: document.cpl as u32 * 12,
        })
    }
}

/// Records delivery attempts; fails for the listed hosts
#[derive(Default)]
struct RecordingTransport {
    attempts: Mutex<Vec<String>>,
    offline_hosts: Vec<String>,
}

impl RecordingTransport {
    fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

impl ReceiptTransport for &RecordingTransport {
    async fn deliver(
        &self,
        _artifact: &RasterArtifact,
        printer: &PrinterProfile,
    ) -> PrintResult<()> {
        self.attempts.lock().unwrap().push(printer.printer_host.clone());
        if self.offline_hosts.contains(&printer.printer_host) {
            return Err(PrintError::Connection(format!(
                "{}: connection refused",
                printer.endpoint()
            )));
        }
        Ok(())
    }
}

fn printer(host: &str) -> PrinterProfile {
    PrinterProfile {
        size: PaperSize::Mm80,
        printer_host: host.to_string(),
        printer_port: 9100,
        do_not_include_price_in_bill: false,
        include_note_in_bill: false,
        include_order_detail_number: false,
        dish_types: vec!["food".to_string()],
    }
}

fn order() -> OrderSession {
    OrderSession {
        restaurant_name: "Quán Ngon".to_string(),
        bill_no: "42".to_string(),
        ..Default::default()
    }
}

fn renderer() -> ReceiptRenderer {
    ReceiptRenderer::new(chrono_tz::Asia::Ho_Chi_Minh)
}

#[tokio::test]
async fn test_rasterization_failure_aborts_remaining_printers() {
    let dir = tempfile::tempdir().unwrap();
    let rasterizer = FakeRasterizer {
        fail_on: Some(0),
        ..Default::default()
    };
    let transport = RecordingTransport::default();
    let orchestrator = JobOrchestrator::new(renderer(), rasterizer, &transport);

    let result = orchestrator
        .process_order(
            &order(),
            &[printer("10.0.0.1"), printer("10.0.0.2")],
            false,
            dir.path(),
        )
        .await;

    assert!(matches!(result, Err(AgentError::Render(RenderError::Raster(_)))));
    assert!(transport.attempts().is_empty());
}

#[tokio::test]
async fn test_later_rasterization_failure_keeps_earlier_delivery() {
    let dir = tempfile::tempdir().unwrap();
    let rasterizer = FakeRasterizer {
        fail_on: Some(1),
        ..Default::default()
    };
    let transport = RecordingTransport::default();
    let orchestrator = JobOrchestrator::new(renderer(), rasterizer, &transport);

    let result = orchestrator
        .process_order(
            &order(),
            &[printer("10.0.0.1"), printer("10.0.0.2"), printer("10.0.0.3")],
            false,
            dir.path(),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(transport.attempts(), ["10.0.0.1"]);
}

#[tokio::test]
async fn test_delivery_failure_continues_with_next_printer() {
    let dir = tempfile::tempdir().unwrap();
    let transport = RecordingTransport {
        offline_hosts: vec!["10.0.0.2".to_string()],
        ..Default::default()
    };
    let orchestrator = JobOrchestrator::new(renderer(), FakeRasterizer::default(), &transport);

    let report = orchestrator
        .process_order(
            &order(),
            &[printer("10.0.0.1"), printer("10.0.0.2"), printer("10.0.0.3")],
            false,
            dir.path(),
        )
        .await
        .unwrap();

    assert_eq!(transport.attempts(), ["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    let outcomes: Vec<_> = report.printers.iter().map(|p| &p.outcome).collect();
    assert_eq!(outcomes[0], &PrinterOutcome::Delivered);
    assert!(matches!(outcomes[1], PrinterOutcome::DeliveryFailed(reason) if reason.contains("refused")));
    assert_eq!(outcomes[2], &PrinterOutcome::Delivered);
    assert_eq!(report.printers[1].printer, "10.0.0.2:9100");
    assert_eq!((report.delivered(), report.failed()), (2, 1));
}

#[tokio::test]
async fn test_job_folder_purged_before_printing() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("jobs");
    std::fs::create_dir(&folder).unwrap();
    std::fs::write(folder.join("1700000000000.png"), b"stale").unwrap();

    let transport = RecordingTransport::default();
    let orchestrator = JobOrchestrator::new(renderer(), FakeRasterizer::default(), &transport);
    orchestrator
        .process_order(&order(), &[], false, &folder)
        .await
        .unwrap();

    assert_eq!(std::fs::read_dir(&folder).unwrap().count(), 0);
}

/// Serves queued descriptors, then nothing
struct QueueSource {
    descriptors: Mutex<Vec<JobDescriptor>>,
    fetches: Arc<AtomicUsize>,
}

impl QueueSource {
    fn new(mut descriptors: Vec<JobDescriptor>) -> Self {
        descriptors.reverse();
        Self {
            descriptors: Mutex::new(descriptors),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl JobSource for QueueSource {
    async fn fetch(&self) -> Result<JobDescriptor, JobSourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.descriptors.lock().unwrap().pop().unwrap_or_default())
    }
}

fn descriptor(payload: serde_json::Value) -> JobDescriptor {
    JobDescriptor {
        sqs_message: Some(payload.to_string()),
    }
}

fn test_config(folder: &Path) -> Config {
    let mut config = Config::with_overrides("http://127.0.0.1:9", folder);
    config.poll_interval_ms = 10;
    config
}

#[tokio::test]
async fn test_cycle_processes_job_then_idles() {
    let dir = tempfile::tempdir().unwrap();
    let source = QueueSource::new(vec![descriptor(serde_json::json!({
        "printerInfo": [{ "size": 58, "printerHost": "10.0.0.1", "printerPort": 9100, "dishTypes": ["food"] }],
        "orderSession": { "restaurantName": "Quán Ngon", "billNo": "42", "tableNames": ["A1"] },
    }))]);
    let transport = RecordingTransport::default();
    let agent = Agent::new(
        source,
        JobOrchestrator::new(renderer(), FakeRasterizer::default(), &transport),
    );
    let config = test_config(dir.path());

    let report = agent.run_cycle(&config).await.unwrap().unwrap();
    assert_eq!(report.delivered(), 1);
    assert_eq!(transport.attempts(), ["10.0.0.1"]);

    assert!(agent.run_cycle(&config).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cycle_skips_payload_without_printers() {
    let dir = tempfile::tempdir().unwrap();
    let source = QueueSource::new(vec![descriptor(serde_json::json!({
        "orderSession": { "billNo": "42" },
    }))]);
    let transport = RecordingTransport::default();
    let agent = Agent::new(
        source,
        JobOrchestrator::new(renderer(), FakeRasterizer::default(), &transport),
    );

    assert!(agent.run_cycle(&test_config(dir.path())).await.unwrap().is_none());
    assert!(transport.attempts().is_empty());
}

#[tokio::test]
async fn test_cycle_rejects_printers_without_order() {
    let dir = tempfile::tempdir().unwrap();
    let source = QueueSource::new(vec![descriptor(serde_json::json!({
        "printerInfo": [{ "size": 80, "printerHost": "10.0.0.1" }],
    }))]);
    let transport = RecordingTransport::default();
    let agent = Agent::new(
        source,
        JobOrchestrator::new(renderer(), FakeRasterizer::default(), &transport),
    );

    let result = agent.run_cycle(&test_config(dir.path())).await;
    assert!(matches!(result, Err(AgentError::JobSource(JobSourceError::Payload(_)))));
}

#[tokio::test]
async fn test_run_polls_until_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let transport = RecordingTransport::default();
    let source = QueueSource::new(Vec::new());
    let fetches = Arc::clone(&source.fetches);
    let agent = Agent::new(
        source,
        JobOrchestrator::new(renderer(), FakeRasterizer::default(), &transport),
    );
    let config = test_config(dir.path());

    let shutdown = CancellationToken::new();
    let stopper = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stopper.cancel();
    });

    tokio::time::timeout(Duration::from_secs(5), agent.run(&config, shutdown))
        .await
        .expect("agent did not stop after cancellation");

    assert!(fetches.load(Ordering::SeqCst) >= 2);
}
