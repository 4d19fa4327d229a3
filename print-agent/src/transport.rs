//! Print transport
//!
//! Sends a rasterized receipt to a network printer as an ESC/POS raster image
//! followed by a feed-and-cut.

use std::time::Duration;

use crab_printer::{
    CodePage, EscPosBuilder, NetworkPrinter, PrintError, PrintResult, Printer, RasterImage,
};
use shared::models::{PaperSize, PrinterProfile};
use tracing::{info, instrument, warn};

use crate::core::Config;
use crate::raster::{CHAR_WIDTH, RasterArtifact};

/// Lines fed before the cut
const CUT_FEED_LINES: u8 = 3;

/// Delivers a raster artifact to the printer described by a profile
#[allow(async_fn_in_trait)]
pub trait ReceiptTransport {
    async fn deliver(
        &self,
        artifact: &RasterArtifact,
        printer: &PrinterProfile,
    ) -> PrintResult<()>;
}

/// ESC/POS driver settings for one paper width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterDriver {
    pub cpl: usize,
    /// Widest raster image the head can print, in dots
    pub max_dots: u32,
    pub code_page: CodePage,
}

impl PrinterDriver {
    pub fn for_size(size: PaperSize) -> Self {
        let cpl = size.cpl();
        Self {
            cpl,
            max_dots: cpl as u32 * CHAR_WIDTH,
            code_page: CodePage::Pc852,
        }
    }

    /// Full byte stream for one receipt image
    pub fn encode(&self, image: &RasterImage) -> Vec<u8> {
        let mut b = EscPosBuilder::new();
        b.code_page(self.code_page)
            .center()
            .raster(image)
            .left()
            .cut_feed(CUT_FEED_LINES);
        b.build()
    }
}

/// Raw TCP (port 9100) ESC/POS transport
#[derive(Debug, Clone)]
pub struct EscPosTransport {
    print_timeout: Duration,
    probe_timeout: Duration,
}

impl EscPosTransport {
    pub fn new(print_timeout: Duration, probe_timeout: Duration) -> Self {
        Self {
            print_timeout,
            probe_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.print_timeout(), config.probe_timeout())
    }
}

impl ReceiptTransport for EscPosTransport {
    #[instrument(skip_all, fields(printer = %printer.endpoint(), png = %artifact.png_path.display()))]
    async fn deliver(
        &self,
        artifact: &RasterArtifact,
        printer: &PrinterProfile,
    ) -> PrintResult<()> {
        let driver = PrinterDriver::for_size(printer.size);
        let device = NetworkPrinter::new(&printer.printer_host, printer.printer_port)?
            .with_timeout(self.print_timeout)
            .with_probe_timeout(self.probe_timeout);

        if !device.is_online().await {
            warn!("Printer did not answer the probe, sending anyway");
        }

        let path = artifact.png_path.clone();
        let max_dots = driver.max_dots;
        let image =
            tokio::task::spawn_blocking(move || RasterImage::from_png_file(&path, max_dots))
                .await
                .map_err(|e| PrintError::Image(format!("Image task failed: {}", e)))??;

        let data = driver.encode(&image);
        info!(
            width = image.width(),
            height = image.height(),
            bytes = data.len(),
            "Sending receipt"
        );
        device.print(&data).await
    }
}
