//! ESC/POS command builder
//!
//! Provides a fluent API for building ESC/POS print data.

#[cfg(feature = "image")]
use crate::raster::RasterImage;

/// Printer code page, selected with ESC t n
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePage {
    /// PC852 Latin 2 ("Slovenia" character set)
    Pc852,
}

impl CodePage {
    /// The `n` argument of ESC t n
    pub fn table(self) -> u8 {
        match self {
            CodePage::Pc852 => 18,
        }
    }
}

/// ESC/POS command builder
///
/// Builds ESC/POS byte sequences for thermal printers.
pub struct EscPosBuilder {
    buf: Vec<u8>,
}

impl EscPosBuilder {
    /// Create a new builder, starting with the printer reset
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(4096);
        // Initialize printer (ESC @)
        buf.extend_from_slice(&[0x1B, 0x40]);
        Self { buf }
    }

    // === Character Set ===

    /// Select character code table
    pub fn code_page(&mut self, page: CodePage) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x74, page.table()]);
        self
    }

    /// Write multiple empty lines
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        // ESC d n - Print and feed n lines
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    // === Alignment ===

    /// Align to center
    pub fn center(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x01]);
        self
    }

    /// Align to left (default)
    pub fn left(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x00]);
        self
    }

    // === Graphics ===

    /// Print a monochrome raster image (GS v 0)
    #[cfg(feature = "image")]
    pub fn raster(&mut self, image: &RasterImage) -> &mut Self {
        self.buf.extend_from_slice(&image.to_escpos());
        self
    }

    // === Paper Control ===

    /// Full cut with feed: feeds n lines then cuts.
    /// Uses GS V 66 n, which lets the printer manage cutter-to-head distance.
    pub fn cut_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x42, lines]);
        self
    }

    // === Build ===

    /// Build the final byte buffer
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}
