//! # crab-printer
//!
//! ESC/POS thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building
//! - Monochrome raster images (GS v 0)
//! - Network printing (raw TCP, usually port 9100)
//!
//! WHAT to print (receipt layout, rasterization of the layout) stays in
//! application code, see `print-agent`.
//!
//! ## Example
//!
//! ```ignore
//! use crab_printer::{CodePage, EscPosBuilder, NetworkPrinter, Printer, RasterImage};
//!
//! let image = RasterImage::from_png_file("receipt.png", 576)?;
//!
//! let mut builder = EscPosBuilder::new();
//! builder.code_page(CodePage::Pc852);
//! builder.center();
//! builder.raster(&image);
//! builder.cut_feed(3);
//!
//! let printer = NetworkPrinter::new("192.168.1.100", 9100)?;
//! printer.print(&builder.build()).await?;
//! ```

mod error;
mod escpos;
mod printer;
#[cfg(feature = "image")]
mod raster;

// Re-exports
pub use error::{PrintError, PrintResult};
pub use escpos::{CodePage, EscPosBuilder};
pub use printer::{NetworkPrinter, Printer};

#[cfg(feature = "image")]
pub use raster::RasterImage;
