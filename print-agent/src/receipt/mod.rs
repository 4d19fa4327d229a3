//! Receipt layout
//!
//! Turns an order plus a printer profile into receipt markup.

mod format;
mod logo;
pub mod markup;
mod profile;
mod renderer;

pub use format::{format_price, format_quantity, format_time};
pub use profile::WidthProfile;
pub use renderer::{ReceiptDocument, ReceiptRenderer};
