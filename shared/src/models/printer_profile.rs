//! Printer Profile Model

use serde::{Deserialize, Serialize};

use super::serde_helpers::null_default;

/// Paper width class of a thermal printer
///
/// The job source sends the paper width in millimetres. 58 selects the narrow
/// class, every other value selects the wide class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum PaperSize {
    /// 58mm paper, 32 characters per line
    Mm58,
    /// 80mm paper, 48 characters per line
    #[default]
    Mm80,
}

impl PaperSize {
    /// Characters per line
    pub fn cpl(self) -> usize {
        match self {
            PaperSize::Mm58 => 32,
            PaperSize::Mm80 => 48,
        }
    }

    /// Paper width in millimetres
    pub fn millimetres(self) -> u16 {
        match self {
            PaperSize::Mm58 => 58,
            PaperSize::Mm80 => 80,
        }
    }
}

impl From<u16> for PaperSize {
    fn from(mm: u16) -> Self {
        if mm == 58 {
            PaperSize::Mm58
        } else {
            PaperSize::Mm80
        }
    }
}

impl From<PaperSize> for u16 {
    fn from(size: PaperSize) -> Self {
        size.millimetres()
    }
}

/// Target printer and its rendering options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterProfile {
    #[serde(default)]
    pub size: PaperSize,
    pub printer_host: String,
    #[serde(default = "default_port")]
    pub printer_port: u16,
    /// Leave the price column empty and skip the totals block
    #[serde(default, deserialize_with = "null_default")]
    pub do_not_include_price_in_bill: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub include_note_in_bill: bool,
    /// Print the "Lần N" reprint marker
    #[serde(default, deserialize_with = "null_default")]
    pub include_order_detail_number: bool,
    /// Dish types printed on this printer
    #[serde(default, deserialize_with = "null_default")]
    pub dish_types: Vec<String>,
}

fn default_port() -> u16 {
    9100
}

impl PrinterProfile {
    /// Whether a dish type is on this printer's allow-list
    pub fn accepts(&self, dish_type: &str) -> bool {
        self.dish_types.iter().any(|t| t == dish_type)
    }

    /// `host:port` form, for logs
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.printer_host, self.printer_port)
    }
}
