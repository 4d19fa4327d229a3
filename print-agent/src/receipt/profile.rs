//! Column layouts per paper width

use shared::models::PaperSize;

/// Column widths for one paper width class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthProfile {
    /// Characters per line
    pub cpl: usize,
    /// Representative / time / table block
    pub info: [usize; 2],
    /// Dish name / quantity / price
    pub items: [usize; 3],
    /// Label / amount
    pub totals: [usize; 2],
}

impl WidthProfile {
    /// 58mm paper
    pub const NARROW: WidthProfile = WidthProfile {
        cpl: 32,
        info: [16, 16],
        items: [18, 2, 12],
        totals: [16, 16],
    };

    /// 80mm paper
    pub const WIDE: WidthProfile = WidthProfile {
        cpl: 48,
        info: [25, 23],
        items: [33, 2, 12],
        totals: [20, 28],
    };

    pub fn for_size(size: PaperSize) -> &'static WidthProfile {
        match size {
            PaperSize::Mm58 => &Self::NARROW,
            PaperSize::Mm80 => &Self::WIDE,
        }
    }
}
