//! Monochrome raster images for ESC/POS printers

use std::path::Path;

use image::{DynamicImage, GenericImageView};
use tracing::{info, instrument};

use crate::error::{PrintError, PrintResult};

/// 1-bit image packed for GS v 0
///
/// Rows are `width_bytes` long, most significant bit first, 1 = black dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterImage {
    /// Load an image file and convert it for a printer of `max_width` dots
    #[instrument]
    pub fn from_png_file(path: &Path, max_width: u32) -> PrintResult<Self> {
        let img = image::open(path)
            .map_err(|e| PrintError::Image(format!("{}: {}", path.display(), e)))?;
        info!(dimensions = ?img.dimensions(), "raster image opened");
        Ok(Self::from_image(&img, max_width))
    }

    /// Convert a decoded image
    ///
    /// The image is:
    /// - Resized to fit `max_width` dots (aspect ratio kept)
    /// - Converted to 1-bit monochrome, transparent pixels printed white
    pub fn from_image(img: &DynamicImage, max_width: u32) -> Self {
        let (w, h) = img.dimensions();

        let (new_w, new_h) = if w > max_width {
            let ratio = max_width as f64 / w as f64;
            (max_width, ((h as f64 * ratio) as u32).max(1))
        } else {
            (w, h)
        };

        let resized = if (new_w, new_h) == (w, h) {
            img.clone()
        } else {
            img.resize_exact(new_w, new_h, image::imageops::FilterType::Nearest)
        };

        let x_bytes = new_w.div_ceil(8);
        let rgba = resized.to_rgba8();
        let mut data = Vec::with_capacity((x_bytes * new_h) as usize);

        for y in 0..new_h {
            for x_byte in 0..x_bytes {
                let mut byte = 0u8;
                for bit in 0..8 {
                    let x = x_byte * 8 + bit;
                    if x < new_w {
                        let pixel = rgba.get_pixel(x, y);

                        // Transparent = white (0)
                        if pixel[3] >= 128 {
                            let luma = (0.299 * pixel[0] as f32
                                + 0.587 * pixel[1] as f32
                                + 0.114 * pixel[2] as f32) as u8;

                            // Dark enough = print black (1)
                            if luma < 128 {
                                byte |= 1 << (7 - bit);
                            }
                        }
                    }
                }
                data.push(byte);
            }
        }

        Self {
            width: new_w,
            height: new_h,
            data,
        }
    }

    /// Width in dots
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in dots
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row
    pub fn width_bytes(&self) -> u32 {
        self.width.div_ceil(8)
    }

    /// Packed rows
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encode as a GS v 0 raster bit image command
    pub fn to_escpos(&self) -> Vec<u8> {
        let x_bytes = self.width_bytes();
        let mut out = Vec::with_capacity(self.data.len() + 9);

        // GS v 0 m xL xH yL yH
        out.extend_from_slice(&[0x1D, 0x76, 0x30, 0x00]);
        out.push(x_bytes as u8);
        out.push((x_bytes >> 8) as u8);
        out.push(self.height as u8);
        out.push((self.height >> 8) as u8);
        out.extend_from_slice(&self.data);

        // Newline after image
        out.push(0x0A);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn checker(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        for y in 0..height {
            for x in 0..width {
                if (x + y) % 2 == 0 {
                    img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
                }
            }
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_packs_bits_msb_first() {
        let raster = RasterImage::from_image(&checker(10, 2), 384);

        assert_eq!(raster.width(), 10);
        assert_eq!(raster.height(), 2);
        assert_eq!(raster.width_bytes(), 2);
        // Row 0: x = 0,2,4,6 | 8
        assert_eq!(raster.data()[0], 0b1010_1010);
        assert_eq!(raster.data()[1], 0b1000_0000);
        // Row 1: x = 1,3,5,7 | 9
        assert_eq!(raster.data()[2], 0b0101_0101);
        assert_eq!(raster.data()[3], 0b0100_0000);
    }

    #[test]
    fn test_transparent_is_white() {
        let img = RgbaImage::from_pixel(8, 1, Rgba([0, 0, 0, 0]));
        let raster = RasterImage::from_image(&DynamicImage::ImageRgba8(img), 384);
        assert_eq!(raster.data(), &[0]);
    }

    #[test]
    fn test_resizes_to_max_width() {
        let raster = RasterImage::from_image(&checker(800, 100), 400);
        assert_eq!(raster.width(), 400);
        assert_eq!(raster.height(), 50);
    }

    #[test]
    fn test_escpos_header() {
        let raster = RasterImage::from_image(&checker(576, 300), 576);
        let data = raster.to_escpos();

        assert_eq!(&data[..8], &[0x1D, 0x76, 0x30, 0x00, 72, 0, 44, 1]);
        assert_eq!(data.len(), 8 + 72 * 300 + 1);
    }

    #[test]
    fn test_missing_file() {
        let err = RasterImage::from_png_file(Path::new("/nonexistent/receipt.png"), 384)
            .unwrap_err();
        assert!(matches!(err, PrintError::Image(_)));
    }
}
