//! The loaded source image.

use image::RgbaImage;

use crate::error::{AnnotatorError, Result};
use crate::geometry::{FittedView, Size, fit_to_canvas};

/// A decoded image together with the size it is displayed at when `scale == 1`.
///
/// Box coordinates live in the fitted display space (`0..display.width`),
/// so [`LoadedImage::display_to_original`] is the only factor needed to map a
/// box onto native pixels. The image never changes once loaded; a new upload
/// replaces it wholesale.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pixels: RgbaImage,
    display: Size,
}

impl LoadedImage {
    /// Decode raw file bytes (format is sniffed from the content).
    pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
        let decoded = image::load_from_memory(bytes)?;
        let pixels = decoded.to_rgba8();
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(AnnotatorError::EmptyImage { width, height });
        }
        log::debug!("Decoded image {}x{} ({} bytes)", width, height, bytes.len());
        Ok(pixels)
    }

    /// Fit decoded pixels into a canvas.
    ///
    /// Returns the image and the initial (fit-to-canvas) view.
    pub fn fit(pixels: RgbaImage, canvas: Size) -> (Self, FittedView) {
        let fitted = fit_to_canvas(Self::pixel_size(&pixels), canvas);
        let image = Self {
            pixels,
            display: fitted.display,
        };
        (image, fitted)
    }

    fn pixel_size(pixels: &RgbaImage) -> Size {
        let (w, h) = pixels.dimensions();
        Size::from_pixels(w, h)
    }

    /// Native pixel data.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Native width in pixels.
    pub fn original_width(&self) -> u32 {
        self.pixels.width()
    }

    /// Native height in pixels.
    pub fn original_height(&self) -> u32 {
        self.pixels.height()
    }

    /// Native size in pixels.
    pub fn original_size(&self) -> Size {
        Self::pixel_size(&self.pixels)
    }

    /// Fitted display size at `scale == 1`.
    pub fn display_size(&self) -> Size {
        self.display
    }

    /// Per-axis factor from display space to native pixels.
    ///
    /// Returns `(1.0, 1.0)` for a degenerate display size.
    pub fn display_to_original(&self) -> (f32, f32) {
        if self.display.is_empty() {
            return (1.0, 1.0);
        }
        let original = self.original_size();
        (
            original.width / self.display.width,
            original.height / self.display.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let pixels = LoadedImage::decode(&png_bytes(8, 6)).unwrap();
        assert_eq!(pixels.dimensions(), (8, 6));
        assert_eq!(pixels.get_pixel(3, 3), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = LoadedImage::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AnnotatorError::Decode(_)));
    }

    #[test]
    fn test_fit_records_display_size() {
        let pixels = RgbaImage::new(800, 600);
        let (image, fitted) = LoadedImage::fit(pixels, Size::new(400.0, 300.0));
        assert_eq!(image.display_size(), Size::new(400.0, 300.0));
        assert_eq!(image.original_width(), 800);
        assert_eq!(image.original_height(), 600);
        assert_eq!(fitted.transform.scale, 1.0);
        assert_eq!(image.display_to_original(), (2.0, 2.0));
    }

    #[test]
    fn test_display_to_original_letterboxed() {
        let pixels = RgbaImage::new(1000, 250);
        let (image, _) = LoadedImage::fit(pixels, Size::new(400.0, 300.0));
        let (sx, sy) = image.display_to_original();
        assert!((sx - 2.5).abs() < 1e-6);
        assert!((sy - 2.5).abs() < 1e-6);
    }
}
