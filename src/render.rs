//! Canvas repaint pipeline.
//!
//! [`render`] is the only paint entry point: it clears the surface, installs
//! the view transform as a single affine matrix, draws the image at its fitted
//! size, strokes every committed box and finally the in-progress box. It holds
//! no state of its own, so painting the same [`Scene`] twice yields identical
//! pixels.
//!
//! Backends implement [`Surface`]. [`SoftwareSurface`] paints into an RGBA
//! framebuffer and is used headless and in tests; the browser build paints
//! onto a `CanvasRenderingContext2d`.

use image::{Pixel, Rgba, RgbaImage};

use crate::constants::{BOX_LINE_WIDTH, COMMITTED_BOX_COLOR, PREVIEW_BOX_COLOR};
use crate::geometry::{Point, Size, ViewTransform};
use crate::image_data::LoadedImage;
use crate::model::BoundingBox;

/// How a rectangle outline is painted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// RGBA colour
    pub color: [u8; 4],
    /// Line width in image-space units (scaled by the transform)
    pub line_width: f32,
}

impl StrokeStyle {
    /// Style of committed boxes.
    pub fn committed() -> Self {
        Self {
            color: COMMITTED_BOX_COLOR,
            line_width: BOX_LINE_WIDTH,
        }
    }

    /// Style of the box being drawn.
    pub fn preview() -> Self {
        Self {
            color: PREVIEW_BOX_COLOR,
            line_width: BOX_LINE_WIDTH,
        }
    }

    /// CSS colour string for canvas backends.
    pub fn css_color(&self) -> String {
        let [r, g, b, a] = self.color;
        format!("rgba({}, {}, {}, {:.3})", r, g, b, f32::from(a) / 255.0)
    }
}

/// A paint target.
pub trait Surface {
    /// Size of the surface in screen pixels.
    fn size(&self) -> Size;

    /// Clear the whole surface, independent of the current transform.
    fn clear(&mut self);

    /// Replace the current transform (never compose with the previous one).
    fn set_transform(&mut self, transform: &ViewTransform);

    /// Draw the image at the image-space origin, at its fitted display size.
    fn draw_image(&mut self, image: &LoadedImage);

    /// Stroke an image-space rectangle; extents may be negative.
    fn stroke_rect(&mut self, rect: &BoundingBox, style: &StrokeStyle);
}

/// Everything needed to paint one frame.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub image: Option<&'a LoadedImage>,
    pub transform: ViewTransform,
    pub boxes: &'a [BoundingBox],
    pub preview: Option<BoundingBox>,
}

/// Repaint `surface` from scratch.
pub fn render<S: Surface + ?Sized>(surface: &mut S, scene: &Scene<'_>) {
    surface.clear();
    let Some(image) = scene.image else {
        return;
    };

    surface.set_transform(&scene.transform);
    surface.draw_image(image);

    let committed = StrokeStyle::committed();
    for bbox in scene.boxes {
        surface.stroke_rect(bbox, &committed);
    }

    if let Some(preview) = &scene.preview {
        surface.stroke_rect(preview, &StrokeStyle::preview());
    }
}

// ============================================================================
// Software backend
// ============================================================================

/// RGBA framebuffer surface.
#[derive(Debug, Clone)]
pub struct SoftwareSurface {
    frame: RgbaImage,
    transform: ViewTransform,
    background: Rgba<u8>,
}

impl SoftwareSurface {
    /// Create a transparent surface of the given pixel size.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, [0, 0, 0, 0])
    }

    /// Create a surface that clears to `background`.
    pub fn with_background(width: u32, height: u32, background: [u8; 4]) -> Self {
        let background = Rgba(background);
        Self {
            frame: RgbaImage::from_pixel(width, height, background),
            transform: ViewTransform::identity(),
            background,
        }
    }

    /// The painted frame.
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    /// Consume the surface, returning the painted frame.
    pub fn into_frame(self) -> RgbaImage {
        self.frame
    }

    /// Screen-space pixel range `[start, end)` covering `[lo, hi)` on one axis.
    fn pixel_span(lo: f32, hi: f32, limit: u32) -> (u32, u32) {
        let start = lo.floor().max(0.0).min(limit as f32) as u32;
        let end = hi.ceil().max(0.0).min(limit as f32) as u32;
        (start, end)
    }

    fn blend_at(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if color[3] == 255 {
            self.frame.put_pixel(x, y, color);
        } else {
            self.frame.get_pixel_mut(x, y).blend(&color);
        }
    }
}

impl Surface for SoftwareSurface {
    fn size(&self) -> Size {
        Size::from_pixels(self.frame.width(), self.frame.height())
    }

    fn clear(&mut self) {
        let background = self.background;
        for pixel in self.frame.pixels_mut() {
            *pixel = background;
        }
    }

    fn set_transform(&mut self, transform: &ViewTransform) {
        self.transform = *transform;
    }

    fn draw_image(&mut self, image: &LoadedImage) {
        let display = image.display_size();
        if display.is_empty() {
            return;
        }

        let source = image.pixels();
        let (to_original_x, to_original_y) = image.display_to_original();
        let max_x = source.width() - 1;
        let max_y = source.height() - 1;

        let top_left = self.transform.image_to_screen(Point::new(0.0, 0.0));
        let bottom_right = self
            .transform
            .image_to_screen(Point::new(display.width, display.height));
        let (x0, x1) = Self::pixel_span(top_left.x, bottom_right.x, self.frame.width());
        let (y0, y1) = Self::pixel_span(top_left.y, bottom_right.y, self.frame.height());

        // Inverse-map each covered pixel centre and sample nearest.
        for y in y0..y1 {
            for x in x0..x1 {
                let p = self
                    .transform
                    .screen_to_image(Point::new(x as f32 + 0.5, y as f32 + 0.5));
                if p.x < 0.0 || p.y < 0.0 || p.x >= display.width || p.y >= display.height {
                    continue;
                }
                let sx = ((p.x * to_original_x) as u32).min(max_x);
                let sy = ((p.y * to_original_y) as u32).min(max_y);
                let color = *source.get_pixel(sx, sy);
                self.blend_at(x, y, color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: &BoundingBox, style: &StrokeStyle) {
        let (min, max) = rect.min_max();
        let min = self.transform.image_to_screen(min);
        let max = self.transform.image_to_screen(max);
        let half = style.line_width * self.transform.scale / 2.0;
        if half.is_nan() || half <= 0.0 {
            return;
        }

        // The stroke straddles the outline: outer minus inner rectangle.
        let (ox0, oy0, ox1, oy1) = (min.x - half, min.y - half, max.x + half, max.y + half);
        let (ix0, iy0, ix1, iy1) = (min.x + half, min.y + half, max.x - half, max.y - half);
        let color = Rgba(style.color);

        let (x0, x1) = Self::pixel_span(ox0, ox1, self.frame.width());
        let (y0, y1) = Self::pixel_span(oy0, oy1, self.frame.height());
        for y in y0..y1 {
            let cy = y as f32 + 0.5;
            if cy < oy0 || cy >= oy1 {
                continue;
            }
            for x in x0..x1 {
                let cx = x as f32 + 0.5;
                if cx < ox0 || cx >= ox1 {
                    continue;
                }
                let inside_inner = cx >= ix0 && cx < ix1 && cy >= iy0 && cy < iy1;
                if !inside_inner {
                    self.blend_at(x, y, color);
                }
            }
        }
    }
}
