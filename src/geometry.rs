//! View transform mathematics.
//!
//! The view maps image space to screen space with a uniform scale followed by
//! a translation: `screen = image * scale + pan`. All conversions of pointer
//! positions go through [`ViewTransform::screen_to_image`] so that drawing,
//! stored boxes and rendering agree with each other.

use serde::{Deserialize, Serialize};

/// A 2D point, either in screen space or image space depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    pub fn delta_from(&self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Build from integer pixel dimensions.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    /// True if either side is zero, negative or not finite.
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0)
    }
}

/// Pan/zoom state of the view.
///
/// `scale` is always positive: [`ViewTransform::zoom`] ignores factors that
/// would make it zero, negative or non-finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

/// Result of fitting an image into a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedView {
    /// Transform that centers the fitted image at scale 1.
    pub transform: ViewTransform,
    /// Size the image is drawn at when `scale == 1`.
    pub display: Size,
}

impl ViewTransform {
    /// Create a new transform with the given scale and pan.
    pub fn new(scale: f32, pan_x: f32, pan_y: f32) -> Self {
        Self {
            scale,
            pan_x,
            pan_y,
        }
    }

    /// Create an identity transform (scale=1, no pan).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Convert a screen-space point to image space.
    pub fn screen_to_image(&self, point: Point) -> Point {
        Point::new(
            (point.x - self.pan_x) / self.scale,
            (point.y - self.pan_y) / self.scale,
        )
    }

    /// Convert an image-space point to screen space.
    pub fn image_to_screen(&self, point: Point) -> Point {
        Point::new(
            point.x * self.scale + self.pan_x,
            point.y * self.scale + self.pan_y,
        )
    }

    /// Multiply the scale by `factor`, leaving pan untouched.
    ///
    /// The zoom is anchored at the canvas origin. Factors that are not
    /// finite and positive, or that would overflow the scale, return the
    /// transform unchanged.
    pub fn zoom(&self, factor: f32) -> ViewTransform {
        let scale = self.scale * factor;
        if !(factor.is_finite() && factor > 0.0 && scale.is_finite() && scale > 0.0) {
            log::warn!("🔍 Ignoring zoom factor {}", factor);
            return *self;
        }
        ViewTransform { scale, ..*self }
    }

    /// Zoom in by a factor (e.g., 1.1 for 10% zoom in).
    pub fn zoom_in(&self, factor: f32) -> ViewTransform {
        self.zoom(factor)
    }

    /// Zoom out by a factor (e.g., 1.1 for 10% zoom out).
    pub fn zoom_out(&self, factor: f32) -> ViewTransform {
        self.zoom(1.0 / factor)
    }

    /// Apply a screen-space pan delta to the transform.
    pub fn pan_by(&self, dx: f32, dy: f32) -> ViewTransform {
        ViewTransform {
            scale: self.scale,
            pan_x: self.pan_x + dx,
            pan_y: self.pan_y + dy,
        }
    }

    /// Restore scale to 1 without touching pan.
    pub fn reset_zoom(&self) -> ViewTransform {
        ViewTransform { scale: 1.0, ..*self }
    }

    /// Canvas 2D style affine matrix `[a, b, c, d, e, f]` for this transform.
    pub fn to_affine(&self) -> [f64; 6] {
        [
            f64::from(self.scale),
            0.0,
            0.0,
            f64::from(self.scale),
            f64::from(self.pan_x),
            f64::from(self.pan_y),
        ]
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Fit an image into a canvas, preserving aspect ratio and centering it.
///
/// The fitted image fills the canvas along its limiting axis. The returned
/// transform always has `scale == 1`. An empty image or canvas yields a
/// zero display size centered in the canvas.
pub fn fit_to_canvas(image: Size, canvas: Size) -> FittedView {
    if image.is_empty() || canvas.is_empty() {
        let transform = ViewTransform::new(
            1.0,
            canvas.width.max(0.0) / 2.0,
            canvas.height.max(0.0) / 2.0,
        );
        return FittedView {
            transform,
            display: Size::default(),
        };
    }

    // Cross-multiplied ratio comparison keeps integer-sized inputs exact.
    let display = if image.width * canvas.height > canvas.width * image.height {
        Size::new(canvas.width, canvas.width * image.height / image.width)
    } else {
        Size::new(canvas.height * image.width / image.height, canvas.height)
    };

    FittedView {
        transform: ViewTransform::new(
            1.0,
            (canvas.width - display.width) / 2.0,
            (canvas.height - display.height) / 2.0,
        ),
        display,
    }
}
