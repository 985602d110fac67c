//! Bounding box geometry in image space.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// A rectangle in image-space coordinates.
///
/// `width` and `height` keep the sign of the drag that produced the box, so a
/// box drawn up-and-left has negative extents. Use [`BoundingBox::normalized`]
/// when a positive-extent rectangle is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box anchored at `start` and extending to `end`, sign preserved.
    pub fn from_corners(start: Point, end: Point) -> Self {
        Self::new(start.x, start.y, end.x - start.x, end.y - start.y)
    }

    /// Same rectangle with a top-left origin and non-negative extents.
    pub fn normalized(&self) -> Self {
        Self::new(
            self.x.min(self.x + self.width),
            self.y.min(self.y + self.height),
            self.width.abs(),
            self.height.abs(),
        )
    }

    /// True if either side is shorter than `min_size` (or not a number).
    pub fn is_degenerate(&self, min_size: f32) -> bool {
        !(self.width.abs() >= min_size && self.height.abs() >= min_size)
    }

    /// Top-left and bottom-right corners of the normalized box.
    pub fn min_max(&self) -> (Point, Point) {
        let n = self.normalized();
        (
            Point::new(n.x, n.y),
            Point::new(n.x + n.width, n.y + n.height),
        )
    }

    /// Box with every coordinate multiplied by `factor_x`/`factor_y`.
    pub fn scaled(&self, factor_x: f32, factor_y: f32) -> Self {
        Self::new(
            self.x * factor_x,
            self.y * factor_y,
            self.width * factor_x,
            self.height * factor_y,
        )
    }
}
