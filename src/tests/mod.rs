//! End-to-end tests for annotation sessions.
//!
//! These drive [`crate::AnnotatorSession`] through pointer events and controls
//! the way a host would, and check stored geometry, rendering and exported
//! archives together.

mod export_tests;

use image::{Rgba, RgbaImage};

use crate::geometry::{Point, Size};
use crate::interaction::PointerEvent;
use crate::session::AnnotatorSession;

pub(super) const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub(super) const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Image whose left half is red and right half blue.
pub(super) fn split_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| if x < width / 2 { RED } else { BLUE })
}

/// Session with a blank `width`x`height` image fitted into `canvas`.
pub(super) fn session_with(width: u32, height: u32, canvas: Size) -> AnnotatorSession {
    let mut session = AnnotatorSession::default();
    session
        .load_pixels(RgbaImage::new(width, height), canvas)
        .unwrap();
    session
}

/// Drag from `from` to `to` in screen space (down, one move, up).
pub(super) fn drag(session: &mut AnnotatorSession, from: Point, to: Point) {
    session.handle_pointer(PointerEvent::Down(from));
    session.handle_pointer(PointerEvent::Move(to));
    session.handle_pointer(PointerEvent::Up(to));
}
