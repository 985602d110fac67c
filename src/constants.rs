//! Global constants for the boxcrop annotator

/// Multiplicative step for zoom in (zoom out divides by it).
pub const ZOOM_FACTOR: f32 = 1.1;

/// Boxes narrower or shorter than this (image-space units) are rejected on commit.
pub const MIN_BOX_SIZE: f32 = 1.0;

/// Stroke width for boxes, in image-space units.
pub const BOX_LINE_WIDTH: f32 = 2.0;

/// Stroke colour of committed boxes.
pub const COMMITTED_BOX_COLOR: [u8; 4] = [255, 0, 0, 255];

/// Stroke colour of the box currently being drawn.
pub const PREVIEW_BOX_COLOR: [u8; 4] = [0, 0, 255, 255];

/// Default JPEG quality for exported crops (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Default file name of the crop archive.
pub const DEFAULT_ARCHIVE_NAME: &str = "Cropped_Images.zip";

/// Prefix of each archive entry; followed by the 1-based box index.
pub const CROP_ENTRY_PREFIX: &str = "cropped_image_";

/// Extension of each archive entry.
pub const CROP_ENTRY_EXTENSION: &str = "jpg";

/// Default canvas size for headless sessions.
pub const DEFAULT_CANVAS_WIDTH: u32 = 800;

/// Default canvas size for headless sessions.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 600;
