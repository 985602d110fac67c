//! boxcrop - bounding box annotation and crop export
//!
//! Load one image, drag out rectangular boxes over it under a pan/zoom view,
//! undo and redo box edits, and export every boxed region of the native image
//! as a JPEG inside a single ZIP archive. All state lives in an
//! [`AnnotatorSession`] for as long as the host keeps it.

pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod geometry;
pub mod image_data;
pub mod interaction;
pub mod model;
pub mod render;
pub mod session;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;

#[cfg(test)]
mod tests;

pub use config::{AppConfig, UserPreferences};
pub use error::{AnnotatorError, Result};
pub use export::ExportArchive;
pub use geometry::{Point, Size, ViewTransform};
pub use model::{BoundingBox, BoxStore};
pub use render::{SoftwareSurface, Surface};
pub use session::{AnnotatorSession, Control, ControlOutcome};

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
