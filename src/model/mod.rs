//! Annotation data models.

mod bbox;
mod box_store;

pub use bbox::BoundingBox;
pub use box_store::BoxStore;
