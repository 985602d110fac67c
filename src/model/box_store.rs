//! Committed boxes with an undo/redo buffer.
//!
//! Maintains two stacks:
//! - `boxes`: committed boxes in insertion order (most recent at the end)
//! - `undone`: boxes that can be redone (most recently undone at the end)
//!
//! Adding a box clears `undone` (a new edit invalidates redo history).
//! Undo moves the last committed box onto `undone`; redo moves it back.

use super::BoundingBox;

/// Ordered box collection for one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxStore {
    boxes: Vec<BoundingBox>,
    undone: Vec<BoundingBox>,
}

impl BoxStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a box and drop the redo history.
    pub fn add(&mut self, bbox: BoundingBox) {
        self.boxes.push(bbox);
        if !self.undone.is_empty() {
            log::debug!("🗑️ Redo buffer cleared ({} boxes)", self.undone.len());
            self.undone.clear();
        }
        log::debug!("📝 Box #{} added: {:?}", self.boxes.len(), bbox);
    }

    /// Move the last committed box to the redo buffer.
    /// Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(bbox) = self.boxes.pop() else {
            return false;
        };
        log::debug!("⏪ Undo box {:?}", bbox);
        self.undone.push(bbox);
        true
    }

    /// Move the most recently undone box back onto the committed list.
    /// Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(bbox) = self.undone.pop() else {
            return false;
        };
        log::debug!("⏩ Redo box {:?}", bbox);
        self.boxes.push(bbox);
        true
    }

    /// Clear committed boxes and redo history.
    pub fn reset(&mut self) {
        self.boxes.clear();
        self.undone.clear();
        log::debug!("🗑️ Boxes reset");
    }

    /// Committed boxes in insertion order.
    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    /// Redo buffer, most recently undone last.
    pub fn undone(&self) -> &[BoundingBox] {
        &self.undone
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.boxes.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: u8) -> BoundingBox {
        let f = f32::from(i);
        BoundingBox::new(f, f, 10.0 + f, 5.0 + f)
    }

    #[test]
    fn test_store_basic() {
        let mut store = BoxStore::new();
        assert!(!store.can_undo());
        assert!(!store.can_redo());

        store.add(sample(1));
        assert!(store.can_undo());
        assert!(!store.can_redo());

        assert!(store.undo());
        assert!(!store.can_undo());
        assert!(store.can_redo());
        assert_eq!(store.undone(), &[sample(1)]);

        assert!(store.redo());
        assert!(store.can_undo());
        assert!(!store.can_redo());
        assert_eq!(store.boxes(), &[sample(1)]);
    }

    #[test]
    fn test_undo_redo_on_empty_is_noop() {
        let mut store = BoxStore::new();
        assert!(!store.undo());
        assert!(!store.redo());
        assert_eq!(store, BoxStore::new());
    }

    #[test]
    fn test_undo_then_redo_restores_state() {
        let mut store = BoxStore::new();
        for i in 0..4 {
            store.add(sample(i));
        }
        store.undo();
        let before = store.clone();

        assert!(store.undo());
        assert!(store.redo());
        assert_eq!(store, before);
    }

    #[test]
    fn test_undo_order_is_lifo() {
        let mut store = BoxStore::new();
        store.add(sample(1));
        store.add(sample(2));
        store.add(sample(3));

        store.undo();
        store.undo();
        assert_eq!(store.boxes(), &[sample(1)]);
        assert_eq!(store.undone(), &[sample(3), sample(2)]);

        store.redo();
        assert_eq!(store.boxes(), &[sample(1), sample(2)]);
        assert_eq!(store.undone(), &[sample(3)]);
    }

    #[test]
    fn test_add_clears_redo() {
        let mut store = BoxStore::new();
        store.add(sample(1));
        store.add(sample(2));
        store.undo();
        store.undo();
        assert_eq!(store.undone().len(), 2);

        store.add(sample(3));
        assert!(!store.can_redo());
        assert!(!store.redo());
        assert_eq!(store.boxes(), &[sample(3)]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = BoxStore::new();
        store.add(sample(1));
        store.add(sample(2));
        store.undo();

        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(!store.can_redo());
    }
}
