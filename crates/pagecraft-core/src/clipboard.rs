//! In-process copy/paste buffer.

use crate::shapes::CanvasObject;
use kurbo::Vec2;

/// Offset applied on every paste.
pub const PASTE_OFFSET: f64 = 10.0;

/// Holding buffer for copied objects.
///
/// The buffer's own positions advance by the paste offset after each paste, so
/// consecutive pastes step diagonally instead of stacking.
#[derive(Debug, Clone)]
pub struct Clipboard {
    buffer: Vec<CanvasObject>,
    offset: Vec2,
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard {
    pub fn new() -> Self {
        Self::with_offset(PASTE_OFFSET)
    }

    /// Clipboard stepping `offset` pixels on both axes per paste.
    pub fn with_offset(offset: f64) -> Self {
        Self {
            buffer: Vec::new(),
            offset: Vec2::new(offset, offset),
        }
    }

    /// Replace the buffer with deep copies of `objects`.
    pub fn copy<'a>(&mut self, objects: impl IntoIterator<Item = &'a CanvasObject>) {
        self.buffer = objects.into_iter().cloned().collect();
        log::debug!("Copied {} object(s)", self.buffer.len());
    }

    /// Produce fresh copies of the buffer, shifted by the offset and with new ids.
    ///
    /// Returns an empty vector when nothing has been copied.
    pub fn paste(&mut self) -> Vec<CanvasObject> {
        let pasted: Vec<CanvasObject> = self
            .buffer
            .iter()
            .map(|object| {
                let mut copy = object.duplicate();
                copy.translate(self.offset);
                copy
            })
            .collect();
        for object in &mut self.buffer {
            object.translate(self.offset);
        }
        pasted
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
