//! Ordered list of live slot indices, handed to the renderer as an index buffer

/// Slot indices currently alive, plus a dirty flag for topology changes.
///
/// Removal shifts later entries down by one, so a sweep that removes while
/// iterating must walk from the back.
pub struct ActiveIndexList {
    indices: Vec<u32>,
    dirty: bool,
}

impl ActiveIndexList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
            dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Slot index at list position `position`
    pub fn get(&self, position: usize) -> Option<u32> {
        self.indices.get(position).copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.indices
    }

    pub fn contains(&self, slot: u32) -> bool {
        self.indices.contains(&slot)
    }

    pub(crate) fn push(&mut self, slot: u32) {
        self.indices.push(slot);
        self.dirty = true;
    }

    /// Remove the entry at `position`, preserving the order of the rest
    pub(crate) fn remove_at(&mut self, position: usize) -> u32 {
        self.dirty = true;
        self.indices.remove(position)
    }

    /// True if entries were added or removed since the last [`take_dirty`](Self::take_dirty)
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and reset the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}
