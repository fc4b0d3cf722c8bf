//! Memory-mapped section handles.

use memmap2::Mmap;

/// A read-only view of one section, backed by a memory mapping.
///
/// The handle owns its mapping; the section bytes stay valid exactly as
/// long as the handle lives. Dropping the handle releases the mapping,
/// so an unmapped section cannot be accessed by construction.
pub struct SectionHandle {
    mmap: Mmap,
    offset: usize,
    len: usize,
}

impl SectionHandle {
    pub(crate) fn new(mmap: Mmap, offset: usize, len: usize) -> Self {
        Self { mmap, offset, len }
    }

    /// Returns the section bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[self.offset..self.offset + self.len]
    }

    /// Returns the section length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the section is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for SectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionHandle")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
