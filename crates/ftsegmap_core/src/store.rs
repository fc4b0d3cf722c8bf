//! Mapped segment store: packed u64 list over a mapped container section.

use crate::error::CoreResult;
use ftsegmap_codec::PackedU64Slice;
use ftsegmap_storage::SectionHandle;

/// Read-only view of the segment store section while it is mapped.
///
/// Owns the section mapping; dropping the store releases it. Decoding is
/// performed in place over the mapped bytes through a cheap
/// [`PackedU64Slice`] view, reconstructed per query.
#[derive(Debug)]
pub struct SegmentStore {
    handle: SectionHandle,
    len: usize,
}

impl SegmentStore {
    /// Validates the mapped section as a packed list and wraps it.
    ///
    /// # Errors
    ///
    /// Returns an error if the section bytes are not a well-formed packed
    /// list header.
    pub fn open(handle: SectionHandle) -> CoreResult<Self> {
        let len = PackedU64Slice::parse(handle.as_bytes())?.len();
        Ok(Self { handle, len })
    }

    /// Returns the number of encoded segments in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the store holds no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a decode view over the mapped bytes.
    ///
    /// # Errors
    ///
    /// Propagates header validation errors; these cannot occur after a
    /// successful [`open`](SegmentStore::open) unless the backing file
    /// was modified externally.
    pub fn view(&self) -> CoreResult<PackedU64Slice<'_>> {
        Ok(PackedU64Slice::parse(self.handle.as_bytes())?)
    }
}
