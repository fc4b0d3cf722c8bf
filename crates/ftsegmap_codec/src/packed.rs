//! Build-once packed u64 list with random-access decode.
//!
//! Layout:
//!
//! ```text
//! magic "PU64" (4) | version u16 | block_len u16 | count u64
//! block directory: one u64 byte offset per block, relative to payload start
//! payload: blocks back to back
//! ```
//!
//! Each block covers `block_len` consecutive values (the last block may be
//! partial) and stores the block minimum as a base (u64), a delta bit
//! width (u8), and the bitpacked `value - base` deltas. Decoding one value
//! touches only its block, so the list can be indexed directly over
//! memory-mapped bytes without materializing anything.

use crate::bitpack;
use crate::error::{CodecError, CodecResult};

/// Magic bytes identifying a packed u64 list.
pub const PACKED_MAGIC: [u8; 4] = *b"PU64";

/// Current packed list format version.
pub const PACKED_VERSION: u16 = 1;

/// Size of the fixed header: magic (4) + version (2) + block_len (2) + count (8).
pub const PACKED_HEADER_SIZE: usize = 16;

/// Default number of values per block.
pub const DEFAULT_BLOCK_LEN: u16 = 64;

/// Per-block prefix: base (8) + width (1).
const BLOCK_PREFIX_SIZE: usize = 9;

/// Accumulates u64 values and encodes them into a packed list.
#[derive(Debug)]
pub struct PackedU64Builder {
    values: Vec<u64>,
    block_len: u16,
}

impl Default for PackedU64Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl PackedU64Builder {
    /// Creates an empty builder with the default block length.
    #[must_use]
    pub fn new() -> Self {
        Self::with_block_len(DEFAULT_BLOCK_LEN)
    }

    /// Creates an empty builder with an explicit block length.
    ///
    /// A zero block length falls back to the default.
    #[must_use]
    pub fn with_block_len(block_len: u16) -> Self {
        Self {
            values: Vec::new(),
            block_len: if block_len == 0 {
                DEFAULT_BLOCK_LEN
            } else {
                block_len
            },
        }
    }

    /// Appends one value.
    pub fn push(&mut self, value: u64) {
        self.values.push(value);
    }

    /// Appends all values from a slice.
    pub fn extend_from_slice(&mut self, values: &[u64]) {
        self.values.extend_from_slice(values);
    }

    /// Returns the number of accumulated values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no values were accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encodes the accumulated values into packed list bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        let block_len = usize::from(self.block_len);
        let block_count = self.values.len().div_ceil(block_len);

        let mut payload = Vec::new();
        let mut directory = Vec::with_capacity(block_count * 8);

        for block in self.values.chunks(block_len) {
            directory.extend_from_slice(&(payload.len() as u64).to_le_bytes());

            let base = block.iter().copied().min().unwrap_or(0);
            let deltas: Vec<u64> = block.iter().map(|&v| v - base).collect();
            let width = bitpack::width_for(deltas.iter().copied().max().unwrap_or(0));

            payload.extend_from_slice(&base.to_le_bytes());
            payload.push(width as u8);
            bitpack::pack_into(&deltas, width, &mut payload);
        }

        let mut out = Vec::with_capacity(PACKED_HEADER_SIZE + directory.len() + payload.len());
        out.extend_from_slice(&PACKED_MAGIC);
        out.extend_from_slice(&PACKED_VERSION.to_le_bytes());
        out.extend_from_slice(&self.block_len.to_le_bytes());
        out.extend_from_slice(&(self.values.len() as u64).to_le_bytes());
        out.extend_from_slice(&directory);
        out.extend_from_slice(&payload);
        out
    }
}

/// A borrowed view over packed list bytes, typically a mapped section.
///
/// Parsing validates the fixed header only; per-value decodes bounds-check
/// the block they touch. Parsing is O(1), so views are cheap to
/// reconstruct per query.
#[derive(Debug, Clone, Copy)]
pub struct PackedU64Slice<'a> {
    bytes: &'a [u8],
    block_len: usize,
    count: usize,
    /// Byte offset where the payload (first block) starts.
    payload_start: usize,
}

impl<'a> PackedU64Slice<'a> {
    /// Parses the header of packed list bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the magic, version, or declared sizes do not
    /// describe `bytes`.
    pub fn parse(bytes: &'a [u8]) -> CodecResult<Self> {
        let count = Self::count_from_header(bytes)?;
        let block_len = usize::from(u16::from_le_bytes([bytes[6], bytes[7]]));
        if block_len == 0 {
            return Err(CodecError::invalid_format("zero block length"));
        }

        let block_count = count.div_ceil(block_len);
        let payload_start = block_count
            .checked_mul(8)
            .and_then(|dir| dir.checked_add(PACKED_HEADER_SIZE))
            .ok_or_else(|| CodecError::invalid_format("packed list directory too large"))?;
        if bytes.len() < payload_start {
            return Err(CodecError::Truncated { at: bytes.len() });
        }

        Ok(Self {
            bytes,
            block_len,
            count,
            payload_start,
        })
    }

    /// Reads the value count from a packed list header without parsing
    /// the rest.
    ///
    /// Lets callers learn the length from a small prefix read, before any
    /// mapping of the full byte run exists.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is shorter than the header or is not a
    /// packed list.
    pub fn count_from_header(bytes: &[u8]) -> CodecResult<usize> {
        if bytes.len() < PACKED_HEADER_SIZE {
            return Err(CodecError::Truncated { at: bytes.len() });
        }
        if bytes[0..4] != PACKED_MAGIC {
            return Err(CodecError::invalid_format("bad packed list magic"));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version > PACKED_VERSION {
            return Err(CodecError::invalid_format(format!(
                "unsupported packed list version: {version}"
            )));
        }

        let count = u64::from_le_bytes([
            bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
        ]);
        usize::try_from(count)
            .map_err(|_| CodecError::invalid_format("packed list count exceeds address space"))
    }

    /// Returns the number of values in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Decodes the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::IndexOutOfBounds`] for an index past the end,
    /// or [`CodecError::Truncated`] if the bytes end inside the block.
    pub fn get(&self, index: usize) -> CodecResult<u64> {
        if index >= self.count {
            return Err(CodecError::IndexOutOfBounds {
                index,
                len: self.count,
            });
        }

        let block = index / self.block_len;
        let dir_at = PACKED_HEADER_SIZE + block * 8;
        let rel = u64::from_le_bytes(
            self.bytes[dir_at..dir_at + 8]
                .try_into()
                .unwrap_or([0; 8]),
        );
        let block_start = self
            .payload_start
            .checked_add(usize::try_from(rel).map_err(|_| CodecError::Truncated { at: dir_at })?)
            .ok_or(CodecError::Truncated { at: dir_at })?;

        let prefix_end = block_start
            .checked_add(BLOCK_PREFIX_SIZE)
            .ok_or(CodecError::Truncated { at: dir_at })?;
        if prefix_end > self.bytes.len() {
            return Err(CodecError::Truncated {
                at: self.bytes.len(),
            });
        }

        let base = u64::from_le_bytes(
            self.bytes[block_start..block_start + 8]
                .try_into()
                .unwrap_or([0; 8]),
        );
        let width = u32::from(self.bytes[block_start + 8]);
        if width > 64 {
            return Err(CodecError::invalid_format(format!(
                "invalid delta width: {width}"
            )));
        }

        let packed = &self.bytes[block_start + BLOCK_PREFIX_SIZE..];
        let delta = bitpack::unpack_at(packed, width, index % self.block_len).ok_or(
            CodecError::Truncated {
                at: self.bytes.len(),
            },
        )?;

        Ok(base.wrapping_add(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pack(values: &[u64]) -> Vec<u8> {
        let mut builder = PackedU64Builder::new();
        builder.extend_from_slice(values);
        builder.finish()
    }

    #[test]
    fn empty_list() {
        let bytes = pack(&[]);
        let slice = PackedU64Slice::parse(&bytes).unwrap();

        assert_eq!(slice.len(), 0);
        assert!(slice.is_empty());
        assert!(matches!(
            slice.get(0),
            Err(CodecError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn single_block() {
        let values = [42u64, 7, 42, 1000, 0];
        let bytes = pack(&values);
        let slice = PackedU64Slice::parse(&bytes).unwrap();

        assert_eq!(slice.len(), values.len());
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(slice.get(i).unwrap(), v);
        }
    }

    #[test]
    fn multiple_blocks_with_partial_tail() {
        // 3 full blocks of 64 plus a partial block of 5.
        let values: Vec<u64> = (0..197).map(|i| i * i + 17).collect();
        let bytes = pack(&values);
        let slice = PackedU64Slice::parse(&bytes).unwrap();

        assert_eq!(slice.len(), 197);
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(slice.get(i).unwrap(), v);
        }
    }

    #[test]
    fn constant_values_use_zero_width() {
        let values = vec![0xDEAD_BEEFu64; 128];
        let bytes = pack(&values);
        let slice = PackedU64Slice::parse(&bytes).unwrap();

        // Two blocks, each base (8) + width (1) and no packed payload.
        assert_eq!(bytes.len(), PACKED_HEADER_SIZE + 2 * 8 + 2 * 9);
        assert_eq!(slice.get(0).unwrap(), 0xDEAD_BEEF);
        assert_eq!(slice.get(127).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn extreme_values() {
        let values = [0u64, u64::MAX, 1, u64::MAX - 1];
        let bytes = pack(&values);
        let slice = PackedU64Slice::parse(&bytes).unwrap();

        for (i, &v) in values.iter().enumerate() {
            assert_eq!(slice.get(i).unwrap(), v);
        }
    }

    #[test]
    fn custom_block_len() {
        let mut builder = PackedU64Builder::with_block_len(4);
        builder.extend_from_slice(&[9, 8, 7, 6, 5, 4, 3, 2, 1]);
        let bytes = builder.finish();

        let slice = PackedU64Slice::parse(&bytes).unwrap();
        for i in 0..9 {
            assert_eq!(slice.get(i).unwrap(), 9 - i as u64);
        }
    }

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = pack(&[1, 2, 3]);
        bytes[0] = b'X';

        assert!(matches!(
            PackedU64Slice::parse(&bytes),
            Err(CodecError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn truncated_header_rejected() {
        let bytes = pack(&[1, 2, 3]);
        assert!(matches!(
            PackedU64Slice::parse(&bytes[..10]),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn truncated_payload_detected() {
        let values: Vec<u64> = (0..80).map(|i| i * 1000).collect();
        let bytes = pack(&values);
        let cut = &bytes[..bytes.len() - 4];

        let slice = PackedU64Slice::parse(cut).unwrap();
        assert!(slice.get(0).is_ok());
        assert!(slice.get(79).is_err());
    }

    #[test]
    fn count_from_header_prefix() {
        let bytes = pack(&[5, 6, 7]);
        let count = PackedU64Slice::count_from_header(&bytes[..PACKED_HEADER_SIZE]).unwrap();
        assert_eq!(count, 3);
    }

    proptest! {
        #[test]
        fn random_access_matches_source(values in prop::collection::vec(any::<u64>(), 0..600)) {
            let bytes = pack(&values);
            let slice = PackedU64Slice::parse(&bytes).unwrap();

            prop_assert_eq!(slice.len(), values.len());
            for (i, &v) in values.iter().enumerate() {
                prop_assert_eq!(slice.get(i).unwrap(), v);
            }
        }
    }
}
