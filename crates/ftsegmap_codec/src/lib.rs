//! # ftsegmap Codec
//!
//! Build-once compressed u64 sequence with O(1) random-access decode.
//!
//! The sequence is encoded in fixed-length blocks, each holding a base
//! value plus bitpacked deltas, with a block directory for direct
//! indexing. Decoding a value touches a single block, so a
//! [`PackedU64Slice`] can sit directly on memory-mapped bytes — no
//! up-front decompression, no allocation per read.
//!
//! ## Usage
//!
//! ```
//! use ftsegmap_codec::{PackedU64Builder, PackedU64Slice};
//!
//! let mut builder = PackedU64Builder::new();
//! builder.extend_from_slice(&[10, 11, 12, 500]);
//! let bytes = builder.finish();
//!
//! let list = PackedU64Slice::parse(&bytes).unwrap();
//! assert_eq!(list.len(), 4);
//! assert_eq!(list.get(3).unwrap(), 500);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod bitpack;
mod error;
mod packed;

pub use error::{CodecError, CodecResult};
pub use packed::{
    PackedU64Builder, PackedU64Slice, DEFAULT_BLOCK_LEN, PACKED_HEADER_SIZE, PACKED_MAGIC,
    PACKED_VERSION,
};
