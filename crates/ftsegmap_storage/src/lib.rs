//! # ftsegmap Storage
//!
//! Named-section binary container for ftsegmap artifacts.
//!
//! A container is a single file holding write-once named sections. The
//! build side appends sections through [`ContainerWriter`] and seals the
//! file with a section directory; the read side opens the directory with
//! [`ContainerReader`] and accesses sections either as owned buffers or
//! as zero-copy memory mappings ([`SectionHandle`]).
//!
//! Containers are opaque byte stores: section contents are interpreted
//! entirely by the layers above.
//!
//! ## Example
//!
//! ```no_run
//! use ftsegmap_storage::{ContainerReader, ContainerWriter};
//! use std::path::Path;
//!
//! let path = Path::new("index.bin");
//!
//! let mut writer = ContainerWriter::create(path).unwrap();
//! writer.write_section("payload", b"bytes").unwrap();
//! writer.finish().unwrap();
//!
//! let reader = ContainerReader::open(path).unwrap();
//! let handle = reader.map_section("payload").unwrap();
//! assert_eq!(handle.as_bytes(), b"bytes");
//! ```

#![warn(missing_docs)]

mod error;
mod reader;
mod section;
mod writer;

pub use error::{StorageError, StorageResult};
pub use reader::{ContainerReader, SectionInfo};
pub use section::SectionHandle;
pub use writer::{ContainerWriter, CONTAINER_MAGIC, CONTAINER_VERSION};
