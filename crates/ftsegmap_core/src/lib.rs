//! # ftsegmap Core
//!
//! Feature-segment index for routing graphs.
//!
//! Translates between routing-graph node identifiers and the map-feature
//! geometry they correspond to:
//!
//! - given a node, which contiguous runs of feature points does it touch
//!   ([`SegmentMapping::for_each_segment`]);
//! - given geometry segments, which routing nodes do they belong to
//!   ([`SegmentMapping::resolve_nodes`]).
//!
//! The artifact is built offline once by [`SegmentMappingBuilder`] and
//! served read-only by [`SegmentMapping`], which keeps the small
//! node-offset index in memory and attaches the compressed segment store
//! by memory mapping on demand.
//!
//! ## Example
//!
//! ```no_run
//! use ftsegmap_core::{FeatureSegment, NodeId, SegmentMapping, SegmentMappingBuilder};
//! use ftsegmap_storage::{ContainerReader, ContainerWriter};
//! use std::path::Path;
//!
//! let path = Path::new("routing.bin");
//!
//! // Build once, offline.
//! let mut builder = SegmentMappingBuilder::new();
//! builder.append(NodeId::new(5), &[FeatureSegment::new(10, 0, 5)]).unwrap();
//! let mut writer = ContainerWriter::create(path).unwrap();
//! builder.save(&mut writer).unwrap();
//! writer.finish().unwrap();
//!
//! // Serve read-only.
//! let container = ContainerReader::open(path).unwrap();
//! let mut mapping = SegmentMapping::load(&container).unwrap();
//! mapping.map(&container).unwrap();
//! mapping.for_each_segment(NodeId::new(5), |seg| println!("{seg}")).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod error;
mod mapping;
mod offsets;
mod segment;
mod store;
mod types;

pub use builder::SegmentMappingBuilder;
pub use error::{CoreError, CoreResult};
pub use mapping::{ResolvedNodes, SegmentMapping, OFFSETS_SECTION, SEGMENTS_SECTION};
pub use offsets::{NodeOffset, OffsetIndex};
pub use segment::{FeatureSegment, INVALID_FEATURE_ID};
pub use store::SegmentStore;
pub use types::NodeId;
