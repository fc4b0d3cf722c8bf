//! Mapping builder: offline construction of the persisted artifact.

use crate::error::{CoreError, CoreResult};
use crate::mapping::{OFFSETS_SECTION, SEGMENTS_SECTION};
use crate::offsets::OffsetIndex;
use crate::segment::FeatureSegment;
use crate::types::NodeId;
use ftsegmap_codec::PackedU64Builder;
use ftsegmap_storage::ContainerWriter;
use tracing::debug;

/// Accumulates per-node segment lists and persists them as the offset
/// index and segment store sections.
///
/// Single-use and single-threaded: nodes are appended in strictly
/// increasing id order (asserted in debug builds — the reader's binary
/// searches silently misbehave on an out-of-order artifact), then the
/// whole accumulation is written once with
/// [`save`](SegmentMappingBuilder::save).
#[derive(Debug, Default)]
pub struct SegmentMappingBuilder {
    offsets: OffsetIndex,
    buffer: Vec<u64>,
    last_node: Option<NodeId>,
}

impl SegmentMappingBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one node's segments.
    ///
    /// Records an offset-index entry pointing at the position before this
    /// append, then encodes each segment into the accumulation buffer.
    /// Empty segment lists are legal and produce an empty range for the
    /// node.
    ///
    /// # Errors
    ///
    /// Returns an error if the accumulated store outgrows the u32 offset
    /// space of the index format.
    pub fn append(&mut self, node_id: NodeId, segments: &[FeatureSegment]) -> CoreResult<()> {
        debug_assert!(
            self.last_node.map_or(true, |last| last < node_id),
            "nodes must be appended in strictly increasing id order"
        );

        let offset = u32::try_from(self.buffer.len())
            .map_err(|_| CoreError::invalid_operation("segment store exceeds u32 offset space"))?;

        self.offsets.push(node_id, offset);
        self.buffer.extend(segments.iter().map(|s| s.encode()));
        self.last_node = Some(node_id);

        Ok(())
    }

    /// Returns the number of accumulated segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the number of appended nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.offsets.len()
    }

    /// Finalizes the accumulation and writes both sections into the
    /// container, in the exact layout the reader expects.
    ///
    /// # Errors
    ///
    /// Returns an error if a section cannot be written.
    pub fn save(&self, container: &mut ContainerWriter) -> CoreResult<()> {
        let mut packed = PackedU64Builder::new();
        packed.extend_from_slice(&self.buffer);
        container.write_section(SEGMENTS_SECTION, &packed.finish())?;
        container.write_section(OFFSETS_SECTION, &self.offsets.encode())?;

        debug!(
            nodes = self.offsets.len(),
            segments = self.buffer.len(),
            "saved feature segment mapping"
        );
        Ok(())
    }
}
