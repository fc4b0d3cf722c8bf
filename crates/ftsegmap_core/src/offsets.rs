//! Node-offset index: per-node positions into the segment store.

use crate::error::{CoreError, CoreResult};
use crate::types::NodeId;
use std::ops::Range;

/// Associates a routing node with the store index of its first segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeOffset {
    /// The routing node.
    pub node_id: NodeId,
    /// Index of the node's first segment in the segment store.
    pub offset: u32,
}

/// Size of one encoded record: node ID (4) + offset (4).
const RECORD_SIZE: usize = 8;

/// Ordered table of [`NodeOffset`] records.
///
/// Records are kept in strictly ascending node-id order; both lookups are
/// binary searches over that order. A node's segment count is implicit:
/// the distance to the next record's offset, or to the store's end for
/// the last record.
#[derive(Debug, Clone, Default)]
pub struct OffsetIndex {
    records: Vec<NodeOffset>,
}

impl OffsetIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Callers append in ascending node-id order; the
    /// order is asserted in debug builds.
    pub fn push(&mut self, node_id: NodeId, offset: u32) {
        debug_assert!(
            self.records.last().map_or(true, |r| r.node_id < node_id),
            "node ids must be appended in strictly increasing order"
        );
        self.records.push(NodeOffset { node_id, offset });
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the index has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Discards all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Returns the largest recorded store offset, the minimum store
    /// length the index is consistent with.
    #[must_use]
    pub fn max_offset(&self) -> Option<usize> {
        self.records.last().map(|r| r.offset as usize)
    }

    /// Returns the half-open store range `[s, e)` holding `node_id`'s
    /// segments, given the store's total length.
    ///
    /// An unknown node yields an empty range.
    #[must_use]
    pub fn segments_range(&self, node_id: NodeId, store_len: usize) -> Range<usize> {
        match self.records.binary_search_by_key(&node_id, |r| r.node_id) {
            Ok(i) => {
                let start = self.records[i].offset as usize;
                let end = match self.records.get(i + 1) {
                    Some(next) => next.offset as usize,
                    None => store_len,
                };
                start..end
            }
            Err(_) => 0..0,
        }
    }

    /// Returns the node whose range contains `store_index`, or `None` if
    /// the index falls outside every recorded range.
    #[must_use]
    pub fn node_at(&self, store_index: usize, store_len: usize) -> Option<NodeId> {
        if store_index >= store_len {
            return None;
        }
        let i = self
            .records
            .partition_point(|r| r.offset as usize <= store_index);
        if i == 0 {
            return None;
        }
        Some(self.records[i - 1].node_id)
    }

    /// Encodes the index as fixed-width little-endian records.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.records.len() * RECORD_SIZE);
        for record in &self.records {
            buf.extend_from_slice(&record.node_id.as_u32().to_le_bytes());
            buf.extend_from_slice(&record.offset.to_le_bytes());
        }
        buf
    }

    /// Decodes an index from its encoded bytes.
    ///
    /// Ascending node-id order is a hard invariant of the format — binary
    /// search correctness depends on it — so out-of-order records are
    /// rejected, not resorted.
    ///
    /// # Errors
    ///
    /// Returns an error on a ragged byte length or unordered records.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() % RECORD_SIZE != 0 {
            return Err(CoreError::invalid_format(
                "offset index size is not a whole number of records",
            ));
        }

        let mut records: Vec<NodeOffset> = Vec::with_capacity(data.len() / RECORD_SIZE);
        for chunk in data.chunks_exact(RECORD_SIZE) {
            let node_id = NodeId::new(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
            let offset = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);

            if let Some(last) = records.last() {
                if last.node_id >= node_id {
                    return Err(CoreError::invalid_format(format!(
                        "offset index not in ascending node order at {node_id}"
                    )));
                }
                if last.offset > offset {
                    return Err(CoreError::invalid_format(format!(
                        "offset index offsets decrease at {node_id}"
                    )));
                }
            }
            records.push(NodeOffset { node_id, offset });
        }

        Ok(Self { records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OffsetIndex {
        let mut index = OffsetIndex::new();
        index.push(NodeId::new(5), 0);
        index.push(NodeId::new(7), 1);
        index.push(NodeId::new(12), 3);
        index
    }

    #[test]
    fn range_for_present_nodes() {
        let index = sample();
        assert_eq!(index.segments_range(NodeId::new(5), 6), 0..1);
        assert_eq!(index.segments_range(NodeId::new(7), 6), 1..3);
        // Last node extends to the end of the store.
        assert_eq!(index.segments_range(NodeId::new(12), 6), 3..6);
    }

    #[test]
    fn range_for_unknown_node_is_empty() {
        let index = sample();
        let range = index.segments_range(NodeId::new(999), 6);
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn node_at_store_indices() {
        let index = sample();
        assert_eq!(index.node_at(0, 6), Some(NodeId::new(5)));
        assert_eq!(index.node_at(1, 6), Some(NodeId::new(7)));
        assert_eq!(index.node_at(2, 6), Some(NodeId::new(7)));
        assert_eq!(index.node_at(3, 6), Some(NodeId::new(12)));
        assert_eq!(index.node_at(5, 6), Some(NodeId::new(12)));
        assert_eq!(index.node_at(6, 6), None);
    }

    #[test]
    fn node_at_empty_index() {
        let index = OffsetIndex::new();
        assert_eq!(index.node_at(0, 0), None);
    }

    #[test]
    fn encode_decode_roundtrip() {
        let index = sample();
        let decoded = OffsetIndex::decode(&index.encode()).unwrap();

        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded.segments_range(NodeId::new(7), 6), 1..3);
    }

    #[test]
    fn decode_rejects_ragged_length() {
        let result = OffsetIndex::decode(&[0u8; 11]);
        assert!(matches!(result, Err(CoreError::InvalidFormat { .. })));
    }

    #[test]
    fn decode_rejects_unordered_nodes() {
        let mut bytes = Vec::new();
        for (node, offset) in [(9u32, 0u32), (3, 1)] {
            bytes.extend_from_slice(&node.to_le_bytes());
            bytes.extend_from_slice(&offset.to_le_bytes());
        }

        let result = OffsetIndex::decode(&bytes);
        assert!(matches!(result, Err(CoreError::InvalidFormat { .. })));
    }

    #[test]
    fn decode_rejects_decreasing_offsets() {
        let mut bytes = Vec::new();
        for (node, offset) in [(3u32, 5u32), (9, 1)] {
            bytes.extend_from_slice(&node.to_le_bytes());
            bytes.extend_from_slice(&offset.to_le_bytes());
        }

        let result = OffsetIndex::decode(&bytes);
        assert!(matches!(result, Err(CoreError::InvalidFormat { .. })));
    }

    #[test]
    fn clear_empties_index() {
        let mut index = sample();
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.segments_range(NodeId::new(5), 6), 0..0);
    }
}
