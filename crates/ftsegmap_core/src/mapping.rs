//! Mapping reader: per-node segment lookup and reverse resolution.

use crate::error::{CoreError, CoreResult};
use crate::offsets::OffsetIndex;
use crate::segment::FeatureSegment;
use crate::store::SegmentStore;
use crate::types::NodeId;
use ftsegmap_codec::{PackedU64Slice, PACKED_HEADER_SIZE};
use ftsegmap_storage::ContainerReader;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Container section holding the packed segment store.
pub const SEGMENTS_SECTION: &str = "ftseg";

/// Container section holding the node-offset index.
pub const OFFSETS_SECTION: &str = "ftseg_offsets";

/// Result of reverse resolution: encoded query segment to the routing
/// nodes matching it in forward and reverse direction.
pub type ResolvedNodes = HashMap<u64, (NodeId, NodeId)>;

/// Reader over a persisted feature-segment mapping artifact.
///
/// The offset index is small and lives in memory for the reader's whole
/// lifetime; the much larger segment store is attached on demand via
/// [`map`](SegmentMapping::map) and can be released with
/// [`unmap`](SegmentMapping::unmap) under memory pressure without losing
/// the index. Queries never mutate loaded state, so a loaded mapping can
/// be shared across threads; attachment changes take `&mut self` and are
/// thereby serialized against in-flight queries.
#[derive(Debug, Default)]
pub struct SegmentMapping {
    offsets: OffsetIndex,
    store_len: usize,
    store: Option<SegmentStore>,
}

impl SegmentMapping {
    /// Loads the offset index and store length from a container.
    ///
    /// The store itself is not mapped; call [`map`](SegmentMapping::map)
    /// before decoding segments.
    ///
    /// # Errors
    ///
    /// A missing, truncated, or malformed section is a fatal construction
    /// error; no partially initialized mapping is returned.
    pub fn load(container: &ContainerReader) -> CoreResult<Self> {
        let offsets = OffsetIndex::decode(&container.read_section(OFFSETS_SECTION)?)?;

        let header = container.read_section_at(SEGMENTS_SECTION, 0, PACKED_HEADER_SIZE)?;
        let store_len = PackedU64Slice::count_from_header(&header)?;

        if offsets.max_offset().is_some_and(|max| max > store_len) {
            return Err(CoreError::invalid_format(
                "offset index points beyond the segment store",
            ));
        }

        debug!(
            nodes = offsets.len(),
            segments = store_len,
            "loaded feature segment mapping"
        );

        Ok(Self {
            offsets,
            store_len,
            store: None,
        })
    }

    /// Attaches the segment store section. Idempotent: a mapped store
    /// stays mapped.
    ///
    /// # Errors
    ///
    /// Returns an error if mapping fails or the mapped store disagrees
    /// with the length recorded at load time.
    pub fn map(&mut self, container: &ContainerReader) -> CoreResult<()> {
        if self.store.is_some() {
            return Ok(());
        }

        let store = SegmentStore::open(container.map_section(SEGMENTS_SECTION)?)?;
        if store.len() != self.store_len {
            return Err(CoreError::invalid_format(format!(
                "segment store length changed: loaded {}, mapped {}",
                self.store_len,
                store.len()
            )));
        }

        debug!(segments = store.len(), "mapped segment store");
        self.store = Some(store);
        Ok(())
    }

    /// Releases the segment store mapping. Idempotent; the offset index
    /// stays resident and the store can be remapped later.
    pub fn unmap(&mut self) {
        self.store = None;
    }

    /// Returns whether the segment store is currently mapped.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.store.is_some()
    }

    /// Discards all state: offset index, store length, and any mapping.
    pub fn clear(&mut self) {
        self.offsets.clear();
        self.store_len = 0;
        self.store = None;
    }

    /// Returns the total number of segments in the store.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.store_len
    }

    /// Returns the number of nodes with recorded segments.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.offsets.len()
    }

    /// Returns the half-open store range `[s, e)` of a node's segments.
    /// An unknown node yields an empty range.
    #[must_use]
    pub fn segments_range(&self, node_id: NodeId) -> Range<usize> {
        self.offsets.segments_range(node_id, self.store_len)
    }

    /// Returns the node owning the given store index.
    ///
    /// # Errors
    ///
    /// An index outside every recorded range is a consistency violation
    /// and surfaces as [`CoreError::InconsistentIndex`].
    pub fn node_at(&self, store_index: usize) -> CoreResult<NodeId> {
        self.offsets
            .node_at(store_index, self.store_len)
            .ok_or(CoreError::InconsistentIndex { store_index })
    }

    /// Decodes each of `node_id`'s segments in store order and passes the
    /// valid ones to `visitor`. Sentinel (invalid) entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreNotMapped`] when the store is detached,
    /// or a codec error on corrupt store bytes.
    pub fn for_each_segment<F>(&self, node_id: NodeId, mut visitor: F) -> CoreResult<()>
    where
        F: FnMut(FeatureSegment),
    {
        let store = self.store.as_ref().ok_or(CoreError::StoreNotMapped)?;
        let view = store.view()?;

        for index in self.segments_range(node_id) {
            let segment = FeatureSegment::from_encoded(view.get(index)?);
            if segment.is_valid() {
                visitor(segment);
            }
        }
        Ok(())
    }

    /// Resolves which routing nodes the query segments belong to.
    ///
    /// Scans the whole store once; every store entry intersecting a query
    /// segment records its owning node under the query's encoding — in the
    /// pair's first slot when the stored and query directions agree, in
    /// the second otherwise. Unset slots hold [`NodeId::INVALID`].
    ///
    /// Worst case O(store length × query count). The `cancel` flag is
    /// polled once per store entry; once observed set, the partial result
    /// accumulated so far is returned without error. Cancellation is
    /// cooperative only — a scan is never interrupted mid-entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreNotMapped`] when the store is detached,
    /// or a consistency error if a matching entry belongs to no node.
    pub fn resolve_nodes(
        &self,
        query: &[FeatureSegment],
        cancel: &AtomicBool,
    ) -> CoreResult<ResolvedNodes> {
        let store = self.store.as_ref().ok_or(CoreError::StoreNotMapped)?;
        let view = store.view()?;

        let mut resolved = ResolvedNodes::new();
        for index in 0..self.store_len {
            if cancel.load(Ordering::Relaxed) {
                debug!(scanned = index, "segment resolution cancelled");
                break;
            }

            let stored = FeatureSegment::from_encoded(view.get(index)?);
            if !stored.is_valid() {
                continue;
            }

            for q in query {
                if !stored.intersects(q) {
                    continue;
                }
                let node = self.node_at(index)?;
                let entry = resolved
                    .entry(q.encode())
                    .or_insert((NodeId::INVALID, NodeId::INVALID));
                if stored.is_reversed() == q.is_reversed() {
                    entry.0 = node;
                } else {
                    entry.1 = node;
                }
            }
        }

        Ok(resolved)
    }

    /// Logs every store entry belonging to the given feature. Diagnostic
    /// only.
    ///
    /// # Errors
    ///
    /// Same requirements as [`for_each_segment`](Self::for_each_segment).
    pub fn dump_segments_by_feature(&self, feature_id: u32) -> CoreResult<()> {
        let store = self.store.as_ref().ok_or(CoreError::StoreNotMapped)?;
        let view = store.view()?;

        for index in 0..self.store_len {
            let segment = FeatureSegment::from_encoded(view.get(index)?);
            if segment.feature_id == feature_id {
                let node = self.node_at(index)?;
                debug!(%segment, %node, index, "feature segment");
            }
        }
        Ok(())
    }

    /// Logs every segment recorded for the given node. Diagnostic only.
    ///
    /// # Errors
    ///
    /// Same requirements as [`for_each_segment`](Self::for_each_segment).
    pub fn dump_segments_by_node(&self, node_id: NodeId) -> CoreResult<()> {
        self.for_each_segment(node_id, |segment| {
            debug!(%segment, node = %node_id, "node segment");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SegmentMappingBuilder;
    use ftsegmap_storage::ContainerWriter;
    use std::path::Path;
    use tempfile::tempdir;

    fn seg(fid: u32, start: u16, end: u16) -> FeatureSegment {
        FeatureSegment::new(fid, start, end)
    }

    fn build_sample(path: &Path) {
        let mut builder = SegmentMappingBuilder::new();
        builder.append(NodeId::new(5), &[seg(10, 0, 5)]).unwrap();
        builder
            .append(NodeId::new(7), &[seg(10, 5, 9), seg(11, 0, 3)])
            .unwrap();

        let mut writer = ContainerWriter::create(path).unwrap();
        builder.save(&mut writer).unwrap();
        writer.finish().unwrap();
    }

    fn load_mapped(path: &Path) -> SegmentMapping {
        let container = ContainerReader::open(path).unwrap();
        let mut mapping = SegmentMapping::load(&container).unwrap();
        mapping.map(&container).unwrap();
        mapping
    }

    #[test]
    fn builder_reader_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.bin");
        build_sample(&path);

        let mapping = load_mapped(&path);
        assert_eq!(mapping.segment_count(), 3);
        assert_eq!(mapping.node_count(), 2);

        assert_eq!(mapping.segments_range(NodeId::new(5)).len(), 1);
        assert_eq!(mapping.segments_range(NodeId::new(7)).len(), 2);

        // Second entry under node 7.
        let range = mapping.segments_range(NodeId::new(7));
        assert_eq!(mapping.node_at(range.start + 1).unwrap(), NodeId::new(7));

        let mut visited = Vec::new();
        mapping
            .for_each_segment(NodeId::new(5), |s| visited.push(s))
            .unwrap();
        assert_eq!(visited, vec![seg(10, 0, 5)]);
    }

    #[test]
    fn unknown_node_has_empty_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.bin");
        build_sample(&path);

        let mapping = load_mapped(&path);
        let range = mapping.segments_range(NodeId::new(999));
        assert_eq!(range.start, range.end);

        let mut visited = 0;
        mapping
            .for_each_segment(NodeId::new(999), |_| visited += 1)
            .unwrap();
        assert_eq!(visited, 0);
    }

    #[test]
    fn for_each_skips_invalid_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.bin");

        let mut builder = SegmentMappingBuilder::new();
        builder
            .append(
                NodeId::new(3),
                &[seg(10, 0, 4), FeatureSegment::INVALID, seg(10, 4, 8)],
            )
            .unwrap();
        let mut writer = ContainerWriter::create(&path).unwrap();
        builder.save(&mut writer).unwrap();
        writer.finish().unwrap();

        let mapping = load_mapped(&path);
        assert_eq!(mapping.segments_range(NodeId::new(3)).len(), 3);

        let mut visited = Vec::new();
        mapping
            .for_each_segment(NodeId::new(3), |s| visited.push(s))
            .unwrap();
        assert_eq!(visited, vec![seg(10, 0, 4), seg(10, 4, 8)]);
    }

    #[test]
    fn query_before_map_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.bin");
        build_sample(&path);

        let container = ContainerReader::open(&path).unwrap();
        let mapping = SegmentMapping::load(&container).unwrap();
        assert!(!mapping.is_mapped());

        // The offset index works without the store.
        assert_eq!(mapping.segments_range(NodeId::new(7)).len(), 2);

        let result = mapping.for_each_segment(NodeId::new(5), |_| {});
        assert!(matches!(result, Err(CoreError::StoreNotMapped)));
    }

    #[test]
    fn map_is_idempotent_and_unmap_remaps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.bin");
        build_sample(&path);

        let container = ContainerReader::open(&path).unwrap();
        let mut mapping = SegmentMapping::load(&container).unwrap();

        mapping.map(&container).unwrap();
        mapping.map(&container).unwrap();
        assert!(mapping.is_mapped());

        mapping.unmap();
        mapping.unmap();
        assert!(!mapping.is_mapped());

        mapping.map(&container).unwrap();
        let mut visited = 0;
        mapping
            .for_each_segment(NodeId::new(5), |_| visited += 1)
            .unwrap();
        assert_eq!(visited, 1);
    }

    #[test]
    fn clear_discards_everything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.bin");
        build_sample(&path);

        let mut mapping = load_mapped(&path);
        mapping.clear();

        assert!(!mapping.is_mapped());
        assert_eq!(mapping.segment_count(), 0);
        assert_eq!(mapping.node_count(), 0);
        assert_eq!(mapping.segments_range(NodeId::new(5)), 0..0);
    }

    #[test]
    fn missing_section_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.bin");

        let mut writer = ContainerWriter::create(&path).unwrap();
        writer.write_section("unrelated", b"bytes").unwrap();
        writer.finish().unwrap();

        let container = ContainerReader::open(&path).unwrap();
        let result = SegmentMapping::load(&container);
        assert!(matches!(result, Err(CoreError::Storage(_))));
    }

    #[test]
    fn resolve_nodes_directional() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.bin");
        build_sample(&path);

        let mapping = load_mapped(&path);
        let cancel = AtomicBool::new(false);

        // Forward query overlapping node 5's segment.
        let forward = seg(10, 2, 4);
        // Reversed query overlapping node 7's segment on feature 11.
        let reversed = seg(11, 3, 1);

        let resolved = mapping.resolve_nodes(&[forward, reversed], &cancel).unwrap();
        assert_eq!(resolved.len(), 2);

        let (fwd_node, rev_node) = resolved[&forward.encode()];
        assert_eq!(fwd_node, NodeId::new(5));
        assert_eq!(rev_node, NodeId::INVALID);

        let (fwd_node, rev_node) = resolved[&reversed.encode()];
        assert_eq!(fwd_node, NodeId::INVALID);
        assert_eq!(rev_node, NodeId::new(7));
    }

    #[test]
    fn resolve_nodes_no_match() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.bin");
        build_sample(&path);

        let mapping = load_mapped(&path);
        let cancel = AtomicBool::new(false);

        let resolved = mapping
            .resolve_nodes(&[seg(42, 0, 9)], &cancel)
            .unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn resolve_nodes_preset_cancel_returns_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.bin");
        build_sample(&path);

        let mapping = load_mapped(&path);
        let cancel = AtomicBool::new(true);

        let query = [seg(10, 2, 4)];
        let resolved = mapping.resolve_nodes(&query, &cancel).unwrap();

        // Partial result is a subset of the uncancelled result.
        let full = mapping
            .resolve_nodes(&query, &AtomicBool::new(false))
            .unwrap();
        assert!(resolved.is_empty());
        assert!(resolved.keys().all(|k| full.contains_key(k)));
    }

    #[test]
    fn dump_operations_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.bin");
        build_sample(&path);

        let mapping = load_mapped(&path);
        mapping.dump_segments_by_feature(10).unwrap();
        mapping.dump_segments_by_node(NodeId::new(7)).unwrap();
    }
}
