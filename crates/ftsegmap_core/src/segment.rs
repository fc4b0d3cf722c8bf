//! Feature segment value type.

use std::fmt;

/// Sentinel feature ID marking an invalid or placeholder segment.
pub const INVALID_FEATURE_ID: u32 = u32::MAX;

/// A contiguous subrange of one map feature's point sequence.
///
/// `point_start > point_end` encodes reversed traversal of the feature's
/// geometry; the endpoints are indices into the point sequence of the
/// feature identified by `feature_id`. The geometry itself is owned
/// elsewhere — a segment only references it.
///
/// Segments pack into a single u64 (see [`encode`](FeatureSegment::encode))
/// and that packed form is the on-disk contract of the segment store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureSegment {
    /// Identifier of the owning map feature.
    pub feature_id: u32,
    /// Index of the first point of the subrange.
    pub point_start: u16,
    /// Index of the last point of the subrange.
    pub point_end: u16,
}

impl FeatureSegment {
    /// The invalid placeholder segment.
    pub const INVALID: Self = Self {
        feature_id: INVALID_FEATURE_ID,
        point_start: 0,
        point_end: 0,
    };

    /// Creates a segment from its three fields.
    ///
    /// No range validation is performed; the caller guarantees the point
    /// indices fit the feature's geometry.
    #[must_use]
    pub const fn new(feature_id: u32, point_start: u16, point_end: u16) -> Self {
        Self {
            feature_id,
            point_start,
            point_end,
        }
    }

    /// Decodes a segment from its packed 64-bit form.
    ///
    /// Bit layout: `[63:32]` feature ID, `[31:16]` point start, `[15:0]`
    /// point end.
    #[must_use]
    pub const fn from_encoded(value: u64) -> Self {
        Self {
            feature_id: (value >> 32) as u32,
            point_start: (value >> 16) as u16,
            point_end: value as u16,
        }
    }

    /// Packs the segment into its 64-bit form. Exact inverse of
    /// [`from_encoded`](FeatureSegment::from_encoded).
    #[must_use]
    pub const fn encode(self) -> u64 {
        ((self.feature_id as u64) << 32)
            | ((self.point_start as u64) << 16)
            | (self.point_end as u64)
    }

    /// Returns whether this segment references a real feature.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.feature_id != INVALID_FEATURE_ID
    }

    /// Returns whether the segment traverses its points in reverse order.
    #[must_use]
    pub const fn is_reversed(self) -> bool {
        self.point_start > self.point_end
    }

    /// Traversal direction: `Some(false)` forward, `Some(true)` reversed,
    /// `None` for a degenerate single-point segment.
    const fn direction(self) -> Option<bool> {
        if self.point_start == self.point_end {
            None
        } else {
            Some(self.point_start > self.point_end)
        }
    }

    /// The closed, direction-independent point interval covered by the
    /// segment, as `(min, max)`.
    #[must_use]
    pub fn point_bounds(self) -> (u16, u16) {
        if self.is_reversed() {
            (self.point_end, self.point_start)
        } else {
            (self.point_start, self.point_end)
        }
    }

    /// Returns whether two segments of the same feature cover overlapping
    /// point intervals, regardless of direction.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        if self.feature_id != other.feature_id {
            return false;
        }
        let (a_min, a_max) = self.point_bounds();
        let (b_min, b_max) = other.point_bounds();
        a_min <= b_max && b_min <= a_max
    }

    /// Merges a directionally contiguous segment of the same feature into
    /// this one.
    ///
    /// Two segments merge only when one's end point equals the other's
    /// start point and their traversal directions are compatible (equal,
    /// or either segment degenerate). On success this segment is extended
    /// to span the union and `true` is returned; otherwise it is left
    /// unmodified. Overlapping-but-not-touching segments never merge.
    pub fn merge(&mut self, other: &Self) -> bool {
        if self.feature_id != other.feature_id || !self.is_valid() {
            return false;
        }
        if let (Some(a), Some(b)) = (self.direction(), other.direction()) {
            if a != b {
                return false;
            }
        }

        if self.point_end == other.point_start {
            self.point_end = other.point_end;
            true
        } else if other.point_end == self.point_start {
            self.point_start = other.point_start;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for FeatureSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(
                f,
                "seg:{}[{}..{}]",
                self.feature_id, self.point_start, self.point_end
            )
        } else {
            write!(f, "seg:invalid")
        }
    }
}
