//! Core type definitions for ftsegmap.

use std::fmt;

/// Identifier of a routing-graph node.
///
/// Routing nodes are abstract graph vertices, distinct from map geometry;
/// the mapping in this crate is what ties the two together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel for "no node".
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns whether this is a real node ID rather than the sentinel.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "node:{}", self.0)
        } else {
            write!(f, "node:invalid")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_ordering() {
        assert!(NodeId::new(1) < NodeId::new(2));
    }

    #[test]
    fn invalid_sentinel() {
        assert!(!NodeId::INVALID.is_valid());
        assert!(NodeId::new(0).is_valid());
        assert_eq!(format!("{}", NodeId::INVALID), "node:invalid");
    }

    #[test]
    fn node_id_display() {
        assert_eq!(format!("{}", NodeId::new(42)), "node:42");
    }
}
