//! Signed-id polymorphism for the two node populations.
//!
//! Inside the stores every reference is a compact `RawId`: `0` is null, a
//! positive value is a branching-node index, a negative value `-i` is the
//! leaf for the suffix starting at position `i`. Across component boundaries
//! the tagged [`NodeId`] is used instead, with `Option<NodeId>` standing in
//! for null.

/// Compact node reference as stored in the arrays.
pub type RawId = i32;

/// The null reference.
pub const NIL: RawId = 0;

/// The root is always the branching node with index 1.
pub const ROOT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Branch(u32),
    Leaf(u32),
}

impl NodeId {
    #[inline]
    pub fn raw(self) -> RawId {
        match self {
            NodeId::Branch(b) => b as RawId,
            NodeId::Leaf(i) => -(i as RawId),
        }
    }

    /// Decodes a compact id; `NIL` maps to `None`.
    #[inline]
    pub fn from_raw(raw: RawId) -> Option<NodeId> {
        match raw {
            0 => None,
            b if b > 0 => Some(NodeId::Branch(b as u32)),
            i => Some(NodeId::Leaf(i.unsigned_abs())),
        }
    }

    #[inline]
    pub fn is_branch(self) -> bool {
        matches!(self, NodeId::Branch(_))
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        matches!(self, NodeId::Leaf(_))
    }

    /// The branching index, if this is a branching node.
    #[inline]
    pub fn branch(self) -> Option<u32> {
        match self {
            NodeId::Branch(b) => Some(b),
            NodeId::Leaf(_) => None,
        }
    }

    /// The suffix position, if this is a leaf.
    #[inline]
    pub fn leaf(self) -> Option<u32> {
        match self {
            NodeId::Leaf(i) => Some(i),
            NodeId::Branch(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip() {
        assert_eq!(NodeId::from_raw(NIL), None);
        for id in [NodeId::Branch(1), NodeId::Branch(77), NodeId::Leaf(1), NodeId::Leaf(12)] {
            assert_eq!(NodeId::from_raw(id.raw()), Some(id));
        }
    }

    #[test]
    fn sign_convention() {
        assert!(NodeId::Branch(3).raw() > 0);
        assert!(NodeId::Leaf(3).raw() < 0);
        assert_eq!(NodeId::Leaf(3).raw(), -3);
    }
}
