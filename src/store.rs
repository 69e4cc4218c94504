//! Node stores: the mutable tree state behind the builders.
//!
//! Three physical layouts populate the same logical tree. The linked-list
//! and hash-table layouts implement [`Store`] and are interchangeable under
//! every online/offline builder; the linear-array layout is write-only and
//! owned by the PWOTD builder alone.

pub mod array;
pub mod hash;
pub mod list;

use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::text::Text;

pub use array::ArrayStore;
pub use hash::HashStore;
pub use list::ListStore;

/// Geometric growth with a halving step. Each expansion moves to
/// `max(current + step, desired)` clamped to `cap`, then halves the step
/// with a floor of [`Grow::MIN_STEP`].
#[derive(Debug, Clone, Copy)]
pub struct Grow {
    step: u32,
}

impl Grow {
    pub const MIN_STEP: u32 = 128;

    pub fn new(initial_step: u32) -> Grow {
        Grow {
            step: initial_step.max(Self::MIN_STEP),
        }
    }

    /// Next capacity for a store currently at `current` that needs at least
    /// `desired`, never exceeding `cap`.
    pub fn next(&mut self, current: u32, desired: u32, cap: u32) -> u32 {
        let grown = current.saturating_add(self.step).max(desired).min(cap);
        self.step = (self.step / 2).max(Self::MIN_STEP);
        grown
    }
}

/// Currently-allocated and peak-allocated byte counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUse {
    pub allocated: usize,
    pub peak: usize,
}

impl MemoryUse {
    pub fn combine(self, other: MemoryUse) -> MemoryUse {
        MemoryUse {
            allocated: self.allocated + other.allocated,
            peak: self.peak + other.peak,
        }
    }
}

/// Byte meter shared by the stores and the edge table.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Meter {
    allocated: usize,
    peak: usize,
}

impl Meter {
    pub(crate) fn charge(&mut self, bytes: usize) {
        self.allocated += bytes;
        self.peak = self.peak.max(self.allocated);
    }

    pub(crate) fn release(&mut self, bytes: usize) {
        self.allocated -= bytes.min(self.allocated);
    }

    pub(crate) fn report(&self) -> MemoryUse {
        MemoryUse {
            allocated: self.allocated,
            peak: self.peak,
        }
    }
}

/// Result of probing a parent for the edge starting with some character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildLookup {
    Found(NodeId),
    /// No such edge. The hint carries the greatest preceding sibling, which
    /// the linked-list layout needs as the insertion position; the hash
    /// layout always reports `prev: None`.
    Missing(InsertHint),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertHint {
    pub prev: Option<NodeId>,
}

impl InsertHint {
    pub fn front() -> InsertHint {
        InsertHint { prev: None }
    }

    pub fn after(prev: NodeId) -> InsertHint {
        InsertHint { prev: Some(prev) }
    }
}

/// The mutable-tree contract shared by the linked-list and hash layouts.
///
/// Depths of leaves are a function of the effective text length, which the
/// online builders vary per phase; every operation that touches a leaf depth
/// therefore takes `text_len` explicitly.
pub trait Store {
    /// Number of live branching nodes (the root counts).
    fn branch_count(&self) -> u32;

    /// Number of inserted leaves.
    fn leaf_count(&self) -> u32;

    fn depth(&self, branch: u32) -> u32;

    fn head(&self, branch: u32) -> u32;

    fn suffix_link(&self, branch: u32) -> Option<u32>;

    fn set_suffix_link(&mut self, branch: u32, target: u32);

    /// Whether backward pointers are maintained.
    fn has_parents(&self) -> bool;

    /// Parent of a node; `None` for the root, for leaves not yet inserted,
    /// or when backward pointers are off.
    fn parent(&self, node: NodeId) -> Option<u32>;

    /// The unique child of `parent` whose edge starts with `first`, or the
    /// insertion hint if there is none.
    fn lookup_child(&self, text: &Text, parent: u32, first: u32) -> ChildLookup;

    /// Splits the edge `parent -> child` after `matched` label characters,
    /// installing a fresh branching node between the two. Returns its id.
    fn split_edge(
        &mut self,
        text: &Text,
        text_len: u32,
        parent: u32,
        child: NodeId,
        matched: u32,
        new_head: u32,
    ) -> Result<u32>;

    /// Inserts the leaf for suffix `leaf` under `parent`. The hint must come
    /// from a lookup (or split) against the current state of `parent`.
    fn create_leaf(
        &mut self,
        text: &Text,
        text_len: u32,
        parent: u32,
        leaf: u32,
        hint: InsertHint,
    ) -> Result<()>;

    /// Visits every edge as `(parent, first_char, child)`, in no particular
    /// order.
    fn for_each_edge(&self, text: &Text, text_len: u32, f: &mut dyn FnMut(u32, u32, NodeId));

    fn memory(&self) -> MemoryUse;

    /// Depth of any node. Leaf depths derive from the effective length.
    #[inline]
    fn node_depth(&self, node: NodeId, text_len: u32) -> u32 {
        match node {
            NodeId::Branch(b) => self.depth(b),
            NodeId::Leaf(i) => text_len + 1 - i,
        }
    }

    /// Head position of any node. A leaf's head is its suffix position.
    #[inline]
    fn node_head(&self, node: NodeId) -> u32 {
        match node {
            NodeId::Branch(b) => self.head(b),
            NodeId::Leaf(i) => i,
        }
    }

    /// First character of the edge leading into `child` from a parent of
    /// depth `parent_depth`.
    #[inline]
    fn first_char(&self, text: &Text, parent_depth: u32, child: NodeId) -> u32 {
        text.at(self.node_head(child) + parent_depth)
    }
}

/// Fallible vector growth to an exact new length, charged against a meter.
pub(crate) fn grow_to<T: Clone + Default>(
    vec: &mut Vec<T>,
    new_len: usize,
    what: &'static str,
    meter: &mut Meter,
) -> Result<()> {
    if new_len <= vec.len() {
        return Ok(());
    }
    let additional = new_len - vec.len();
    vec.try_reserve_exact(additional)
        .map_err(|_| Error::oom(what, new_len))?;
    meter.charge(additional * std::mem::size_of::<T>());
    vec.resize(new_len, T::default());
    Ok(())
}
