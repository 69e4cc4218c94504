//! Stateless edge primitives over a store, the text and an effective length.
//!
//! The online builders vary the effective length per phase, which is why it
//! is threaded through explicitly: a leaf's depth is `text_len + 1 - i`, so
//! leaf edges lengthen as the effective length grows.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::store::{ChildLookup, Store};
use crate::text::Text;

/// Outcome of walking an edge label against the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Every label character matched.
    Full { len: u32 },
    /// The bound ran out before the label did.
    Bounded { matched: u32 },
    /// First difference after `matched` characters; `ord` compares the text
    /// character against the label character.
    Mismatch { matched: u32, ord: Ordering },
}

/// An edge under inspection: `pos` is the next text position to compare.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub parent: u32,
    pub child: NodeId,
    pub pos: u32,
}

/// Compares a child's depth against a target depth.
#[inline]
pub fn depthscan<S: Store + ?Sized>(
    store: &S,
    text_len: u32,
    child: NodeId,
    target_depth: u32,
) -> Ordering {
    store.node_depth(child, text_len).cmp(&target_depth)
}

/// Compares the first character of the edge into `child` against `T[pos]`.
#[inline]
pub fn fastscan<S: Store + ?Sized>(
    store: &S,
    text: &Text,
    parent: u32,
    child: NodeId,
    pos: u32,
) -> Ordering {
    store
        .first_char(text, store.depth(parent), child)
        .cmp(&text.at(pos))
}

/// The child of `parent` whose edge starts with `T[pos]`, or the insertion
/// hint when there is none.
#[inline]
pub fn branch_once<S: Store + ?Sized>(
    store: &S,
    text: &Text,
    parent: u32,
    pos: u32,
) -> ChildLookup {
    store.lookup_child(text, parent, text.at(pos))
}

/// Walks the whole edge label against `T[pos..]`, bounded by `max_len`.
pub fn slowscan<S: Store + ?Sized>(
    store: &S,
    text: &Text,
    text_len: u32,
    parent: u32,
    child: NodeId,
    pos: u32,
    max_len: u32,
) -> Scan {
    let parent_depth = store.depth(parent);
    let start = store.node_head(child) + parent_depth;
    let edge_len = store.node_depth(child, text_len) - parent_depth;
    let mut k = 0;
    while k < edge_len && k < max_len {
        let t = text.at(pos + k);
        let e = text.at(start + k);
        if t != e {
            return Scan::Mismatch {
                matched: k,
                ord: t.cmp(&e),
            };
        }
        k += 1;
    }
    if k == edge_len {
        Scan::Full { len: k }
    } else {
        Scan::Bounded { matched: k }
    }
}

/// Moves through the cursor's edge: the child becomes the new parent and the
/// position advances by the edge length. Only branching children can be
/// descended into.
pub fn edge_descend<S: Store + ?Sized>(store: &S, cursor: Cursor) -> Result<(u32, u32)> {
    match cursor.child {
        NodeId::Branch(b) => Ok((
            b,
            cursor.pos + store.depth(b) - store.depth(cursor.parent),
        )),
        NodeId::Leaf(_) => Err(Error::invariant(
            "descend",
            cursor.child.raw(),
            "cannot descend into a leaf",
        )),
    }
}

/// Moves one edge upward. Requires backward pointers.
pub fn edge_climb<S: Store + ?Sized>(store: &S, node: NodeId) -> Result<u32> {
    store
        .parent(node)
        .ok_or_else(|| Error::invariant("climb", node.raw(), "no backward pointer"))
}
