//! Sibling-linked-list layout (LL / LL-BP).
//!
//! Two parallel populations indexed by the compact signed id: positive ids
//! select a branching record, negative ids select the per-suffix leaf slot.
//! The children of a node form a singly linked list in strictly ascending
//! first-character order. Backward pointers are a construction-time option
//! carried in separate parallel arrays.

use log::debug;

use crate::error::{Error, Result};
use crate::node::{NodeId, RawId, NIL, ROOT};
use crate::store::{grow_to, ChildLookup, Grow, InsertHint, MemoryUse, Meter, Store};
use crate::text::Text;

#[derive(Debug, Clone, Copy, Default)]
struct BranchRec {
    first_child: RawId,
    next_sibling: RawId,
    suffix_link: RawId,
    depth: u32,
    head: u32,
}

pub struct ListStore {
    n: u32,
    branches: Vec<BranchRec>,
    branch_parent: Option<Vec<RawId>>,
    leaf_next: Vec<RawId>,
    leaf_parent: Option<Vec<RawId>>,
    live: u32,
    leaves: u32,
    grow: Grow,
    meter: Meter,
}

impl ListStore {
    /// Reserves the leaf population for a text of `n` characters, sizes the
    /// branching population to the next power of two at or below `n`, and
    /// installs the root at id 1.
    pub fn allocate(n: u32, backward: bool) -> Result<ListStore> {
        let initial = initial_branch_capacity(n);
        let mut store = ListStore {
            n,
            branches: Vec::new(),
            branch_parent: backward.then(Vec::new),
            leaf_next: Vec::new(),
            leaf_parent: backward.then(Vec::new),
            live: 0,
            leaves: 0,
            grow: Grow::new(initial),
            meter: Meter::default(),
        };
        grow_to(&mut store.leaf_next, n as usize + 2, "leaf records", &mut store.meter)?;
        if let Some(lp) = store.leaf_parent.as_mut() {
            grow_to(lp, n as usize + 2, "leaf parents", &mut store.meter)?;
        }
        store.grow_branches(initial.min(store.branch_bound()))?;
        let root = store.new_branch(0, 0)?;
        debug_assert_eq!(root, ROOT);
        Ok(store)
    }

    fn branch_cap(&self) -> u32 {
        self.branches.len().saturating_sub(1) as u32
    }

    /// Upper bound on branching nodes: `n`, except that the root always
    /// exists.
    fn branch_bound(&self) -> u32 {
        self.n.max(1)
    }

    fn grow_branches(&mut self, desired: u32) -> Result<()> {
        let new_cap = self.grow.next(self.branch_cap(), desired, self.branch_bound());
        debug!("list store grows branching capacity to {new_cap}");
        grow_to(&mut self.branches, new_cap as usize + 1, "branch records", &mut self.meter)?;
        if let Some(bp) = self.branch_parent.as_mut() {
            grow_to(bp, new_cap as usize + 1, "branch parents", &mut self.meter)?;
        }
        Ok(())
    }

    fn new_branch(&mut self, depth: u32, head: u32) -> Result<u32> {
        let id = self.live + 1;
        if id > self.branch_bound() {
            return Err(Error::invariant(
                "branch allocation",
                id as i32,
                "branching population exceeds its bound",
            ));
        }
        if id > self.branch_cap() {
            self.grow_branches(id)?;
        }
        self.branches[id as usize] = BranchRec {
            depth,
            head,
            ..BranchRec::default()
        };
        self.live = id;
        Ok(id)
    }

    fn next_raw(&self, raw: RawId) -> RawId {
        if raw > 0 {
            self.branches[raw as usize].next_sibling
        } else {
            self.leaf_next[raw.unsigned_abs() as usize]
        }
    }

    fn set_next_raw(&mut self, raw: RawId, next: RawId) {
        if raw > 0 {
            self.branches[raw as usize].next_sibling = next;
        } else {
            self.leaf_next[raw.unsigned_abs() as usize] = next;
        }
    }

    fn set_parent(&mut self, node: NodeId, parent: u32) {
        match node {
            NodeId::Branch(b) => {
                if let Some(bp) = self.branch_parent.as_mut() {
                    bp[b as usize] = parent as RawId;
                }
            }
            NodeId::Leaf(i) => {
                if let Some(lp) = self.leaf_parent.as_mut() {
                    lp[i as usize] = parent as RawId;
                }
            }
        }
    }

    /// First child as a tagged id; `None` on a childless node.
    pub fn first_child(&self, branch: u32) -> Option<NodeId> {
        NodeId::from_raw(self.branches[branch as usize].first_child)
    }

    /// Next sibling as a tagged id.
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        NodeId::from_raw(self.next_raw(node.raw()))
    }
}

fn initial_branch_capacity(n: u32) -> u32 {
    if n <= 2 {
        return 2;
    }
    1 << (31 - n.leading_zeros())
}

impl Store for ListStore {
    fn branch_count(&self) -> u32 {
        self.live
    }

    fn leaf_count(&self) -> u32 {
        self.leaves
    }

    fn depth(&self, branch: u32) -> u32 {
        self.branches[branch as usize].depth
    }

    fn head(&self, branch: u32) -> u32 {
        self.branches[branch as usize].head
    }

    fn suffix_link(&self, branch: u32) -> Option<u32> {
        match self.branches[branch as usize].suffix_link {
            NIL => None,
            raw => Some(raw as u32),
        }
    }

    fn set_suffix_link(&mut self, branch: u32, target: u32) {
        self.branches[branch as usize].suffix_link = target as RawId;
    }

    fn has_parents(&self) -> bool {
        self.branch_parent.is_some()
    }

    fn parent(&self, node: NodeId) -> Option<u32> {
        let raw = match node {
            NodeId::Branch(b) => *self.branch_parent.as_ref()?.get(b as usize)?,
            NodeId::Leaf(i) => *self.leaf_parent.as_ref()?.get(i as usize)?,
        };
        (raw != NIL).then_some(raw as u32)
    }

    fn lookup_child(&self, text: &Text, parent: u32, first: u32) -> ChildLookup {
        let parent_depth = self.depth(parent);
        let mut prev = None;
        let mut cursor = self.branches[parent as usize].first_child;
        while let Some(node) = NodeId::from_raw(cursor) {
            let c = self.first_char(text, parent_depth, node);
            if c == first {
                return ChildLookup::Found(node);
            }
            if c > first {
                break;
            }
            prev = Some(node);
            cursor = self.next_raw(cursor);
        }
        ChildLookup::Missing(InsertHint { prev })
    }

    fn split_edge(
        &mut self,
        _text: &Text,
        text_len: u32,
        parent: u32,
        child: NodeId,
        matched: u32,
        new_head: u32,
    ) -> Result<u32> {
        let parent_depth = self.depth(parent);
        let new_depth = parent_depth + matched;
        if matched == 0 || self.node_depth(child, text_len) <= new_depth {
            return Err(Error::invariant("split", child.raw(), "split point outside the edge"));
        }

        let child_raw = child.raw();
        let mut prev = NIL;
        let mut cursor = self.branches[parent as usize].first_child;
        while cursor != NIL && cursor != child_raw {
            prev = cursor;
            cursor = self.next_raw(cursor);
        }
        if cursor == NIL {
            return Err(Error::invariant("split", child_raw, "child is not under this parent"));
        }

        let branch = self.new_branch(new_depth, new_head)?;
        let after = self.next_raw(child_raw);
        if prev == NIL {
            self.branches[parent as usize].first_child = branch as RawId;
        } else {
            self.set_next_raw(prev, branch as RawId);
        }
        self.branches[branch as usize].next_sibling = after;
        self.branches[branch as usize].first_child = child_raw;
        self.set_next_raw(child_raw, NIL);
        self.set_parent(NodeId::Branch(branch), parent);
        self.set_parent(child, branch);
        Ok(branch)
    }

    fn create_leaf(
        &mut self,
        _text: &Text,
        _text_len: u32,
        parent: u32,
        leaf: u32,
        hint: InsertHint,
    ) -> Result<()> {
        let raw = NodeId::Leaf(leaf).raw();
        match hint.prev {
            None => {
                self.leaf_next[leaf as usize] = self.branches[parent as usize].first_child;
                self.branches[parent as usize].first_child = raw;
            }
            Some(prev) => {
                self.leaf_next[leaf as usize] = self.next_raw(prev.raw());
                self.set_next_raw(prev.raw(), raw);
            }
        }
        self.set_parent(NodeId::Leaf(leaf), parent);
        self.leaves += 1;
        Ok(())
    }

    fn for_each_edge(&self, text: &Text, _text_len: u32, f: &mut dyn FnMut(u32, u32, NodeId)) {
        for b in 1..=self.live {
            let parent_depth = self.depth(b);
            let mut cursor = self.branches[b as usize].first_child;
            while let Some(node) = NodeId::from_raw(cursor) {
                f(b, self.first_char(text, parent_depth, node), node);
                cursor = self.next_raw(cursor);
            }
        }
    }

    fn memory(&self) -> MemoryUse {
        self.meter.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ab() -> Text {
        Text::from_str("ab").unwrap()
    }

    #[test]
    fn allocate_installs_root() {
        let s = ListStore::allocate(2, false).unwrap();
        assert_eq!(s.branch_count(), 1);
        assert_eq!(s.depth(ROOT), 0);
        assert_eq!(s.suffix_link(ROOT), None);
    }

    #[test]
    fn leaves_keep_sibling_order() {
        let text = ab();
        let len = text.effective_len();
        let mut s = ListStore::allocate(2, false).unwrap();
        // Suffixes of "ab$": b$ at 2, ab$ at 1, $ at 3, inserted out of order.
        for leaf in [2, 1, 3] {
            let first = text.at(leaf);
            let hint = match s.lookup_child(&text, ROOT, first) {
                ChildLookup::Missing(h) => h,
                ChildLookup::Found(_) => panic!("duplicate edge"),
            };
            s.create_leaf(&text, len, ROOT, leaf, hint).unwrap();
        }
        let order: Vec<NodeId> = {
            let mut out = Vec::new();
            let mut cur = s.first_child(ROOT);
            while let Some(node) = cur {
                out.push(node);
                cur = s.next_sibling(node);
            }
            out
        };
        // a < b < sentinel.
        assert_eq!(order, vec![NodeId::Leaf(1), NodeId::Leaf(2), NodeId::Leaf(3)]);
    }

    #[test]
    fn split_relinks_in_place() {
        let text = Text::from_str("aa").unwrap();
        let len = text.effective_len();
        let mut s = ListStore::allocate(2, true).unwrap();
        s.create_leaf(&text, len, ROOT, 1, InsertHint::front()).unwrap();
        let b = s
            .split_edge(&text, len, ROOT, NodeId::Leaf(1), 1, 1)
            .unwrap();
        assert_eq!(s.depth(b), 1);
        assert_eq!(s.head(b), 1);
        assert_eq!(s.first_child(ROOT), Some(NodeId::Branch(b)));
        assert_eq!(s.first_child(b), Some(NodeId::Leaf(1)));
        assert_eq!(s.parent(NodeId::Leaf(1)), Some(b));
        assert_eq!(s.parent(NodeId::Branch(b)), Some(ROOT));
    }

    #[test]
    fn split_rejects_foreign_child() {
        let text = ab();
        let len = text.effective_len();
        let mut s = ListStore::allocate(2, false).unwrap();
        s.create_leaf(&text, len, ROOT, 1, InsertHint::front()).unwrap();
        assert!(s
            .split_edge(&text, len, ROOT, NodeId::Leaf(2), 1, 2)
            .is_err());
    }
}
