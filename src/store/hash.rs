//! Hash-table layout (HT / HT-BP).
//!
//! Branching records keep only `{depth, head, suffix_link}`; leaves own no
//! record at all; their numeric identity is the record. Every parent-child
//! edge lives in the open-addressed [`EdgeMap`]. Backward pointers are the
//! same construction-time option as in the list layout.

use log::debug;

use crate::edgemap::{Collision, EdgeMap};
use crate::error::{Error, Result};
use crate::node::{NodeId, RawId, NIL, ROOT};
use crate::store::{grow_to, ChildLookup, Grow, InsertHint, MemoryUse, Meter, Store};
use crate::text::Text;

pub struct HashStore {
    n: u32,
    depths: Vec<u32>,
    heads: Vec<u32>,
    links: Vec<RawId>,
    branch_parent: Option<Vec<RawId>>,
    leaf_parent: Option<Vec<RawId>>,
    edges: EdgeMap,
    live: u32,
    leaves: u32,
    grow: Grow,
    meter: Meter,
}

impl HashStore {
    pub fn allocate(
        n: u32,
        backward: bool,
        collision: Collision,
        functions: u32,
    ) -> Result<HashStore> {
        let initial = if n <= 2 { 2 } else { 1 << (31 - n.leading_zeros()) };
        let initial = initial.min(n.max(1));
        let mut store = HashStore {
            n,
            depths: Vec::new(),
            heads: Vec::new(),
            links: Vec::new(),
            branch_parent: backward.then(Vec::new),
            leaf_parent: backward.then(Vec::new),
            edges: EdgeMap::new((n as usize).max(16), collision, functions)?,
            live: 0,
            leaves: 0,
            grow: Grow::new(initial),
            meter: Meter::default(),
        };
        if let Some(lp) = store.leaf_parent.as_mut() {
            grow_to(lp, n as usize + 2, "leaf parents", &mut store.meter)?;
        }
        store.grow_branches(initial)?;
        let root = store.new_branch(0, 0)?;
        debug_assert_eq!(root, ROOT);
        Ok(store)
    }

    /// Shared access for tests and the rehash-idempotence property.
    pub fn edges(&self) -> &EdgeMap {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut EdgeMap {
        &mut self.edges
    }

    fn branch_cap(&self) -> u32 {
        self.depths.len().saturating_sub(1) as u32
    }

    fn branch_bound(&self) -> u32 {
        self.n.max(1)
    }

    fn grow_branches(&mut self, desired: u32) -> Result<()> {
        let new_cap = self.grow.next(self.branch_cap(), desired, self.branch_bound());
        debug!("hash store grows branching capacity to {new_cap}");
        let len = new_cap as usize + 1;
        grow_to(&mut self.depths, len, "branch depths", &mut self.meter)?;
        grow_to(&mut self.heads, len, "branch heads", &mut self.meter)?;
        grow_to(&mut self.links, len, "branch links", &mut self.meter)?;
        if let Some(bp) = self.branch_parent.as_mut() {
            grow_to(bp, len, "branch parents", &mut self.meter)?;
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
        self.depths[id as usize] = depth;
        self.heads[id as usize] = head;
        self.links[id as usize] = NIL;
        self.live = id;
        Ok(id)
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
}

impl Store for HashStore {
    fn branch_count(&self) -> u32 {
        self.live
    }

    fn leaf_count(&self) -> u32 {
        self.leaves
    }

    fn depth(&self, branch: u32) -> u32 {
        self.depths[branch as usize]
    }

    fn head(&self, branch: u32) -> u32 {
        self.heads[branch as usize]
    }

    fn suffix_link(&self, branch: u32) -> Option<u32> {
        match self.links[branch as usize] {
            NIL => None,
            raw => Some(raw as u32),
        }
    }

    fn set_suffix_link(&mut self, branch: u32, target: u32) {
        self.links[branch as usize] = target as RawId;
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

    fn lookup_child(&self, _text: &Text, parent: u32, first: u32) -> ChildLookup {
        match self.edges.get(parent, first) {
            Some(raw) => match NodeId::from_raw(raw) {
                Some(node) => ChildLookup::Found(node),
                None => ChildLookup::Missing(InsertHint::front()),
            },
            None => ChildLookup::Missing(InsertHint::front()),
        }
    }

    fn split_edge(
        &mut self,
        text: &Text,
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
        let incoming = self.first_char(text, parent_depth, child);
        if self.edges.get(parent, incoming) != Some(child.raw()) {
            return Err(Error::invariant("split", child.raw(), "child is not under this parent"));
        }
        let branch = self.new_branch(new_depth, new_head)?;
        self.edges.insert(parent, incoming, branch as RawId)?;
        let outgoing = self.first_char(text, new_depth, child);
        self.edges.insert(branch, outgoing, child.raw())?;
        self.set_parent(NodeId::Branch(branch), parent);
        self.set_parent(child, branch);
        Ok(branch)
    }

    fn create_leaf(
        &mut self,
        text: &Text,
        _text_len: u32,
        parent: u32,
        leaf: u32,
        _hint: InsertHint,
    ) -> Result<()> {
        let first = text.at(leaf + self.depth(parent));
        self.edges.insert(parent, first, NodeId::Leaf(leaf).raw())?;
        self.set_parent(NodeId::Leaf(leaf), parent);
        self.leaves += 1;
        Ok(())
    }

    fn for_each_edge(&self, _text: &Text, _text_len: u32, f: &mut dyn FnMut(u32, u32, NodeId)) {
        self.edges.for_each(&mut |parent, first, raw| {
            if let Some(node) = NodeId::from_raw(raw) {
                f(parent, first, node);
            }
        });
    }

    fn memory(&self) -> MemoryUse {
        self.meter.report().combine(self.edges.memory())
    }
}
