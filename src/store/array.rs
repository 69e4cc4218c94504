//! Linear-array layout (LA), written only by the PWOTD builder.
//!
//! One `u32` cell per leaf, two per branching node. The two highest bits
//! flag `LEAF` and `RIGHTMOST`; the payload holds a text offset (leaf cells
//! and the first cell of a branching pair) or a child pointer (the second
//! cell). The root is implicit: its child list starts at cell 0. Children
//! sit contiguously in ascending first-character order.
//!
//! A branching pair's first cell records the lexicographically smallest
//! suffix of its subtree plus the parent's depth, so a child's depth falls
//! out of the difference against its first child's offset. The payload
//! width caps the text: `n + 2` must fit in 30 bits.

use log::debug;

use crate::error::{Error, Result};
use crate::store::{Grow, MemoryUse, Meter};

pub const LEAF: u32 = 0x8000_0000;
pub const RIGHTMOST: u32 = 0x4000_0000;
pub const PAYLOAD: u32 = 0x3FFF_FFFF;

pub struct ArrayStore {
    n: u32,
    cells: Vec<u32>,
    leaves: u32,
    branches: u32,
    grow: Grow,
    meter: Meter,
}

impl ArrayStore {
    pub fn allocate(n: u32) -> Result<ArrayStore> {
        if n as u64 + 2 > PAYLOAD as u64 + 1 {
            return Err(Error::Config(format!(
                "text of {n} characters cannot be indexed by 30-bit cells"
            )));
        }
        let mut store = ArrayStore {
            n,
            cells: Vec::new(),
            leaves: 0,
            branches: 0,
            grow: Grow::new((n / 2).max(Grow::MIN_STEP)),
            meter: Meter::default(),
        };
        let initial = (n as usize + 2).min(store.cell_bound());
        store.reserve_cells(initial)?;
        Ok(store)
    }

    /// `T_NODE` never exceeds `3n - 1` cells.
    fn cell_bound(&self) -> usize {
        (3 * self.n as usize).saturating_sub(1).max(2)
    }

    fn reserve_cells(&mut self, capacity: usize) -> Result<()> {
        let have = self.cells.capacity();
        if capacity <= have {
            return Ok(());
        }
        self.cells
            .try_reserve_exact(capacity - have)
            .map_err(|_| Error::oom("node array", capacity))?;
        self.meter.charge((capacity - have) * std::mem::size_of::<u32>());
        Ok(())
    }

    fn push(&mut self, cell: u32) -> Result<u32> {
        let idx = self.cells.len();
        let bound = self.cell_bound();
        if idx >= bound {
            return Err(Error::invariant(
                "node array",
                idx as i32,
                "cell count exceeds its bound",
            ));
        }
        if idx >= self.cells.capacity() {
            let next = self
                .grow
                .next(self.cells.capacity() as u32, idx as u32 + 2, bound as u32);
            debug!("node array grows to {next} cells");
            self.reserve_cells(next as usize)?;
        }
        self.cells.push(cell);
        Ok(idx as u32)
    }

    /// Appends a leaf cell. The payload is the suffix start plus the
    /// parent's depth.
    pub fn push_leaf(&mut self, payload: u32) -> Result<u32> {
        debug_assert!(payload <= PAYLOAD);
        self.leaves += 1;
        self.push(LEAF | payload)
    }

    /// Appends an unevaluated branching pair; both cells are patched later.
    /// Returns the index of the first cell.
    pub fn push_branch(&mut self) -> Result<u32> {
        let first = self.push(0)?;
        self.push(0)?;
        self.branches += 1;
        Ok(first)
    }

    /// Writes the first-child pointer into the second cell of a pair.
    pub fn patch_pointer(&mut self, pair: u32, child_list: u32) -> Result<()> {
        if child_list > PAYLOAD {
            return Err(Error::invariant(
                "node array",
                pair as i32,
                "child pointer exceeds the payload width",
            ));
        }
        self.cells[pair as usize + 1] = child_list;
        Ok(())
    }

    /// Writes the text offset into the first cell of a pair, preserving its
    /// flags.
    pub fn patch_offset(&mut self, pair: u32, payload: u32) {
        debug_assert!(payload <= PAYLOAD);
        let cell = &mut self.cells[pair as usize];
        *cell = (*cell & !PAYLOAD) | payload;
    }

    /// Flags a cell as the last child of its parent.
    pub fn mark_rightmost(&mut self, cell: u32) {
        self.cells[cell as usize] |= RIGHTMOST;
    }

    #[inline]
    pub fn cell(&self, idx: u32) -> u32 {
        self.cells[idx as usize]
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.cells.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn leaf_count(&self) -> u32 {
        self.leaves
    }

    /// Branching-node count, the implicit root included.
    pub fn branch_count(&self) -> u32 {
        self.branches + 1
    }

    pub fn memory(&self) -> MemoryUse {
        self.meter.report()
    }
}
