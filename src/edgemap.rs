//! Open-addressed edge table for the hash-table node layout.
//!
//! Keys are `(parent branching id, first edge character)`, values are
//! compact child ids. Two collision strategies share the table: double
//! hashing (insert and lookup only) and cuckoo hashing with `k` hash
//! functions and an iterative eviction walk driven by an explicit
//! fixed-capacity trail. The hash family is SipHash-2-4 keyed by random
//! seeds; a rehash re-derives every seed and replays the live edges.

use arrayvec::ArrayVec;
use log::debug;
use rand::{thread_rng, RngCore};
use siphasher::sip128::SipHasher24;

use crate::error::{Error, Result};
use crate::node::RawId;
use crate::store::{MemoryUse, Meter};

/// Collision resolution strategy. Cuckoo is the default on the invocation
/// surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Collision {
    #[default]
    Cuckoo,
    DoubleHash,
}

/// Default number of cuckoo hash functions.
pub const DEFAULT_HASH_FUNCTIONS: u32 = 8;

/// Bound on the cuckoo eviction trail.
const EVICTION_BOUND: usize = 1024;

/// Bound on consecutive rehash attempts.
const REHASH_BOUND: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    parent: u32,
    first: u32,
    child: RawId,
}

const EMPTY: Slot = Slot {
    parent: 0,
    first: 0,
    child: 0,
};

impl Slot {
    #[inline]
    fn occupied(&self) -> bool {
        self.child != 0
    }
}

type Seed = [u8; 16];

#[inline]
fn slot_hash(seed: &Seed, parent: u32, first: u32) -> u64 {
    let mut key = [0u8; 8];
    key[..4].copy_from_slice(&parent.to_le_bytes());
    key[4..].copy_from_slice(&first.to_le_bytes());
    let wide: u128 = SipHasher24::new_with_key(seed).hash(&key).into();
    wide as u64
}

fn fresh_seeds(count: usize) -> Vec<Seed> {
    let mut rng = thread_rng();
    let mut seeds = vec![[0u8; 16]; count];
    for seed in &mut seeds {
        rng.fill_bytes(seed);
    }
    seeds
}

pub struct EdgeMap {
    slots: Vec<Slot>,
    seeds: Vec<Seed>,
    mode: Collision,
    functions: usize,
    live: usize,
    meter: Meter,
}

impl EdgeMap {
    /// Allocates a table with at least `capacity` slots (rounded up to a
    /// power of two, minimum 16).
    pub fn new(capacity: usize, mode: Collision, functions: u32) -> Result<EdgeMap> {
        let size = capacity.max(16).next_power_of_two();
        let functions = match mode {
            Collision::Cuckoo => functions.clamp(2, 64) as usize,
            Collision::DoubleHash => 2,
        };
        let mut meter = Meter::default();
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(size)
            .map_err(|_| Error::oom("edge table", size))?;
        meter.charge(size * std::mem::size_of::<Slot>());
        slots.resize(size, EMPTY);
        Ok(EdgeMap {
            slots,
            seeds: fresh_seeds(functions),
            mode,
            functions,
            live: 0,
            meter,
        })
    }

    /// Number of live edges.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Slot count of the backing table.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn memory(&self) -> MemoryUse {
        self.meter.report()
    }

    /// Inserts or overwrites the edge `(parent, first) -> child`.
    pub fn insert(&mut self, parent: u32, first: u32, child: RawId) -> Result<()> {
        debug_assert_ne!(child, 0);
        if let Some(slot) = find_in(&mut self.slots, &self.seeds, self.mode, self.functions, parent, first) {
            slot.child = child;
            return Ok(());
        }
        if (self.live + 1) * 4 > self.slots.len() * 3 {
            let target = self.slots.len() * 2;
            self.rehash_into(target, None)?;
        }
        let item = Slot { parent, first, child };
        if let Err(orphan) = place_in(&mut self.slots, &self.seeds, self.mode, self.functions, item) {
            let target = self.slots.len() * 2;
            self.rehash_into(target, Some(orphan))?;
        }
        self.live += 1;
        Ok(())
    }

    /// Looks up the edge `(parent, first)`.
    pub fn get(&self, parent: u32, first: u32) -> Option<RawId> {
        match self.mode {
            Collision::Cuckoo => {
                let mask = self.slots.len() - 1;
                for seed in &self.seeds {
                    let slot = &self.slots[slot_hash(seed, parent, first) as usize & mask];
                    if slot.occupied() && slot.parent == parent && slot.first == first {
                        return Some(slot.child);
                    }
                }
                None
            }
            Collision::DoubleHash => {
                let mask = self.slots.len() - 1;
                let mut idx = slot_hash(&self.seeds[0], parent, first) as usize & mask;
                let step = (slot_hash(&self.seeds[1], parent, first) as usize & mask) | 1;
                for _ in 0..self.slots.len() {
                    let slot = &self.slots[idx];
                    if !slot.occupied() {
                        return None;
                    }
                    if slot.parent == parent && slot.first == first {
                        return Some(slot.child);
                    }
                    idx = (idx + step) & mask;
                }
                None
            }
        }
    }

    /// Removes an edge. Only the cuckoo strategy supports deletion.
    pub fn remove(&mut self, parent: u32, first: u32) -> Option<RawId> {
        debug_assert_eq!(self.mode, Collision::Cuckoo, "double hashing does not delete");
        if self.mode != Collision::Cuckoo {
            return None;
        }
        let mask = self.slots.len() - 1;
        for s in 0..self.functions {
            let idx = slot_hash(&self.seeds[s], parent, first) as usize & mask;
            let slot = &mut self.slots[idx];
            if slot.occupied() && slot.parent == parent && slot.first == first {
                let child = slot.child;
                *slot = EMPTY;
                self.live -= 1;
                return Some(child);
            }
        }
        None
    }

    /// Visits every live edge.
    pub fn for_each(&self, f: &mut dyn FnMut(u32, u32, RawId)) {
        for slot in &self.slots {
            if slot.occupied() {
                f(slot.parent, slot.first, slot.child);
            }
        }
    }

    /// Re-seeds the hash family and replays every live edge into a table of
    /// the same size.
    pub fn rehash(&mut self) -> Result<()> {
        self.rehash_into(self.slots.len(), None)
    }

    fn rehash_into(&mut self, mut target: usize, orphan: Option<Slot>) -> Result<()> {
        for attempt in 0..REHASH_BOUND {
            let seeds = fresh_seeds(self.functions);
            let mut fresh = Vec::new();
            if fresh.try_reserve_exact(target).is_err() {
                return Err(Error::oom("edge table", target));
            }
            self.meter.charge(target * std::mem::size_of::<Slot>());
            fresh.resize(target, EMPTY);

            let replayed = self
                .slots
                .iter()
                .filter(|s| s.occupied())
                .chain(orphan.as_ref())
                .try_for_each(|&slot| {
                    place_in(&mut fresh, &seeds, self.mode, self.functions, slot).map_err(|_| ())
                });
            match replayed {
                Ok(()) => {
                    debug!(
                        "edge table rehashed to {target} slots on attempt {attempt} ({} live)",
                        self.live
                    );
                    self.meter.release(self.slots.len() * std::mem::size_of::<Slot>());
                    self.slots = fresh;
                    self.seeds = seeds;
                    return Ok(());
                }
                Err(()) => {
                    self.meter.release(target * std::mem::size_of::<Slot>());
                    target *= 2;
                }
            }
        }
        Err(Error::invariant("rehash", 0, "rehash attempt bound exceeded"))
    }
}

fn find_in<'a>(
    slots: &'a mut [Slot],
    seeds: &[Seed],
    mode: Collision,
    functions: usize,
    parent: u32,
    first: u32,
) -> Option<&'a mut Slot> {
    let mask = slots.len() - 1;
    match mode {
        Collision::Cuckoo => {
            for s in 0..functions {
                let idx = slot_hash(&seeds[s], parent, first) as usize & mask;
                let slot = &slots[idx];
                if slot.occupied() && slot.parent == parent && slot.first == first {
                    return Some(&mut slots[idx]);
                }
            }
            None
        }
        Collision::DoubleHash => {
            let mut idx = slot_hash(&seeds[0], parent, first) as usize & mask;
            let step = (slot_hash(&seeds[1], parent, first) as usize & mask) | 1;
            for _ in 0..slots.len() {
                let slot = &slots[idx];
                if !slot.occupied() {
                    return None;
                }
                if slot.parent == parent && slot.first == first {
                    return Some(&mut slots[idx]);
                }
                idx = (idx + step) & mask;
            }
            None
        }
    }
}

/// Places `item` into `slots`, assuming its key is absent. On failure the
/// displaced occupant that could not be re-homed is handed back so the
/// caller can replay it after a rehash.
fn place_in(
    slots: &mut [Slot],
    seeds: &[Seed],
    mode: Collision,
    functions: usize,
    item: Slot,
) -> std::result::Result<(), Slot> {
    let mask = slots.len() - 1;
    match mode {
        Collision::DoubleHash => {
            let mut idx = slot_hash(&seeds[0], item.parent, item.first) as usize & mask;
            let step = (slot_hash(&seeds[1], item.parent, item.first) as usize & mask) | 1;
            for _ in 0..slots.len() {
                if !slots[idx].occupied() {
                    slots[idx] = item;
                    return Ok(());
                }
                idx = (idx + step) & mask;
            }
            Err(item)
        }
        Collision::Cuckoo => {
            let candidates = |slot: &Slot| -> ArrayVec<usize, 64> {
                seeds[..functions]
                    .iter()
                    .map(|seed| slot_hash(seed, slot.parent, slot.first) as usize & mask)
                    .collect()
            };

            let cells = candidates(&item);
            for &idx in &cells {
                if !slots[idx].occupied() {
                    slots[idx] = item;
                    return Ok(());
                }
            }

            // Eviction walk from the last-probed cell, bounded by the trail.
            let mut trail: ArrayVec<u32, EVICTION_BOUND> = ArrayVec::new();
            let mut at = cells[functions - 1];
            let mut carried = item;
            loop {
                if trail.try_push(at as u32).is_err() {
                    return Err(carried);
                }
                std::mem::swap(&mut slots[at], &mut carried);

                let cells = candidates(&carried);
                if let Some(&free) = cells.iter().find(|&&idx| !slots[idx].occupied()) {
                    slots[free] = carried;
                    return Ok(());
                }
                // Evict from the candidate after the cell we just filled.
                let next = cells
                    .iter()
                    .position(|&idx| idx == at)
                    .map(|p| (p + 1) % functions)
                    .unwrap_or(0);
                at = cells[next];
            }
        }
    }
}
