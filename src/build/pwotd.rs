//! PWOTD: partitioned write-only top-down construction into the linear
//! array.
//!
//! Three phases. Partitioning radix-sorts the suffix array by a `p`-character
//! prefix and carves it where the prefix changes. Preliminary evaluation
//! walks partition ranges off a stack, emitting leaves and branch pairs and
//! scheduling single multi-suffix partitions for full expansion. Expansion
//! pops node jobs off the main stack: refine the LCP, sort the range on the
//! character there, emit the child list, push the sub-ranges.
//!
//! Branch pairs are emitted with empty payloads. The child pointer is
//! patched as soon as the child list lands; the text offset of the first
//! cell must name the lexicographically smallest suffix of the subtree,
//! which is only settled once every sort below the node has run, so offsets
//! are backpatched from the final suffix order in one pass at the end.
//!
//! Both stacks grow on demand; the alphabet-times-prefix bound on the
//! partition stack is not trusted.

use log::debug;

use crate::error::{Error, Result};
use crate::store::array::ArrayStore;
use crate::text::Text;

/// Prefix length for the partitioning phase: none for small texts, else
/// one more than the base-32 logarithm of the overflow factor.
pub fn default_prefix_length(suffix_count: u32) -> u32 {
    const SMALL: u64 = 1 << 20;
    if suffix_count as u64 <= SMALL {
        return 0;
    }
    let mut ratio = (suffix_count as u64).div_ceil(SMALL);
    let mut p = 1;
    while ratio > 1 {
        ratio = ratio.div_ceil(32);
        p += 1;
    }
    p
}

#[derive(Debug, Clone, Copy)]
struct Partition {
    begin: u32,
    end: u32,
    lcp: u32,
    text_offset: u32,
}

/// An unevaluated node: a suffix-array interval, a provisional LCP, and the
/// pair cell awaiting its child pointer (`None` for the implicit root).
#[derive(Debug, Clone, Copy)]
struct NodeJob {
    begin: u32,
    end: u32,
    lcp: u32,
    slot: Option<u32>,
}

/// A partition-range awaiting preliminary evaluation.
#[derive(Debug, Clone, Copy)]
struct RangeJob {
    lo: u32,
    hi: u32,
    lcp: u32,
    slot: Option<u32>,
}

/// A branch pair whose text offset is settled after all sorting.
#[derive(Debug, Clone, Copy)]
struct OffsetPatch {
    pair: u32,
    position: u32,
    parent_depth: u32,
}

pub fn build(store: &mut ArrayStore, text: &Text, prefix_length: Option<u32>) -> Result<()> {
    let suffix_count = text.effective_len();
    let mut suffixes = fallible_vec::<u32>(suffix_count as usize, "suffix array")?;
    suffixes.extend(1..=suffix_count);
    let mut scratch = fallible_vec::<u32>(suffix_count as usize, "radix scratch")?;
    scratch.resize(suffix_count as usize, 0);

    if suffix_count == 1 {
        let cell = store.push_leaf(suffixes[0])?;
        store.mark_rightmost(cell);
        return Ok(());
    }

    let p = prefix_length.unwrap_or_else(|| default_prefix_length(suffix_count));
    debug!("pwotd over {suffix_count} suffixes with prefix length {p}");

    let mut patches: Vec<OffsetPatch> = Vec::new();
    let mut main_stack: Vec<NodeJob> = Vec::new();

    if p == 0 {
        expand(
            store,
            text,
            &mut suffixes,
            &mut scratch,
            &mut main_stack,
            &mut patches,
            NodeJob { begin: 0, end: suffix_count, lcp: 0, slot: None },
        )?;
        apply_patches(store, &suffixes, &patches);
        return Ok(());
    }

    // Phase 1: sort by the first p characters, lowest-order byte first,
    // character positions from p - 1 down to 0.
    for position in (0..p).rev() {
        radix_sort_at(text, &mut suffixes, &mut scratch, position);
    }
    let partitions = carve_partitions(text, &suffixes, p)?;
    debug!("{} partitions", partitions.len());

    // Phase 2: preliminary evaluation over partition ranges.
    let mut scheduled: Vec<NodeJob> = Vec::new();
    let mut range_stack: Vec<RangeJob> = Vec::new();
    range_stack.push(RangeJob { lo: 0, hi: partitions.len() as u32, lcp: 0, slot: None });

    while let Some(range) = range_stack.pop() {
        let depth = refine_range_lcp(text, &partitions, range, p);
        let list_start = store.len();
        if let Some(slot) = range.slot {
            store.patch_pointer(slot, list_start)?;
        }

        let mut last_cell = 0;
        let mut g = range.lo;
        while g < range.hi {
            let group_char = text.at(partitions[g as usize].text_offset + depth);
            let mut h = g + 1;
            while h < range.hi && text.at(partitions[h as usize].text_offset + depth) == group_char
            {
                h += 1;
            }
            let begin = partitions[g as usize].begin;
            let end = partitions[(h - 1) as usize].end;
            if end - begin == 1 {
                last_cell = store.push_leaf(suffixes[begin as usize] + depth)?;
            } else {
                last_cell = store.push_branch()?;
                patches.push(OffsetPatch { pair: last_cell, position: begin, parent_depth: depth });
                let slot = Some(last_cell + 1);
                if h - g == 1 {
                    scheduled.push(NodeJob {
                        begin,
                        end,
                        lcp: partitions[g as usize].lcp,
                        slot,
                    });
                } else {
                    range_stack.push(RangeJob { lo: g, hi: h, lcp: depth + 1, slot });
                }
            }
            g = h;
        }
        store.mark_rightmost(last_cell);
    }

    // Phase 3: full evaluation of the scheduled partitions, in LIFO order.
    while let Some(job) = scheduled.pop() {
        expand(store, text, &mut suffixes, &mut scratch, &mut main_stack, &mut patches, job)?;
    }

    apply_patches(store, &suffixes, &patches);
    Ok(())
}

/// Pops node jobs until the main stack runs dry: refine the LCP, sort the
/// interval on the character there, and emit one child list.
fn expand(
    store: &mut ArrayStore,
    text: &Text,
    suffixes: &mut [u32],
    scratch: &mut [u32],
    main_stack: &mut Vec<NodeJob>,
    patches: &mut Vec<OffsetPatch>,
    job: NodeJob,
) -> Result<()> {
    debug_assert!(main_stack.is_empty());
    main_stack.push(job);

    while let Some(job) = main_stack.pop() {
        let interval = &mut suffixes[job.begin as usize..job.end as usize];
        let depth = determine_lcp(text, interval, job.lcp);
        radix_sort_at(text, interval, scratch, depth);

        let list_start = store.len();
        if let Some(slot) = job.slot {
            store.patch_pointer(slot, list_start)?;
        }

        let mut last_cell = 0;
        let mut g = job.begin;
        while g < job.end {
            let group_char = text.at(suffixes[g as usize] + depth);
            let mut h = g + 1;
            while h < job.end && text.at(suffixes[h as usize] + depth) == group_char {
                h += 1;
            }
            if h - g == 1 {
                last_cell = store.push_leaf(suffixes[g as usize] + depth)?;
            } else {
                last_cell = store.push_branch()?;
                patches.push(OffsetPatch { pair: last_cell, position: g, parent_depth: depth });
                main_stack.push(NodeJob { begin: g, end: h, lcp: depth + 1, slot: Some(last_cell + 1) });
            }
            g = h;
        }
        store.mark_rightmost(last_cell);
    }
    Ok(())
}

fn apply_patches(store: &mut ArrayStore, suffixes: &[u32], patches: &[OffsetPatch]) {
    for patch in patches {
        store.patch_offset(patch.pair, suffixes[patch.position as usize] + patch.parent_depth);
    }
}

/// Exact longest common prefix of an interval of at least two suffixes,
/// starting the scan at `from`. The sentinel guarantees termination.
fn determine_lcp(text: &Text, interval: &[u32], from: u32) -> u32 {
    debug_assert!(interval.len() >= 2);
    let mut depth = from;
    loop {
        let lead = text.at(interval[0] + depth);
        if interval[1..].iter().any(|&s| text.at(s + depth) != lead) {
            return depth;
        }
        depth += 1;
    }
}

/// Exact LCP of a range of at least two partitions, probing one suffix per
/// partition (they share their prefix up to at least `p`).
fn refine_range_lcp(text: &Text, partitions: &[Partition], range: RangeJob, p: u32) -> u32 {
    debug_assert!(range.hi - range.lo >= 2);
    let mut depth = range.lcp;
    while depth < p {
        let lead = text.at(partitions[range.lo as usize].text_offset + depth);
        let split = partitions[(range.lo + 1) as usize..range.hi as usize]
            .iter()
            .any(|part| text.at(part.text_offset + depth) != lead);
        if split {
            return depth;
        }
        depth += 1;
    }
    depth
}

/// One stable LSD pass per byte of the character at `offset`.
fn radix_sort_at(text: &Text, interval: &mut [u32], scratch: &mut [u32], offset: u32) {
    let scratch = &mut scratch[..interval.len()];
    for byte in 0..text.code_unit_width() {
        let shift = 8 * byte;
        let mut starts = [0usize; 257];
        for &s in interval.iter() {
            let key = (text.at(s + offset) >> shift) & 0xFF;
            starts[key as usize + 1] += 1;
        }
        for b in 0..256 {
            starts[b + 1] += starts[b];
        }
        for &s in interval.iter() {
            let key = (text.at(s + offset) >> shift) & 0xFF;
            scratch[starts[key as usize]] = s;
            starts[key as usize] += 1;
        }
        interval.copy_from_slice(scratch);
    }
}

/// Breaks the sorted suffix array where the `p`-character prefix changes.
fn carve_partitions(text: &Text, suffixes: &[u32], p: u32) -> Result<Vec<Partition>> {
    let suffix_count = suffixes.len() as u32;
    let mut partitions = Vec::new();
    let mut begin = 0u32;
    while begin < suffix_count {
        let lead = suffixes[begin as usize];
        let mut end = begin + 1;
        while end < suffix_count && shares_prefix(text, lead, suffixes[end as usize], p) {
            end += 1;
        }
        let text_offset = suffixes[begin as usize..end as usize]
            .iter()
            .copied()
            .min()
            .expect("partitions are never empty");
        // The LCP is p unless a lone short suffix runs out first.
        let lcp = if end - begin == 1 {
            p.min(suffix_count + 1 - text_offset)
        } else {
            p
        };
        partitions
            .try_reserve(1)
            .map_err(|_| Error::oom("partition table", partitions.len() + 1))?;
        partitions.push(Partition { begin, end, lcp, text_offset });
        begin = end;
    }
    Ok(partitions)
}

#[inline]
fn shares_prefix(text: &Text, a: u32, b: u32, p: u32) -> bool {
    (0..p).all(|q| text.at(a + q) == text.at(b + q))
}

fn fallible_vec<T>(capacity: usize, what: &'static str) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity)
        .map_err(|_| Error::oom(what, capacity))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_length_thresholds() {
        assert_eq!(default_prefix_length(1), 0);
        assert_eq!(default_prefix_length(1 << 20), 0);
        assert_eq!(default_prefix_length((1 << 20) + 1), 2);
        assert_eq!(default_prefix_length(1 << 25), 2);
        assert_eq!(default_prefix_length((1 << 25) + 1), 3);
    }

    #[test]
    fn radix_pass_is_stable() {
        let text = Text::from_str("abab").unwrap();
        // Suffixes 1 and 3 share 'a', 2 and 4 share 'b'; sorting on the
        // first character must keep 1 before 3 and 2 before 4.
        let mut s = vec![2, 1, 4, 3];
        let mut scratch = vec![0; 4];
        radix_sort_at(&text, &mut s, &mut scratch, 0);
        assert_eq!(s, vec![1, 3, 2, 4]);
    }

    #[test]
    fn lcp_scan() {
        let text = Text::from_str("aaab").unwrap();
        assert_eq!(determine_lcp(&text, &[1, 2], 0), 2); // "aaab$" vs "aab$"
        assert_eq!(determine_lcp(&text, &[1, 2], 1), 2);
        assert_eq!(determine_lcp(&text, &[3, 4], 0), 0); // "ab$" vs "b$" share nothing
    }

    #[test]
    fn partitions_carry_the_smallest_offset() {
        let text = Text::from_str("abab").unwrap();
        let mut s: Vec<u32> = (1..=5).collect();
        let mut scratch = vec![0; 5];
        radix_sort_at(&text, &mut s, &mut scratch, 0);
        let parts = carve_partitions(&text, &s, 1).unwrap();
        // Groups: a{1,3}, b{2,4}, ${5}.
        assert_eq!(parts.len(), 3);
        assert_eq!((parts[0].begin, parts[0].end, parts[0].text_offset), (0, 2, 1));
        assert_eq!((parts[1].begin, parts[1].end, parts[1].text_offset), (2, 4, 2));
        assert_eq!((parts[2].begin, parts[2].end, parts[2].lcp), (4, 5, 1));
    }

    #[test]
    fn single_suffix_text() {
        let text = Text::from_str("").unwrap();
        let mut store = ArrayStore::allocate(0).unwrap();
        build(&mut store, &text, None).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.leaf_count(), 1);
    }
}
