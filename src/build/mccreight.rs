//! McCreight's algorithm: suffixes inserted in text order, longest first.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::link::{install, simulate_bottomup, simulate_topdown, LinkState, PendingLink};
use crate::node::{NodeId, ROOT};
use crate::scan::{branch_once, slowscan, Scan};
use crate::store::{ChildLookup, InsertHint, Store};
use crate::text::Text;

/// Where an insertion ended up. `parent` is the node the new leaf hangs off;
/// when an edge had to be split, `parent` is the fresh branching node and
/// `grandpa` the node above it.
struct Inserted {
    parent: u32,
    split: Option<Split>,
}

struct Split {
    grandpa: u32,
}

/// Walks from `start`, whose path is known to equal `T[i .. i + depth(start))`,
/// and attaches the leaf for suffix `i`.
fn insert_suffix<S: Store + ?Sized>(
    store: &mut S,
    text: &Text,
    text_len: u32,
    start: u32,
    i: u32,
) -> Result<Inserted> {
    let mut cur = start;
    let mut pos = i + store.depth(cur);
    loop {
        if pos > text_len {
            return Err(Error::Logic { suffix: i });
        }
        let child = match branch_once(store, text, cur, pos) {
            ChildLookup::Missing(hint) => {
                store.create_leaf(text, text_len, cur, i, hint)?;
                return Ok(Inserted { parent: cur, split: None });
            }
            ChildLookup::Found(child) => child,
        };
        let remaining = text_len + 1 - pos;
        match slowscan(store, text, text_len, cur, child, pos, remaining) {
            Scan::Full { len } => match child {
                NodeId::Branch(b) => {
                    pos += len;
                    cur = b;
                }
                NodeId::Leaf(_) => return Err(Error::Logic { suffix: i }),
            },
            Scan::Bounded { .. } => return Err(Error::Logic { suffix: i }),
            Scan::Mismatch { matched, ord } => {
                let head = store.node_head(child);
                let branch = store.split_edge(text, text_len, cur, child, matched, head)?;
                let hint = match ord {
                    Ordering::Less => InsertHint::front(),
                    _ => InsertHint::after(child),
                };
                store.create_leaf(text, text_len, branch, i, hint)?;
                return Ok(Inserted {
                    parent: branch,
                    split: Some(Split { grandpa: cur }),
                });
            }
        }
    }
}

/// Every suffix walked from the root; no suffix links.
pub fn simple<S: Store + ?Sized>(store: &mut S, text: &Text) -> Result<()> {
    let text_len = text.effective_len();
    for i in 1..=text_len {
        insert_suffix(store, text, text_len, ROOT, i)?;
    }
    Ok(())
}

/// The insertion node is carried across iterations through suffix links;
/// splits trigger link simulation, unresolved targets ride along as a
/// pending link until the split that creates them.
pub fn linked<S: Store + ?Sized>(store: &mut S, text: &Text) -> Result<()> {
    let text_len = text.effective_len();
    let mut pending: Option<(PendingLink, u32)> = None;
    let mut start = ROOT;
    for i in 1..=text_len {
        let inserted = insert_suffix(store, text, text_len, start, i)?;

        if let Some((p, source_leaf)) = pending {
            let resolved = if inserted.split.is_some() && store.depth(inserted.parent) == p.target_depth
            {
                install(store, p.source, inserted.parent)?;
                true
            } else if store.has_parents() {
                match simulate_bottomup(store, text_len, p.source, NodeId::Leaf(source_leaf))? {
                    LinkState::Found(target) => {
                        install(store, p.source, target)?;
                        true
                    }
                    LinkState::NotYet { .. } => false,
                }
            } else {
                false
            };
            if resolved {
                pending = None;
            }
        }

        let mut rescan_from = ROOT;
        if let Some(split) = &inserted.split {
            let branch = inserted.parent;
            let depth = store.depth(branch);
            if depth == 1 {
                install(store, branch, ROOT)?;
            } else {
                let state = if store.has_parents() {
                    simulate_bottomup(store, text_len, branch, NodeId::Leaf(i))?
                } else {
                    simulate_topdown(store, text, text_len, branch, split.grandpa)?
                };
                match state {
                    LinkState::Found(target) => install(store, branch, target)?,
                    LinkState::NotYet { reached } => {
                        pending = Some((
                            PendingLink {
                                source: branch,
                                target_depth: depth - 1,
                            },
                            i,
                        ));
                        rescan_from = reached;
                    }
                }
            }
        }

        // Resume from the link when it is known; otherwise from the deepest
        // node the simulation verified on the next suffix's path.
        start = store.suffix_link(inserted.parent).unwrap_or(rescan_from);
    }
    Ok(())
}
