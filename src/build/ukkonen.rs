//! Ukkonen's algorithm: online over growing prefixes.
//!
//! Leaf labels are open-ended: every primitive is called with the phase's
//! effective length, so existing leaves lengthen for free and only the
//! pending suffixes need explicit work. The linked rendition tracks the
//! active point `(active node, remainder below it)` canonically; the simple
//! rendition re-walks every pending suffix from the root each phase.

use crate::error::{Error, Result};
use crate::link::{install, simulate_bottomup, simulate_topdown, LinkState, PendingLink};
use crate::node::{NodeId, ROOT};
use crate::scan::{branch_once, slowscan, Scan};
use crate::store::{ChildLookup, InsertHint, Store};
use crate::text::Text;

enum Extend {
    /// Rule 2: a leaf was attached.
    Added,
    /// Rule 3: the suffix is already implicit; the whole phase is done.
    Present,
}

fn extend_from_root<S: Store + ?Sized>(
    store: &mut S,
    text: &Text,
    end: u32,
    sp: u32,
) -> Result<Extend> {
    let mut cur = ROOT;
    let mut pos = sp;
    loop {
        if pos > end {
            return Ok(Extend::Present);
        }
        let child = match branch_once(store, text, cur, pos) {
            ChildLookup::Missing(hint) => {
                store.create_leaf(text, end, cur, sp, hint)?;
                return Ok(Extend::Added);
            }
            ChildLookup::Found(child) => child,
        };
        let remaining = end + 1 - pos;
        match slowscan(store, text, end, cur, child, pos, remaining) {
            Scan::Full { len } => match child {
                NodeId::Branch(b) => {
                    pos += len;
                    cur = b;
                }
                NodeId::Leaf(_) => return Ok(Extend::Present),
            },
            Scan::Bounded { .. } => return Ok(Extend::Present),
            Scan::Mismatch { matched, ord } => {
                let branch =
                    store.split_edge(text, end, cur, child, matched, store.node_head(child))?;
                let hint = if ord == std::cmp::Ordering::Less {
                    InsertHint::front()
                } else {
                    InsertHint::after(child)
                };
                store.create_leaf(text, end, branch, sp, hint)?;
                return Ok(Extend::Added);
            }
        }
    }
}

/// Per phase, walks each still-implicit suffix from the root and extends it
/// by the phase character; the first Rule-3 hit ends the phase.
pub fn simple<S: Store + ?Sized>(store: &mut S, text: &Text) -> Result<()> {
    let text_len = text.effective_len();
    let mut first_pending = 1;
    for end in 1..=text_len {
        for sp in first_pending..=end {
            match extend_from_root(store, text, end, sp)? {
                Extend::Added => first_pending = sp + 1,
                Extend::Present => break,
            }
        }
    }
    Ok(())
}

/// Full Ukkonen with an active point and deferred suffix links.
pub fn linked<S: Store + ?Sized>(store: &mut S, text: &Text) -> Result<()> {
    let text_len = text.effective_len();
    let mut sp: u32 = 1;
    let mut anode: u32 = ROOT;
    let mut pending: Option<PendingLink> = None;

    for end in 1..=text_len {
        let c = text.at(end);
        loop {
            if sp > end {
                break;
            }

            // Canonize the active remainder T[sp + depth(anode) .. end).
            let mut alen = end - sp - store.depth(anode);
            let mut on_edge = None;
            while alen > 0 {
                let pos = sp + store.depth(anode);
                let child = match branch_once(store, text, anode, pos) {
                    ChildLookup::Found(child) => child,
                    ChildLookup::Missing(_) => {
                        return Err(Error::invariant(
                            "ukkonen",
                            anode as i32,
                            "active path has no edge",
                        ))
                    }
                };
                let edge_len = store.node_depth(child, end) - store.depth(anode);
                if alen < edge_len {
                    on_edge = Some(child);
                    break;
                }
                match child {
                    NodeId::Branch(b) => {
                        alen -= edge_len;
                        anode = b;
                    }
                    NodeId::Leaf(_) => {
                        return Err(Error::invariant(
                            "ukkonen",
                            child.raw(),
                            "active point ran off a leaf edge",
                        ))
                    }
                }
            }

            match on_edge {
                None => {
                    // The active suffix ends at an explicit node.
                    if let Some(p) = pending.take() {
                        if store.depth(anode) == p.target_depth {
                            install(store, p.source, anode)?;
                        } else {
                            pending = Some(p);
                        }
                    }
                    match branch_once(store, text, anode, end) {
                        ChildLookup::Found(_) => break, // Rule 3
                        ChildLookup::Missing(hint) => {
                            store.create_leaf(text, end, anode, sp, hint)?;
                            sp += 1;
                            anode = if anode == ROOT {
                                ROOT
                            } else {
                                store.suffix_link(anode).unwrap_or(ROOT)
                            };
                        }
                    }
                }
                Some(child) => {
                    let label_char =
                        text.at(store.node_head(child) + store.depth(anode) + alen);
                    if label_char == c {
                        break; // Rule 3 inside the edge
                    }
                    let branch =
                        store.split_edge(text, end, anode, child, alen, store.node_head(child))?;
                    let hint = if c < label_char {
                        InsertHint::front()
                    } else {
                        InsertHint::after(child)
                    };
                    store.create_leaf(text, end, branch, sp, hint)?;

                    if let Some(p) = pending.take() {
                        if store.depth(branch) == p.target_depth {
                            install(store, p.source, branch)?;
                        } else {
                            pending = Some(p);
                        }
                    }
                    let depth = store.depth(branch);
                    if depth == 1 {
                        install(store, branch, ROOT)?;
                    } else {
                        let state = if store.has_parents() {
                            simulate_bottomup(store, end, branch, child)?
                        } else {
                            simulate_topdown(store, text, end, branch, anode)?
                        };
                        match state {
                            LinkState::Found(target) => install(store, branch, target)?,
                            LinkState::NotYet { .. } => {
                                pending = Some(PendingLink {
                                    source: branch,
                                    target_depth: depth - 1,
                                })
                            }
                        }
                    }

                    sp += 1;
                    anode = if anode == ROOT {
                        ROOT
                    } else {
                        store.suffix_link(anode).unwrap_or(ROOT)
                    };
                }
            }
        }
    }
    Ok(())
}
