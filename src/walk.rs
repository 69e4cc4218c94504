//! Ordered depth-first traversal.
//!
//! One event per edge, children in ascending first-character order. The
//! store walker snapshots the edge set (the hash layout keeps no sibling
//! order of its own) and replays it depth-first; the array walker decodes
//! `LEAF`/`RIGHTMOST` cells directly. Array traversal has no suffix links
//! and synthesises ids: the root is 0, a branching child is its first cell
//! index plus one, a leaf is its suffix position.

use crate::node::{NodeId, ROOT};
use crate::store::array::{ArrayStore, LEAF, PAYLOAD, RIGHTMOST};
use crate::store::Store;
use crate::text::Text;

/// Event detail level. `Detailed` includes suffix links; the array layout
/// supports only `Simple`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    Detailed,
    #[default]
    Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    pub parent: NodeId,
    pub child: NodeId,
    pub suffix_link: Option<NodeId>,
    pub parent_depth: u32,
    pub child_depth: u32,
    pub child_head: u32,
}

/// The traversal consumer contract.
pub trait Visit {
    fn edge(&mut self, event: &EdgeEvent);
}

/// A visitor that discards everything; used when the benchmark only needs
/// the traversal work itself.
#[derive(Debug, Default)]
pub struct Sink;

impl Visit for Sink {
    fn edge(&mut self, _event: &EdgeEvent) {}
}

/// Collects events in traversal order.
#[derive(Debug, Default)]
pub struct Collector {
    pub events: Vec<EdgeEvent>,
}

impl Visit for Collector {
    fn edge(&mut self, event: &EdgeEvent) {
        self.events.push(*event);
    }
}

/// Renders events as stable text lines: depth range, decoded label, and the
/// leaf position where applicable. Store-independent, which makes it the
/// yardstick for cross-layout equality.
pub struct Serializer<'t> {
    text: &'t Text,
    mode: Traversal,
    pub lines: Vec<String>,
}

impl<'t> Serializer<'t> {
    pub fn new(text: &'t Text, mode: Traversal) -> Serializer<'t> {
        Serializer { text, mode, lines: Vec::new() }
    }

    fn label(&self, event: &EdgeEvent) -> String {
        let mut out = String::new();
        for pos in event.child_head + event.parent_depth..event.child_head + event.child_depth {
            let unit = self.text.at(pos);
            if unit == self.text.sentinel() {
                out.push('$');
            } else if let Some(c) = char::from_u32(unit).filter(|c| !c.is_control()) {
                out.push(c);
            } else {
                out.push_str(&format!("#{unit:x};"));
            }
        }
        out
    }
}

impl Visit for Serializer<'_> {
    fn edge(&mut self, event: &EdgeEvent) {
        let label = self.label(event);
        let mut line = match event.child {
            NodeId::Leaf(i) => format!("{}..{} {} leaf {}", event.parent_depth, event.child_depth, label, i),
            NodeId::Branch(_) => format!("{}..{} {} node", event.parent_depth, event.child_depth, label),
        };
        if self.mode == Traversal::Detailed {
            if let Some(NodeId::Branch(link)) = event.suffix_link {
                line.push_str(&format!(" link {link}"));
            }
        }
        self.lines.push(line);
    }
}

/// Depth-first traversal of a list- or hash-backed tree.
pub fn walk_store<S: Store + ?Sized>(store: &S, text: &Text, mode: Traversal, visit: &mut dyn Visit) {
    let text_len = text.effective_len();
    let mut children: Vec<Vec<(u32, NodeId)>> = vec![Vec::new(); store.branch_count() as usize + 1];
    store.for_each_edge(text, text_len, &mut |parent, first, child| {
        children[parent as usize].push((first, child));
    });
    for list in &mut children {
        list.sort_unstable_by_key(|&(first, _)| first);
    }

    let mut stack: Vec<(u32, usize)> = vec![(ROOT, 0)];
    while let Some(frame) = stack.last_mut() {
        let (branch, next) = *frame;
        let list = &children[branch as usize];
        if next == list.len() {
            stack.pop();
            continue;
        }
        frame.1 += 1;
        let (_, child) = list[next];
        let suffix_link = match (mode, child) {
            (Traversal::Detailed, NodeId::Branch(b)) => {
                store.suffix_link(b).map(NodeId::Branch)
            }
            _ => None,
        };
        visit.edge(&EdgeEvent {
            parent: NodeId::Branch(branch),
            child,
            suffix_link,
            parent_depth: store.depth(branch),
            child_depth: store.node_depth(child, text_len),
            child_head: store.node_head(child),
        });
        if let NodeId::Branch(b) = child {
            stack.push((b, 0));
        }
    }
}

struct ArrayFrame {
    next_cell: u32,
    parent: NodeId,
    parent_depth: u32,
    done: bool,
}

/// Depth-first decode of the linear array.
pub fn walk_array(store: &ArrayStore, text: &Text, visit: &mut dyn Visit) {
    if store.is_empty() {
        return;
    }
    let text_len = text.effective_len();
    let mut stack = vec![ArrayFrame {
        next_cell: 0,
        parent: NodeId::Branch(0),
        parent_depth: 0,
        done: false,
    }];

    while let Some(frame) = stack.last_mut() {
        if frame.done {
            stack.pop();
            continue;
        }
        let idx = frame.next_cell;
        let cell = store.cell(idx);
        let rightmost = cell & RIGHTMOST != 0;
        if rightmost {
            frame.done = true;
        }

        if cell & LEAF != 0 {
            let suffix = (cell & PAYLOAD) - frame.parent_depth;
            frame.next_cell = idx + 1;
            let event = EdgeEvent {
                parent: frame.parent,
                child: NodeId::Leaf(suffix),
                suffix_link: None,
                parent_depth: frame.parent_depth,
                child_depth: text_len + 1 - suffix,
                child_head: suffix,
            };
            visit.edge(&event);
        } else {
            let offset = cell & PAYLOAD;
            let child_list = store.cell(idx + 1) & PAYLOAD;
            let first_child_offset = store.cell(child_list) & PAYLOAD;
            let child_depth = frame.parent_depth + (first_child_offset - offset);
            frame.next_cell = idx + 2;
            let event = EdgeEvent {
                parent: frame.parent,
                child: NodeId::Branch(idx + 1),
                suffix_link: None,
                parent_depth: frame.parent_depth,
                child_depth,
                child_head: offset - frame.parent_depth,
            };
            visit.edge(&event);
            stack.push(ArrayFrame {
                next_cell: child_list,
                parent: NodeId::Branch(idx + 1),
                parent_depth: child_depth,
                done: false,
            });
        }
    }
}
