//! Shared helpers: building every compatible configuration and checking the
//! structural invariants any finished tree must satisfy.

use std::collections::HashMap;

use stree::driver::{construct, Algorithm, Options, StoreKind, Tree, Variation};
use stree::node::NodeId;
use stree::walk::{Collector, EdgeEvent, Serializer, Traversal};
use stree::Text;

/// Every `(store, algorithm, variation)` cell of the compatibility matrix.
pub fn all_options() -> Vec<Options> {
    let mut out = Vec::new();
    for store in [StoreKind::List, StoreKind::Hash] {
        for algorithm in [
            Algorithm::SimpleMcCreight,
            Algorithm::McCreight,
            Algorithm::SimpleUkkonen,
            Algorithm::Ukkonen,
        ] {
            out.push(Options::new(store, algorithm));
            if matches!(algorithm, Algorithm::McCreight | Algorithm::Ukkonen) {
                let mut bp = Options::new(store, algorithm);
                bp.variation = Variation::BackwardPointers;
                out.push(bp);
            }
        }
    }
    out.push(Options::new(StoreKind::Array, Algorithm::Pwotd));
    out
}

pub fn describe(options: &Options) -> String {
    format!(
        "{:?}/{:?}/{:?}",
        options.store, options.algorithm, options.variation
    )
}

/// Builds and serialises with the simple traversal; the resulting lines are
/// layout-independent.
pub fn lines(text: &Text, options: &Options) -> Vec<String> {
    let tree = construct(text, options).expect("construction failed");
    let mut ser = Serializer::new(text, Traversal::Simple);
    tree.traverse(text, Traversal::Simple, &mut ser);
    ser.lines
}

pub fn collect(text: &Text, options: &Options) -> (Tree, Vec<EdgeEvent>) {
    let tree = construct(text, options).expect("construction failed");
    let mut collector = Collector::default();
    let mode = if options.store == StoreKind::Array {
        Traversal::Simple
    } else {
        Traversal::Detailed
    };
    tree.traverse(text, mode, &mut collector);
    (tree, collector.events)
}

fn label_of(text: &Text, event: &EdgeEvent) -> Vec<u32> {
    (event.child_head + event.parent_depth..event.child_head + event.child_depth)
        .map(|pos| text.at(pos))
        .collect()
}

/// Checks the universal invariants over a traversal of a finished tree.
pub fn assert_valid(text: &Text, tree: &Tree, events: &[EdgeEvent]) {
    let n = text.n();
    let n1 = text.effective_len();

    // Path labels per branching node, the root(s) being empty.
    let mut paths: HashMap<NodeId, Vec<u32>> = HashMap::new();
    let mut leaf_seen = vec![false; n1 as usize + 1];
    let mut child_counts: HashMap<NodeId, u32> = HashMap::new();
    let mut last_first: HashMap<NodeId, u32> = HashMap::new();

    for event in events {
        let parent_path: Vec<u32> = if event.parent_depth == 0 {
            Vec::new()
        } else {
            paths.get(&event.parent).expect("parent before child").clone()
        };
        assert_eq!(parent_path.len() as u32, event.parent_depth);

        let edge = label_of(text, event);
        assert!(!edge.is_empty(), "empty edge label");
        assert_eq!(
            event.child_depth,
            event.parent_depth + edge.len() as u32,
            "depth does not match the label interval"
        );

        // Sibling order and first-character uniqueness.
        let first = edge[0];
        if let Some(&prev) = last_first.get(&event.parent) {
            assert!(first > prev, "siblings out of order or duplicated");
        }
        last_first.insert(event.parent, first);
        *child_counts.entry(event.parent).or_insert(0) += 1;

        let mut path = parent_path;
        path.extend_from_slice(&edge);
        match event.child {
            NodeId::Leaf(i) => {
                assert!(i >= 1 && i <= n1, "leaf position out of range");
                assert!(!leaf_seen[i as usize], "duplicate leaf {i}");
                leaf_seen[i as usize] = true;
                let expected: Vec<u32> = (i..=n1).map(|pos| text.at(pos)).collect();
                assert_eq!(path, expected, "leaf {i} does not spell its suffix");
            }
            NodeId::Branch(_) => {
                paths.insert(event.child, path);
            }
        }
    }

    // One leaf per suffix.
    assert_eq!(tree.leaf_count(), n1, "leaf count");
    assert!(leaf_seen[1..=n1 as usize].iter().all(|&b| b), "missing leaves");

    // Branching bound; every internal node below the root has two children.
    assert!(tree.branch_count() >= 1 && tree.branch_count() <= n.max(1), "branch bound");
    assert_eq!(tree.branch_count() as usize, paths.len() + 1, "branch events");
    for (node, count) in &child_counts {
        if paths.contains_key(node) {
            assert!(*count >= 2, "internal node {node:?} has {count} child(ren)");
        }
    }

    // Suffix links, where present, point one character up the path.
    for event in events {
        if let Some(link) = event.suffix_link {
            let source = paths.get(&event.child).expect("link on a leaf");
            let target: &[u32] = match link {
                NodeId::Branch(_) if paths.contains_key(&link) => &paths[&link],
                _ => &[],
            };
            assert_eq!(
                target,
                &source[1..],
                "suffix link of {:?} does not drop exactly the head character",
                event.child
            );
        }
    }
}
