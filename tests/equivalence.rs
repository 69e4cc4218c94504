//! Randomised cross-layout properties.

mod support;

use itertools::Itertools;
use proptest::prelude::*;
use stree::driver::{construct, Algorithm, Options, StoreKind, Tree};
use stree::edgemap::Collision;
use stree::store::{ChildLookup, Store};
use stree::Text;
use support::{all_options, assert_valid, collect, describe, lines};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Invariant 7: every compatible `(store, algorithm)` build of the same
    /// text is isomorphic as a labelled tree.
    #[test]
    fn layouts_and_algorithms_agree(input in "[abc]{0,32}") {
        let text = Text::from_str(&input).unwrap();
        let reference = lines(&text, &Options::new(StoreKind::List, Algorithm::SimpleMcCreight));
        for options in all_options() {
            let got = lines(&text, &options);
            prop_assert_eq!(&got, &reference, "{}", describe(&options));
        }
    }

    #[test]
    fn every_build_satisfies_the_invariants(input in "[ab]{0,24}") {
        let text = Text::from_str(&input).unwrap();
        for options in all_options() {
            let (tree, events) = collect(&text, &options);
            assert_valid(&text, &tree, &events);
        }
    }

    /// Varying the partitioning prefix must not change the tree.
    #[test]
    fn pwotd_prefix_lengths_agree(input in "[ab]{0,24}") {
        let text = Text::from_str(&input).unwrap();
        let mut options = Options::new(StoreKind::Array, Algorithm::Pwotd);
        let reference = lines(&text, &options);
        for p in 0..=text.effective_len() {
            options.prefix_length = Some(p);
            let got = lines(&text, &options);
            prop_assert_eq!(&got, &reference, "prefix length {}", p);
        }
    }

    /// After construction every live edge is found and everything else is
    /// not, under either collision strategy and various function counts.
    #[test]
    fn hash_lookups_are_complete(
        input in "[abcd]{0,32}",
        use_cuckoo in proptest::bool::ANY,
        functions in 2u32..12,
    ) {
        let text = Text::from_str(&input).unwrap();
        let mut options = Options::new(StoreKind::Hash, Algorithm::SimpleUkkonen);
        options.collision = Some(if use_cuckoo { Collision::Cuckoo } else { Collision::DoubleHash });
        if use_cuckoo {
            options.cuckoo_hash_functions = Some(functions);
        }
        let (tree, events) = collect(&text, &options);
        let store = match &tree {
            Tree::Hash(s) => s,
            _ => unreachable!(),
        };
        prop_assert_eq!(store.edges().len(), events.len());

        let mut live = Vec::new();
        for event in &events {
            let parent = event.parent.branch().unwrap();
            let first = text.at(event.child_head + event.parent_depth);
            live.push((parent, first));
            prop_assert_eq!(
                store.lookup_child(&text, parent, first),
                ChildLookup::Found(event.child)
            );
        }
        let live: std::collections::HashSet<_> = live.into_iter().collect();
        let alphabet = ('a'..='e').map(|c| c as u32).chain([text.sentinel()]);
        for parent in 1..=store.branch_count() {
            for first in alphabet.clone() {
                if !live.contains(&(parent, first)) {
                    prop_assert!(matches!(
                        store.lookup_child(&text, parent, first),
                        ChildLookup::Missing(_)
                    ));
                }
            }
        }
    }

    /// Wide code units: two radix bytes per character and a 0xFFFF sentinel.
    #[test]
    fn wide_texts_agree_across_layouts(input in "[αβγδ]{0,20}") {
        let text = Text::from_str(&input).unwrap();
        prop_assert_eq!(text.code_unit_width(), if input.is_empty() { 1 } else { 2 });
        let reference = lines(&text, &Options::new(StoreKind::List, Algorithm::SimpleMcCreight));
        for options in all_options() {
            let got = lines(&text, &options);
            prop_assert_eq!(&got, &reference, "{}", describe(&options));
        }
        let mut pwotd = Options::new(StoreKind::Array, Algorithm::Pwotd);
        pwotd.prefix_length = Some(2);
        prop_assert_eq!(&lines(&text, &pwotd), &reference, "pwotd with a fixed prefix");
    }

    /// Invariant 8: rehash twice, same edge set.
    #[test]
    fn rehash_is_idempotent(input in "[abc]{1,24}") {
        let text = Text::from_str(&input).unwrap();
        let options = Options::new(StoreKind::Hash, Algorithm::McCreight);
        let mut store = match construct(&text, &options).unwrap() {
            Tree::Hash(s) => s,
            _ => unreachable!(),
        };
        let snapshot = |s: &stree::store::HashStore| {
            let mut edges = Vec::new();
            s.edges().for_each(&mut |p, c, child| edges.push((p, c, child)));
            edges.into_iter().sorted().collect::<Vec<_>>()
        };
        let before = snapshot(&store);
        store.edges_mut().rehash().unwrap();
        store.edges_mut().rehash().unwrap();
        prop_assert_eq!(snapshot(&store), before);
    }
}
