//! The concrete construction scenarios, bit-for-bit.

mod support;

use stree::driver::{Algorithm, Options, StoreKind};
use stree::Text;
use support::{all_options, assert_valid, collect, describe, lines};

fn reference(input: &str) -> Vec<String> {
    let text = Text::from_str(input).unwrap();
    lines(&text, &Options::new(StoreKind::List, Algorithm::McCreight))
}

#[test]
fn s1_single_character() {
    assert_eq!(reference("a"), vec!["0..2 a$ leaf 1", "0..1 $ leaf 2"]);
}

#[test]
fn s2_repeated_character() {
    assert_eq!(
        reference("aa"),
        vec![
            "0..1 a node",
            "1..3 a$ leaf 1",
            "1..2 $ leaf 2",
            "0..1 $ leaf 3",
        ]
    );
}

#[test]
fn s3_two_distinct_characters() {
    assert_eq!(
        reference("ab"),
        vec!["0..3 ab$ leaf 1", "0..2 b$ leaf 2", "0..1 $ leaf 3"]
    );
}

#[test]
fn s4_abab_structure_and_link() {
    assert_eq!(
        reference("abab"),
        vec![
            "0..2 ab node",
            "2..5 ab$ leaf 1",
            "2..3 $ leaf 3",
            "0..1 b node",
            "1..4 ab$ leaf 2",
            "1..2 $ leaf 4",
            "0..1 $ leaf 5",
        ]
    );

    // The internal node on "ab" links to the internal node on "b".
    let text = Text::from_str("abab").unwrap();
    let (_, events) = collect(&text, &Options::new(StoreKind::List, Algorithm::McCreight));
    let ab = events
        .iter()
        .find(|e| e.child.is_branch() && e.child_depth == 2)
        .expect("no internal node at depth 2");
    let b = events
        .iter()
        .find(|e| e.child.is_branch() && e.child_depth == 1)
        .expect("no internal node at depth 1");
    assert_eq!(ab.suffix_link, Some(b.child));
}

#[test]
fn s5_mississippi() {
    let text = Text::from_str("mississippi").unwrap();
    for options in all_options() {
        let (tree, events) = collect(&text, &options);
        assert_eq!(tree.leaf_count(), 12, "{}", describe(&options));
        assert_eq!(tree.branch_count(), 7, "{}", describe(&options));
        assert_valid(&text, &tree, &events);
    }
}

#[test]
fn s6_every_combination_matches_the_reference() {
    let expected = reference("abcabcabc");
    let text = Text::from_str("abcabcabc").unwrap();
    assert_eq!(text.effective_len(), 10);
    for options in all_options() {
        assert_eq!(lines(&text, &options), expected, "{}", describe(&options));
    }
}

#[test]
fn leaf_ids_spell_their_suffixes_everywhere() {
    for input in ["", "a", "abab", "aabaa", "banana", "abcabcabc", "aaaaaaaaaa", "abaababaab"] {
        let text = Text::from_str(input).unwrap();
        for options in all_options() {
            let (tree, events) = collect(&text, &options);
            assert_valid(&text, &tree, &events);
            let leaves: Vec<u32> = events.iter().filter_map(|e| e.child.leaf()).collect();
            assert_eq!(leaves.len() as u32, text.effective_len(), "{}", describe(&options));
        }
    }
}
