//! Integration tests for the segment trie
//!
//! Tests exact and right-anchored lookup, underspecified queries, and
//! optional segments.

use morphon_engine::SegmentTrie;

use crate::Language;

fn sorted(values: Vec<&usize>) -> Vec<usize> {
    let mut values: Vec<usize> = values.into_iter().copied().collect();
    values.sort_unstable();
    values
}

fn lexicon(lang: &Language, forms: &[&str]) -> SegmentTrie<usize> {
    let mut trie = SegmentTrie::new();
    for (index, form) in forms.iter().enumerate() {
        trie.insert(&lang.table.to_shape(form).unwrap(), index);
    }
    trie
}

#[test]
fn exact_search_needs_the_whole_key() {
    let lang = Language::new();
    let trie = lexicon(&lang, &["tat", "at", "dat"]);
    assert_eq!(trie.len(), 3);
    assert_eq!(sorted(trie.search(&lang.table.to_shape("tat").unwrap())), vec![0]);
    assert_eq!(sorted(trie.search(&lang.table.to_shape("at").unwrap())), vec![1]);
    assert!(trie.search(&lang.table.to_shape("t").unwrap()).is_empty());
}

#[test]
fn partial_search_is_right_anchored() {
    let lang = Language::new();
    let trie = lexicon(&lang, &["tat", "at", "ta"]);
    assert_eq!(sorted(trie.search_partial(&lang.table.to_shape("tat").unwrap())), vec![0, 1]);
}

#[test]
fn boundaries_are_not_part_of_keys() {
    let lang = Language::new();
    let trie = lexicon(&lang, &["ta+t"]);
    assert_eq!(sorted(trie.search(&lang.table.to_shape("tat").unwrap())), vec![0]);
}

#[test]
fn underspecified_query_follows_every_unifying_branch() {
    let lang = Language::new();
    let trie = lexicon(&lang, &["tat", "dat", "sat"]);
    let mut query = lang.table.to_shape("tat").unwrap();
    let first = query.segments().next().unwrap();
    let voice = lang.phonetic.feature_mask(lang.phonetic.require_feature("voice").unwrap());
    query[first].bundle_mut().unwrap().apply(&voice, true);
    assert_eq!(sorted(trie.search(&query)), vec![0, 1]);
}

#[test]
fn optional_segments_branch() {
    let lang = Language::new();
    let trie = lexicon(&lang, &["tat", "tt", "tot"]);
    let mut query = lang.table.to_shape("tat").unwrap();
    let middle = query.segments().nth(1).unwrap();
    query[middle].optional = true;
    assert_eq!(sorted(trie.search(&query)), vec![0, 1]);
}

#[test]
fn empty_trie() {
    let lang = Language::new();
    let trie: SegmentTrie<usize> = SegmentTrie::new();
    assert!(trie.is_empty());
    assert!(trie.search(&lang.table.to_shape("ta").unwrap()).is_empty());
}
