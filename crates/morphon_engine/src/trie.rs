//! Segment trie for lexical lookup.
//!
//! Keys are the segment bundles of a shape read from the right, so words
//! sharing a final stretch share a path. Lookup walks an analysis shape in
//! the same direction, following every child whose bundle the analysis
//! segment unifies with and branching around optional segments.

use std::collections::BTreeMap;

use morphon_foundation::FeatureBundle;
use morphon_phonetics::PhoneticShape;

#[derive(Clone, Debug)]
struct TrieNode<T> {
    children: BTreeMap<FeatureBundle, TrieNode<T>>,
    values: Vec<T>,
}

impl<T> Default for TrieNode<T> {
    fn default() -> Self {
        Self {
            children: BTreeMap::new(),
            values: Vec::new(),
        }
    }
}

/// A trie from segment sequences to values.
#[derive(Clone, Debug)]
pub struct SegmentTrie<T> {
    root: TrieNode<T>,
    len: usize,
}

impl<T> Default for SegmentTrie<T> {
    fn default() -> Self {
        Self {
            root: TrieNode::default(),
            len: 0,
        }
    }
}

/// A segment read from an analysis shape.
#[derive(Copy, Clone)]
struct KeyStep {
    bundle: FeatureBundle,
    optional: bool,
}

fn key_steps(shape: &PhoneticShape) -> Vec<KeyStep> {
    let mut steps: Vec<KeyStep> = shape
        .segments()
        .filter_map(|id| {
            let node = &shape[id];
            node.bundle().map(|bundle| KeyStep {
                bundle: *bundle,
                optional: node.optional,
            })
        })
        .collect();
    steps.reverse();
    steps
}

impl<T> SegmentTrie<T> {
    /// Creates an empty trie.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `value` under the segments of `shape`. Boundaries are ignored.
    pub fn insert(&mut self, shape: &PhoneticShape, value: T) {
        let mut node = &mut self.root;
        for step in key_steps(shape) {
            node = node.children.entry(step.bundle).or_default();
        }
        node.values.push(value);
        self.len += 1;
    }

    /// Returns values whose whole key matches `shape`.
    #[must_use]
    pub fn search(&self, shape: &PhoneticShape) -> Vec<&T> {
        let mut out = Vec::new();
        Self::walk(&self.root, &key_steps(shape), false, &mut out);
        out
    }

    /// Returns values whose key matches a right-anchored part of `shape`.
    #[must_use]
    pub fn search_partial(&self, shape: &PhoneticShape) -> Vec<&T> {
        let mut out = Vec::new();
        Self::walk(&self.root, &key_steps(shape), true, &mut out);
        out
    }

    fn walk<'a>(node: &'a TrieNode<T>, steps: &[KeyStep], partial: bool, out: &mut Vec<&'a T>) {
        if partial || steps.is_empty() {
            for value in &node.values {
                if !out.iter().any(|seen| std::ptr::eq(*seen, value)) {
                    out.push(value);
                }
            }
        }
        let Some((step, rest)) = steps.split_first() else {
            return;
        };
        if step.optional {
            Self::walk(node, rest, partial, out);
        }
        for (key, child) in &node.children {
            if step.bundle.unifies(key) {
                Self::walk(child, rest, partial, out);
            }
        }
    }
}
