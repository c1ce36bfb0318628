//! Character definition tables.
//!
//! A [`CharacterDefinitionTable`] maps strings to segment and boundary
//! definitions. It converts words into [`PhoneticShape`]s by longest-match
//! tokenization and renders shapes back into strings.

use std::collections::{BTreeSet, HashMap};

use morphon_foundation::{Error, FeatureBundle, FeatureSystem, Result};

use crate::shape::{NodeKind, PhoneticShape, ShapeNode};

/// A string that stands for one segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentDefinition {
    representation: String,
    bundle: FeatureBundle,
}

impl SegmentDefinition {
    /// Returns the surface string.
    #[must_use]
    pub fn representation(&self) -> &str {
        &self.representation
    }

    /// Returns the segment's features.
    #[must_use]
    pub fn bundle(&self) -> FeatureBundle {
        self.bundle
    }
}

/// A string that stands for a morpheme boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryDefinition {
    representation: String,
}

impl BoundaryDefinition {
    /// Returns the surface string.
    #[must_use]
    pub fn representation(&self) -> &str {
        &self.representation
    }
}

#[derive(Clone, Copy, Debug)]
enum Definition {
    Segment(usize),
    Boundary(usize),
}

/// Table of segment and boundary definitions for one stratum.
#[derive(Clone, Debug, Default)]
pub struct CharacterDefinitionTable {
    name: String,
    segments: Vec<SegmentDefinition>,
    boundaries: Vec<BoundaryDefinition>,
    lookup: HashMap<String, Definition>,
    longest: usize,
}

impl CharacterDefinitionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn register(&mut self, representation: &str, definition: Definition) {
        self.longest = self.longest.max(representation.chars().count());
        self.lookup.insert(representation.to_string(), definition);
    }

    /// Defines a segment from feature value names.
    ///
    /// # Errors
    ///
    /// Returns an error if a value name is not registered in `system`.
    pub fn add_segment(
        &mut self,
        system: &FeatureSystem,
        representation: &str,
        values: &[&str],
    ) -> Result<()> {
        let bundle = system.bundle(values)?;
        self.add_segment_bundle(representation, bundle);
        Ok(())
    }

    /// Defines a segment from a bundle.
    pub fn add_segment_bundle(&mut self, representation: &str, bundle: FeatureBundle) {
        let index = self.segments.len();
        self.segments.push(SegmentDefinition {
            representation: representation.to_string(),
            bundle,
        });
        self.register(representation, Definition::Segment(index));
    }

    /// Defines a boundary.
    pub fn add_boundary(&mut self, representation: &str) {
        let index = self.boundaries.len();
        self.boundaries.push(BoundaryDefinition {
            representation: representation.to_string(),
        });
        self.register(representation, Definition::Boundary(index));
    }

    /// Looks up a segment definition by its string.
    #[must_use]
    pub fn segment(&self, representation: &str) -> Option<&SegmentDefinition> {
        match self.lookup.get(representation) {
            Some(Definition::Segment(i)) => self.segments.get(*i),
            _ => None,
        }
    }

    /// Looks up a segment definition, failing if unknown.
    ///
    /// # Errors
    ///
    /// Returns an invalid shape error naming the representation.
    pub fn require_segment(&self, representation: &str) -> Result<&SegmentDefinition> {
        self.segment(representation)
            .ok_or_else(|| Error::invalid_shape(representation, "", 0))
    }

    /// Looks up a boundary definition by its string.
    #[must_use]
    pub fn boundary(&self, representation: &str) -> Option<&BoundaryDefinition> {
        match self.lookup.get(representation) {
            Some(Definition::Boundary(i)) => self.boundaries.get(*i),
            _ => None,
        }
    }

    /// Iterates the segment definitions in definition order.
    pub fn segments(&self) -> impl Iterator<Item = &SegmentDefinition> {
        self.segments.iter()
    }

    fn node_for(&self, definition: Definition) -> ShapeNode {
        match definition {
            Definition::Segment(i) => ShapeNode::segment(self.segments[i].bundle),
            Definition::Boundary(i) => ShapeNode::boundary(self.boundaries[i].representation.clone()),
        }
    }

    /// Tokenizes `word` into nodes by longest match, trying the exact text
    /// before its lowercase form at each position.
    ///
    /// # Errors
    ///
    /// Returns an invalid shape error carrying the converted prefix and the
    /// character position where no definition matched.
    pub fn to_nodes(&self, word: &str) -> Result<Vec<ShapeNode>> {
        let chars: Vec<char> = word.chars().collect();
        let mut nodes = Vec::new();
        let mut pos = 0;
        while pos < chars.len() {
            let max = self.longest.min(chars.len() - pos);
            let found = (1..=max).rev().find_map(|width| {
                let exact: String = chars[pos..pos + width].iter().collect();
                self.lookup
                    .get(&exact)
                    .or_else(|| self.lookup.get(&exact.to_lowercase()))
                    .map(|definition| (width, *definition))
            });
            let Some((width, definition)) = found else {
                let matched: String = chars[..pos].iter().collect();
                return Err(Error::invalid_shape(word, matched, pos));
            };
            nodes.push(self.node_for(definition));
            pos += width;
        }
        Ok(nodes)
    }

    /// Converts `word` into a phonetic shape.
    ///
    /// # Errors
    ///
    /// Returns an invalid shape error if tokenization fails, or a capacity
    /// error if the word is too long.
    pub fn to_shape(&self, word: &str) -> Result<PhoneticShape> {
        PhoneticShape::from_nodes(self.to_nodes(word)?)
    }

    /// Returns the representations a segment bundle can stand for, exact
    /// matches first.
    #[must_use]
    pub fn candidates(&self, bundle: &FeatureBundle) -> Vec<&str> {
        let exact = self
            .segments
            .iter()
            .filter(|def| def.bundle == *bundle)
            .map(|def| def.representation.as_str());
        let covered = self
            .segments
            .iter()
            .filter(|def| def.bundle != *bundle && bundle.unifies(&def.bundle))
            .map(|def| def.representation.as_str());
        exact.chain(covered).collect()
    }

    fn render_segment(&self, bundle: &FeatureBundle) -> &str {
        self.candidates(bundle)
            .first()
            .copied()
            .or_else(|| {
                self.segments
                    .iter()
                    .find(|def| def.bundle.unifies(bundle))
                    .map(|def| def.representation.as_str())
            })
            .unwrap_or("?")
    }

    /// Renders a shape, skipping deleted nodes and wrapping optional ones in
    /// parentheses.
    #[must_use]
    pub fn render(&self, shape: &PhoneticShape) -> String {
        let mut out = String::new();
        for node in shape.visible() {
            let text = match &node.kind {
                NodeKind::Segment(bundle) => self.render_segment(bundle),
                NodeKind::Boundary(repr) => repr.as_str(),
                NodeKind::Margin(_) => continue,
            };
            if node.optional {
                out.push('(');
                out.push_str(text);
                out.push(')');
            } else {
                out.push_str(text);
            }
        }
        out
    }

    /// Returns true if `word` is a possible surface rendering of `shape`.
    ///
    /// Each segment may be written as any definition it unifies with,
    /// boundaries and optional nodes may be omitted, and comparison ignores
    /// case.
    #[must_use]
    pub fn matches_surface(&self, shape: &PhoneticShape, word: &str) -> bool {
        let target: Vec<char> = word.to_lowercase().chars().collect();
        let mut reachable = BTreeSet::from([0usize]);
        for node in shape.visible() {
            let (options, skippable): (Vec<String>, bool) = match &node.kind {
                NodeKind::Segment(bundle) => (
                    self.candidates(bundle)
                        .into_iter()
                        .map(str::to_lowercase)
                        .collect(),
                    node.optional,
                ),
                NodeKind::Boundary(repr) => (vec![repr.to_lowercase()], true),
                NodeKind::Margin(_) => continue,
            };
            let mut next = BTreeSet::new();
            for &pos in &reachable {
                if skippable {
                    next.insert(pos);
                }
                for option in &options {
                    let option: Vec<char> = option.chars().collect();
                    if target[pos..].starts_with(&option) {
                        next.insert(pos + option.len());
                    }
                }
            }
            if next.is_empty() {
                return false;
            }
            reachable = next;
        }
        reachable.contains(&target.len())
    }
}
