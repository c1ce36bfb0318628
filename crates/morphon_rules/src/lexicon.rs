//! Lexicon model.
//!
//! A [`LexEntry`] is a root morpheme: its part of speech, head and foot
//! features, MPR features, one or more [`RootAllomorph`]s, and optional
//! [`InflectedStem`]s that realize morphosyntactic features directly.
//! [`AllomorphConstraints`] are shared by root allomorphs and affix
//! allomorphs and are checked once synthesis has finished.

use std::collections::BTreeSet;
use std::sync::Arc;

use morphon_foundation::{FeatureId, FeatureValues, Result, VariableValues};
use morphon_phonetics::{
    CharacterDefinitionTable, Direction, MatchOptions, Matcher, NodeId, Pattern, PhoneticShape,
};

// =============================================================================
// Allomorph Constraints
// =============================================================================

/// Left and right contexts an allomorph must appear between.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllomorphEnvironment {
    left: Pattern,
    right: Pattern,
}

impl AllomorphEnvironment {
    /// Creates an environment. Either side may be empty.
    #[must_use]
    pub fn new(left: Pattern, right: Pattern) -> Self {
        Self { left, right }
    }

    /// Returns the left context.
    #[must_use]
    pub fn left(&self) -> &Pattern {
        &self.left
    }

    /// Returns the right context.
    #[must_use]
    pub fn right(&self) -> &Pattern {
        &self.right
    }

    /// Returns true if the contexts match around the span `first..=last`.
    ///
    /// The left context is matched right to left from the node before
    /// `first`; the right context left to right from the node after `last`.
    #[must_use]
    pub fn matches(&self, shape: &PhoneticShape, first: NodeId, last: NodeId) -> bool {
        let empty = VariableValues::new();
        let left_ok = self.left.is_empty()
            || shape.prev(first).is_some_and(|before| {
                Matcher::new(&self.left, MatchOptions::synthesis(Direction::RightToLeft))
                    .is_match(shape, before, &empty)
            });
        let right_ok = self.right.is_empty()
            || shape.next(last).is_some_and(|after| {
                Matcher::new(&self.right, MatchOptions::synthesis(Direction::LeftToRight))
                    .is_match(shape, after, &empty)
            });
        left_ok && right_ok
    }
}

/// Where a co-occurring morpheme must (or must not) appear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Adjacency {
    /// Anywhere in the word.
    #[default]
    Anywhere,
    /// Anywhere to the left.
    SomewhereToLeft,
    /// Anywhere to the right.
    SomewhereToRight,
    /// Immediately to the left.
    AdjacentToLeft,
    /// Immediately to the right.
    AdjacentToRight,
}

impl Adjacency {
    fn holds(self, index: usize, other: usize) -> bool {
        match self {
            Self::Anywhere => other != index,
            Self::SomewhereToLeft => other < index,
            Self::SomewhereToRight => other > index,
            Self::AdjacentToLeft => other + 1 == index,
            Self::AdjacentToRight => other == index + 1,
        }
    }
}

/// Whether a co-occurrence is required or excluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoOccurrenceKind {
    /// The other morpheme must be present.
    Required,
    /// The other morpheme must be absent.
    Excluded,
}

/// A constraint on another morpheme appearing in the same word.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CoOccurrence {
    morpheme: String,
    adjacency: Adjacency,
    kind: CoOccurrenceKind,
}

impl CoOccurrence {
    /// The named morpheme must appear as described.
    #[must_use]
    pub fn required(morpheme: impl Into<String>, adjacency: Adjacency) -> Self {
        Self {
            morpheme: morpheme.into(),
            adjacency,
            kind: CoOccurrenceKind::Required,
        }
    }

    /// The named morpheme must not appear as described.
    #[must_use]
    pub fn excluded(morpheme: impl Into<String>, adjacency: Adjacency) -> Self {
        Self {
            morpheme: morpheme.into(),
            adjacency,
            kind: CoOccurrenceKind::Excluded,
        }
    }

    /// Returns the other morpheme's id.
    #[must_use]
    pub fn morpheme(&self) -> &str {
        &self.morpheme
    }

    /// Returns the kind.
    #[must_use]
    pub fn kind(&self) -> CoOccurrenceKind {
        self.kind
    }

    /// Checks the constraint for the morph at `index` of a word whose
    /// morphemes, in surface order, are `morphemes`.
    #[must_use]
    pub fn check(&self, morphemes: &[&str], index: usize) -> bool {
        let found = morphemes
            .iter()
            .enumerate()
            .any(|(other, id)| *id == self.morpheme && self.adjacency.holds(index, other));
        match self.kind {
            CoOccurrenceKind::Required => found,
            CoOccurrenceKind::Excluded => !found,
        }
    }
}

/// Conditions an allomorph places on the word it appears in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllomorphConstraints {
    /// Environments; at least one must match when any are given.
    pub environments: Vec<AllomorphEnvironment>,
    /// Morpheme co-occurrence constraints; all must hold.
    pub co_occurrences: Vec<CoOccurrence>,
    /// MPR features the word must carry.
    pub required_mpr: BTreeSet<String>,
    /// MPR features the word must not carry.
    pub excluded_mpr: BTreeSet<String>,
}

impl AllomorphConstraints {
    /// Creates an unconstrained set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an environment.
    #[must_use]
    pub fn with_environment(mut self, environment: AllomorphEnvironment) -> Self {
        self.environments.push(environment);
        self
    }

    /// Adds a co-occurrence constraint.
    #[must_use]
    pub fn with_co_occurrence(mut self, constraint: CoOccurrence) -> Self {
        self.co_occurrences.push(constraint);
        self
    }

    /// Requires an MPR feature.
    #[must_use]
    pub fn with_required_mpr(mut self, feature: impl Into<String>) -> Self {
        self.required_mpr.insert(feature.into());
        self
    }

    /// Excludes an MPR feature.
    #[must_use]
    pub fn with_excluded_mpr(mut self, feature: impl Into<String>) -> Self {
        self.excluded_mpr.insert(feature.into());
        self
    }

    /// Returns true if there is nothing to check.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
            && self.co_occurrences.is_empty()
            && self.required_mpr.is_empty()
            && self.excluded_mpr.is_empty()
    }

    /// Returns true if the MPR features of a word satisfy this set.
    pub fn mpr_satisfied<'a, I>(&self, word_mpr: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        let present: BTreeSet<&str> = word_mpr.into_iter().map(String::as_str).collect();
        self.required_mpr.iter().all(|f| present.contains(f.as_str()))
            && self.excluded_mpr.iter().all(|f| !present.contains(f.as_str()))
    }

    /// Returns true if some environment matches around `first..=last`.
    #[must_use]
    pub fn environment_satisfied(&self, shape: &PhoneticShape, first: NodeId, last: NodeId) -> bool {
        self.environments.is_empty()
            || self
                .environments
                .iter()
                .any(|env| env.matches(shape, first, last))
    }
}

// =============================================================================
// Lexical Entries
// =============================================================================

/// One phonological form of a root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootAllomorph {
    representation: String,
    shape: PhoneticShape,
    constraints: Arc<AllomorphConstraints>,
}

impl RootAllomorph {
    /// Tokenizes `representation` with `table`.
    ///
    /// # Errors
    ///
    /// Returns an invalid shape error if the form cannot be tokenized.
    pub fn new(table: &CharacterDefinitionTable, representation: &str) -> Result<Self> {
        Ok(Self {
            representation: representation.to_string(),
            shape: table.to_shape(representation)?,
            constraints: Arc::new(AllomorphConstraints::default()),
        })
    }

    /// Attaches constraints.
    #[must_use]
    pub fn with_constraints(mut self, constraints: AllomorphConstraints) -> Self {
        self.constraints = Arc::new(constraints);
        self
    }

    /// Returns the written form.
    #[must_use]
    pub fn representation(&self) -> &str {
        &self.representation
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &PhoneticShape {
        &self.shape
    }

    /// Returns the constraints.
    #[must_use]
    pub fn constraints(&self) -> &Arc<AllomorphConstraints> {
        &self.constraints
    }
}

/// A listed stem that realizes some morphosyntactic features by itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InflectedStem {
    representation: String,
    shape: PhoneticShape,
    features: FeatureValues,
}

impl InflectedStem {
    /// Tokenizes `representation` with `table`.
    ///
    /// # Errors
    ///
    /// Returns an invalid shape error if the form cannot be tokenized.
    pub fn new(
        table: &CharacterDefinitionTable,
        representation: &str,
        features: FeatureValues,
    ) -> Result<Self> {
        Ok(Self {
            representation: representation.to_string(),
            shape: table.to_shape(representation)?,
            features,
        })
    }

    /// Returns the written form.
    #[must_use]
    pub fn representation(&self) -> &str {
        &self.representation
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &PhoneticShape {
        &self.shape
    }

    /// Returns the features the stem realizes.
    #[must_use]
    pub fn features(&self) -> &FeatureValues {
        &self.features
    }
}

/// A root morpheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexEntry {
    id: String,
    gloss: String,
    pos: String,
    head: FeatureValues,
    foot: FeatureValues,
    mpr: BTreeSet<String>,
    obligatory_head: Vec<FeatureId>,
    allomorphs: Vec<RootAllomorph>,
    stems: Vec<InflectedStem>,
}

impl LexEntry {
    /// Creates an entry with no allomorphs.
    #[must_use]
    pub fn new(id: impl Into<String>, pos: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            gloss: id.clone(),
            id,
            pos: pos.into(),
            head: FeatureValues::new(),
            foot: FeatureValues::new(),
            mpr: BTreeSet::new(),
            obligatory_head: Vec::new(),
            allomorphs: Vec::new(),
            stems: Vec::new(),
        }
    }

    /// Sets the gloss.
    #[must_use]
    pub fn with_gloss(mut self, gloss: impl Into<String>) -> Self {
        self.gloss = gloss.into();
        self
    }

    /// Sets the head features.
    #[must_use]
    pub fn with_head(mut self, head: FeatureValues) -> Self {
        self.head = head;
        self
    }

    /// Sets the foot features.
    #[must_use]
    pub fn with_foot(mut self, foot: FeatureValues) -> Self {
        self.foot = foot;
        self
    }

    /// Adds an MPR feature.
    #[must_use]
    pub fn with_mpr(mut self, feature: impl Into<String>) -> Self {
        self.mpr.insert(feature.into());
        self
    }

    /// Requires a head feature to be present once synthesis finishes.
    #[must_use]
    pub fn with_obligatory_head(mut self, feature: FeatureId) -> Self {
        self.obligatory_head.push(feature);
        self
    }

    /// Adds an allomorph. Allomorphs earlier in the list take precedence.
    #[must_use]
    pub fn with_allomorph(mut self, allomorph: RootAllomorph) -> Self {
        self.allomorphs.push(allomorph);
        self
    }

    /// Adds an inflected stem.
    #[must_use]
    pub fn with_stem(mut self, stem: InflectedStem) -> Self {
        self.stems.push(stem);
        self
    }

    /// Returns the id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the gloss.
    #[must_use]
    pub fn gloss(&self) -> &str {
        &self.gloss
    }

    /// Returns the part of speech.
    #[must_use]
    pub fn pos(&self) -> &str {
        &self.pos
    }

    /// Returns the head features.
    #[must_use]
    pub fn head(&self) -> &FeatureValues {
        &self.head
    }

    /// Returns the foot features.
    #[must_use]
    pub fn foot(&self) -> &FeatureValues {
        &self.foot
    }

    /// Returns the MPR features.
    #[must_use]
    pub fn mpr(&self) -> &BTreeSet<String> {
        &self.mpr
    }

    /// Returns the obligatory head features.
    #[must_use]
    pub fn obligatory_head(&self) -> &[FeatureId] {
        &self.obligatory_head
    }

    /// Returns the allomorphs in precedence order.
    #[must_use]
    pub fn allomorphs(&self) -> &[RootAllomorph] {
        &self.allomorphs
    }

    /// Returns the inflected stems.
    #[must_use]
    pub fn stems(&self) -> &[InflectedStem] {
        &self.stems
    }

    /// Picks the most specific stem whose features are all pending.
    ///
    /// Returns the stem index and the features left to realize.
    #[must_use]
    pub fn select_stem(&self, pending: &FeatureValues) -> Option<(usize, FeatureValues)> {
        self.stems
            .iter()
            .enumerate()
            .filter_map(|(index, stem)| {
                pending
                    .superset_remainder(&stem.features)
                    .map(|rest| (index, stem.features.value_count(), rest))
            })
            .max_by_key(|(index, count, _)| (*count, std::cmp::Reverse(*index)))
            .map(|(index, _, rest)| (index, rest))
    }
}
