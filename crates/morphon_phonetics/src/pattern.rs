//! Phonetic patterns.
//!
//! A [`Pattern`] is a sequence of [`PatternItem`]s, each wrapping a
//! [`PatternNode`] and an optional partition (capture group) number. Patterns
//! are built once from a [`FeatureSystem`] and read-only afterwards; the
//! contexts precompute the masks unapplication needs so no system lookup
//! happens during a search.

use std::collections::BTreeSet;

use morphon_foundation::{FeatureBundle, FeatureSystem, Result, VariableConstraint};

use crate::chars::{CharacterDefinitionTable, SegmentDefinition};
use crate::shape::MarginSide;

// =============================================================================
// Contexts
// =============================================================================

const NO_VARIABLES: &[VariableConstraint] = &[];

fn specified_mask(system: &FeatureSystem, bundle: &FeatureBundle) -> FeatureBundle {
    system
        .specified_features(bundle)
        .into_iter()
        .fold(FeatureBundle::EMPTY, |acc, f| acc.union(&system.feature_mask(f)))
}

/// Matches one segment by identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentContext {
    representation: String,
    bundle: FeatureBundle,
    mask: FeatureBundle,
    open: FeatureBundle,
}

impl SegmentContext {
    /// Creates a context for a raw bundle.
    #[must_use]
    pub fn from_bundle(system: &FeatureSystem, representation: &str, bundle: FeatureBundle) -> Self {
        Self {
            representation: representation.to_string(),
            bundle,
            mask: specified_mask(system, &bundle),
            open: system.uninstantiated(&bundle),
        }
    }

    /// Creates a context for a segment definition.
    #[must_use]
    pub fn from_definition(system: &FeatureSystem, definition: &SegmentDefinition) -> Self {
        Self::from_bundle(system, definition.representation(), definition.bundle())
    }

    /// Creates a context for the segment a table defines for `representation`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table has no such segment.
    pub fn from_table(
        system: &FeatureSystem,
        table: &CharacterDefinitionTable,
        representation: &str,
    ) -> Result<Self> {
        Ok(Self::from_definition(system, table.require_segment(representation)?))
    }

    /// Returns the segment's surface string.
    #[must_use]
    pub fn representation(&self) -> &str {
        &self.representation
    }

    /// Returns the segment's features.
    #[must_use]
    pub fn bundle(&self) -> FeatureBundle {
        self.bundle
    }

    /// Returns every value of every feature the segment specifies.
    #[must_use]
    pub fn mask(&self) -> FeatureBundle {
        self.mask
    }

    /// Returns the segment with its unspecified features uninstantiated.
    #[must_use]
    pub fn open(&self) -> FeatureBundle {
        self.open
    }
}

/// Matches any segment carrying a set of features, with agreement variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NaturalClass {
    name: String,
    bundle: FeatureBundle,
    mask: FeatureBundle,
    open: FeatureBundle,
    variables: Vec<VariableConstraint>,
}

impl NaturalClass {
    /// Creates a class from feature value names.
    ///
    /// # Errors
    ///
    /// Returns an error if a value name is not registered.
    pub fn new(system: &FeatureSystem, name: &str, values: &[&str]) -> Result<Self> {
        Ok(Self::from_bundle(system, name, system.bundle(values)?))
    }

    /// Creates a class from a bundle.
    #[must_use]
    pub fn from_bundle(system: &FeatureSystem, name: &str, bundle: FeatureBundle) -> Self {
        Self {
            name: name.to_string(),
            bundle,
            mask: specified_mask(system, &bundle),
            open: system.uninstantiated(&bundle),
            variables: Vec::new(),
        }
    }

    /// Adds an agreement constraint.
    #[must_use]
    pub fn with_variable(mut self, constraint: VariableConstraint) -> Self {
        self.mask = self.mask.union(&constraint.variable.mask());
        self.open = self.open.union(&constraint.variable.mask());
        self.variables.push(constraint);
        self
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the required features.
    #[must_use]
    pub fn bundle(&self) -> FeatureBundle {
        self.bundle
    }

    /// Returns every value of every feature the class constrains, variables
    /// included.
    #[must_use]
    pub fn mask(&self) -> FeatureBundle {
        self.mask
    }

    /// Returns the class with its unconstrained features uninstantiated.
    #[must_use]
    pub fn open(&self) -> FeatureBundle {
        self.open
    }

    /// Returns the agreement constraints.
    #[must_use]
    pub fn variables(&self) -> &[VariableConstraint] {
        &self.variables
    }
}

/// Matches a boundary, optionally a specific one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundaryContext {
    representation: Option<String>,
}

impl BoundaryContext {
    /// Matches any boundary.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Matches the boundary with this representation.
    #[must_use]
    pub fn new(representation: impl Into<String>) -> Self {
        Self {
            representation: Some(representation.into()),
        }
    }

    /// Returns the required representation.
    #[must_use]
    pub fn representation(&self) -> Option<&str> {
        self.representation.as_deref()
    }

    /// Returns true if `repr` satisfies this context.
    #[must_use]
    pub fn accepts(&self, repr: &str) -> bool {
        self.representation.as_deref().is_none_or(|r| r == repr)
    }
}

/// A sub-pattern repeated between `min` and `max` times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NestedPattern {
    pattern: Pattern,
    min: usize,
    max: Option<usize>,
}

impl NestedPattern {
    /// Creates a quantified sub-pattern; `max = None` is unbounded.
    #[must_use]
    pub fn new(pattern: Pattern, min: usize, max: Option<usize>) -> Self {
        Self { pattern, min, max }
    }

    /// Returns the repeated pattern.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Returns the minimum repetition count.
    #[must_use]
    pub fn min(&self) -> usize {
        self.min
    }

    /// Returns the maximum repetition count.
    #[must_use]
    pub fn max(&self) -> Option<usize> {
        self.max
    }
}

// =============================================================================
// Pattern
// =============================================================================

/// One element of a pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternNode {
    /// A specific segment.
    Segment(SegmentContext),
    /// A natural class.
    NaturalClass(NaturalClass),
    /// A boundary.
    Boundary(BoundaryContext),
    /// A shape edge.
    Margin(MarginSide),
    /// A quantified sub-pattern.
    Nested(NestedPattern),
}

impl PatternNode {
    /// Returns the required bundle and variables of a simple context.
    #[must_use]
    pub fn constraint(&self) -> Option<(FeatureBundle, &[VariableConstraint])> {
        match self {
            Self::Segment(ctx) => Some((ctx.bundle, NO_VARIABLES)),
            Self::NaturalClass(nc) => Some((nc.bundle, nc.variables())),
            _ => None,
        }
    }

    /// Returns the constrained-feature mask of a simple context.
    #[must_use]
    pub fn mask(&self) -> Option<FeatureBundle> {
        match self {
            Self::Segment(ctx) => Some(ctx.mask),
            Self::NaturalClass(nc) => Some(nc.mask),
            _ => None,
        }
    }

    /// Returns the uninstantiated bundle of a simple context.
    #[must_use]
    pub fn open(&self) -> Option<FeatureBundle> {
        match self {
            Self::Segment(ctx) => Some(ctx.open),
            Self::NaturalClass(nc) => Some(nc.open),
            _ => None,
        }
    }
}

/// A pattern item: a node plus its capture group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternItem {
    /// The node.
    pub node: PatternNode,
    /// The partition number nodes matched by this item are captured into.
    pub partition: Option<usize>,
}

/// A sequence of pattern items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    items: Vec<PatternItem>,
    greedy: BTreeSet<usize>,
}

impl Pattern {
    /// Creates an empty pattern.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an uncaptured node.
    #[must_use]
    pub fn with(mut self, node: PatternNode) -> Self {
        self.push(node, None);
        self
    }

    /// Appends a node captured into `partition`.
    #[must_use]
    pub fn with_partition(mut self, partition: usize, node: PatternNode) -> Self {
        self.push(node, Some(partition));
        self
    }

    /// Appends a segment context.
    #[must_use]
    pub fn segment(self, context: SegmentContext) -> Self {
        self.with(PatternNode::Segment(context))
    }

    /// Appends a natural class.
    #[must_use]
    pub fn class(self, class: NaturalClass) -> Self {
        self.with(PatternNode::NaturalClass(class))
    }

    /// Appends a boundary context.
    #[must_use]
    pub fn boundary(self, context: BoundaryContext) -> Self {
        self.with(PatternNode::Boundary(context))
    }

    /// Appends a margin.
    #[must_use]
    pub fn margin(self, side: MarginSide) -> Self {
        self.with(PatternNode::Margin(side))
    }

    /// Appends a quantified sub-pattern.
    #[must_use]
    pub fn nested(self, pattern: Pattern, min: usize, max: Option<usize>) -> Self {
        self.with(PatternNode::Nested(NestedPattern::new(pattern, min, max)))
    }

    /// Marks a partition as greedy for match ordering.
    #[must_use]
    pub fn with_greedy(mut self, partition: usize) -> Self {
        self.greedy.insert(partition);
        self
    }

    /// Appends an item.
    pub fn push(&mut self, node: PatternNode, partition: Option<usize>) {
        self.items.push(PatternItem { node, partition });
    }

    /// Appends every item of `other`, captured into `partition` when given.
    pub fn append(&mut self, other: &Pattern, partition: Option<usize>) {
        for item in &other.items {
            self.items.push(PatternItem {
                node: item.node.clone(),
                partition: partition.or(item.partition),
            });
        }
        self.greedy.extend(other.greedy.iter().copied());
    }

    /// Returns the items in order.
    #[must_use]
    pub fn items(&self) -> &[PatternItem] {
        &self.items
    }

    /// Returns the greedy partitions.
    #[must_use]
    pub fn greedy(&self) -> &BTreeSet<usize> {
        &self.greedy
    }

    /// Returns the number of top-level items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the pattern has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the partition numbers used by top-level items, in order of
    /// first appearance.
    #[must_use]
    pub fn partitions(&self) -> Vec<usize> {
        let mut seen = Vec::new();
        for item in &self.items {
            if let Some(p) = item.partition {
                if !seen.contains(&p) {
                    seen.push(p);
                }
            }
        }
        seen
    }

    /// Returns true if every item is a simple context.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.items.iter().all(|item| item.node.constraint().is_some())
    }
}
