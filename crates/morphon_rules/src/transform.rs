//! Morphological transforms.
//!
//! A [`Transform`] maps an input described by a list of LHS patterns (one
//! per partition) to an output built by a list of [`OutputOp`]s: copy a
//! partition, copy it with modified features, or insert new material.
//! Prefixes, suffixes, infixes, and reduplication are all transforms.
//!
//! Synthesis matches the LHS and builds the output. Analysis matches the
//! output template and rebuilds the input, reconstructing any partition the
//! output never copied as optional underspecified segments.

use morphon_foundation::{Error, FeatureBundle, FeatureSystem, Result, VariableValues};
use morphon_phonetics::{
    BoundaryContext, CharacterDefinitionTable, Direction, Match, MarginSide, MatchOptions, Matcher,
    NaturalClass, NestedPattern, NodeKind, Pattern, PatternNode, PhoneticShape, SegmentContext,
    ShapeNode,
};

// =============================================================================
// Output Operations
// =============================================================================

/// Literal affix material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffixSegments {
    representation: String,
    nodes: Vec<ShapeNode>,
    pattern: Pattern,
}

impl AffixSegments {
    /// Tokenizes `representation` with `table`.
    ///
    /// # Errors
    ///
    /// Returns an invalid shape error if the material cannot be tokenized.
    pub fn new(system: &FeatureSystem, table: &CharacterDefinitionTable, representation: &str) -> Result<Self> {
        let nodes = table.to_nodes(representation)?;
        let mut pattern = Pattern::new();
        for node in &nodes {
            match &node.kind {
                NodeKind::Segment(bundle) => {
                    let repr = table.candidates(bundle).first().copied().unwrap_or("?");
                    pattern.push(
                        PatternNode::Segment(SegmentContext::from_bundle(system, repr, *bundle)),
                        None,
                    );
                }
                NodeKind::Boundary(repr) => {
                    pattern.push(PatternNode::Boundary(BoundaryContext::new(repr.clone())), None);
                }
                NodeKind::Margin(_) => {}
            }
        }
        Ok(Self {
            representation: representation.to_string(),
            nodes,
            pattern,
        })
    }

    /// Returns the written form.
    #[must_use]
    pub fn representation(&self) -> &str {
        &self.representation
    }

    /// Returns the nodes inserted during synthesis.
    #[must_use]
    pub fn nodes(&self) -> &[ShapeNode] {
        &self.nodes
    }
}

/// One step of building a transform's output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputOp {
    /// Copy an input partition.
    Copy(usize),
    /// Copy an input partition, overwriting features with a class.
    Modify(usize, NaturalClass),
    /// Insert literal segments.
    Insert(AffixSegments),
    /// Insert one segment described by a natural class.
    InsertClass(NaturalClass),
}

impl OutputOp {
    fn source(&self) -> Option<usize> {
        match self {
            Self::Copy(p) | Self::Modify(p, _) => Some(*p),
            Self::Insert(_) | Self::InsertClass(_) => None,
        }
    }
}

/// Where a transform's new material goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AffixKind {
    /// Inserted material precedes every copy.
    Prefix,
    /// Inserted material follows every copy.
    Suffix,
    /// Anything else: infixes, circumfixes, pure reduplication, modification.
    Implicit,
}

// =============================================================================
// Transform
// =============================================================================

/// An input-to-output mapping for one morphological allomorph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transform {
    lhs: Vec<Pattern>,
    rhs: Vec<OutputOp>,
    kind: AffixKind,
    canonical: Vec<bool>,
    input: Pattern,
    template: Pattern,
}

/// A pattern matching any run of segments, including none.
#[must_use]
pub fn any_segments(system: &FeatureSystem) -> Pattern {
    let any = NaturalClass::from_bundle(system, "any", FeatureBundle::EMPTY);
    Pattern::new().nested(Pattern::new().class(any), 0, None)
}

impl Transform {
    /// Creates a transform.
    ///
    /// # Errors
    ///
    /// Returns an invalid rule error if an operation copies a partition the
    /// LHS does not define.
    pub fn new(system: &FeatureSystem, lhs: Vec<Pattern>, rhs: Vec<OutputOp>) -> Result<Self> {
        if let Some(bad) = rhs.iter().filter_map(OutputOp::source).find(|p| *p >= lhs.len()) {
            return Err(Error::invalid_rule(format!(
                "output copies partition {bad} but the input has {}",
                lhs.len()
            )));
        }

        let first_copy = rhs.iter().position(|op| op.source().is_some());
        let last_copy = rhs.iter().rposition(|op| op.source().is_some());
        let kind = match (first_copy, last_copy) {
            (Some(first), Some(last)) => {
                let before = rhs[..first].iter().any(|op| op.source().is_none());
                let after = rhs[last + 1..].iter().any(|op| op.source().is_none());
                match (before, after) {
                    (true, false) => AffixKind::Prefix,
                    (false, true) => AffixKind::Suffix,
                    _ => AffixKind::Implicit,
                }
            }
            _ => AffixKind::Implicit,
        };

        let mut canonical = vec![false; rhs.len()];
        for p in 0..lhs.len() {
            let mut copies = rhs
                .iter()
                .enumerate()
                .filter(|(_, op)| op.source() == Some(p))
                .map(|(index, _)| index);
            let chosen = if kind == AffixKind::Prefix {
                copies.next_back()
            } else {
                copies.next()
            };
            if let Some(index) = chosen {
                canonical[index] = true;
            }
        }

        let mut input = Pattern::new().margin(MarginSide::Left);
        for (p, pattern) in lhs.iter().enumerate() {
            input.append(pattern, Some(p));
        }
        let input = input.margin(MarginSide::Right);

        let mut template = Pattern::new().margin(MarginSide::Left);
        for (index, op) in rhs.iter().enumerate() {
            match op {
                OutputOp::Copy(p) => template.append(&lhs[*p], Some(index)),
                OutputOp::Modify(p, class) => template.append(&modified(system, &lhs[*p], class), Some(index)),
                OutputOp::Insert(segments) => template.append(&segments.pattern, Some(index)),
                OutputOp::InsertClass(class) => template.push(PatternNode::NaturalClass(class.clone()), Some(index)),
            }
        }
        let template = template.margin(MarginSide::Right);

        Ok(Self {
            lhs,
            rhs,
            kind,
            canonical,
            input,
            template,
        })
    }

    /// A prefix attaching literal material before the whole stem.
    ///
    /// # Errors
    ///
    /// Returns an invalid shape error if the material cannot be tokenized.
    pub fn prefix(system: &FeatureSystem, table: &CharacterDefinitionTable, representation: &str) -> Result<Self> {
        let affix = AffixSegments::new(system, table, representation)?;
        Self::new(system, vec![any_segments(system)], vec![OutputOp::Insert(affix), OutputOp::Copy(0)])
    }

    /// A suffix attaching literal material after the whole stem.
    ///
    /// # Errors
    ///
    /// Returns an invalid shape error if the material cannot be tokenized.
    pub fn suffix(system: &FeatureSystem, table: &CharacterDefinitionTable, representation: &str) -> Result<Self> {
        let affix = AffixSegments::new(system, table, representation)?;
        Self::new(system, vec![any_segments(system)], vec![OutputOp::Copy(0), OutputOp::Insert(affix)])
    }

    /// Returns the LHS patterns.
    #[must_use]
    pub fn lhs(&self) -> &[Pattern] {
        &self.lhs
    }

    /// Returns the output operations.
    #[must_use]
    pub fn rhs(&self) -> &[OutputOp] {
        &self.rhs
    }

    /// Returns the affix kind.
    #[must_use]
    pub fn kind(&self) -> AffixKind {
        self.kind
    }

    /// Returns true if output op `index` is the canonical copy of its
    /// partition. Other copies are reduplicants.
    #[must_use]
    pub fn is_canonical(&self, index: usize) -> bool {
        self.canonical.get(index).copied().unwrap_or(false)
    }

    /// Builds the output for `shape`, attributing new material to `morph`.
    ///
    /// Returns `None` if the input does not match.
    ///
    /// # Errors
    ///
    /// Returns an uninstantiated feature error if an output variable was
    /// never bound, or a capacity error if the output overflows.
    pub fn apply(&self, shape: &PhoneticShape, morph: usize) -> Result<Option<PhoneticShape>> {
        let matcher = Matcher::new(&self.input, MatchOptions::synthesis(Direction::LeftToRight));
        let Some(found) = matcher.first_match(shape, shape.first(), &VariableValues::new()) else {
            return Ok(None);
        };
        let mut vars = found.variables().clone();
        vars.remove_ambiguous();

        let mut output = PhoneticShape::new();
        for (index, op) in self.rhs.iter().enumerate() {
            match op {
                OutputOp::Copy(p) | OutputOp::Modify(p, _) => {
                    let tag = if self.is_canonical(index) { None } else { Some(morph) };
                    for mut node in partition_nodes(shape, &found, *p) {
                        if let OutputOp::Modify(_, class) = op {
                            if let Some(bundle) = node.bundle_mut() {
                                bundle.apply(&class.mask(), false);
                                bundle.apply(&class.bundle(), true);
                                vars.apply_to(bundle, class.variables())?;
                            }
                        }
                        if tag.is_some() {
                            node.morph = tag;
                        }
                        node.partition = None;
                        output.push_back(node)?;
                    }
                }
                OutputOp::Insert(segments) => {
                    for node in &segments.nodes {
                        output.push_back(node.clone().with_morph(Some(morph)))?;
                    }
                }
                OutputOp::InsertClass(class) => {
                    let mut bundle = class.bundle();
                    vars.apply_to(&mut bundle, class.variables())?;
                    output.push_back(ShapeNode::segment(bundle).with_morph(Some(morph)))?;
                }
            }
        }
        Ok(Some(output))
    }

    /// Rebuilds every input `shape` could have been produced from.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if a reconstruction overflows.
    pub fn unapply(&self, shape: &PhoneticShape) -> Result<Vec<PhoneticShape>> {
        let matcher = Matcher::new(&self.template, MatchOptions::analysis(Direction::LeftToRight));
        let mut results: Vec<PhoneticShape> = Vec::new();
        for found in matcher.match_at(shape, shape.first(), &VariableValues::new()) {
            let mut output = PhoneticShape::new();
            for (p, pattern) in self.lhs.iter().enumerate() {
                let canonical = self
                    .rhs
                    .iter()
                    .enumerate()
                    .find(|(index, op)| op.source() == Some(p) && self.is_canonical(*index));
                match canonical {
                    Some((index, op)) => {
                        for mut node in partition_nodes(shape, &found, index) {
                            if let (OutputOp::Modify(_, class), Some(bundle)) = (op, node.bundle_mut()) {
                                bundle.apply(&class.mask(), true);
                            }
                            node.partition = None;
                            node.morph = None;
                            output.push_back(node)?;
                        }
                    }
                    None => output.extend(reconstruct(pattern))?,
                }
            }
            if !results.contains(&output) {
                results.push(output);
            }
        }
        Ok(results)
    }
}

fn partition_nodes(shape: &PhoneticShape, found: &Match, partition: usize) -> Vec<ShapeNode> {
    let ids = found.partition(partition);
    match (ids.first(), ids.last()) {
        (Some(first), Some(last)) => shape.copy_span(*first, *last),
        _ => Vec::new(),
    }
}

/// Optional underspecified segments standing in for an uncopied partition.
fn reconstruct(pattern: &Pattern) -> Vec<ShapeNode> {
    let mut nodes = Vec::new();
    for item in pattern.items() {
        match &item.node {
            PatternNode::Nested(nested) => {
                let reps = nested.max().unwrap_or(nested.min() + 1);
                for _ in 0..reps {
                    nodes.extend(reconstruct(nested.pattern()));
                }
            }
            node => {
                if let Some(open) = node.open() {
                    nodes.push(ShapeNode::segment(open).with_optional(true));
                }
            }
        }
    }
    nodes
}

/// The pattern a partition matches once `class` has overwritten it.
fn modified(system: &FeatureSystem, pattern: &Pattern, class: &NaturalClass) -> Pattern {
    let rewrite = |bundle: FeatureBundle| {
        let mut out = bundle;
        out.apply(&class.mask(), false);
        out.apply(&class.bundle(), true);
        out
    };
    let mut result = Pattern::new();
    for item in pattern.items() {
        let node = match &item.node {
            PatternNode::Segment(ctx) => PatternNode::Segment(SegmentContext::from_bundle(
                system,
                ctx.representation(),
                rewrite(ctx.bundle()),
            )),
            PatternNode::NaturalClass(nc) => {
                let mut rebuilt = NaturalClass::from_bundle(system, nc.name(), rewrite(nc.bundle()));
                for constraint in nc.variables() {
                    if constraint.variable.mask().disjoint(&class.mask()) {
                        rebuilt = rebuilt.with_variable(constraint.clone());
                    }
                }
                PatternNode::NaturalClass(rebuilt)
            }
            PatternNode::Nested(nested) => PatternNode::Nested(NestedPattern::new(
                modified(system, nested.pattern(), class),
                nested.min(),
                nested.max(),
            )),
            other => other.clone(),
        };
        result.push(node, item.partition);
    }
    result
}
