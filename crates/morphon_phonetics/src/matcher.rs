//! Pattern matching over phonetic shapes.
//!
//! [`Matcher`] runs a [`Pattern`] against a [`PhoneticShape`] from a start
//! node in one direction and returns every match, best first. Matching is a
//! depth-first expansion over pattern items; quantified sub-patterns use a
//! breadth-first worklist so each repetition count is explored once per
//! terminal node.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet, VecDeque};

use morphon_foundation::{BindingStrategy, FeatureBundle, VariableConstraint, VariableValues};

use crate::pattern::{BoundaryContext, NestedPattern, Pattern, PatternItem, PatternNode};
use crate::shape::{Direction, MarginSide, NodeId, NodeKind, PhoneticShape};

// =============================================================================
// Options
// =============================================================================

/// Whether the matcher serves analysis or synthesis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Shapes are underspecified and may hold optional nodes.
    Analysis,
    /// Shapes are fully specified.
    Synthesis,
}

/// Matcher configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatchOptions {
    /// Traversal direction.
    pub direction: Direction,
    /// Analysis or synthesis.
    pub mode: MatchMode,
    /// The pattern describes material a rule rewrites.
    pub target: bool,
    /// Segments rewritten earlier in the current pass do not match.
    pub require_clean: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            direction: Direction::LeftToRight,
            mode: MatchMode::Synthesis,
            target: false,
            require_clean: false,
        }
    }
}

impl MatchOptions {
    /// Options for a synthesis environment matched in `direction`.
    #[must_use]
    pub fn synthesis(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    /// Options for an analysis environment matched in `direction`.
    #[must_use]
    pub fn analysis(direction: Direction) -> Self {
        Self {
            direction,
            mode: MatchMode::Analysis,
            ..Self::default()
        }
    }

    /// Sets the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Marks the pattern as a rewrite target.
    #[must_use]
    pub fn with_target(mut self, target: bool) -> Self {
        self.target = target;
        self
    }

    /// Requires clean segments.
    #[must_use]
    pub fn with_require_clean(mut self, require_clean: bool) -> Self {
        self.require_clean = require_clean;
        self
    }

    fn skips_boundaries(&self) -> bool {
        self.mode == MatchMode::Analysis || !self.target
    }

    fn strategy(&self) -> BindingStrategy {
        if self.mode == MatchMode::Synthesis && self.target {
            BindingStrategy::First
        } else {
            BindingStrategy::Enumerate
        }
    }
}

// =============================================================================
// Match
// =============================================================================

/// One way a pattern matched a shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    nodes: Vec<NodeId>,
    partitions: BTreeMap<usize, Vec<NodeId>>,
    variables: VariableValues,
    next: Option<NodeId>,
    greedy: usize,
}

impl Match {
    /// Returns the matched nodes in shape order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Returns the nodes captured into `partition`, in shape order.
    #[must_use]
    pub fn partition(&self, partition: usize) -> &[NodeId] {
        self.partitions
            .get(&partition)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns every captured partition.
    #[must_use]
    pub fn partitions(&self) -> &BTreeMap<usize, Vec<NodeId>> {
        &self.partitions
    }

    /// Returns the variable bindings produced by the match.
    #[must_use]
    pub fn variables(&self) -> &VariableValues {
        &self.variables
    }

    /// Consumes the match, returning its bindings.
    #[must_use]
    pub fn into_variables(self) -> VariableValues {
        self.variables
    }

    /// Returns the number of matched nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true for a zero-length match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the leftmost matched node.
    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    /// Returns the rightmost matched node.
    #[must_use]
    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Returns the node the traversal would examine after this match.
    #[must_use]
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Returns the number of nodes captured by greedy partitions.
    #[must_use]
    pub fn greedy_len(&self) -> usize {
        self.greedy
    }
}

#[derive(Clone, Debug)]
struct Partial {
    pos: Option<NodeId>,
    nodes: Vec<NodeId>,
    partitions: BTreeMap<usize, Vec<NodeId>>,
    vars: VariableValues,
}

impl Partial {
    fn consume(&self, id: NodeId, next: Option<NodeId>, partition: Option<usize>) -> Self {
        let mut out = self.clone();
        out.pos = next;
        out.nodes.push(id);
        if let Some(p) = partition {
            out.partitions.entry(p).or_default().push(id);
        }
        out
    }
}

// =============================================================================
// Matcher
// =============================================================================

/// Matches one pattern with fixed options.
#[derive(Clone, Copy, Debug)]
pub struct Matcher<'p> {
    pattern: &'p Pattern,
    options: MatchOptions,
}

impl<'p> Matcher<'p> {
    /// Creates a matcher.
    #[must_use]
    pub fn new(pattern: &'p Pattern, options: MatchOptions) -> Self {
        Self { pattern, options }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// Returns every match starting at `start`, best first.
    ///
    /// Longer matches come first, then matches capturing more nodes in
    /// greedy partitions, then discovery order.
    #[must_use]
    pub fn match_at(&self, shape: &PhoneticShape, start: NodeId, vars: &VariableValues) -> Vec<Match> {
        let items = self.ordered(self.pattern.items());
        let initial = Partial {
            pos: Some(start),
            nodes: Vec::new(),
            partitions: BTreeMap::new(),
            vars: vars.clone(),
        };
        let mut partials = Vec::new();
        self.match_items(shape, &items, initial, &mut partials);

        let mut seen = HashSet::new();
        let mut matches: Vec<Match> = partials
            .into_iter()
            .filter(|p| seen.insert((p.nodes.clone(), p.partitions.clone(), p.vars.clone())))
            .map(|p| self.finish(p))
            .collect();
        matches.sort_by_key(|m| (Reverse(m.nodes.len()), Reverse(m.greedy)));
        matches
    }

    /// Returns the best match starting at `start`.
    #[must_use]
    pub fn first_match(&self, shape: &PhoneticShape, start: NodeId, vars: &VariableValues) -> Option<Match> {
        self.match_at(shape, start, vars).into_iter().next()
    }

    /// Returns true if the pattern matches at `start`.
    #[must_use]
    pub fn is_match(&self, shape: &PhoneticShape, start: NodeId, vars: &VariableValues) -> bool {
        !self.match_at(shape, start, vars).is_empty()
    }

    /// Scans from `from` in the matcher's direction and returns the best
    /// match at the first position where the pattern matches.
    #[must_use]
    pub fn find(&self, shape: &PhoneticShape, from: NodeId, vars: &VariableValues) -> Option<Match> {
        let mut cur = Some(from);
        while let Some(id) = cur {
            if let Some(found) = self.first_match(shape, id, vars) {
                return Some(found);
            }
            cur = shape.step(id, self.options.direction);
        }
        None
    }

    fn ordered<'a>(&self, items: &'a [PatternItem]) -> Vec<&'a PatternItem> {
        match self.options.direction {
            Direction::LeftToRight => items.iter().collect(),
            Direction::RightToLeft => items.iter().rev().collect(),
        }
    }

    fn finish(&self, partial: Partial) -> Match {
        let Partial {
            pos,
            mut nodes,
            mut partitions,
            vars,
        } = partial;
        if self.options.direction == Direction::RightToLeft {
            nodes.reverse();
            for list in partitions.values_mut() {
                list.reverse();
            }
        }
        let greedy = self
            .pattern
            .greedy()
            .iter()
            .filter_map(|p| partitions.get(p))
            .map(Vec::len)
            .sum();
        Match {
            nodes,
            partitions,
            variables: vars,
            next: pos,
            greedy,
        }
    }

    fn match_items(
        &self,
        shape: &PhoneticShape,
        items: &[&PatternItem],
        partial: Partial,
        out: &mut Vec<Partial>,
    ) {
        let Some((item, rest)) = items.split_first() else {
            out.push(partial);
            return;
        };
        let next = match &item.node {
            PatternNode::Segment(_) | PatternNode::NaturalClass(_) => {
                let Some((bundle, variables)) = item.node.constraint() else {
                    return;
                };
                self.match_simple(shape, &partial, &bundle, variables, item.partition)
            }
            PatternNode::Boundary(ctx) => self.match_boundary(shape, &partial, ctx, item.partition),
            PatternNode::Margin(side) => self.match_margin(shape, &partial, *side),
            PatternNode::Nested(nested) => self.match_nested(shape, partial, nested, item.partition),
        };
        for p in next {
            self.match_items(shape, rest, p, out);
        }
    }

    /// Nodes a simple context may be tested against from `pos`.
    fn positions(&self, shape: &PhoneticShape, pos: Option<NodeId>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = pos;
        while let Some(id) = cur {
            let node = &shape[id];
            let step = shape.step(id, self.options.direction);
            if node.deleted || (node.is_boundary() && self.options.skips_boundaries()) {
                cur = step;
                continue;
            }
            out.push(id);
            if node.optional && node.is_segment() && self.options.mode == MatchMode::Analysis {
                cur = step;
                continue;
            }
            break;
        }
        out
    }

    fn match_simple(
        &self,
        shape: &PhoneticShape,
        partial: &Partial,
        bundle: &FeatureBundle,
        variables: &[VariableConstraint],
        partition: Option<usize>,
    ) -> Vec<Partial> {
        let mut out = Vec::new();
        for id in self.positions(shape, partial.pos) {
            let node = &shape[id];
            let Some(segment) = node.bundle() else {
                continue;
            };
            if self.options.require_clean && !node.clean {
                continue;
            }
            if !segment.unifies(bundle) {
                continue;
            }
            let next = shape.step(id, self.options.direction);
            if variables.is_empty() {
                out.push(partial.consume(id, next, partition));
                continue;
            }
            for vars in partial.vars.resolve(segment, variables, self.options.strategy()) {
                let mut consumed = partial.consume(id, next, partition);
                consumed.vars = vars;
                out.push(consumed);
            }
        }
        out
    }

    fn skip_invisible(&self, shape: &PhoneticShape, pos: Option<NodeId>, boundaries: bool) -> Option<NodeId> {
        let mut cur = pos;
        while let Some(id) = cur {
            let node = &shape[id];
            let skip = node.deleted
                || (boundaries && node.is_boundary())
                || (node.optional && node.is_segment() && self.options.mode == MatchMode::Analysis);
            if !skip {
                return Some(id);
            }
            cur = shape.step(id, self.options.direction);
        }
        None
    }

    fn match_boundary(
        &self,
        shape: &PhoneticShape,
        partial: &Partial,
        ctx: &BoundaryContext,
        partition: Option<usize>,
    ) -> Vec<Partial> {
        let mut cur = partial.pos;
        while let Some(id) = cur {
            if !shape[id].deleted {
                break;
            }
            cur = shape.step(id, self.options.direction);
        }
        if let Some(id) = cur {
            if let NodeKind::Boundary(repr) = &shape[id].kind {
                if ctx.accepts(repr) {
                    let next = shape.step(id, self.options.direction);
                    return vec![partial.consume(id, next, partition)];
                }
            }
        }
        if self.options.mode == MatchMode::Analysis {
            vec![partial.clone()]
        } else {
            Vec::new()
        }
    }

    fn match_margin(&self, shape: &PhoneticShape, partial: &Partial, side: MarginSide) -> Vec<Partial> {
        let Some(id) = self.skip_invisible(shape, partial.pos, true) else {
            return Vec::new();
        };
        if shape[id].kind != NodeKind::Margin(side) {
            return Vec::new();
        }
        let mut out = partial.clone();
        out.pos = shape.step(id, self.options.direction);
        vec![out]
    }

    fn match_nested(
        &self,
        shape: &PhoneticShape,
        partial: Partial,
        nested: &NestedPattern,
        partition: Option<usize>,
    ) -> Vec<Partial> {
        let items = self.ordered(nested.pattern().items());
        let start_len = partial.nodes.len();
        let mut candidates = Vec::new();
        let mut terminals = HashSet::new();
        if nested.min() == 0 {
            terminals.insert(partial.nodes.last().copied());
            candidates.push(partial.clone());
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([(partial, 0usize)]);
        while let Some((current, count)) = queue.pop_front() {
            if nested.max().is_some_and(|max| count >= max) {
                continue;
            }
            let mut extensions = Vec::new();
            self.match_items(shape, &items, current.clone(), &mut extensions);
            for ext in extensions {
                if ext.nodes.len() == current.nodes.len() {
                    continue;
                }
                let reps = count + 1;
                let terminal = ext.nodes.last().copied();
                if !visited.insert((terminal, reps)) {
                    continue;
                }
                if reps >= nested.min() && terminals.insert(terminal) {
                    candidates.push(ext.clone());
                }
                queue.push_back((ext, reps));
            }
        }

        if let Some(p) = partition {
            for candidate in &mut candidates {
                let added: Vec<NodeId> = candidate.nodes[start_len..].to_vec();
                candidate.partitions.entry(p).or_default().extend(added);
            }
        }
        candidates
    }
}
