//! Phonological rules.
//!
//! A [`StandardRule`] rewrites an input pattern (the LHS) as one of several
//! disjunctive [`PhonologicalSubrule`]s, each with its own output (RHS),
//! environment, and conditions. The shape of the LHS/RHS pair decides what
//! the subrule does:
//!
//! | LHS | RHS | Kind |
//! |-----|-----|------|
//! | n | n | feature change |
//! | 0 | n | epenthesis |
//! | n | m < n | narrowing (deletion) |
//! | 1 | m > 1 | widening |
//!
//! A [`MetathesisRule`] reorders the partitions of a pattern instead.
//!
//! Synthesis applies a rule to a [`WordSynthesis`]; analysis unapplies it
//! from a [`WordAnalysis`]. Unapplication never branches: it rewrites the
//! shape into a less specified one that still covers every input the rule
//! could have produced it from.

use std::collections::BTreeSet;

use im::OrdSet;
use morphon_foundation::{Error, FeatureBundle, FeatureSystem, Result, VariableValues};
use morphon_phonetics::{
    Direction, Match, MatchMode, MatchOptions, Matcher, NodeId, NodeKind, Pattern, PatternItem,
    PatternNode, PhoneticShape, ShapeNode,
};
use tracing::trace;

use crate::word::{WordAnalysis, WordSynthesis};

// =============================================================================
// Shared Types
// =============================================================================

/// How a rule traverses the shape during synthesis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ApplicationOrder {
    /// Apply iteratively from the left edge.
    #[default]
    LeftToRight,
    /// Apply iteratively from the right edge.
    RightToLeft,
    /// Find every application on the input first, then apply them all.
    Simultaneous,
}

impl ApplicationOrder {
    fn direction(self) -> Direction {
        match self {
            Self::RightToLeft => Direction::RightToLeft,
            Self::LeftToRight | Self::Simultaneous => Direction::LeftToRight,
        }
    }
}

/// Part-of-speech and MPR conditions on a rule or subrule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleConditions {
    /// The word's part of speech must be one of these. Empty allows any.
    pub required_pos: BTreeSet<String>,
    /// MPR features the word must carry.
    pub required_mpr: BTreeSet<String>,
    /// MPR features that block the rule.
    pub excluded_mpr: BTreeSet<String>,
}

impl RuleConditions {
    /// Returns true if the word may undergo the rule.
    #[must_use]
    pub fn permits(&self, word: &WordSynthesis) -> bool {
        (self.required_pos.is_empty() || self.required_pos.contains(&word.pos))
            && self.required_mpr.iter().all(|f| word.mpr.contains(f))
            && !self.is_blocked(&word.mpr)
    }

    /// Returns true if some excluded MPR feature is present.
    #[must_use]
    pub fn is_blocked(&self, mpr: &OrdSet<String>) -> bool {
        self.excluded_mpr.iter().any(|f| mpr.contains(f))
    }

    /// Returns true if the analysis's part of speech constraint leaves room
    /// for the rule.
    #[must_use]
    pub fn permits_analysis(&self, analysis: &WordAnalysis) -> bool {
        self.required_pos.is_empty()
            || analysis.pos.is_empty()
            || self.required_pos.iter().any(|p| analysis.pos.contains(p))
    }
}

/// What a subrule does, derived from its LHS and RHS lengths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SubruleKind {
    /// Equal lengths: features change in place.
    #[default]
    FeatureChange,
    /// Empty LHS: segments are inserted.
    Epenthesis,
    /// Shorter RHS: trailing input segments are deleted.
    Narrowing,
    /// Single-segment LHS, longer RHS: one segment becomes several.
    Widening,
}

impl SubruleKind {
    fn classify(lhs: usize, rhs: usize) -> Result<Self> {
        match (lhs, rhs) {
            (0, 0) => Err(Error::invalid_rule("a subrule needs a non-empty input or output")),
            (0, _) => Ok(Self::Epenthesis),
            (l, r) if l == r => Ok(Self::FeatureChange),
            (l, r) if r < l => Ok(Self::Narrowing),
            (1, _) => Ok(Self::Widening),
            (l, r) => Err(Error::invalid_rule(format!(
                "cannot rewrite {l} segments as {r}"
            ))),
        }
    }
}

// =============================================================================
// Subrules
// =============================================================================

/// One disjunctive output of a [`StandardRule`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhonologicalSubrule {
    rhs: Pattern,
    left: Pattern,
    right: Pattern,
    conditions: RuleConditions,
    kind: SubruleKind,
    changes: Vec<FeatureBundle>,
}

impl PhonologicalSubrule {
    /// Creates a subrule producing `rhs` in any environment.
    #[must_use]
    pub fn new(rhs: Pattern) -> Self {
        Self {
            rhs,
            left: Pattern::new(),
            right: Pattern::new(),
            conditions: RuleConditions::default(),
            kind: SubruleKind::default(),
            changes: Vec::new(),
        }
    }

    /// Sets the left environment.
    #[must_use]
    pub fn with_left(mut self, left: Pattern) -> Self {
        self.left = left;
        self
    }

    /// Sets the right environment.
    #[must_use]
    pub fn with_right(mut self, right: Pattern) -> Self {
        self.right = right;
        self
    }

    /// Replaces the conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: RuleConditions) -> Self {
        self.conditions = conditions;
        self
    }

    /// Restricts the subrule to a part of speech.
    #[must_use]
    pub fn with_required_pos(mut self, pos: impl Into<String>) -> Self {
        self.conditions.required_pos.insert(pos.into());
        self
    }

    /// Requires an MPR feature.
    #[must_use]
    pub fn with_required_mpr(mut self, feature: impl Into<String>) -> Self {
        self.conditions.required_mpr.insert(feature.into());
        self
    }

    /// Blocks the subrule for words carrying an MPR feature.
    #[must_use]
    pub fn with_excluded_mpr(mut self, feature: impl Into<String>) -> Self {
        self.conditions.excluded_mpr.insert(feature.into());
        self
    }

    /// Returns the output pattern.
    #[must_use]
    pub fn rhs(&self) -> &Pattern {
        &self.rhs
    }

    /// Returns the left environment.
    #[must_use]
    pub fn left(&self) -> &Pattern {
        &self.left
    }

    /// Returns the right environment.
    #[must_use]
    pub fn right(&self) -> &Pattern {
        &self.right
    }

    /// Returns the conditions.
    #[must_use]
    pub fn conditions(&self) -> &RuleConditions {
        &self.conditions
    }

    /// Returns the kind. Only meaningful once added to a rule.
    #[must_use]
    pub fn kind(&self) -> SubruleKind {
        self.kind
    }

    fn rhs_node(&self, index: usize) -> Option<&PatternNode> {
        self.rhs.items().get(index).map(|item| &item.node)
    }

    fn change(&self, index: usize) -> FeatureBundle {
        self.changes.get(index).copied().unwrap_or_default()
    }

    /// Matches both environments around a target or gap.
    ///
    /// `before` is the node left of the target, `after` the node right of it.
    fn environment(
        &self,
        shape: &PhoneticShape,
        before: Option<NodeId>,
        after: Option<NodeId>,
        vars: &VariableValues,
        mode: MatchMode,
    ) -> Option<VariableValues> {
        let left_options = MatchOptions::synthesis(Direction::RightToLeft).with_mode(mode);
        let right_options = MatchOptions::synthesis(Direction::LeftToRight).with_mode(mode);
        let lefts: Vec<VariableValues> = if self.left.is_empty() {
            vec![vars.clone()]
        } else {
            let before = before?;
            Matcher::new(&self.left, left_options)
                .match_at(shape, before, vars)
                .into_iter()
                .map(Match::into_variables)
                .collect()
        };
        for bound in lefts {
            if self.right.is_empty() {
                return Some(bound);
            }
            let Some(after) = after else {
                continue;
            };
            if let Some(found) = Matcher::new(&self.right, right_options).first_match(shape, after, &bound) {
                return Some(found.into_variables());
            }
        }
        None
    }

    // -------------------------------------------------------------------------
    // Synthesis
    // -------------------------------------------------------------------------

    fn apply_match(&self, shape: &mut PhoneticShape, found: &Match, vars: &VariableValues) -> Result<()> {
        let nodes = found.nodes();
        match self.kind {
            SubruleKind::FeatureChange | SubruleKind::Narrowing => {
                for (index, &id) in nodes.iter().enumerate() {
                    match self.rhs_node(index) {
                        Some(node) => rewrite(shape, id, node, self.change(index), vars)?,
                        None => shape[id].deleted = true,
                    }
                }
            }
            SubruleKind::Widening => {
                let Some(&first) = nodes.first() else {
                    return Ok(());
                };
                let base = shape[first].bundle().copied().unwrap_or_default();
                let morph = shape[first].morph;
                if let Some(node) = self.rhs_node(0) {
                    rewrite(shape, first, node, self.change(0), vars)?;
                }
                let mut anchor = first;
                for (index, item) in self.rhs.items().iter().enumerate().skip(1) {
                    let bundle = realize(base, &item.node, self.change(index), vars)?;
                    anchor = shape.insert_after(anchor, ShapeNode::segment(bundle).with_morph(morph))?;
                    shape[anchor].clean = false;
                }
            }
            SubruleKind::Epenthesis => {}
        }
        Ok(())
    }

    fn insert_at(&self, shape: &mut PhoneticShape, anchor: NodeId, vars: &VariableValues) -> Result<()> {
        let morph = shape[anchor].morph.or_else(|| shape.next(anchor).and_then(|n| shape[n].morph));
        let mut at = anchor;
        for (index, item) in self.rhs.items().iter().enumerate() {
            let bundle = realize(FeatureBundle::EMPTY, &item.node, self.change(index), vars)?;
            at = shape.insert_after(at, ShapeNode::segment(bundle).with_morph(morph))?;
            shape[at].clean = false;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Analysis
    // -------------------------------------------------------------------------

    /// Unapplies the subrule everywhere it matches, visiting start nodes in
    /// `scan` order. Returns true if the shape changed.
    fn unapply_pass(
        &self,
        lhs: &Pattern,
        shape: &mut PhoneticShape,
        scan: Direction,
        simultaneous: bool,
    ) -> Result<bool> {
        if self.rhs.is_empty() {
            return self.unapply_gaps(lhs, shape);
        }
        let options = MatchOptions::analysis(Direction::LeftToRight)
            .with_target(true)
            .with_require_clean(simultaneous);
        let matcher = Matcher::new(&self.rhs, options);
        let empty = VariableValues::new();
        let end = shape.end(scan);
        let mut changed = false;
        let mut cur = shape.step(shape.begin(scan), scan);
        while let Some(start) = cur {
            if start == end {
                break;
            }
            let mut advanced = None;
            for found in matcher.match_at(shape, start, &empty) {
                let before = found.first().and_then(|f| shape.prev(f));
                if self
                    .environment(shape, before, found.next(), found.variables(), MatchMode::Analysis)
                    .is_some()
                {
                    changed |= self.unapply_match(lhs, shape, &found)?;
                    advanced = match scan {
                        Direction::LeftToRight => found.next(),
                        Direction::RightToLeft => shape.prev(start),
                    };
                    break;
                }
            }
            cur = match advanced {
                Some(next) => Some(next),
                None => shape.step(start, scan),
            };
        }
        Ok(changed)
    }

    fn unapply_match(&self, lhs: &Pattern, shape: &mut PhoneticShape, found: &Match) -> Result<bool> {
        let nodes = found.nodes();
        let mut changed = false;
        match self.kind {
            SubruleKind::FeatureChange => {
                for (index, &id) in nodes.iter().enumerate() {
                    changed |= uninstantiate(shape, id, self.change(index));
                }
            }
            SubruleKind::Epenthesis => {
                for &id in nodes {
                    changed |= make_optional(shape, id);
                }
            }
            SubruleKind::Widening => {
                for (index, &id) in nodes.iter().enumerate() {
                    changed |= if index == 0 {
                        uninstantiate(shape, id, self.change(0))
                    } else {
                        make_optional(shape, id)
                    };
                }
            }
            SubruleKind::Narrowing => {
                for (index, &id) in nodes.iter().enumerate() {
                    changed |= uninstantiate(shape, id, self.change(index));
                }
                if let Some(&last) = nodes.last() {
                    changed |= restore_deleted(lhs, self.rhs.len(), shape, last)?;
                }
            }
        }
        Ok(changed)
    }

    fn unapply_gaps(&self, lhs: &Pattern, shape: &mut PhoneticShape) -> Result<bool> {
        let empty = VariableValues::new();
        let mut changed = false;
        let mut anchor = Some(shape.first());
        while let Some(at) = anchor {
            if at == shape.last() {
                break;
            }
            let after = shape.next(at);
            if self
                .environment(shape, Some(at), after, &empty, MatchMode::Analysis)
                .is_some()
            {
                changed |= restore_deleted(lhs, 0, shape, at)?;
            }
            anchor = after;
        }
        Ok(changed)
    }
}

/// Writes an RHS node's values into the segment at `id`.
fn rewrite(
    shape: &mut PhoneticShape,
    id: NodeId,
    node: &PatternNode,
    change: FeatureBundle,
    vars: &VariableValues,
) -> Result<()> {
    let Some(base) = shape[id].bundle().copied() else {
        return Ok(());
    };
    let bundle = realize(base, node, change, vars)?;
    let target = &mut shape[id];
    target.kind = NodeKind::Segment(bundle);
    target.clean = false;
    Ok(())
}

/// Computes the bundle an RHS node turns `base` into.
fn realize(
    mut base: FeatureBundle,
    node: &PatternNode,
    change: FeatureBundle,
    vars: &VariableValues,
) -> Result<FeatureBundle> {
    base.apply(&change, false);
    match node {
        PatternNode::Segment(ctx) => base.apply(&ctx.bundle().intersection(&change), true),
        PatternNode::NaturalClass(class) => {
            base.apply(&class.bundle(), true);
            vars.apply_to(&mut base, class.variables())?;
        }
        _ => {}
    }
    Ok(base)
}

fn uninstantiate(shape: &mut PhoneticShape, id: NodeId, change: FeatureBundle) -> bool {
    let node = &mut shape[id];
    node.clean = false;
    let Some(bundle) = node.bundle_mut() else {
        return false;
    };
    let before = *bundle;
    bundle.apply(&change, true);
    *bundle != before
}

fn make_optional(shape: &mut PhoneticShape, id: NodeId) -> bool {
    let node = &mut shape[id];
    node.clean = false;
    if node.optional {
        return false;
    }
    node.optional = true;
    true
}

/// Inserts the LHS items from `from` on as optional segments after `anchor`,
/// unless an identical optional segment already follows it.
fn restore_deleted(lhs: &Pattern, from: usize, shape: &mut PhoneticShape, anchor: NodeId) -> Result<bool> {
    let bundles: Vec<FeatureBundle> = lhs.items()[from.min(lhs.len())..]
        .iter()
        .filter_map(|item| item.node.open())
        .collect();
    let Some(first) = bundles.first() else {
        return Ok(false);
    };
    if let Some(next) = shape.next(anchor) {
        let node = &shape[next];
        if node.optional && node.bundle() == Some(first) {
            return Ok(false);
        }
    }
    let mut at = anchor;
    for bundle in bundles {
        at = shape.insert_after(at, ShapeNode::segment(bundle).with_optional(true))?;
        shape[at].clean = false;
    }
    Ok(true)
}

/// Returns the values an RHS node changes relative to its LHS node.
fn changed_mask(system: &FeatureSystem, lhs: Option<&PatternNode>, rhs: &PatternNode) -> FeatureBundle {
    match rhs {
        PatternNode::Segment(ctx) => {
            let before = lhs.and_then(PatternNode::constraint).map(|(b, _)| b);
            system
                .specified_features(&ctx.bundle())
                .into_iter()
                .map(|f| system.feature_mask(f))
                .filter(|mask| {
                    before.is_none_or(|b| b.intersection(mask) != ctx.bundle().intersection(mask))
                })
                .fold(FeatureBundle::EMPTY, |acc, mask| acc.union(&mask))
        }
        other => other.mask().unwrap_or_default(),
    }
}

// =============================================================================
// Standard Rules
// =============================================================================

/// A rewrite rule with disjunctive subrules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandardRule {
    name: String,
    lhs: Pattern,
    order: ApplicationOrder,
    subrules: Vec<PhonologicalSubrule>,
}

impl StandardRule {
    /// Creates a rule with no subrules.
    ///
    /// # Errors
    ///
    /// Returns an invalid rule error if `lhs` holds anything but segments
    /// and natural classes.
    pub fn new(name: impl Into<String>, lhs: Pattern) -> Result<Self> {
        let name = name.into();
        if !lhs.is_simple() {
            return Err(Error::invalid_rule(format!(
                "{name}: input must contain only segments and natural classes"
            )));
        }
        Ok(Self {
            name,
            lhs,
            order: ApplicationOrder::default(),
            subrules: Vec::new(),
        })
    }

    /// Sets the application order.
    #[must_use]
    pub fn with_order(mut self, order: ApplicationOrder) -> Self {
        self.order = order;
        self
    }

    /// Adds a subrule, classifying it against the LHS.
    ///
    /// # Errors
    ///
    /// Returns an invalid rule error if the RHS is not simple or the LHS/RHS
    /// lengths describe no supported rewrite.
    pub fn with_subrule(mut self, system: &FeatureSystem, mut subrule: PhonologicalSubrule) -> Result<Self> {
        if !subrule.rhs.is_simple() {
            return Err(Error::invalid_rule(format!(
                "{}: output must contain only segments and natural classes",
                self.name
            )));
        }
        subrule.kind = SubruleKind::classify(self.lhs.len(), subrule.rhs.len())?;
        subrule.changes = subrule
            .rhs
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let lhs = self.lhs.items().get(index).map(|i: &PatternItem| &i.node);
                changed_mask(system, lhs, &item.node)
            })
            .collect();
        self.subrules.push(subrule);
        Ok(self)
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the input pattern.
    #[must_use]
    pub fn lhs(&self) -> &Pattern {
        &self.lhs
    }

    /// Returns the application order.
    #[must_use]
    pub fn order(&self) -> ApplicationOrder {
        self.order
    }

    /// Returns the subrules.
    #[must_use]
    pub fn subrules(&self) -> &[PhonologicalSubrule] {
        &self.subrules
    }

    /// Returns true if every subrule is blocked by `mpr`.
    #[must_use]
    pub fn is_blocked(&self, mpr: &OrdSet<String>) -> bool {
        !self.subrules.is_empty() && self.subrules.iter().all(|s| s.conditions.is_blocked(mpr))
    }

    fn select(&self, word: &WordSynthesis, found: &Match) -> Option<(usize, VariableValues)> {
        let shape = &word.shape;
        let before = found.first().and_then(|f| shape.prev(f));
        let after = found.last().and_then(|l| shape.next(l));
        self.subrules.iter().enumerate().find_map(|(index, sub)| {
            if !sub.conditions.permits(word) {
                return None;
            }
            sub.environment(shape, before, after, found.variables(), MatchMode::Synthesis)
                .map(|mut vars| {
                    vars.remove_ambiguous();
                    (index, vars)
                })
        })
    }

    fn select_gap(&self, word: &WordSynthesis, anchor: NodeId) -> Option<(usize, VariableValues)> {
        let shape = &word.shape;
        let after = shape.next(anchor);
        self.subrules.iter().enumerate().find_map(|(index, sub)| {
            if !sub.conditions.permits(word) {
                return None;
            }
            sub.environment(shape, Some(anchor), after, &VariableValues::new(), MatchMode::Synthesis)
                .map(|mut vars| {
                    vars.remove_ambiguous();
                    (index, vars)
                })
        })
    }

    /// Applies the rule to a word. Returns true if the shape changed.
    ///
    /// # Errors
    ///
    /// Returns an uninstantiated feature error if an output variable was
    /// never bound, or a capacity error if the shape overflows.
    pub fn apply(&self, word: &mut WordSynthesis) -> Result<bool> {
        let applied = if self.lhs.is_empty() {
            self.apply_epenthesis(word)?
        } else {
            self.apply_rewrites(word)?
        };
        word.shape.reset_clean();
        if applied {
            trace!(rule = %self.name, "phonological rule applied");
        }
        Ok(applied)
    }

    fn apply_rewrites(&self, word: &mut WordSynthesis) -> Result<bool> {
        let direction = self.order.direction();
        let matcher = Matcher::new(&self.lhs, MatchOptions::synthesis(direction).with_target(true));
        let empty = VariableValues::new();
        let end = word.shape.end(direction);
        let mut pending = Vec::new();
        let mut applied = false;
        let mut cur = word.shape.step(word.shape.begin(direction), direction);
        while let Some(start) = cur {
            if start == end {
                break;
            }
            let chosen = matcher
                .match_at(&word.shape, start, &empty)
                .into_iter()
                .find_map(|found| self.select(word, &found).map(|(index, vars)| (index, found, vars)));
            let Some((index, found, vars)) = chosen else {
                cur = word.shape.step(start, direction);
                continue;
            };
            cur = found.next();
            if self.order == ApplicationOrder::Simultaneous {
                pending.push((index, found, vars));
            } else {
                self.subrules[index].apply_match(&mut word.shape, &found, &vars)?;
                applied = true;
            }
        }
        for (index, found, vars) in pending {
            self.subrules[index].apply_match(&mut word.shape, &found, &vars)?;
            applied = true;
        }
        Ok(applied)
    }

    fn apply_epenthesis(&self, word: &mut WordSynthesis) -> Result<bool> {
        let direction = self.order.direction();
        let mut pending = Vec::new();
        let mut applied = false;
        let mut anchor = match direction {
            Direction::LeftToRight => Some(word.shape.first()),
            Direction::RightToLeft => word.shape.prev(word.shape.last()),
        };
        while let Some(at) = anchor {
            if at == word.shape.last() {
                break;
            }
            let following = word.shape.next(at);
            let step = match direction {
                Direction::LeftToRight => following,
                Direction::RightToLeft => word.shape.prev(at),
            };
            if let Some((index, vars)) = self.select_gap(word, at) {
                if self.order == ApplicationOrder::Simultaneous {
                    pending.push((index, at, vars));
                } else {
                    self.subrules[index].insert_at(&mut word.shape, at, &vars)?;
                    applied = true;
                }
            }
            anchor = step;
        }
        for (index, at, vars) in pending {
            self.subrules[index].insert_at(&mut word.shape, at, &vars)?;
            applied = true;
        }
        Ok(applied)
    }

    /// Unapplies the rule from an analysis. Returns true if the shape changed.
    ///
    /// Matches are visited against the application direction, and each
    /// subrule is unapplied until the shape stops changing. Deletions are
    /// reconstructed `1 + reapplications` times.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if reconstruction overflows the shape.
    pub fn unapply(&self, analysis: &mut WordAnalysis, reapplications: usize) -> Result<bool> {
        let simultaneous = self.order == ApplicationOrder::Simultaneous;
        let scan = self.order.direction().reverse();
        let mut changed = false;
        for sub in &self.subrules {
            if !sub.conditions.permits_analysis(analysis) {
                continue;
            }
            if sub.kind == SubruleKind::Narrowing {
                for _ in 0..=reapplications {
                    changed |= sub.unapply_pass(&self.lhs, &mut analysis.shape, scan, simultaneous)?;
                }
                continue;
            }
            // An application can destroy the environment of an earlier one,
            // so passes repeat until nothing changes. Unapplication only adds
            // values or optional flags, which bounds the loop.
            while sub.unapply_pass(&self.lhs, &mut analysis.shape, scan, simultaneous)? {
                changed = true;
            }
        }
        analysis.shape.reset_clean();
        if changed {
            trace!(rule = %self.name, "phonological rule unapplied");
        }
        Ok(changed)
    }
}

// =============================================================================
// Metathesis
// =============================================================================

/// A rule that reorders the partitions of a pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetathesisRule {
    name: String,
    pattern: Pattern,
    analysis: Pattern,
    partitions: Vec<usize>,
    order: Vec<usize>,
    direction: Direction,
    conditions: RuleConditions,
}

impl MetathesisRule {
    /// Creates a rule that rewrites the partitions of `pattern` into
    /// `order`.
    ///
    /// Unpartitioned items before and after the partitions act as the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an invalid rule error if the partitions are not contiguous,
    /// an unpartitioned item sits between them, or `order` is not a
    /// permutation of them.
    pub fn new(name: impl Into<String>, pattern: Pattern, order: Vec<usize>) -> Result<Self> {
        let name = name.into();
        let partitions = pattern.partitions();
        let mut sorted_order = order.clone();
        sorted_order.sort_unstable();
        let mut sorted_partitions = partitions.clone();
        sorted_partitions.sort_unstable();
        if sorted_order != sorted_partitions || partitions.is_empty() {
            return Err(Error::invalid_rule(format!(
                "{name}: output order must permute the pattern's partitions"
            )));
        }

        let items = pattern.items();
        let start = items.iter().position(|i| i.partition.is_some()).unwrap_or(0);
        let end = items.iter().rposition(|i| i.partition.is_some()).map_or(0, |e| e + 1);
        let middle = &items[start..end];
        let contiguous = middle.iter().all(|i| i.partition.is_some())
            && middle
                .windows(2)
                .filter(|w| w[0].partition != w[1].partition)
                .count()
                + 1
                == partitions.len();
        if !contiguous {
            return Err(Error::invalid_rule(format!(
                "{name}: partitions must be contiguous"
            )));
        }

        let mut analysis = Pattern::new();
        for item in &items[..start] {
            analysis.push(item.node.clone(), None);
        }
        for p in &order {
            for item in middle.iter().filter(|i| i.partition == Some(*p)) {
                analysis.push(item.node.clone(), item.partition);
            }
        }
        for item in &items[end..] {
            analysis.push(item.node.clone(), None);
        }

        Ok(Self {
            name,
            pattern,
            analysis,
            partitions,
            order,
            direction: Direction::LeftToRight,
            conditions: RuleConditions::default(),
        })
    }

    /// Sets the synthesis traversal direction.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Replaces the conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: RuleConditions) -> Self {
        self.conditions = conditions;
        self
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the synthesis pattern.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Returns the output order of partitions.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Returns the conditions.
    #[must_use]
    pub fn conditions(&self) -> &RuleConditions {
        &self.conditions
    }

    /// Moves the captured partitions into `sequence`, starting where the
    /// leftmost partition was.
    fn reorder(shape: &mut PhoneticShape, found: &Match, sequence: &[usize]) -> bool {
        let Some(first) = found
            .partitions()
            .values()
            .filter_map(|nodes| nodes.first().copied())
            .min_by_key(|id| shape.ids().position(|n| n == *id))
        else {
            return false;
        };
        let Some(mut anchor) = shape.prev(first) else {
            return false;
        };
        for p in sequence {
            for &id in found.partition(*p) {
                if shape.move_after(id, anchor) {
                    anchor = id;
                }
            }
        }
        true
    }

    /// Applies the rule. Returns true if the shape changed.
    pub fn apply(&self, word: &mut WordSynthesis) -> bool {
        if !self.conditions.permits(word) || self.order == self.partitions {
            return false;
        }
        let matcher = Matcher::new(&self.pattern, MatchOptions::synthesis(self.direction).with_target(true));
        let applied = Self::rewrite_all(&mut word.shape, &matcher, self.direction, &self.order);
        if applied {
            trace!(rule = %self.name, "metathesis applied");
        }
        applied
    }

    /// Unapplies the rule. Returns true if the shape changed.
    pub fn unapply(&self, analysis: &mut WordAnalysis) -> bool {
        if !self.conditions.permits_analysis(analysis) || self.order == self.partitions {
            return false;
        }
        let matcher = Matcher::new(
            &self.analysis,
            MatchOptions::analysis(Direction::LeftToRight).with_target(true),
        );
        let changed = Self::rewrite_all(&mut analysis.shape, &matcher, Direction::LeftToRight, &self.partitions);
        if changed {
            trace!(rule = %self.name, "metathesis unapplied");
        }
        changed
    }

    fn rewrite_all(shape: &mut PhoneticShape, matcher: &Matcher<'_>, direction: Direction, sequence: &[usize]) -> bool {
        let empty = VariableValues::new();
        let end = shape.end(direction);
        let mut changed = false;
        let mut cur = shape.step(shape.begin(direction), direction);
        while let Some(start) = cur {
            if start == end {
                break;
            }
            match matcher.first_match(shape, start, &empty) {
                Some(found) => {
                    changed |= Self::reorder(shape, &found, sequence);
                    cur = found.next();
                }
                None => cur = shape.step(start, direction),
            }
        }
        changed
    }
}

// =============================================================================
// Rules
// =============================================================================

/// A phonological rule of either kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhonologicalRule {
    /// A rewrite rule.
    Standard(StandardRule),
    /// A metathesis rule.
    Metathesis(MetathesisRule),
}

impl PhonologicalRule {
    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Standard(rule) => rule.name(),
            Self::Metathesis(rule) => rule.name(),
        }
    }

    /// Returns the application order.
    #[must_use]
    pub fn order(&self) -> ApplicationOrder {
        match self {
            Self::Standard(rule) => rule.order(),
            Self::Metathesis(rule) => match rule.direction {
                Direction::LeftToRight => ApplicationOrder::LeftToRight,
                Direction::RightToLeft => ApplicationOrder::RightToLeft,
            },
        }
    }

    /// Returns true if the rule is blocked for words carrying `mpr`.
    #[must_use]
    pub fn is_blocked(&self, mpr: &OrdSet<String>) -> bool {
        match self {
            Self::Standard(rule) => rule.is_blocked(mpr),
            Self::Metathesis(rule) => rule.conditions.is_blocked(mpr),
        }
    }

    /// Applies the rule. Returns true if the shape changed.
    ///
    /// # Errors
    ///
    /// See [`StandardRule::apply`].
    pub fn apply(&self, word: &mut WordSynthesis) -> Result<bool> {
        match self {
            Self::Standard(rule) => rule.apply(word),
            Self::Metathesis(rule) => Ok(rule.apply(word)),
        }
    }

    /// Unapplies the rule. Returns true if the shape changed.
    ///
    /// # Errors
    ///
    /// See [`StandardRule::unapply`].
    pub fn unapply(&self, analysis: &mut WordAnalysis, reapplications: usize) -> Result<bool> {
        match self {
            Self::Standard(rule) => rule.unapply(analysis, reapplications),
            Self::Metathesis(rule) => Ok(rule.unapply(analysis)),
        }
    }
}

impl From<StandardRule> for PhonologicalRule {
    fn from(rule: StandardRule) -> Self {
        Self::Standard(rule)
    }
}

impl From<MetathesisRule> for PhonologicalRule {
    fn from(rule: MetathesisRule) -> Self {
        Self::Metathesis(rule)
    }
}
