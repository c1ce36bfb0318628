//! Morphological rules and affix templates.
//!
//! A [`MorphologicalRule`] attaches one morpheme. Its allomorphs are tried
//! in order; each is a [`Transform`] plus the constraints the allomorph
//! places on the finished word. An [`AffixTemplate`] groups rules into
//! ordered slots for position-class morphology.

use std::collections::BTreeSet;
use std::sync::Arc;

use morphon_foundation::{FeatureId, FeatureValues, Result};
use tracing::trace;

use crate::lexicon::AllomorphConstraints;
use crate::transform::Transform;
use crate::word::{Morph, PendingRule, WordAnalysis, WordSynthesis};

// =============================================================================
// Rules
// =============================================================================

/// One allomorph of a morphological rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MorphologicalAllomorph {
    transform: Transform,
    constraints: Arc<AllomorphConstraints>,
    output_mpr: BTreeSet<String>,
}

impl MorphologicalAllomorph {
    /// Creates an unconstrained allomorph.
    #[must_use]
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            constraints: Arc::new(AllomorphConstraints::default()),
            output_mpr: BTreeSet::new(),
        }
    }

    /// Attaches constraints.
    #[must_use]
    pub fn with_constraints(mut self, constraints: AllomorphConstraints) -> Self {
        self.constraints = Arc::new(constraints);
        self
    }

    /// Adds an MPR feature to words this allomorph produces.
    #[must_use]
    pub fn with_output_mpr(mut self, feature: impl Into<String>) -> Self {
        self.output_mpr.insert(feature.into());
        self
    }

    /// Returns the transform.
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Returns the constraints.
    #[must_use]
    pub fn constraints(&self) -> &Arc<AllomorphConstraints> {
        &self.constraints
    }
}

/// A rule attaching one morpheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MorphologicalRule {
    name: String,
    gloss: String,
    allomorphs: Vec<MorphologicalAllomorph>,
    required_pos: BTreeSet<String>,
    output_pos: Option<String>,
    required_head: FeatureValues,
    required_foot: FeatureValues,
    output_head: FeatureValues,
    output_foot: FeatureValues,
    obligatory_head: Vec<FeatureId>,
    realizational: FeatureValues,
}

impl MorphologicalRule {
    /// Creates a rule with no allomorphs.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            gloss: name.clone(),
            name,
            allomorphs: Vec::new(),
            required_pos: BTreeSet::new(),
            output_pos: None,
            required_head: FeatureValues::new(),
            required_foot: FeatureValues::new(),
            output_head: FeatureValues::new(),
            output_foot: FeatureValues::new(),
            obligatory_head: Vec::new(),
            realizational: FeatureValues::new(),
        }
    }

    /// Sets the gloss.
    #[must_use]
    pub fn with_gloss(mut self, gloss: impl Into<String>) -> Self {
        self.gloss = gloss.into();
        self
    }

    /// Adds an allomorph. Earlier allomorphs take precedence.
    #[must_use]
    pub fn with_allomorph(mut self, allomorph: MorphologicalAllomorph) -> Self {
        self.allomorphs.push(allomorph);
        self
    }

    /// Restricts the input part of speech.
    #[must_use]
    pub fn with_required_pos(mut self, pos: impl Into<String>) -> Self {
        self.required_pos.insert(pos.into());
        self
    }

    /// Sets the output part of speech.
    #[must_use]
    pub fn with_output_pos(mut self, pos: impl Into<String>) -> Self {
        self.output_pos = Some(pos.into());
        self
    }

    /// Sets head features the input must be compatible with.
    #[must_use]
    pub fn with_required_head(mut self, head: FeatureValues) -> Self {
        self.required_head = head;
        self
    }

    /// Sets foot features the input must be compatible with.
    #[must_use]
    pub fn with_required_foot(mut self, foot: FeatureValues) -> Self {
        self.required_foot = foot;
        self
    }

    /// Sets head features written onto the output.
    #[must_use]
    pub fn with_output_head(mut self, head: FeatureValues) -> Self {
        self.output_head = head;
        self
    }

    /// Sets foot features written onto the output.
    #[must_use]
    pub fn with_output_foot(mut self, foot: FeatureValues) -> Self {
        self.output_foot = foot;
        self
    }

    /// Requires a head feature to be present once synthesis finishes.
    #[must_use]
    pub fn with_obligatory_head(mut self, feature: FeatureId) -> Self {
        self.obligatory_head.push(feature);
        self
    }

    /// Makes the rule realizational: it spells out these features.
    #[must_use]
    pub fn with_realizational(mut self, features: FeatureValues) -> Self {
        self.realizational = features;
        self
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the gloss.
    #[must_use]
    pub fn gloss(&self) -> &str {
        &self.gloss
    }

    /// Returns the allomorphs in precedence order.
    #[must_use]
    pub fn allomorphs(&self) -> &[MorphologicalAllomorph] {
        &self.allomorphs
    }

    /// Returns the realizational features.
    #[must_use]
    pub fn realizational(&self) -> &FeatureValues {
        &self.realizational
    }

    /// Returns true if the rule spells out features.
    #[must_use]
    pub fn is_realizational(&self) -> bool {
        !self.realizational.is_empty()
    }

    fn admits(&self, analysis: &WordAnalysis) -> bool {
        if analysis.pos.is_empty() {
            return true;
        }
        match &self.output_pos {
            Some(pos) => analysis.pos.contains(pos),
            None => self.required_pos.is_empty() || self.required_pos.iter().any(|p| analysis.pos.contains(p)),
        }
    }

    fn input_pos(&self, analysis: &WordAnalysis) -> im::OrdSet<String> {
        let required: im::OrdSet<String> = self.required_pos.iter().cloned().collect();
        match (&self.output_pos, required.is_empty()) {
            (None, true) => analysis.pos.clone(),
            (None, false) if !analysis.pos.is_empty() => required.intersection(analysis.pos.clone()),
            (Some(_), true) => im::OrdSet::new(),
            _ => required,
        }
    }

    /// Unapplies the rule, producing one analysis per distinct input shape
    /// any allomorph could have started from.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if a reconstruction overflows.
    pub fn unapply(&self, analysis: &WordAnalysis, pending: PendingRule) -> Result<Vec<WordAnalysis>> {
        if !self.admits(analysis) {
            return Ok(Vec::new());
        }
        let realizational = if self.is_realizational() {
            match analysis.realizational.unify(&self.realizational) {
                Some(unified) => unified,
                None => return Ok(Vec::new()),
            }
        } else {
            analysis.realizational.clone()
        };
        let pos = self.input_pos(analysis);

        let mut out: Vec<WordAnalysis> = Vec::new();
        for allomorph in &self.allomorphs {
            for shape in allomorph.transform.unapply(&analysis.shape)? {
                if out.iter().any(|a| a.shape == shape) {
                    continue;
                }
                let mut next = analysis.clone();
                next.shape = shape;
                next.pos = pos.clone();
                next.realizational = realizational.clone();
                next.record_unapplication(pending.clone());
                out.push(next);
            }
        }
        if !out.is_empty() {
            trace!(rule = %self.name, analyses = out.len(), "morphological rule unapplied");
        }
        Ok(out)
    }

    /// Applies the rule, producing one word per allomorph whose input
    /// matches. The caller is responsible for this rule being next.
    ///
    /// # Errors
    ///
    /// See [`Transform::apply`].
    pub fn apply(&self, word: &WordSynthesis) -> Result<Vec<WordSynthesis>> {
        if !self.required_pos.is_empty() && !self.required_pos.contains(&word.pos) {
            return Ok(Vec::new());
        }
        if !word.head.is_compatible(&self.required_head) || !word.foot.is_compatible(&self.required_foot) {
            return Ok(Vec::new());
        }
        let realizational = if self.is_realizational() {
            match word.realizational.superset_remainder(&self.realizational) {
                Some(rest) => rest,
                None => return Ok(Vec::new()),
            }
        } else {
            word.realizational.clone()
        };

        let morph_index = word.morphs.len();
        let mut out = Vec::new();
        for (index, allomorph) in self.allomorphs.iter().enumerate() {
            let Some(shape) = allomorph.transform.apply(&word.shape, morph_index)? else {
                continue;
            };
            let mut next = word.clone();
            next.shape = shape;
            if let Some(pos) = &self.output_pos {
                next.pos.clone_from(pos);
            }
            next.head = word.head.overlay(&self.output_head).overlay(&self.realizational);
            next.foot = word.foot.overlay(&self.output_foot);
            next.realizational = realizational.clone();
            next.mpr.extend(allomorph.output_mpr.iter().cloned());
            next.obligatory.extend(self.obligatory_head.iter().copied());
            next.add_morph(Morph {
                morpheme: self.name.clone(),
                allomorph: index,
                gloss: self.gloss.clone(),
                constraints: Arc::clone(&allomorph.constraints),
            });
            next.pending.pop_back();
            next.applied.push_back(self.name.clone());
            out.push(next);
        }
        if !out.is_empty() {
            trace!(rule = %self.name, words = out.len(), "morphological rule applied");
        }
        Ok(out)
    }
}

// =============================================================================
// Templates
// =============================================================================

/// A position class in an [`AffixTemplate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffixSlot {
    name: String,
    rules: Vec<MorphologicalRule>,
    optional: bool,
}

impl AffixSlot {
    /// Creates an empty required slot.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            optional: false,
        }
    }

    /// Adds a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: MorphologicalRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Marks the slot optional.
    #[must_use]
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rules.
    #[must_use]
    pub fn rules(&self) -> &[MorphologicalRule] {
        &self.rules
    }

    /// Returns true if the slot may stay empty.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Ordered slots of affixes, applied innermost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffixTemplate {
    name: String,
    required_pos: BTreeSet<String>,
    slots: Vec<AffixSlot>,
}

impl AffixTemplate {
    /// Creates a template with no slots.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_pos: BTreeSet::new(),
            slots: Vec::new(),
        }
    }

    /// Restricts the template to a part of speech.
    #[must_use]
    pub fn with_required_pos(mut self, pos: impl Into<String>) -> Self {
        self.required_pos.insert(pos.into());
        self
    }

    /// Adds the next outer slot.
    #[must_use]
    pub fn with_slot(mut self, slot: AffixSlot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the slots, innermost first.
    #[must_use]
    pub fn slots(&self) -> &[AffixSlot] {
        &self.slots
    }

    /// Unapplies the slots outermost first. Only analyses where at least one
    /// slot rule was unapplied are returned.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if a reconstruction overflows.
    pub fn unapply(&self, analysis: &WordAnalysis, stratum: usize) -> Result<Vec<WordAnalysis>> {
        if !self.required_pos.is_empty()
            && !analysis.pos.is_empty()
            && !self.required_pos.iter().any(|p| analysis.pos.contains(p))
        {
            return Ok(Vec::new());
        }
        let mut frontier = vec![(analysis.clone(), false)];
        for (index, slot) in self.slots.iter().enumerate().rev() {
            let mut next = Vec::new();
            for (current, touched) in frontier {
                for rule in &slot.rules {
                    let pending = PendingRule::slot(stratum, &self.name, index, rule.name());
                    next.extend(rule.unapply(&current, pending)?.into_iter().map(|a| (a, true)));
                }
                if slot.optional {
                    next.push((current, touched));
                }
            }
            frontier = next;
        }
        let required: im::OrdSet<String> = self.required_pos.iter().cloned().collect();
        Ok(frontier
            .into_iter()
            .filter(|(_, touched)| *touched)
            .map(|(mut a, _)| {
                if !required.is_empty() {
                    a.pos = if a.pos.is_empty() {
                        required.clone()
                    } else {
                        a.pos.intersection(required.clone())
                    };
                }
                a
            })
            .collect())
    }

    /// Returns true if the next pending rule belongs to this template.
    #[must_use]
    pub fn is_next(&self, word: &WordSynthesis) -> bool {
        word.next_pending()
            .and_then(|p| p.slot.as_ref())
            .is_some_and(|(template, _)| *template == self.name)
    }

    /// Applies the slots innermost first, following the pending rules.
    ///
    /// When realizational features are pending and the root has inflected
    /// stems, the most specific compatible stem replaces the root first.
    ///
    /// # Errors
    ///
    /// See [`MorphologicalRule::apply`].
    pub fn apply(&self, word: &WordSynthesis) -> Result<Vec<WordSynthesis>> {
        if !self.required_pos.is_empty() && !self.required_pos.contains(&word.pos) {
            return Ok(Vec::new());
        }
        let mut start = word.clone();
        start.select_inflected_stem();

        let mut frontier = vec![start];
        for (index, slot) in self.slots.iter().enumerate() {
            let mut next = Vec::new();
            for current in frontier {
                let chosen = current
                    .next_pending()
                    .filter(|p| p.slot.as_ref().is_some_and(|(t, s)| *t == self.name && *s == index))
                    .and_then(|p| slot.rules.iter().find(|r| r.name() == p.rule));
                match chosen {
                    Some(rule) => next.extend(rule.apply(&current)?),
                    None if slot.optional => next.push(current),
                    None => {}
                }
            }
            frontier = next;
        }
        Ok(frontier)
    }
}
