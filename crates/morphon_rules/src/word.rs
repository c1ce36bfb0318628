//! Search-state records.
//!
//! [`WordAnalysis`] is a hypothesis built while unapplying rules from a
//! surface form; [`WordSynthesis`] is a word rebuilt from a lexical entry by
//! reapplying the hypothesized rules. Both are cheap to clone: the sequences
//! they carry are persistent `im` collections shared between branches.

use std::collections::BTreeMap;
use std::sync::Arc;

use im::{OrdMap, OrdSet, Vector};
use morphon_foundation::{FeatureId, FeatureValues};
use morphon_phonetics::{NodeId, PhoneticShape};

use crate::lexicon::{AllomorphConstraints, LexEntry};
use crate::trace::{FailureReason, TraceNodeId};

/// A rule hypothesized during analysis, waiting to be reapplied.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingRule {
    /// Index of the stratum the rule belongs to.
    pub stratum: usize,
    /// Rule name.
    pub rule: String,
    /// Template and slot the rule was unapplied through, if any.
    pub slot: Option<(String, usize)>,
}

impl PendingRule {
    /// A rule unapplied directly by its stratum.
    #[must_use]
    pub fn rule(stratum: usize, rule: impl Into<String>) -> Self {
        Self {
            stratum,
            rule: rule.into(),
            slot: None,
        }
    }

    /// A rule unapplied through a template slot.
    #[must_use]
    pub fn slot(stratum: usize, template: impl Into<String>, slot: usize, rule: impl Into<String>) -> Self {
        Self {
            stratum,
            rule: rule.into(),
            slot: Some((template.into(), slot)),
        }
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// A partial analysis of a surface form.
#[derive(Clone, Debug)]
pub struct WordAnalysis {
    /// The shape with rules unapplied so far.
    pub shape: PhoneticShape,
    /// Index of the stratum currently being unapplied.
    pub stratum: usize,
    /// Parts of speech the root may have. Empty means unconstrained.
    pub pos: OrdSet<String>,
    /// Unapplied rules, outermost first.
    pub unapplied: Vector<PendingRule>,
    /// Realizational features hypothesized so far.
    pub realizational: FeatureValues,
    /// How often each morphological rule has been unapplied.
    pub unapplications: OrdMap<String, usize>,
    /// Index of the last morphological rule unapplied in a linear stratum.
    pub last_rule: Option<usize>,
    /// Trace node this analysis descends from.
    pub trace: Option<TraceNodeId>,
}

impl WordAnalysis {
    /// Starts an analysis of `shape` in `stratum`.
    #[must_use]
    pub fn new(shape: PhoneticShape, stratum: usize) -> Self {
        Self {
            shape,
            stratum,
            pos: OrdSet::new(),
            unapplied: Vector::new(),
            realizational: FeatureValues::new(),
            unapplications: OrdMap::new(),
            last_rule: None,
            trace: None,
        }
    }

    /// Returns true if a root of part of speech `pos` is admissible.
    #[must_use]
    pub fn accepts_pos(&self, pos: &str) -> bool {
        self.pos.is_empty() || self.pos.contains(pos)
    }

    /// Returns how often `rule` has been unapplied.
    #[must_use]
    pub fn unapplication_count(&self, rule: &str) -> usize {
        self.unapplications.get(rule).copied().unwrap_or(0)
    }

    /// Records that `rule` was unapplied.
    pub fn record_unapplication(&mut self, rule: PendingRule) {
        let count = self.unapplication_count(&rule.rule);
        self.unapplications.insert(rule.rule.clone(), count + 1);
        self.unapplied.push_back(rule);
    }

    /// Moves the analysis to another stratum, resetting per-stratum state.
    #[must_use]
    pub fn into_stratum(mut self, stratum: usize) -> Self {
        self.stratum = stratum;
        self.last_rule = None;
        self.unapplications = OrdMap::new();
        self
    }
}

// =============================================================================
// Synthesis
// =============================================================================

/// One morph of a synthesized word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Morph {
    /// Id of the morpheme: a lexical entry id or a rule name.
    pub morpheme: String,
    /// Index of the allomorph used.
    pub allomorph: usize,
    /// Gloss.
    pub gloss: String,
    /// Constraints of the allomorph used.
    pub constraints: Arc<AllomorphConstraints>,
}

/// A word being rebuilt from a lexical entry.
#[derive(Clone, Debug)]
pub struct WordSynthesis {
    /// The current shape. Every node carries the index of its morph.
    pub shape: PhoneticShape,
    /// The root entry.
    pub root: Arc<LexEntry>,
    /// Index of the root allomorph.
    pub root_allomorph: usize,
    /// Index of the inflected stem substituted for the root, if any.
    pub stem: Option<usize>,
    /// Current part of speech.
    pub pos: String,
    /// Head features.
    pub head: FeatureValues,
    /// Foot features.
    pub foot: FeatureValues,
    /// Realizational features still to be realized.
    pub realizational: FeatureValues,
    /// MPR features.
    pub mpr: OrdSet<String>,
    /// Head features that must be present at the end.
    pub obligatory: OrdSet<FeatureId>,
    /// Morphs in application order; the root is first.
    pub morphs: Vector<Morph>,
    /// Rules still to apply; the next one is at the back.
    pub pending: Vector<PendingRule>,
    /// Names of the rules applied so far.
    pub applied: Vector<String>,
    /// Index of the stratum currently being applied.
    pub stratum: usize,
    /// Trace node this synthesis descends from.
    pub trace: Option<TraceNodeId>,
}

impl WordSynthesis {
    /// Starts a synthesis from allomorph `allomorph` of `root`, reapplying
    /// the rules `analysis` unapplied.
    ///
    /// Returns `None` if the entry has no such allomorph.
    #[must_use]
    pub fn new(root: Arc<LexEntry>, allomorph: usize, analysis: &WordAnalysis) -> Option<Self> {
        let form = root.allomorphs().get(allomorph)?;
        let mut shape = form.shape().clone();
        tag_all(&mut shape, 0);
        let morph = Morph {
            morpheme: root.id().to_string(),
            allomorph,
            gloss: root.gloss().to_string(),
            constraints: Arc::clone(form.constraints()),
        };
        Some(Self {
            shape,
            pos: root.pos().to_string(),
            head: root.head().clone(),
            foot: root.foot().clone(),
            realizational: analysis.realizational.clone(),
            mpr: root.mpr().iter().cloned().collect(),
            obligatory: root.obligatory_head().iter().copied().collect(),
            morphs: Vector::unit(morph),
            pending: analysis.unapplied.clone(),
            applied: Vector::new(),
            stratum: analysis.stratum,
            trace: analysis.trace,
            stem: None,
            root_allomorph: allomorph,
            root,
        })
    }

    /// Returns the next rule to apply.
    #[must_use]
    pub fn next_pending(&self) -> Option<&PendingRule> {
        self.pending.back()
    }

    /// Returns true if the next pending rule is `rule` of `stratum`,
    /// unapplied outside any template.
    #[must_use]
    pub fn next_is(&self, stratum: usize, rule: &str) -> bool {
        self.next_pending()
            .is_some_and(|p| p.stratum == stratum && p.rule == rule && p.slot.is_none())
    }

    /// Adds a morph and returns its index.
    pub fn add_morph(&mut self, morph: Morph) -> usize {
        self.morphs.push_back(morph);
        self.morphs.len() - 1
    }

    /// Replaces the root's shape with an inflected stem.
    ///
    /// Only valid before any affix has been attached.
    pub fn substitute_stem(&mut self, index: usize, remainder: FeatureValues) -> bool {
        let Some(stem) = self.root.stems().get(index) else {
            return false;
        };
        if self.morphs.len() != 1 {
            return false;
        }
        let mut shape = stem.shape().clone();
        tag_all(&mut shape, 0);
        self.head = self.head.overlay(stem.features());
        self.shape = shape;
        self.stem = Some(index);
        self.realizational = remainder;
        true
    }

    /// Substitutes the most specific inflected stem whose features are all
    /// pending realizational features. Returns true if a stem was chosen.
    pub fn select_inflected_stem(&mut self) -> bool {
        if self.stem.is_some() || self.morphs.len() != 1 || self.realizational.is_empty() {
            return false;
        }
        match self.root.select_stem(&self.realizational) {
            Some((index, rest)) => self.substitute_stem(index, rest),
            None => false,
        }
    }

    /// Returns the first and last node of each morph that has any.
    #[must_use]
    pub fn morph_spans(&self) -> BTreeMap<usize, (NodeId, NodeId)> {
        let mut spans: BTreeMap<usize, (NodeId, NodeId)> = BTreeMap::new();
        for id in self.shape.ids() {
            let node = &self.shape[id];
            if node.deleted || node.is_margin() {
                continue;
            }
            if let Some(morph) = node.morph {
                spans
                    .entry(morph)
                    .and_modify(|span| span.1 = id)
                    .or_insert((id, id));
            }
        }
        spans
    }

    /// Returns morph indices in surface order. Morphs with no visible nodes
    /// follow in application order.
    #[must_use]
    pub fn surface_order(&self) -> Vec<usize> {
        let mut order = Vec::new();
        for id in self.shape.ids() {
            let node = &self.shape[id];
            if node.deleted {
                continue;
            }
            if let Some(morph) = node.morph {
                if !order.contains(&morph) {
                    order.push(morph);
                }
            }
        }
        for index in 0..self.morphs.len() {
            if !order.contains(&index) {
                order.push(index);
            }
        }
        order
    }

    /// Returns the morpheme ids in application order.
    #[must_use]
    pub fn morpheme_ids(&self) -> Vec<&str> {
        self.morphs.iter().map(|m| m.morpheme.as_str()).collect()
    }

    /// Returns the allomorph indices in application order.
    #[must_use]
    pub fn allomorph_indices(&self) -> Vec<usize> {
        self.morphs.iter().map(|m| m.allomorph).collect()
    }

    /// Checks a finished synthesis.
    ///
    /// # Errors
    ///
    /// Returns the first reason the word is invalid.
    pub fn validate(&self) -> Result<(), FailureReason> {
        if !self.pending.is_empty() {
            return Err(FailureReason::PendingRules);
        }
        if !self.obligatory.iter().all(|f| self.head.contains(*f)) {
            return Err(FailureReason::ObligatoryFeatures);
        }
        let spans = self.morph_spans();
        for (index, morph) in self.morphs.iter().enumerate() {
            if let Some(&(first, last)) = spans.get(&index) {
                if !morph.constraints.environment_satisfied(&self.shape, first, last) {
                    return Err(FailureReason::Environment);
                }
            }
        }
        let order = self.surface_order();
        let linear: Vec<&str> = order
            .iter()
            .filter_map(|&i| self.morphs.get(i))
            .map(|m| m.morpheme.as_str())
            .collect();
        for (position, &index) in order.iter().enumerate() {
            let Some(morph) = self.morphs.get(index) else {
                continue;
            };
            if !morph
                .constraints
                .co_occurrences
                .iter()
                .all(|c| c.check(&linear, position))
            {
                return Err(FailureReason::CoOccurrence);
            }
        }
        if !self
            .morphs
            .iter()
            .all(|m| m.constraints.mpr_satisfied(self.mpr.iter()))
        {
            return Err(FailureReason::Mpr);
        }
        Ok(())
    }

    /// Returns true if both words have the same shape, morphs, and stratum.
    #[must_use]
    pub fn same_result(&self, other: &Self) -> bool {
        self.stratum == other.stratum
            && self.shape.same_segments(&other.shape)
            && self.morphs.len() == other.morphs.len()
            && self
                .morphs
                .iter()
                .zip(other.morphs.iter())
                .all(|(a, b)| a.morpheme == b.morpheme && a.allomorph == b.allomorph)
    }
}

fn tag_all(shape: &mut PhoneticShape, morph: usize) {
    let ids: Vec<NodeId> = shape.ids().collect();
    for id in ids {
        if !shape[id].is_margin() {
            shape[id].morph = Some(morph);
        }
    }
}
