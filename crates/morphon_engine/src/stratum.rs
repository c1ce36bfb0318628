//! Strata: one layer of rules and lexicon.
//!
//! Analysis through a stratum:
//! 1. Unapply phonological rules, last rule first
//! 2. Look the shape up in the lexicon
//! 3. Unapply affix templates, then morphological rules, looking the shape
//!    up again after every successful unapplication
//!
//! Synthesis runs the other way: pending morphological rules and templates,
//! then phonological rules in order.

use std::collections::VecDeque;
use std::sync::Arc;

use morphon_foundation::{Error, Result};
use morphon_phonetics::{CharacterDefinitionTable, PhoneticShape};
use morphon_rules::{
    AffixTemplate, LexEntry, MorphologicalRule, PendingRule, PhonologicalRule, Trace, WordAnalysis,
    WordSynthesis,
};
use tracing::debug;

use crate::config::{MorpherConfig, MorphologicalOrder, PhonologicalOrder};
use crate::trie::SegmentTrie;

// =============================================================================
// Results
// =============================================================================

/// A lexical entry found for an analysis.
#[derive(Clone, Debug)]
pub struct LexicalHit {
    /// The entry.
    pub entry: Arc<LexEntry>,
    /// The analysis that found it.
    pub analysis: WordAnalysis,
}

/// Output of one analysis pass through a stratum.
#[derive(Clone, Debug, Default)]
pub struct StratumAnalysis {
    /// Every analysis reached, to be continued in the stratum below.
    pub analyses: Vec<WordAnalysis>,
    /// Lexical entries found along the way.
    pub hits: Vec<LexicalHit>,
}

// =============================================================================
// Builder
// =============================================================================

/// Builds a [`Stratum`].
#[derive(Clone, Debug)]
pub struct StratumBuilder {
    name: String,
    table: Arc<CharacterDefinitionTable>,
    phonological: Vec<PhonologicalRule>,
    morphological: Vec<MorphologicalRule>,
    templates: Vec<AffixTemplate>,
    entries: Vec<LexEntry>,
    morphological_order: MorphologicalOrder,
    phonological_order: PhonologicalOrder,
    cyclic: bool,
}

impl StratumBuilder {
    /// Starts a stratum using `table` to render its shapes.
    #[must_use]
    pub fn new(name: impl Into<String>, table: Arc<CharacterDefinitionTable>) -> Self {
        Self {
            name: name.into(),
            table,
            phonological: Vec::new(),
            morphological: Vec::new(),
            templates: Vec::new(),
            entries: Vec::new(),
            morphological_order: MorphologicalOrder::default(),
            phonological_order: PhonologicalOrder::default(),
            cyclic: false,
        }
    }

    /// Appends a phonological rule.
    #[must_use]
    pub fn with_phonological_rule(mut self, rule: impl Into<PhonologicalRule>) -> Self {
        self.phonological.push(rule.into());
        self
    }

    /// Appends a morphological rule.
    #[must_use]
    pub fn with_morphological_rule(mut self, rule: MorphologicalRule) -> Self {
        self.morphological.push(rule);
        self
    }

    /// Adds an affix template.
    #[must_use]
    pub fn with_template(mut self, template: AffixTemplate) -> Self {
        self.templates.push(template);
        self
    }

    /// Adds a lexical entry.
    #[must_use]
    pub fn with_entry(mut self, entry: LexEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Sets the morphological rule order.
    #[must_use]
    pub fn with_morphological_order(mut self, order: MorphologicalOrder) -> Self {
        self.morphological_order = order;
        self
    }

    /// Sets the phonological rule order.
    #[must_use]
    pub fn with_phonological_order(mut self, order: PhonologicalOrder) -> Self {
        self.phonological_order = order;
        self
    }

    /// Marks the stratum cyclic.
    #[must_use]
    pub fn with_cyclic(mut self, cyclic: bool) -> Self {
        self.cyclic = cyclic;
        self
    }

    /// Builds the stratum and indexes its lexicon.
    ///
    /// # Errors
    ///
    /// Returns an unsupported error for cyclic strata and for simultaneous
    /// phonological rule order.
    pub fn build(self) -> Result<Stratum> {
        if self.cyclic {
            return Err(Error::unsupported(format!("cyclic stratum '{}'", self.name)));
        }
        if self.phonological_order == PhonologicalOrder::Simultaneous {
            return Err(Error::unsupported(format!(
                "simultaneous phonological rule order in stratum '{}'",
                self.name
            )));
        }

        let mut trie = SegmentTrie::new();
        let entries: Vec<Arc<LexEntry>> = self.entries.into_iter().map(Arc::new).collect();
        for (index, entry) in entries.iter().enumerate() {
            for allomorph in entry.allomorphs() {
                trie.insert(allomorph.shape(), (index, None));
            }
            for (stem_index, stem) in entry.stems().iter().enumerate() {
                trie.insert(stem.shape(), (index, Some(stem_index)));
            }
        }

        Ok(Stratum {
            name: self.name,
            table: self.table,
            phonological: self.phonological,
            morphological: self.morphological,
            templates: self.templates,
            morphological_order: self.morphological_order,
            entries,
            trie,
        })
    }
}

// =============================================================================
// Stratum
// =============================================================================

/// One layer of rules and lexical entries.
#[derive(Clone, Debug)]
pub struct Stratum {
    name: String,
    table: Arc<CharacterDefinitionTable>,
    phonological: Vec<PhonologicalRule>,
    morphological: Vec<MorphologicalRule>,
    templates: Vec<AffixTemplate>,
    morphological_order: MorphologicalOrder,
    entries: Vec<Arc<LexEntry>>,
    trie: SegmentTrie<(usize, Option<usize>)>,
}

impl Stratum {
    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the character table.
    #[must_use]
    pub fn table(&self) -> &Arc<CharacterDefinitionTable> {
        &self.table
    }

    /// Returns the phonological rules in application order.
    #[must_use]
    pub fn phonological_rules(&self) -> &[PhonologicalRule] {
        &self.phonological
    }

    /// Returns the morphological rules.
    #[must_use]
    pub fn morphological_rules(&self) -> &[MorphologicalRule] {
        &self.morphological
    }

    /// Returns the affix templates.
    #[must_use]
    pub fn templates(&self) -> &[AffixTemplate] {
        &self.templates
    }

    /// Returns the lexical entries.
    #[must_use]
    pub fn entries(&self) -> &[Arc<LexEntry>] {
        &self.entries
    }

    fn render(&self, shape: &PhoneticShape) -> String {
        self.table.render(shape)
    }

    /// Returns a hit for every entry with an allomorph or inflected stem
    /// matching `analysis`.
    ///
    /// A stem hit carries the stem's features as realizational features and
    /// is dropped if they clash with those already hypothesized.
    #[must_use]
    pub fn lookup(&self, analysis: &WordAnalysis) -> Vec<LexicalHit> {
        let mut found: Vec<(usize, Option<usize>)> = self.trie.search(&analysis.shape).into_iter().copied().collect();
        found.sort_unstable();
        found.dedup();
        found
            .into_iter()
            .filter_map(|(index, stem)| {
                let entry = self.entries.get(index)?;
                if !analysis.accepts_pos(entry.pos()) {
                    return None;
                }
                let mut hit = analysis.clone();
                if let Some(stem) = stem {
                    hit.realizational = analysis.realizational.unify(entry.stems().get(stem)?.features())?;
                }
                Some(LexicalHit {
                    entry: Arc::clone(entry),
                    analysis: hit,
                })
            })
            .collect()
    }

    /// Runs one analysis pass over `analysis`.
    ///
    /// # Errors
    ///
    /// Returns rule errors with the failing rule as a frame.
    pub fn analyze(
        &self,
        index: usize,
        analysis: WordAnalysis,
        config: &MorpherConfig,
        trace: &mut dyn Trace,
    ) -> Result<StratumAnalysis> {
        let mut analysis = analysis.into_stratum(index);
        let parent = analysis.trace;
        analysis.trace = trace
            .begin_unapply_stratum(parent, &self.name, &self.render(&analysis.shape))
            .or(parent);

        for rule in self.phonological.iter().rev() {
            let input = self.render(&analysis.shape);
            let changed = rule
                .unapply(&mut analysis, config.deletion_reapplications)
                .map_err(|e| e.with_frame(format!("rule {}", rule.name())))?;
            if changed {
                let output = self.render(&analysis.shape);
                analysis.trace = trace
                    .phonological_rule_unapplied(analysis.trace, rule.name(), &input, &output)
                    .or(analysis.trace);
            }
        }

        let mut result = StratumAnalysis::default();
        let mut worklist = VecDeque::from([analysis]);
        while let Some(current) = worklist.pop_front() {
            if result.analyses.len() >= config.max_analyses_per_stratum {
                debug!(stratum = %self.name, limit = config.max_analyses_per_stratum, "analysis limit reached");
                break;
            }
            let shape = self.render(&current.shape);
            let hits = self.lookup(&current);
            let node = trace
                .lexical_lookup(current.trace, &self.name, &shape, hits.len())
                .or(current.trace);
            for mut hit in hits {
                hit.analysis.trace = node;
                result.hits.push(hit);
            }
            worklist.extend(self.unapply_morphology(index, &current, config, trace)?);
            result.analyses.push(current);
        }

        debug!(
            stratum = %self.name,
            analyses = result.analyses.len(),
            hits = result.hits.len(),
            "stratum unapplied"
        );
        trace.end_unapply_stratum(parent, &self.name, result.analyses.len());
        Ok(result)
    }

    fn unapply_morphology(
        &self,
        index: usize,
        analysis: &WordAnalysis,
        config: &MorpherConfig,
        trace: &mut dyn Trace,
    ) -> Result<Vec<WordAnalysis>> {
        let input = self.render(&analysis.shape);
        let mut out = Vec::new();

        if !analysis.unapplied.iter().any(|p| p.stratum == index) {
            for template in &self.templates {
                let unapplied = template
                    .unapply(analysis, index)
                    .map_err(|e| e.with_frame(format!("template {}", template.name())))?;
                for mut next in unapplied {
                    let output = self.render(&next.shape);
                    next.trace = trace
                        .template_unapplied(analysis.trace, template.name(), &input, &output)
                        .or(next.trace);
                    out.push(next);
                }
            }
        }

        for (rule_index, rule) in self.morphological.iter().enumerate() {
            let allowed = match self.morphological_order {
                MorphologicalOrder::Linear => analysis.last_rule.is_none_or(|last| rule_index < last),
                MorphologicalOrder::Unordered => {
                    analysis.unapplication_count(rule.name()) < config.max_rule_unapplications
                }
            };
            if !allowed {
                continue;
            }
            let unapplied = rule
                .unapply(analysis, PendingRule::rule(index, rule.name()))
                .map_err(|e| e.with_frame(format!("rule {}", rule.name())))?;
            for mut next in unapplied {
                next.last_rule = Some(rule_index);
                let output = self.render(&next.shape);
                next.trace = trace
                    .morphological_rule_unapplied(analysis.trace, rule.name(), &input, &output)
                    .or(next.trace);
                out.push(next);
            }
        }
        Ok(out)
    }

    /// Runs one synthesis pass over `word`.
    ///
    /// Words whose next pending rule belongs to this stratum but cannot be
    /// applied are dropped.
    ///
    /// # Errors
    ///
    /// Returns rule errors with the failing rule as a frame.
    pub fn synthesize(&self, index: usize, word: WordSynthesis, trace: &mut dyn Trace) -> Result<Vec<WordSynthesis>> {
        let mut word = word;
        word.stratum = index;
        let parent = word.trace;
        word.trace = trace
            .begin_apply_stratum(parent, &self.name, &self.render(&word.shape))
            .or(parent);

        let mut worklist = VecDeque::from([word]);
        let mut finished = Vec::new();
        while let Some(current) = worklist.pop_front() {
            let Some(pending) = current.next_pending().filter(|p| p.stratum == index).cloned() else {
                finished.push(current);
                continue;
            };
            worklist.extend(self.apply_pending(&current, &pending, trace)?);
        }

        let mut out = Vec::with_capacity(finished.len());
        for mut word in finished {
            word.select_inflected_stem();
            self.apply_phonology(&mut word, trace)?;
            out.push(word);
        }

        debug!(stratum = %self.name, syntheses = out.len(), "stratum applied");
        trace.end_apply_stratum(parent, &self.name, out.len());
        Ok(out)
    }

    fn apply_pending(
        &self,
        word: &WordSynthesis,
        pending: &PendingRule,
        trace: &mut dyn Trace,
    ) -> Result<Vec<WordSynthesis>> {
        let input = self.render(&word.shape);
        let mut out = Vec::new();
        match &pending.slot {
            None => {
                let Some(rule) = self.morphological.iter().find(|r| r.name() == pending.rule) else {
                    return Ok(out);
                };
                let applied = rule
                    .apply(word)
                    .map_err(|e| e.with_frame(format!("rule {}", rule.name())))?;
                for mut next in applied {
                    let allomorph = next.morphs.back().map_or(0, |m| m.allomorph);
                    let output = self.render(&next.shape);
                    next.trace = trace
                        .morphological_rule_applied(word.trace, rule.name(), allomorph, &input, &output)
                        .or(next.trace);
                    out.push(next);
                }
            }
            Some((template_name, _)) => {
                let Some(template) = self.templates.iter().find(|t| t.name() == template_name) else {
                    return Ok(out);
                };
                let applied = template
                    .apply(word)
                    .map_err(|e| e.with_frame(format!("template {}", template.name())))?;
                for mut next in applied {
                    let output = self.render(&next.shape);
                    next.trace = trace
                        .template_applied(word.trace, template.name(), &input, &output)
                        .or(next.trace);
                    out.push(next);
                }
            }
        }
        Ok(out)
    }

    fn apply_phonology(&self, word: &mut WordSynthesis, trace: &mut dyn Trace) -> Result<()> {
        for rule in &self.phonological {
            if rule.is_blocked(&word.mpr) {
                trace.blocked(word.trace, rule.name());
                continue;
            }
            let input = self.render(&word.shape);
            let changed = rule
                .apply(word)
                .map_err(|e| e.with_frame(format!("rule {}", rule.name())))?;
            if changed {
                let output = self.render(&word.shape);
                word.trace = trace
                    .phonological_rule_applied(word.trace, rule.name(), &input, &output)
                    .or(word.trace);
            }
        }
        Ok(())
    }
}
