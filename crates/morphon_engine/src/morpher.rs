//! The morpher: analysis followed by synthesis.
//!
//! `analyze_and_synthesize` tokenizes a surface word, unapplies every
//! stratum from the surface down, and collects the lexical entries found on
//! the way. Each entry is then synthesized back up through the strata, and
//! the results are filtered:
//! 1. Validity (pending rules, obligatory features, allomorph constraints)
//! 2. Surface match against the input
//! 3. Allomorph precedence within each morpheme sequence
//! 4. Duplicate suppression

use std::sync::Arc;

use morphon_foundation::{Error, Result};
use morphon_rules::{FailureReason, NoTrace, Trace, WordAnalysis, WordSynthesis};
use tracing::debug;

use crate::config::MorpherConfig;
use crate::stratum::{LexicalHit, Stratum};

/// Analyzes and synthesizes words over a stack of strata.
///
/// Strata are ordered deepest first; the last stratum is the surface.
#[derive(Clone, Debug)]
pub struct Morpher {
    strata: Vec<Stratum>,
    config: MorpherConfig,
}

impl Morpher {
    /// Creates a morpher.
    ///
    /// # Errors
    ///
    /// Returns an unsupported error if `strata` is empty.
    pub fn new(strata: Vec<Stratum>, config: MorpherConfig) -> Result<Self> {
        if strata.is_empty() {
            return Err(Error::unsupported("morpher without strata"));
        }
        Ok(Self { strata, config })
    }

    /// Returns the strata, deepest first.
    #[must_use]
    pub fn strata(&self) -> &[Stratum] {
        &self.strata
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &MorpherConfig {
        &self.config
    }

    fn surface(&self) -> &Stratum {
        // `new` rejects empty stacks.
        &self.strata[self.strata.len() - 1]
    }

    /// Analyzes `word` and returns every accepted synthesis.
    ///
    /// # Errors
    ///
    /// Returns an invalid shape error if the word cannot be tokenized, and
    /// propagates rule errors.
    pub fn analyze_and_synthesize(&self, word: &str) -> Result<Vec<WordSynthesis>> {
        self.analyze_and_synthesize_traced(word, &mut NoTrace)
    }

    /// Like [`analyze_and_synthesize`](Self::analyze_and_synthesize), reporting
    /// every step to `trace`.
    ///
    /// # Errors
    ///
    /// See [`analyze_and_synthesize`](Self::analyze_and_synthesize).
    pub fn analyze_and_synthesize_traced(&self, word: &str, trace: &mut dyn Trace) -> Result<Vec<WordSynthesis>> {
        let hits = self.analyze(word, trace)?;
        let mut candidates = Vec::new();
        for hit in &hits {
            candidates.extend(self.synthesize(hit, trace)?);
        }
        debug!(word, hits = hits.len(), candidates = candidates.len(), "synthesis finished");
        let results = self.select(word, candidates, trace);
        trace.end_analysis(word, results.len());
        Ok(results)
    }

    /// Unapplies every stratum and returns the lexical entries found.
    ///
    /// # Errors
    ///
    /// See [`analyze_and_synthesize`](Self::analyze_and_synthesize).
    pub fn analyze(&self, word: &str, trace: &mut dyn Trace) -> Result<Vec<LexicalHit>> {
        let top = self.strata.len() - 1;
        let mut analysis = WordAnalysis::new(self.surface().table().to_shape(word)?, top);
        analysis.trace = trace.begin_analysis(word);

        let mut frontier = vec![analysis];
        let mut hits = Vec::new();
        for (index, stratum) in self.strata.iter().enumerate().rev() {
            let mut next = Vec::new();
            for analysis in frontier {
                let result = stratum
                    .analyze(index, analysis, &self.config, trace)
                    .map_err(|e| e.with_frame(format!("stratum {}", stratum.name())))?;
                hits.extend(result.hits);
                next.extend(result.analyses);
            }
            frontier = next;
        }
        debug!(word, hits = hits.len(), "analysis finished");
        Ok(hits)
    }

    /// Synthesizes every allomorph of a hit's entry up to the surface.
    ///
    /// # Errors
    ///
    /// Propagates rule errors.
    pub fn synthesize(&self, hit: &LexicalHit, trace: &mut dyn Trace) -> Result<Vec<WordSynthesis>> {
        let mut out = Vec::new();
        for allomorph in 0..hit.entry.allomorphs().len() {
            let Some(word) = WordSynthesis::new(Arc::clone(&hit.entry), allomorph, &hit.analysis) else {
                continue;
            };
            let mut frontier = vec![word];
            for (index, stratum) in self.strata.iter().enumerate().skip(hit.analysis.stratum) {
                let mut next = Vec::new();
                for word in frontier {
                    next.extend(
                        stratum
                            .synthesize(index, word, trace)
                            .map_err(|e| e.with_frame(format!("stratum {}", stratum.name())))?,
                    );
                }
                frontier = next;
            }
            out.extend(frontier);
        }
        Ok(out)
    }

    fn select(&self, word: &str, candidates: Vec<WordSynthesis>, trace: &mut dyn Trace) -> Vec<WordSynthesis> {
        let table = self.surface().table();

        let mut valid = Vec::new();
        for candidate in candidates {
            match candidate.validate() {
                Ok(()) => valid.push(candidate),
                Err(reason) => trace.failed(candidate.trace, &table.render(&candidate.shape), &reason),
            }
        }

        let mut matching = Vec::new();
        for candidate in valid {
            if table.matches_surface(&candidate.shape, word) {
                matching.push(candidate);
            } else {
                let surface = table.render(&candidate.shape);
                trace.failed(candidate.trace, &surface, &FailureReason::SurfaceMismatch);
            }
        }

        let outranked: Vec<bool> = matching
            .iter()
            .map(|candidate| matching.iter().any(|other| outranks(other, candidate)))
            .collect();

        let mut results: Vec<WordSynthesis> = Vec::new();
        for (candidate, outranked) in matching.into_iter().zip(outranked) {
            let surface = table.render(&candidate.shape);
            let reason = if outranked {
                Some(FailureReason::Precedence)
            } else if results.iter().any(|r| r.same_result(&candidate)) {
                Some(FailureReason::Duplicate)
            } else {
                None
            };
            match reason {
                Some(reason) => trace.failed(candidate.trace, &surface, &reason),
                None => {
                    trace.successful(candidate.trace, &surface);
                    results.push(candidate);
                }
            }
        }
        results
    }
}

/// Returns true if `winner` uses an earlier allomorph than `loser` for the
/// same morpheme sequence. Allomorphs with equal constraints fluctuate freely
/// and never outrank each other.
fn outranks(winner: &WordSynthesis, loser: &WordSynthesis) -> bool {
    if winner.morpheme_ids() != loser.morpheme_ids() {
        return false;
    }
    winner
        .morphs
        .iter()
        .zip(loser.morphs.iter())
        .find(|(w, l)| w.allomorph != l.allomorph)
        .is_some_and(|(w, l)| w.allomorph < l.allomorph && w.constraints != l.constraints)
}
