//! Trace hooks.
//!
//! The search calls a fixed set of [`Trace`] callbacks. Every method has a
//! no-op default, so an implementation overrides only what it records.
//! Callbacks that open a node return a [`TraceNodeId`] that the search stores
//! on the resulting word and passes back as the parent of later events.
//! Nothing a callback returns influences control flow.

use std::fmt;

/// Handle of a recorded trace node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceNodeId(pub u64);

impl fmt::Display for TraceNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a synthesized word was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// Rules hypothesized during analysis were never applied.
    PendingRules,
    /// An obligatory head feature is missing.
    ObligatoryFeatures,
    /// An allomorph environment did not match.
    Environment,
    /// A morpheme co-occurrence constraint failed.
    CoOccurrence,
    /// An MPR feature requirement failed.
    Mpr,
    /// A lower-index allomorph of the same morpheme sequence won.
    Precedence,
    /// The surface form does not match the input.
    SurfaceMismatch,
    /// An identical result was already produced.
    Duplicate,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::PendingRules => "unapplied rules remain",
            Self::ObligatoryFeatures => "obligatory head features missing",
            Self::Environment => "allomorph environment not satisfied",
            Self::CoOccurrence => "co-occurrence constraint failed",
            Self::Mpr => "MPR features not satisfied",
            Self::Precedence => "outranked by an earlier allomorph",
            Self::SurfaceMismatch => "surface form does not match input",
            Self::Duplicate => "duplicate result",
        };
        f.write_str(text)
    }
}

/// Callbacks invoked by the analysis and synthesis search.
#[allow(unused_variables)]
pub trait Trace {
    /// Analysis of a word starts.
    fn begin_analysis(&mut self, word: &str) -> Option<TraceNodeId> {
        None
    }

    /// Analysis of a word finished with `results` accepted syntheses.
    fn end_analysis(&mut self, word: &str, results: usize) {}

    /// A stratum starts unapplying rules to `shape`.
    fn begin_unapply_stratum(
        &mut self,
        parent: Option<TraceNodeId>,
        stratum: &str,
        shape: &str,
    ) -> Option<TraceNodeId> {
        None
    }

    /// A stratum finished unapplying rules.
    fn end_unapply_stratum(&mut self, parent: Option<TraceNodeId>, stratum: &str, analyses: usize) {}

    /// A stratum starts applying rules to `shape`.
    fn begin_apply_stratum(
        &mut self,
        parent: Option<TraceNodeId>,
        stratum: &str,
        shape: &str,
    ) -> Option<TraceNodeId> {
        None
    }

    /// A stratum finished applying rules.
    fn end_apply_stratum(&mut self, parent: Option<TraceNodeId>, stratum: &str, syntheses: usize) {}

    /// A phonological rule was unapplied.
    fn phonological_rule_unapplied(
        &mut self,
        parent: Option<TraceNodeId>,
        rule: &str,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        None
    }

    /// A phonological rule was applied.
    fn phonological_rule_applied(
        &mut self,
        parent: Option<TraceNodeId>,
        rule: &str,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        None
    }

    /// A morphological rule was unapplied.
    fn morphological_rule_unapplied(
        &mut self,
        parent: Option<TraceNodeId>,
        rule: &str,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        None
    }

    /// A morphological rule was applied using allomorph `allomorph`.
    fn morphological_rule_applied(
        &mut self,
        parent: Option<TraceNodeId>,
        rule: &str,
        allomorph: usize,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        None
    }

    /// An affix template was unapplied.
    fn template_unapplied(
        &mut self,
        parent: Option<TraceNodeId>,
        template: &str,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        None
    }

    /// An affix template was applied.
    fn template_applied(
        &mut self,
        parent: Option<TraceNodeId>,
        template: &str,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        None
    }

    /// The lexicon was searched for `shape`, finding `hits` entries.
    fn lexical_lookup(
        &mut self,
        parent: Option<TraceNodeId>,
        stratum: &str,
        shape: &str,
        hits: usize,
    ) -> Option<TraceNodeId> {
        None
    }

    /// A rule was blocked by MPR features.
    fn blocked(&mut self, parent: Option<TraceNodeId>, rule: &str) {}

    /// A synthesized word was accepted.
    fn successful(&mut self, parent: Option<TraceNodeId>, surface: &str) {}

    /// A synthesized word was rejected.
    fn failed(&mut self, parent: Option<TraceNodeId>, surface: &str, reason: &FailureReason) {}
}

/// A trace that records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTrace;

impl Trace for NoTrace {}
