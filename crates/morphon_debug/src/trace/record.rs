//! Trace event and record types.

use morphon_rules::{FailureReason, TraceNodeId};

// =============================================================================
// Trace Event
// =============================================================================

/// Events reported by the analysis and synthesis search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// Analysis of a word started.
    AnalysisStart {
        /// The input word.
        word: String,
    },

    /// Analysis of a word finished.
    AnalysisEnd {
        /// The input word.
        word: String,
        /// Number of accepted results.
        results: usize,
    },

    /// A stratum started unapplying rules.
    UnapplyStratumStart {
        /// The stratum.
        stratum: String,
        /// The shape entering the stratum.
        shape: String,
    },

    /// A stratum finished unapplying rules.
    UnapplyStratumEnd {
        /// The stratum.
        stratum: String,
        /// Number of analyses produced.
        analyses: usize,
    },

    /// A stratum started applying rules.
    ApplyStratumStart {
        /// The stratum.
        stratum: String,
        /// The shape entering the stratum.
        shape: String,
    },

    /// A stratum finished applying rules.
    ApplyStratumEnd {
        /// The stratum.
        stratum: String,
        /// Number of syntheses produced.
        syntheses: usize,
    },

    /// A phonological rule was unapplied.
    PhonologicalRuleUnapplied {
        /// The rule.
        rule: String,
        /// Shape before.
        input: String,
        /// Shape after.
        output: String,
    },

    /// A phonological rule was applied.
    PhonologicalRuleApplied {
        /// The rule.
        rule: String,
        /// Shape before.
        input: String,
        /// Shape after.
        output: String,
    },

    /// A morphological rule was unapplied.
    MorphologicalRuleUnapplied {
        /// The rule.
        rule: String,
        /// Shape before.
        input: String,
        /// Shape after.
        output: String,
    },

    /// A morphological rule was applied.
    MorphologicalRuleApplied {
        /// The rule.
        rule: String,
        /// Index of the allomorph used.
        allomorph: usize,
        /// Shape before.
        input: String,
        /// Shape after.
        output: String,
    },

    /// An affix template was unapplied.
    TemplateUnapplied {
        /// The template.
        template: String,
        /// Shape before.
        input: String,
        /// Shape after.
        output: String,
    },

    /// An affix template was applied.
    TemplateApplied {
        /// The template.
        template: String,
        /// Shape before.
        input: String,
        /// Shape after.
        output: String,
    },

    /// The lexicon was searched.
    LexicalLookup {
        /// The stratum searched.
        stratum: String,
        /// The shape looked up.
        shape: String,
        /// Number of entries found.
        hits: usize,
    },

    /// A rule was blocked by MPR features.
    Blocked {
        /// The rule.
        rule: String,
    },

    /// A synthesized word was accepted.
    Successful {
        /// The surface form.
        surface: String,
    },

    /// A synthesized word was rejected.
    Failed {
        /// The surface form.
        surface: String,
        /// Why it was rejected.
        reason: FailureReason,
    },
}

impl TraceEvent {
    /// Returns a short name for the event type.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AnalysisStart { .. } => "analysis-start",
            Self::AnalysisEnd { .. } => "analysis-end",
            Self::UnapplyStratumStart { .. } => "unapply-stratum-start",
            Self::UnapplyStratumEnd { .. } => "unapply-stratum-end",
            Self::ApplyStratumStart { .. } => "apply-stratum-start",
            Self::ApplyStratumEnd { .. } => "apply-stratum-end",
            Self::PhonologicalRuleUnapplied { .. } => "phonological-rule-unapplied",
            Self::PhonologicalRuleApplied { .. } => "phonological-rule-applied",
            Self::MorphologicalRuleUnapplied { .. } => "morphological-rule-unapplied",
            Self::MorphologicalRuleApplied { .. } => "morphological-rule-applied",
            Self::TemplateUnapplied { .. } => "template-unapplied",
            Self::TemplateApplied { .. } => "template-applied",
            Self::LexicalLookup { .. } => "lexical-lookup",
            Self::Blocked { .. } => "blocked",
            Self::Successful { .. } => "successful",
            Self::Failed { .. } => "failed",
        }
    }

    /// Returns true if this event belongs to analysis.
    #[must_use]
    pub fn is_analysis_event(&self) -> bool {
        matches!(
            self,
            Self::UnapplyStratumStart { .. }
                | Self::UnapplyStratumEnd { .. }
                | Self::PhonologicalRuleUnapplied { .. }
                | Self::MorphologicalRuleUnapplied { .. }
                | Self::TemplateUnapplied { .. }
                | Self::LexicalLookup { .. }
        )
    }

    /// Returns true if this event belongs to synthesis.
    #[must_use]
    pub fn is_synthesis_event(&self) -> bool {
        matches!(
            self,
            Self::ApplyStratumStart { .. }
                | Self::ApplyStratumEnd { .. }
                | Self::PhonologicalRuleApplied { .. }
                | Self::MorphologicalRuleApplied { .. }
                | Self::TemplateApplied { .. }
                | Self::Blocked { .. }
        )
    }

    /// Returns true if this event ends a search branch.
    #[must_use]
    pub fn is_outcome(&self) -> bool {
        matches!(self, Self::Successful { .. } | Self::Failed { .. })
    }
}

// =============================================================================
// Trace Record
// =============================================================================

/// A timestamped trace record linked to the record it descends from.
#[derive(Clone, Debug)]
pub struct TraceRecord {
    /// Unique record ID within the session.
    pub id: TraceNodeId,
    /// The record this one descends from.
    pub parent: Option<TraceNodeId>,
    /// Timestamp in nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The trace event.
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a new trace record.
    #[must_use]
    pub fn new(id: TraceNodeId, parent: Option<TraceNodeId>, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            parent,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}
