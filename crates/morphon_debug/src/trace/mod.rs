//! Recording trace sink for the morpher.
//!
//! [`Tracer`] implements [`Trace`] by turning every callback into a
//! [`TraceRecord`] linked to its parent. The records of one call to
//! `analyze_and_synthesize_traced` form a tree rooted at its
//! `analysis-start` record: each leaf is a `successful` or `failed` outcome,
//! and [`TraceBuffer::path`] reads a branch back from root to leaf.
//!
//! # Example
//!
//! ```text
//! let mut tracer = Tracer::new(TracerConfig::new());
//! morpher.analyze_and_synthesize_traced("tots", &mut tracer)?;
//! println!("{}", HumanFormatter::new().format_tree(tracer.buffer()));
//! ```

pub mod buffer;
pub mod format;
pub mod record;

pub use buffer::{TraceBuffer, TraceBufferStats};
pub use format::{HumanFormatter, JsonFormatter, TraceFormatter};
pub use record::{TraceEvent, TraceRecord};

use std::io::{self, Write};
use std::time::Instant;

use morphon_rules::{FailureReason, Trace, TraceNodeId};

use crate::config::{TraceOutput, TracerConfig};

// =============================================================================
// Tracer
// =============================================================================

/// Records search events into a bounded buffer.
///
/// A disabled tracer returns immediately from every callback, so the search
/// keeps the parent node it already had.
#[derive(Debug)]
pub struct Tracer {
    config: TracerConfig,
    buffer: TraceBuffer,
    start_time: Instant,
    human_formatter: HumanFormatter,
    json_formatter: JsonFormatter,
}

impl Tracer {
    /// Creates a new tracer with the given configuration.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        let buffer_size = config.buffer_size;
        Self {
            config,
            buffer: TraceBuffer::new(buffer_size),
            start_time: Instant::now(),
            human_formatter: HumanFormatter::new().with_ids(),
            json_formatter: JsonFormatter::new(),
        }
    }

    /// Creates a tracer that records nothing until enabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TracerConfig::new().with_enabled(false))
    }

    /// Creates an enabled tracer that also writes to stderr.
    #[must_use]
    pub fn to_stderr() -> Self {
        Self::new(TracerConfig::new().to_stderr())
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Returns whether tracing is enabled.
    #[must_use]
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Enables tracing.
    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    /// Disables tracing.
    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    /// Sets whether to use JSON output format.
    pub fn set_json_format(&mut self, json: bool) {
        self.config.json_format = json;
    }

    /// Records an event below `parent`.
    ///
    /// Returns the new record's ID, or `None` if the event was not recorded.
    #[inline]
    pub fn record(&mut self, parent: Option<TraceNodeId>, event: TraceEvent) -> Option<TraceNodeId> {
        if !self.config.enabled {
            return None;
        }
        self.record_internal(parent, event)
    }

    fn record_internal(&mut self, parent: Option<TraceNodeId>, event: TraceEvent) -> Option<TraceNodeId> {
        if !self.config.records(event.event_type()) {
            return None;
        }

        #[allow(clippy::cast_possible_truncation)]
        let timestamp_ns = self.start_time.elapsed().as_nanos() as u64;
        let id = self.buffer.push(parent, timestamp_ns, event);

        if self.config.output == TraceOutput::Stderr {
            if let Some(record) = self.buffer.get(id) {
                let line = self.format_record(record);
                let _ = writeln!(io::stderr(), "{line}");
            }
        }
        Some(id)
    }

    /// Formats a record using the current format settings.
    #[must_use]
    pub fn format_record(&self, record: &TraceRecord) -> String {
        if self.config.json_format {
            self.json_formatter.format(record)
        } else {
            self.human_formatter.format(record)
        }
    }

    /// Formats multiple records.
    #[must_use]
    pub fn format_records(&self, records: &[&TraceRecord]) -> String {
        if self.config.json_format {
            self.json_formatter.format_many(records)
        } else {
            self.human_formatter.format_many(records)
        }
    }

    /// Returns the trace buffer.
    #[must_use]
    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    /// Clears the trace buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Returns buffer statistics.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        self.buffer.stats()
    }

    /// Returns every recorded outcome, oldest first.
    #[must_use]
    pub fn outcomes(&self) -> Vec<&TraceRecord> {
        self.buffer.filter(|r| r.event.is_outcome())
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(TracerConfig::default())
    }
}

// =============================================================================
// Trace Callbacks
// =============================================================================

impl Trace for Tracer {
    fn begin_analysis(&mut self, word: &str) -> Option<TraceNodeId> {
        self.record(None, TraceEvent::AnalysisStart { word: word.to_string() })
    }

    fn end_analysis(&mut self, word: &str, results: usize) {
        self.record(None, TraceEvent::AnalysisEnd {
            word: word.to_string(),
            results,
        });
    }

    fn begin_unapply_stratum(&mut self, parent: Option<TraceNodeId>, stratum: &str, shape: &str) -> Option<TraceNodeId> {
        self.record(parent, TraceEvent::UnapplyStratumStart {
            stratum: stratum.to_string(),
            shape: shape.to_string(),
        })
    }

    fn end_unapply_stratum(&mut self, parent: Option<TraceNodeId>, stratum: &str, analyses: usize) {
        self.record(parent, TraceEvent::UnapplyStratumEnd {
            stratum: stratum.to_string(),
            analyses,
        });
    }

    fn begin_apply_stratum(&mut self, parent: Option<TraceNodeId>, stratum: &str, shape: &str) -> Option<TraceNodeId> {
        self.record(parent, TraceEvent::ApplyStratumStart {
            stratum: stratum.to_string(),
            shape: shape.to_string(),
        })
    }

    fn end_apply_stratum(&mut self, parent: Option<TraceNodeId>, stratum: &str, syntheses: usize) {
        self.record(parent, TraceEvent::ApplyStratumEnd {
            stratum: stratum.to_string(),
            syntheses,
        });
    }

    fn phonological_rule_unapplied(
        &mut self,
        parent: Option<TraceNodeId>,
        rule: &str,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        self.record(parent, TraceEvent::PhonologicalRuleUnapplied {
            rule: rule.to_string(),
            input: input.to_string(),
            output: output.to_string(),
        })
    }

    fn phonological_rule_applied(
        &mut self,
        parent: Option<TraceNodeId>,
        rule: &str,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        self.record(parent, TraceEvent::PhonologicalRuleApplied {
            rule: rule.to_string(),
            input: input.to_string(),
            output: output.to_string(),
        })
    }

    fn morphological_rule_unapplied(
        &mut self,
        parent: Option<TraceNodeId>,
        rule: &str,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        self.record(parent, TraceEvent::MorphologicalRuleUnapplied {
            rule: rule.to_string(),
            input: input.to_string(),
            output: output.to_string(),
        })
    }

    fn morphological_rule_applied(
        &mut self,
        parent: Option<TraceNodeId>,
        rule: &str,
        allomorph: usize,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        self.record(parent, TraceEvent::MorphologicalRuleApplied {
            rule: rule.to_string(),
            allomorph,
            input: input.to_string(),
            output: output.to_string(),
        })
    }

    fn template_unapplied(
        &mut self,
        parent: Option<TraceNodeId>,
        template: &str,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        self.record(parent, TraceEvent::TemplateUnapplied {
            template: template.to_string(),
            input: input.to_string(),
            output: output.to_string(),
        })
    }

    fn template_applied(
        &mut self,
        parent: Option<TraceNodeId>,
        template: &str,
        input: &str,
        output: &str,
    ) -> Option<TraceNodeId> {
        self.record(parent, TraceEvent::TemplateApplied {
            template: template.to_string(),
            input: input.to_string(),
            output: output.to_string(),
        })
    }

    fn lexical_lookup(
        &mut self,
        parent: Option<TraceNodeId>,
        stratum: &str,
        shape: &str,
        hits: usize,
    ) -> Option<TraceNodeId> {
        self.record(parent, TraceEvent::LexicalLookup {
            stratum: stratum.to_string(),
            shape: shape.to_string(),
            hits,
        })
    }

    fn blocked(&mut self, parent: Option<TraceNodeId>, rule: &str) {
        self.record(parent, TraceEvent::Blocked { rule: rule.to_string() });
    }

    fn successful(&mut self, parent: Option<TraceNodeId>, surface: &str) {
        self.record(parent, TraceEvent::Successful {
            surface: surface.to_string(),
        });
    }

    fn failed(&mut self, parent: Option<TraceNodeId>, surface: &str, reason: &FailureReason) {
        self.record(parent, TraceEvent::Failed {
            surface: surface.to_string(),
            reason: reason.clone(),
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
