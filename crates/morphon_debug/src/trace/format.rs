//! Trace output formatters.
//!
//! Provides human-readable and JSON formatters for trace records.

use std::fmt::Write;

use super::buffer::TraceBuffer;
use super::record::{TraceEvent, TraceRecord};

// =============================================================================
// Trace Formatter Trait
// =============================================================================

/// Trait for formatting trace records.
pub trait TraceFormatter {
    /// Formats a single trace record to a string.
    fn format(&self, record: &TraceRecord) -> String;

    /// Formats multiple records.
    fn format_many(&self, records: &[&TraceRecord]) -> String {
        records
            .iter()
            .map(|r| self.format(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// Human-Readable Formatter
// =============================================================================

/// Formats trace records in human-readable form.
#[derive(Clone, Debug, Default)]
pub struct HumanFormatter {
    /// Whether to include timestamps.
    pub show_timestamps: bool,
    /// Whether to include record IDs.
    pub show_ids: bool,
}

impl HumanFormatter {
    /// Creates a new human formatter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to show timestamps.
    #[must_use]
    pub fn with_timestamps(mut self) -> Self {
        self.show_timestamps = true;
        self
    }

    /// Builder method to show record IDs.
    #[must_use]
    pub fn with_ids(mut self) -> Self {
        self.show_ids = true;
        self
    }

    /// Formats timestamp in microseconds.
    #[allow(clippy::cast_precision_loss)]
    fn format_timestamp(ns: u64) -> String {
        let us = ns / 1000;
        if us >= 1_000_000 {
            format!("{:.3}s", us as f64 / 1_000_000.0)
        } else if us >= 1000 {
            format!("{:.3}ms", us as f64 / 1000.0)
        } else {
            format!("{us}us")
        }
    }

    fn describe(event: &TraceEvent) -> String {
        match event {
            TraceEvent::AnalysisStart { word } => format!("=== ANALYZE {word} ==="),
            TraceEvent::AnalysisEnd { word, results } => format!("=== {word}: {results} result(s) ==="),
            TraceEvent::UnapplyStratumStart { stratum, shape } => format!(">> unapply {stratum}: {shape}"),
            TraceEvent::UnapplyStratumEnd { stratum, analyses } => {
                format!("<< unapply {stratum}: {analyses} analyses")
            }
            TraceEvent::ApplyStratumStart { stratum, shape } => format!(">> apply {stratum}: {shape}"),
            TraceEvent::ApplyStratumEnd { stratum, syntheses } => {
                format!("<< apply {stratum}: {syntheses} syntheses")
            }
            TraceEvent::PhonologicalRuleUnapplied { rule, input, output } => {
                format!("UNAPPLY {rule} {input} -> {output}")
            }
            TraceEvent::PhonologicalRuleApplied { rule, input, output } => {
                format!("APPLY {rule} {input} -> {output}")
            }
            TraceEvent::MorphologicalRuleUnapplied { rule, input, output } => {
                format!("UNAPPLY +{rule} {input} -> {output}")
            }
            TraceEvent::MorphologicalRuleApplied {
                rule,
                allomorph,
                input,
                output,
            } => format!("APPLY +{rule}[{allomorph}] {input} -> {output}"),
            TraceEvent::TemplateUnapplied { template, input, output } => {
                format!("UNAPPLY template {template} {input} -> {output}")
            }
            TraceEvent::TemplateApplied { template, input, output } => {
                format!("APPLY template {template} {input} -> {output}")
            }
            TraceEvent::LexicalLookup { stratum, shape, hits } => {
                format!("LOOKUP {stratum} {shape}: {hits} hit(s)")
            }
            TraceEvent::Blocked { rule } => format!("BLOCKED {rule}"),
            TraceEvent::Successful { surface } => format!("OK {surface}"),
            TraceEvent::Failed { surface, reason } => format!("FAILED {surface}: {reason}"),
        }
    }

    fn prefix(&self, record: &TraceRecord) -> String {
        let mut prefix = String::new();
        if self.show_ids {
            let _ = write!(prefix, "[{:06}] ", record.id.0);
        }
        if self.show_timestamps {
            let _ = write!(prefix, "{:>10} ", Self::format_timestamp(record.timestamp_ns));
        }
        prefix
    }

    /// Formats every record in `buffer`, indented by its depth in the search.
    #[must_use]
    pub fn format_tree(&self, buffer: &TraceBuffer) -> String {
        buffer
            .iter()
            .map(|record| {
                let indent = "  ".repeat(buffer.depth(record.id));
                format!("{}{indent}{}", self.prefix(record), Self::describe(&record.event))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TraceFormatter for HumanFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        format!("{}{}", self.prefix(record), Self::describe(&record.event))
    }
}

// =============================================================================
// JSON Formatter
// =============================================================================

/// Formats trace records as JSON objects, one per line.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Creates a new JSON formatter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Escapes a string for JSON.
    fn escape_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    fn string_field(name: &str, value: &str) -> String {
        format!("\"{name}\":\"{}\"", Self::escape_string(value))
    }

    fn rewrite_fields(name: &str, key: &str, input: &str, output: &str) -> String {
        format!(
            "{},{},{}",
            Self::string_field(key, name),
            Self::string_field("input", input),
            Self::string_field("output", output)
        )
    }

    fn event_data(event: &TraceEvent) -> String {
        match event {
            TraceEvent::AnalysisStart { word } => Self::string_field("word", word),
            TraceEvent::AnalysisEnd { word, results } => {
                format!("{},\"results\":{results}", Self::string_field("word", word))
            }
            TraceEvent::UnapplyStratumStart { stratum, shape } | TraceEvent::ApplyStratumStart { stratum, shape } => {
                format!("{},{}", Self::string_field("stratum", stratum), Self::string_field("shape", shape))
            }
            TraceEvent::UnapplyStratumEnd { stratum, analyses: count }
            | TraceEvent::ApplyStratumEnd { stratum, syntheses: count } => {
                format!("{},\"count\":{count}", Self::string_field("stratum", stratum))
            }
            TraceEvent::PhonologicalRuleUnapplied { rule, input, output }
            | TraceEvent::PhonologicalRuleApplied { rule, input, output }
            | TraceEvent::MorphologicalRuleUnapplied { rule, input, output } => {
                Self::rewrite_fields(rule, "rule", input, output)
            }
            TraceEvent::MorphologicalRuleApplied {
                rule,
                allomorph,
                input,
                output,
            } => format!(
                "{},\"allomorph\":{allomorph}",
                Self::rewrite_fields(rule, "rule", input, output)
            ),
            TraceEvent::TemplateUnapplied { template, input, output }
            | TraceEvent::TemplateApplied { template, input, output } => {
                Self::rewrite_fields(template, "template", input, output)
            }
            TraceEvent::LexicalLookup { stratum, shape, hits } => format!(
                "{},{},\"hits\":{hits}",
                Self::string_field("stratum", stratum),
                Self::string_field("shape", shape)
            ),
            TraceEvent::Blocked { rule } => Self::string_field("rule", rule),
            TraceEvent::Successful { surface } => Self::string_field("surface", surface),
            TraceEvent::Failed { surface, reason } => format!(
                "{},{}",
                Self::string_field("surface", surface),
                Self::string_field("reason", &reason.to_string())
            ),
        }
    }
}

impl TraceFormatter for JsonFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let parent = record
            .parent
            .map_or_else(|| "null".to_string(), |p| p.0.to_string());
        format!(
            "{{\"id\":{},\"parent\":{parent},\"ts\":{},\"type\":\"{}\",{}}}",
            record.id.0,
            record.timestamp_ns,
            record.event_type(),
            Self::event_data(&record.event)
        )
    }
}
