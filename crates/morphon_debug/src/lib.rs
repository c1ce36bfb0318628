//! Debugging support for Morphon.
//!
//! This crate provides:
//! - [`Tracer`] - A [`Trace`](morphon_rules::Trace) implementation that records every step
//! - [`TraceBuffer`] - Bounded storage of records with parent links
//! - [`HumanFormatter`] and [`JsonFormatter`] - Record rendering

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod trace;

pub use config::{TraceOutput, TracerConfig};
pub use trace::{
    HumanFormatter, JsonFormatter, TraceBuffer, TraceBufferStats, TraceEvent, TraceFormatter,
    TraceRecord, Tracer,
};
