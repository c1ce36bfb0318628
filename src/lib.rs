//! Morphon - Rule-based morphological analysis and synthesis
//!
//! This crate re-exports all layers of the Morphon system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: morphon_debug      — Recording tracer, trace buffer, formatters
//! Layer 3: morphon_engine     — Lexicon trie, strata, the morpher
//! Layer 2: morphon_rules      — Phonological and morphological rules, templates, lexicon
//! Layer 1: morphon_phonetics  — Shapes, character tables, patterns, matcher
//! Layer 0: morphon_foundation — Features, bundles, variables, Error
//! ```

pub use morphon_debug as debug;
pub use morphon_engine as engine;
pub use morphon_foundation as foundation;
pub use morphon_phonetics as phonetics;
pub use morphon_rules as rules;
