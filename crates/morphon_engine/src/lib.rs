//! Search engine for Morphon: lexicon index, strata, and the morpher.
//!
//! This crate provides:
//! - [`SegmentTrie`] - Right-anchored lexicon index over segment bundles
//! - [`Stratum`] - One layer of rules and entries, built with [`StratumBuilder`]
//! - [`Morpher`] - Analysis followed by synthesis over a stack of strata
//! - [`MorpherConfig`] - Search limits

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod morpher;
pub mod stratum;
pub mod trie;

pub use config::{MorpherConfig, MorphologicalOrder, PhonologicalOrder};
pub use morpher::Morpher;
pub use stratum::{LexicalHit, Stratum, StratumAnalysis, StratumBuilder};
pub use trie::SegmentTrie;
