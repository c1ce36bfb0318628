//! Rule layer for Morphon: lexicon, phonological and morphological rules.
//!
//! This crate provides:
//! - [`LexEntry`] - Lexical entries with root allomorphs and inflected stems
//! - [`PhonologicalRule`] - Rewrite and metathesis rules with apply/unapply
//! - [`Transform`] - Partitioned input to output rewriting for affixation
//! - [`MorphologicalRule`] and [`AffixTemplate`] - Morpheme attachment
//! - [`WordAnalysis`] and [`WordSynthesis`] - The states the search moves through
//! - [`Trace`] - Hooks for observing rule applications

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod lexicon;
pub mod morphological;
pub mod phonological;
pub mod trace;
pub mod transform;
pub mod word;

pub use lexicon::{
    Adjacency, AllomorphConstraints, AllomorphEnvironment, CoOccurrence, CoOccurrenceKind,
    InflectedStem, LexEntry, RootAllomorph,
};
pub use morphological::{AffixSlot, AffixTemplate, MorphologicalAllomorph, MorphologicalRule};
pub use phonological::{
    ApplicationOrder, MetathesisRule, PhonologicalRule, PhonologicalSubrule, RuleConditions,
    StandardRule, SubruleKind,
};
pub use trace::{FailureReason, NoTrace, Trace, TraceNodeId};
pub use transform::{AffixKind, AffixSegments, OutputOp, Transform, any_segments};
pub use word::{Morph, PendingRule, WordAnalysis, WordSynthesis};
