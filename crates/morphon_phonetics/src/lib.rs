//! Phonetic layer for Morphon: character tables, shapes, patterns, matching.
//!
//! This crate provides:
//! - [`CharacterDefinitionTable`] - String to segment/boundary tokenization
//! - [`PhoneticShape`] - Arena-backed, capacity-bounded word representation
//! - [`Pattern`] - Segment, natural class, boundary, margin, and nested contexts
//! - [`Matcher`] - Directional, mode-aware pattern matching with partitions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod chars;
pub mod matcher;
pub mod pattern;
pub mod shape;

pub use chars::{BoundaryDefinition, CharacterDefinitionTable, SegmentDefinition};
pub use matcher::{Match, MatchMode, MatchOptions, Matcher};
pub use pattern::{
    BoundaryContext, NaturalClass, NestedPattern, Pattern, PatternItem, PatternNode,
    SegmentContext,
};
pub use shape::{Direction, MarginSide, NodeId, NodeKind, PhoneticShape, ShapeNode};
