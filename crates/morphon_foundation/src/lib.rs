//! Core types for Morphon: feature systems, bundles, and variable bindings.
//!
//! This crate provides:
//! - [`FeatureSystem`] - Registry of features and their values
//! - [`FeatureBundle`] - 128-bit phonetic feature sets with subset unification
//! - [`FeatureValues`] - Recursive head and foot feature maps
//! - [`VariableValues`] - Alpha-variable bindings for agreement constraints
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bundle;
pub mod error;
pub mod feature;
pub mod values;
pub mod variables;

pub use bundle::{BUNDLE_CAPACITY, FeatureBundle};
pub use error::{CapacityLimit, Error, ErrorContext, ErrorKind, Result};
pub use feature::{Feature, FeatureId, FeatureSystem, FeatureValue, ValueId};
pub use values::{FeatureValues, ValueInstance};
pub use variables::{AlphaVariable, BindingStrategy, VariableConstraint, VariableValues};
