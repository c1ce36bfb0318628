//! Error types for the Morphon system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//!
//! Only genuine faults are errors: unreadable input, agreement variables that
//! can never be bound, and capacity violations. A pattern that does not match
//! or a rule that does not apply is ordinary control flow and never reaches
//! this module.

use std::fmt;

use thiserror::Error;

/// The main error type for Morphon operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Adds a frame to this error's context, creating the context if needed.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_frame(frame));
        self
    }

    /// Creates an invalid shape error for a word that could not be tokenized.
    #[must_use]
    pub fn invalid_shape(word: impl Into<String>, matched: impl Into<String>, position: usize) -> Self {
        Self::new(ErrorKind::InvalidShape {
            word: word.into(),
            matched: matched.into(),
            position,
        })
    }

    /// Creates an uninstantiated feature error for an unbound variable.
    #[must_use]
    pub fn uninstantiated_feature(variable: impl Into<String>) -> Self {
        Self::new(ErrorKind::UninstantiatedFeature {
            variable: variable.into(),
        })
    }

    /// Creates a capacity exceeded error.
    #[must_use]
    pub fn capacity_exceeded(limit: CapacityLimit) -> Self {
        Self::new(ErrorKind::CapacityExceeded(limit))
    }

    /// Creates an invalid rule error.
    #[must_use]
    pub fn invalid_rule(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRule(message.into()))
    }

    /// Creates an unsupported configuration error.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported(message.into()))
    }

    /// Creates an unknown feature error.
    #[must_use]
    pub fn unknown_feature(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownFeature(name.into()))
    }

    /// Creates an unknown feature value error.
    #[must_use]
    pub fn unknown_value(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownValue(name.into()))
    }

    /// Returns true if this error was caused by a capacity violation.
    #[must_use]
    pub fn is_capacity(&self) -> bool {
        matches!(self.kind, ErrorKind::CapacityExceeded(_))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The input word contains characters with no segment or boundary definition.
    #[error("invalid shape for {word:?}: matched {matched:?}, failed at position {position}")]
    InvalidShape {
        /// The word being converted.
        word: String,
        /// The longest prefix that was successfully converted.
        matched: String,
        /// Character offset where conversion failed.
        position: usize,
    },

    /// An agreement variable required by a rule was never bound.
    #[error("uninstantiated feature: variable {variable} was never bound")]
    UninstantiatedFeature {
        /// The variable name.
        variable: String,
    },

    /// A hard capacity limit was exceeded.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(CapacityLimit),

    /// A rule definition is structurally invalid.
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// A configuration option is not supported.
    #[error("unsupported configuration: {0}")]
    Unsupported(String),

    /// A feature name was not registered.
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// A feature value name was not registered.
    #[error("unknown feature value: {0}")]
    UnknownValue(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Hard capacity limits that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityLimit {
    /// A phonetic shape grew past its node capacity.
    ShapeNodes {
        /// The configured limit.
        limit: usize,
    },
    /// A bounded feature system registered too many values.
    FeatureValues {
        /// The configured limit.
        limit: usize,
        /// The value that did not fit.
        value: Option<String>,
    },
}

impl fmt::Display for CapacityLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeNodes { limit } => {
                write!(f, "phonetic shape holds at most {limit} nodes")
            }
            Self::FeatureValues { limit, value } => {
                write!(f, "feature system holds at most {limit} values")?;
                if let Some(value) = value {
                    write!(f, " (while adding {value})")?;
                }
                Ok(())
            }
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Rule, stratum, or word the error relates to.
    pub source: Option<String>,
    /// Stack of strata and rules active when the error was raised.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}

/// Result type alias using Morphon's Error type.
pub type Result<T> = std::result::Result<T, Error>;
