//! Integration tests for Error types
//!
//! Tests error construction, display, and context frames.

use morphon_foundation::{CapacityLimit, Error, ErrorContext, ErrorKind};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_invalid_shape() {
    let err = Error::invalid_shape("tax", "ta", 2);
    assert!(matches!(err.kind, ErrorKind::InvalidShape { position: 2, .. }));
    let msg = format!("{err}");
    assert!(msg.contains("tax"));
    assert!(msg.contains("position 2"));
}

#[test]
fn error_uninstantiated_feature() {
    let err = Error::uninstantiated_feature("alpha");
    let msg = format!("{err}");
    assert!(msg.contains("alpha"));
}

#[test]
fn error_capacity_exceeded() {
    let err = Error::capacity_exceeded(CapacityLimit::ShapeNodes { limit: 256 });
    assert!(err.is_capacity());
    assert!(format!("{err}").contains("256"));
}

#[test]
fn error_unsupported_is_not_capacity() {
    let err = Error::unsupported("cyclic strata");
    assert!(!err.is_capacity());
    assert!(format!("{err}").contains("cyclic strata"));
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn frames_accumulate_in_order() {
    let err = Error::invalid_rule("empty pattern")
        .with_frame("rule voicing")
        .with_frame("stratum surface");
    let context = err.context.unwrap();
    assert_eq!(context.stack, vec!["rule voicing", "stratum surface"]);
}

#[test]
fn context_display() {
    let context = ErrorContext::new().with_source("tatso").with_frame("rule plural");
    let shown = format!("{context}");
    assert!(shown.starts_with("at tatso"));
    assert!(shown.contains("  in rule plural"));
}
