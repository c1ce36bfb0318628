//! Integration tests for feature bundles
//!
//! Tests unification, anti-bundles, and uninstantiated segments.

use morphon_foundation::{BUNDLE_CAPACITY, FeatureBundle, FeatureSystem};
use proptest::prelude::*;

fn system() -> FeatureSystem {
    let mut system = FeatureSystem::phonetic();
    system.add_feature_with_values("cons", &["+cons", "-cons"]).unwrap();
    system.add_feature_with_values("voice", &["+voice", "-voice"]).unwrap();
    system
        .add_feature_with_values("place", &["labial", "coronal", "dorsal"])
        .unwrap();
    system
}

// =============================================================================
// Unification
// =============================================================================

#[test]
fn fully_specified_segment_unifies_with_natural_class() {
    let system = system();
    let d = system.bundle(&["+cons", "+voice", "coronal"]).unwrap();
    let voiced = system.bundle(&["+voice"]).unwrap();
    assert!(d.unifies(&voiced));
    assert!(!voiced.unifies(&d));
    assert!(d.unifies(&FeatureBundle::EMPTY));
}

#[test]
fn disjoint_is_symmetric() {
    let system = system();
    let voiced = system.bundle(&["+voice"]).unwrap();
    let voiceless = system.bundle(&["-voice"]).unwrap();
    assert!(voiced.disjoint(&voiceless));
    assert!(voiceless.disjoint(&voiced));
}

// =============================================================================
// Anti-bundles and Uninstantiated Segments
// =============================================================================

#[test]
fn anti_bundle_lists_unused_values_of_specified_features() {
    let system = system();
    let labial = system.bundle(&["labial"]).unwrap();
    let anti = system.anti_bundle(&labial);
    assert_eq!(anti, system.bundle(&["coronal", "dorsal"]).unwrap());
}

#[test]
fn uninstantiated_bundle_unifies_with_agreeing_segments() {
    let system = system();
    let voiced = system.uninstantiated(&system.bundle(&["+voice"]).unwrap());
    let b = system.bundle(&["+cons", "+voice", "labial"]).unwrap();
    let p = system.bundle(&["+cons", "-voice", "labial"]).unwrap();
    assert!(voiced.unifies(&b));
    assert!(!voiced.unifies(&p));
}

#[test]
fn describe_uses_value_names() {
    let system = system();
    let bundle = system.bundle(&["+cons", "dorsal"]).unwrap();
    assert_eq!(system.describe(&bundle), "[+cons dorsal]");
}

proptest! {
    #[test]
    fn union_unifies_with_both_operands(a in 0u64.., b in 0u64..) {
        let left = FeatureBundle::from_words(a, 0);
        let right = FeatureBundle::from_words(b, a);
        let union = left.union(&right);
        prop_assert!(union.unifies(&left));
        prop_assert!(union.unifies(&right));
        prop_assert!(union.len() <= BUNDLE_CAPACITY);
    }
}
