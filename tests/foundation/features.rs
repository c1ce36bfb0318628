//! Integration tests for feature systems and recursive feature values
//!
//! Tests registration, capacity, defaults, and head-feature unification.

use morphon_foundation::{CapacityLimit, ErrorKind, FeatureSystem, FeatureValues, ValueInstance};

fn morphosyntax() -> FeatureSystem {
    let mut system = FeatureSystem::morphosyntactic();
    system.add_feature_with_values("num", &["sg", "pl"]).unwrap();
    system.add_feature_with_values("case", &["nom", "acc", "gen"]).unwrap();
    let agr = system.add_feature("agr");
    let person = system.add_subfeature(agr, "person");
    system.add_value(person, "1").unwrap();
    system.add_value(person, "3").unwrap();
    system
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn registering_twice_returns_same_ids() {
    let mut system = FeatureSystem::phonetic();
    let first = system.add_feature_with_values("voice", &["+voice", "-voice"]).unwrap();
    let second = system.add_feature_with_values("voice", &["+voice"]).unwrap();
    assert_eq!(first, second);
    assert_eq!(system.value_count(), 2);
}

#[test]
fn value_names_belong_to_one_feature() {
    let mut system = FeatureSystem::phonetic();
    system.add_feature_with_values("voice", &["+"]).unwrap();
    let err = system.add_feature_with_values("round", &["+"]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Unsupported(_)));
}

#[test]
fn phonetic_system_is_bounded() {
    let mut system = FeatureSystem::phonetic();
    let feature = system.add_feature("f");
    for i in 0..FeatureSystem::PHONETIC_CAPACITY {
        system.add_value(feature, &format!("v{i}")).unwrap();
    }
    let err = system.add_value(feature, "overflow").unwrap_err();
    assert!(err.is_capacity());
    assert!(matches!(
        err.kind,
        ErrorKind::CapacityExceeded(CapacityLimit::FeatureValues { .. })
    ));
}

#[test]
fn morphosyntactic_system_is_unbounded() {
    let mut system = FeatureSystem::morphosyntactic();
    assert!(!system.is_bounded());
    let feature = system.add_feature("lemma");
    for i in 0..200 {
        system.add_value(feature, &format!("l{i}")).unwrap();
    }
    assert_eq!(system.value_count(), 200);
}

#[test]
fn unknown_names_are_reported() {
    let system = morphosyntax();
    assert!(matches!(system.require_feature("tense").unwrap_err().kind, ErrorKind::UnknownFeature(_)));
    assert!(matches!(system.bundle(&["dual"]).unwrap_err().kind, ErrorKind::UnknownValue(_)));
}

// =============================================================================
// Feature Values
// =============================================================================

#[test]
fn unification_intersects_shared_features() {
    let system = morphosyntax();
    let any_num = FeatureValues::from_names(&system, &[("num", &["sg", "pl"])]).unwrap();
    let plural = FeatureValues::from_names(&system, &[("num", &["pl"]), ("case", &["nom"])]).unwrap();
    let unified = any_num.unify(&plural).unwrap();
    assert!(unified.matches(&plural));
    assert_eq!(unified.value_count(), 2);

    let singular = FeatureValues::from_names(&system, &[("num", &["sg"])]).unwrap();
    assert!(plural.unify(&singular).is_none());
    assert!(!plural.is_compatible(&singular));
}

#[test]
fn nested_values_unify_structurally() {
    let system = morphosyntax();
    let agr = system.require_feature("agr").unwrap();
    let person = system.require_feature("person").unwrap();
    let first = system.require_value("1").unwrap();
    let third = system.require_value("3").unwrap();

    let either = FeatureValues::new().with_complex(agr, FeatureValues::new().with_values(person, [first, third]));
    let third_only = FeatureValues::new().with_complex(agr, FeatureValues::new().with_values(person, [third]));
    let first_only = FeatureValues::new().with_complex(agr, FeatureValues::new().with_values(person, [first]));

    let unified = either.unify(&third_only).unwrap();
    assert_eq!(unified, third_only);
    assert!(third_only.unify(&first_only).is_none());
    assert!(matches!(unified.get(agr), Some(ValueInstance::Complex(_))));
}

#[test]
fn defaults_fill_absent_features() {
    let mut system = morphosyntax();
    let case = system.require_feature("case").unwrap();
    let nom = system.require_value("nom").unwrap();
    system.set_default(case, nom).unwrap();

    let plural = FeatureValues::from_names(&system, &[("num", &["pl"])]).unwrap();
    let filled = plural.unify_defaults(&FeatureValues::new(), &system).unwrap();
    let expected = FeatureValues::from_names(&system, &[("num", &["pl"]), ("case", &["nom"])]).unwrap();
    assert_eq!(filled, expected);
}

#[test]
fn superset_remainder_removes_realized_features() {
    let system = morphosyntax();
    let word = FeatureValues::from_names(&system, &[("num", &["pl"]), ("case", &["gen"])]).unwrap();
    let realized = FeatureValues::from_names(&system, &[("num", &["pl"])]).unwrap();
    let rest = word.superset_remainder(&realized).unwrap();
    assert_eq!(rest, FeatureValues::from_names(&system, &[("case", &["gen"])]).unwrap());

    let missing = FeatureValues::from_names(&system, &[("num", &["sg"])]).unwrap();
    assert!(word.superset_remainder(&missing).is_none());
}

#[test]
fn overlay_overrides_features() {
    let system = morphosyntax();
    let base = FeatureValues::from_names(&system, &[("num", &["sg"]), ("case", &["acc"])]).unwrap();
    let top = FeatureValues::from_names(&system, &[("num", &["pl"])]).unwrap();
    let result = base.overlay(&top);
    assert_eq!(
        result,
        FeatureValues::from_names(&system, &[("num", &["pl"]), ("case", &["acc"])]).unwrap()
    );
    assert_eq!(result.describe(&system), "[num:pl case:acc]");
}
