//! Integration tests for morphological rules and templates
//!
//! Tests head features, part-of-speech changes, allomorph constraints,
//! templates, and inflected stems.

use std::sync::Arc;

use morphon_phonetics::Pattern;
use morphon_rules::{
    Adjacency, AffixSlot, AffixTemplate, AllomorphConstraints, AllomorphEnvironment, CoOccurrence,
    FailureReason, InflectedStem, MorphologicalAllomorph, MorphologicalRule, PendingRule, RootAllomorph,
    Transform, WordSynthesis,
};

use crate::Language;

fn pending(rules: &[&str]) -> Vec<PendingRule> {
    rules.iter().map(|r| PendingRule::rule(0, *r)).collect()
}

fn apply_all(rules: &[&MorphologicalRule], start: WordSynthesis) -> Vec<WordSynthesis> {
    rules.iter().fold(vec![start], |words, rule| {
        words.iter().flat_map(|w| rule.apply(w).unwrap()).collect()
    })
}

// =============================================================================
// Rule Application
// =============================================================================

#[test]
fn required_head_features_must_be_compatible() {
    let lang = Language::new();
    let sg = lang.features(&[("num", &["sg"])]);
    let pl = lang.features(&[("num", &["pl"])]);
    let acc = lang.suffix("acc", &["d"]).with_required_head(pl.clone());

    let plural = lang.synthesis(lang.root("ta", "N").with_head(pl), &pending(&["acc"]));
    assert_eq!(acc.apply(&plural).unwrap().len(), 1);

    let singular = lang.synthesis(lang.root("ta", "N").with_head(sg), &pending(&["acc"]));
    assert!(acc.apply(&singular).unwrap().is_empty());

    let unmarked = lang.synthesis(lang.root("ta", "N"), &pending(&["acc"]));
    assert_eq!(acc.apply(&unmarked).unwrap().len(), 1);
}

#[test]
fn output_head_features_overlay_the_root() {
    let lang = Language::new();
    let pl = lang.features(&[("num", &["pl"])]);
    let rule = lang.suffix("pl", &["s"]).with_output_head(pl.clone());
    let start = lang.synthesis(
        lang.root("ta", "N").with_head(lang.features(&[("num", &["sg"]), ("case", &["nom"])])),
        &pending(&["pl"]),
    );
    let words = rule.apply(&start).unwrap();
    assert!(words[0].head.matches(&pl));
    assert!(words[0].head.matches(&lang.features(&[("case", &["nom"])])));
    assert_eq!(lang.render(&words[0]), "tas");
}

#[test]
fn derivation_changes_part_of_speech() {
    let lang = Language::new();
    let nominalizer = lang.suffix("nmlz", &["ot"]).with_required_pos("V").with_output_pos("N");

    let verb = lang.synthesis(lang.root("dat", "V"), &pending(&["nmlz"]));
    let words = nominalizer.apply(&verb).unwrap();
    assert_eq!(words[0].pos, "N");
    assert_eq!(lang.render(&words[0]), "datot");

    let noun = lang.synthesis(lang.root("dat", "N"), &pending(&["nmlz"]));
    assert!(nominalizer.apply(&noun).unwrap().is_empty());

    let analyses = nominalizer
        .unapply(&lang.analysis("datot"), PendingRule::rule(0, "nmlz"))
        .unwrap();
    assert_eq!(analyses.len(), 1);
    assert!(analyses[0].accepts_pos("V"));
    assert!(!analyses[0].accepts_pos("N"));
}

#[test]
fn unapplication_tries_every_allomorph() {
    let lang = Language::new();
    let rule = lang.suffix("pl", &["s", "as"]);
    let analyses = rule.unapply(&lang.analysis("tatas"), PendingRule::rule(0, "pl")).unwrap();
    let mut stems: Vec<String> = analyses.iter().map(|a| lang.table.render(&a.shape)).collect();
    stems.sort();
    assert_eq!(stems, vec!["tat", "tata"]);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn unapplied_rules_fail_validation() {
    let lang = Language::new();
    let word = lang.synthesis(lang.root("ta", "N"), &pending(&["pl"]));
    assert_eq!(word.validate(), Err(FailureReason::PendingRules));
}

#[test]
fn allomorph_environment_selects_the_form() {
    let lang = Language::new();
    let after_vowel = AllomorphConstraints::new().with_environment(AllomorphEnvironment::new(
        Pattern::new().class(lang.class("V", &["-cons"])),
        Pattern::new(),
    ));
    let rule = MorphologicalRule::new("pl")
        .with_allomorph(
            MorphologicalAllomorph::new(Transform::suffix(&lang.phonetic, &lang.table, "d").unwrap())
                .with_constraints(after_vowel),
        )
        .with_allomorph(MorphologicalAllomorph::new(
            Transform::suffix(&lang.phonetic, &lang.table, "ad").unwrap(),
        ));

    let after_a = rule.apply(&lang.synthesis(lang.root("ta", "N"), &pending(&["pl"]))).unwrap();
    assert_eq!(after_a.len(), 2);
    assert!(after_a.iter().all(|w| w.validate().is_ok()));

    let after_t = rule.apply(&lang.synthesis(lang.root("tat", "N"), &pending(&["pl"]))).unwrap();
    let results: Vec<_> = after_t.iter().map(|w| (lang.render(w), w.validate())).collect();
    assert_eq!(
        results,
        vec![
            ("tatd".to_string(), Err(FailureReason::Environment)),
            ("tatad".to_string(), Ok(())),
        ]
    );
}

#[test]
fn co_occurrence_requires_an_adjacent_morpheme() {
    let lang = Language::new();
    let pl = lang.suffix("pl", &["s"]);
    let acc = MorphologicalRule::new("acc").with_allomorph(
        MorphologicalAllomorph::new(Transform::suffix(&lang.phonetic, &lang.table, "o").unwrap()).with_constraints(
            AllomorphConstraints::new().with_co_occurrence(CoOccurrence::required("pl", Adjacency::AdjacentToLeft)),
        ),
    );

    let both = apply_all(&[&pl, &acc], lang.synthesis(lang.root("ta", "N"), &pending(&["pl", "acc"])));
    assert_eq!(lang.render(&both[0]), "taso");
    assert_eq!(both[0].morpheme_ids(), vec!["ta", "pl", "acc"]);
    assert_eq!(both[0].validate(), Ok(()));

    let alone = apply_all(&[&acc], lang.synthesis(lang.root("ta", "N"), &pending(&["acc"])));
    assert_eq!(alone[0].validate(), Err(FailureReason::CoOccurrence));
}

#[test]
fn excluded_co_occurrence_blocks_the_pair() {
    let lang = Language::new();
    let constraints = AllomorphConstraints::new().with_co_occurrence(CoOccurrence::excluded("dim", Adjacency::Anywhere));
    let entry = lang
        .root("ta", "N")
        .with_allomorph(RootAllomorph::new(&lang.table, "to").unwrap().with_constraints(constraints));
    let dim = lang.suffix("dim", &["d"]);

    let mut analysis = lang.analysis("to");
    analysis.record_unapplication(PendingRule::rule(0, "dim"));
    let start = WordSynthesis::new(Arc::new(entry), 1, &analysis).unwrap();
    let words = dim.apply(&start).unwrap();
    assert_eq!(lang.render(&words[0]), "tod");
    assert_eq!(words[0].allomorph_indices(), vec![1, 0]);
    assert_eq!(words[0].validate(), Err(FailureReason::CoOccurrence));
}

#[test]
fn mpr_features_flow_from_affixes() {
    let lang = Language::new();
    let strong = MorphologicalRule::new("caus").with_allomorph(
        MorphologicalAllomorph::new(Transform::suffix(&lang.phonetic, &lang.table, "a").unwrap())
            .with_output_mpr("strong"),
    );
    let needs_strong = MorphologicalRule::new("pst").with_allomorph(
        MorphologicalAllomorph::new(Transform::suffix(&lang.phonetic, &lang.table, "d").unwrap())
            .with_constraints(AllomorphConstraints::new().with_required_mpr("strong")),
    );

    let ok = apply_all(
        &[&strong, &needs_strong],
        lang.synthesis(lang.root("tat", "V"), &pending(&["caus", "pst"])),
    );
    assert_eq!(lang.render(&ok[0]), "tatad");
    assert_eq!(ok[0].validate(), Ok(()));

    let bare = apply_all(&[&needs_strong], lang.synthesis(lang.root("tat", "V"), &pending(&["pst"])));
    assert_eq!(bare[0].validate(), Err(FailureReason::Mpr));

    let lexical = apply_all(
        &[&needs_strong],
        lang.synthesis(lang.root("tat", "V").with_mpr("strong"), &pending(&["pst"])),
    );
    assert_eq!(lexical[0].validate(), Ok(()));
}

#[test]
fn obligatory_head_features_must_be_supplied() {
    let lang = Language::new();
    let case = lang.syntax.require_feature("case").unwrap();
    let acc = lang.suffix("acc", &["o"]).with_output_head(lang.features(&[("case", &["acc"])]));
    let entry = || lang.root("tat", "N").with_obligatory_head(case);

    let bare = lang.synthesis(entry(), &[]);
    assert_eq!(bare.validate(), Err(FailureReason::ObligatoryFeatures));

    let marked = apply_all(&[&acc], lang.synthesis(entry(), &pending(&["acc"])));
    assert_eq!(marked[0].validate(), Ok(()));
}

// =============================================================================
// Templates
// =============================================================================

fn noun_template(lang: &Language, number_optional: bool) -> AffixTemplate {
    let pl = lang.features(&[("num", &["pl"])]);
    let acc = lang.features(&[("case", &["acc"])]);
    AffixTemplate::new("noun")
        .with_required_pos("N")
        .with_slot(
            AffixSlot::new("number")
                .with_rule(lang.suffix("pl", &["s"]).with_realizational(pl))
                .with_optional(number_optional),
        )
        .with_slot(
            AffixSlot::new("case")
                .with_rule(lang.suffix("acc", &["o"]).with_realizational(acc))
                .with_optional(true),
        )
}

#[test]
fn template_unapplies_outermost_slot_first() {
    let lang = Language::new();
    let template = noun_template(&lang, true);
    let analyses = template.unapply(&lang.analysis("taso"), 0).unwrap();
    let stems: Vec<String> = analyses.iter().map(|a| lang.table.render(&a.shape)).collect();
    assert!(stems.contains(&"ta".to_string()));
    assert!(stems.contains(&"tas".to_string()));
    assert!(analyses.iter().all(|a| a.accepts_pos("N") && !a.accepts_pos("V")));

    let full = analyses.iter().find(|a| lang.table.render(&a.shape) == "ta").unwrap();
    assert!(full.realizational.matches(&lang.features(&[("num", &["pl"]), ("case", &["acc"])])));
}

#[test]
fn obligatory_slot_must_be_filled() {
    let lang = Language::new();
    let template = noun_template(&lang, false);
    let analyses = template.unapply(&lang.analysis("tao"), 0).unwrap();
    assert!(analyses.is_empty());
    assert!(template.unapply(&lang.analysis("ta"), 0).unwrap().is_empty());
}

#[test]
fn template_reapplies_its_slots() {
    let lang = Language::new();
    let template = noun_template(&lang, true);
    let analyses = template.unapply(&lang.analysis("taso"), 0).unwrap();
    let full = analyses.iter().find(|a| lang.table.render(&a.shape) == "ta").unwrap();

    let start = WordSynthesis::new(Arc::new(lang.root("ta", "N")), 0, full).unwrap();
    assert!(template.is_next(&start));
    let words = template.apply(&start).unwrap();
    assert_eq!(words.len(), 1);
    assert_eq!(lang.render(&words[0]), "taso");
    assert!(words[0].realizational.is_empty());
    assert_eq!(words[0].validate(), Ok(()));

    let verb = WordSynthesis::new(Arc::new(lang.root("ta", "V")), 0, full).unwrap();
    assert!(template.apply(&verb).unwrap().is_empty());
}

#[test]
fn inflected_stem_replaces_the_root() {
    let lang = Language::new();
    let pl = lang.features(&[("num", &["pl"])]);
    let template = noun_template(&lang, true);
    let entry = lang
        .root("ta", "N")
        .with_stem(InflectedStem::new(&lang.table, "tod", pl.clone()).unwrap());

    let mut analysis = lang.analysis("ta");
    analysis.realizational = pl.clone();
    let start = WordSynthesis::new(Arc::new(entry), 0, &analysis).unwrap();
    let words = template.apply(&start).unwrap();
    assert_eq!(words.len(), 1);
    assert_eq!(lang.render(&words[0]), "tod");
    assert_eq!(words[0].stem, Some(0));
    assert!(words[0].head.matches(&pl));
    assert!(words[0].realizational.is_empty());
}
