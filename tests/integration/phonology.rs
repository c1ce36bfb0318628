//! End-to-end tests for phonological rules
//!
//! Tests that surface forms produced by rule chains, deletion, and
//! metathesis analyze back to their roots.

use morphon_engine::{Morpher, MorpherConfig};
use morphon_phonetics::{MarginSide, Pattern, PatternNode};
use morphon_rules::{ApplicationOrder, MetathesisRule, PhonologicalSubrule, StandardRule};

use crate::{Language, parses};

/// t -> d / V _ V
fn voicing(lang: &Language) -> StandardRule {
    let vowel = lang.class("V", &["-cons"]);
    StandardRule::new("voice", Pattern::new().segment(lang.seg("t")))
        .unwrap()
        .with_subrule(
            &lang.phonetic,
            PhonologicalSubrule::new(Pattern::new().segment(lang.seg("d")))
                .with_left(Pattern::new().class(vowel.clone()))
                .with_right(Pattern::new().class(vowel)),
        )
        .unwrap()
}

/// a -> o / _ C#
fn rounding(lang: &Language) -> StandardRule {
    StandardRule::new("round", Pattern::new().segment(lang.seg("a")))
        .unwrap()
        .with_subrule(
            &lang.phonetic,
            PhonologicalSubrule::new(Pattern::new().segment(lang.seg("o")))
                .with_right(Pattern::new().class(lang.class("C", &["+cons"])).margin(MarginSide::Right)),
        )
        .unwrap()
}

/// a -> o / _ a
fn raising(lang: &Language, order: ApplicationOrder) -> StandardRule {
    StandardRule::new("raise", Pattern::new().segment(lang.seg("a")))
        .unwrap()
        .with_subrule(
            &lang.phonetic,
            PhonologicalSubrule::new(Pattern::new().segment(lang.seg("o")))
                .with_right(Pattern::new().segment(lang.seg("a"))),
        )
        .unwrap()
        .with_order(order)
}

/// a -> 0 / _ #
fn apocope(lang: &Language) -> StandardRule {
    StandardRule::new("apocope", Pattern::new().segment(lang.seg("a")))
        .unwrap()
        .with_subrule(
            &lang.phonetic,
            PhonologicalSubrule::new(Pattern::new()).with_right(Pattern::new().margin(MarginSide::Right)),
        )
        .unwrap()
}

#[test]
fn rule_chain_is_undone_in_reverse() {
    let lang = Language::new();
    let morpher = lang.morpher(
        lang.stratum("surface")
            .with_phonological_rule(voicing(&lang))
            .with_phonological_rule(rounding(&lang))
            .with_entry(lang.root("atat", "V")),
    );

    let results = morpher.analyze_and_synthesize("adot").unwrap();
    assert_eq!(parses(&results), vec![vec!["atat"]]);
    assert_eq!(lang.table.render(&results[0].shape), "adot");

    assert!(morpher.analyze_and_synthesize("atat").unwrap().is_empty());
}

#[test]
fn deleted_segments_are_recovered() {
    let lang = Language::new();
    let morpher = lang.morpher(
        lang.stratum("surface")
            .with_phonological_rule(apocope(&lang))
            .with_entry(lang.root("tata", "N"))
            .with_entry(lang.root("tat", "N")),
    );

    let results = morpher.analyze_and_synthesize("tat").unwrap();
    assert_eq!(parses(&results), vec![vec!["tat"], vec!["tata"]]);
    assert!(morpher.analyze_and_synthesize("tata").unwrap().is_empty());
}

#[test]
fn metathesis_is_undone_before_lookup() {
    let lang = Language::new();
    let pattern = Pattern::new()
        .with_partition(0, PatternNode::Segment(lang.seg("t")))
        .with_partition(1, PatternNode::Segment(lang.seg("a")));
    let swap = MetathesisRule::new("swap", pattern, vec![1, 0]).unwrap();
    let morpher = lang.morpher(
        lang.stratum("surface")
            .with_phonological_rule(swap)
            .with_entry(lang.root("tad", "N")),
    );

    let results = morpher.analyze_and_synthesize("atd").unwrap();
    assert_eq!(parses(&results), vec![vec!["tad"]]);
    assert!(morpher.analyze_and_synthesize("tad").unwrap().is_empty());
}

#[test]
fn self_bleeding_rule_round_trips_in_every_order() {
    let lang = Language::new();
    let cases = [
        (ApplicationOrder::Simultaneous, "tooa"),
        (ApplicationOrder::LeftToRight, "tooa"),
        (ApplicationOrder::RightToLeft, "taoa"),
    ];
    for (order, surface) in cases {
        let morpher = lang.morpher(
            lang.stratum("surface")
                .with_phonological_rule(raising(&lang, order))
                .with_entry(lang.root("taaa", "N")),
        );

        let results = morpher.analyze_and_synthesize(surface).unwrap();
        assert_eq!(parses(&results), vec![vec!["taaa"]], "{order:?}");
        assert_eq!(lang.table.render(&results[0].shape), surface, "{order:?}");
        assert!(morpher.analyze_and_synthesize("taaa").unwrap().is_empty(), "{order:?}");
    }
}

#[test]
fn repeated_deletions_need_reapplication() {
    let lang = Language::new();
    let stratum = || {
        lang.stratum("surface")
            .with_phonological_rule(apocope(&lang).with_order(ApplicationOrder::RightToLeft))
            .with_entry(lang.root("taa", "N"))
            .with_entry(lang.root("ta", "N"))
            .build()
            .unwrap()
    };

    let once = Morpher::new(vec![stratum()], MorpherConfig::default()).unwrap();
    assert_eq!(parses(&once.analyze_and_synthesize("t").unwrap()), vec![vec!["ta"]]);

    let twice = Morpher::new(vec![stratum()], MorpherConfig::new().with_deletion_reapplications(1)).unwrap();
    assert_eq!(
        parses(&twice.analyze_and_synthesize("t").unwrap()),
        vec![vec!["ta"], vec!["taa"]]
    );
}
