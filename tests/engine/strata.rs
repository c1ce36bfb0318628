//! Integration tests for strata
//!
//! Tests lexical lookup, template ordering, analysis limits, and synthesis
//! through a single stratum.

use std::sync::Arc;

use morphon_engine::{MorpherConfig, MorphologicalOrder, Stratum, StratumBuilder};
use morphon_phonetics::{MarginSide, Pattern, SegmentContext};
use morphon_rules::{
    AffixSlot, AffixTemplate, InflectedStem, NoTrace, PhonologicalSubrule, StandardRule, WordAnalysis,
    WordSynthesis,
};

use crate::Language;

fn analysis(lang: &Language, form: &str) -> WordAnalysis {
    WordAnalysis::new(lang.table.to_shape(form).unwrap(), 0)
}

fn hits(stratum: &Stratum, lang: &Language, form: &str) -> Vec<String> {
    let result = stratum
        .analyze(0, analysis(lang, form), &MorpherConfig::default(), &mut NoTrace)
        .unwrap();
    result.hits.iter().map(|h| h.entry.id().to_string()).collect()
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn lookup_respects_part_of_speech() {
    let lang = Language::new();
    let stratum = StratumBuilder::new("main", Arc::clone(&lang.table))
        .with_entry(lang.root("tat", "N"))
        .with_entry(lang.root("tat", "V"))
        .build()
        .unwrap();

    assert_eq!(stratum.lookup(&analysis(&lang, "tat")).len(), 2);

    let mut verbal = analysis(&lang, "tat");
    verbal.pos.insert("V".to_string());
    let found = stratum.lookup(&verbal);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].entry.pos(), "V");
}

#[test]
fn stems_are_indexed_with_their_features() {
    let lang = Language::new();
    let pl = lang.features(&[("num", &["pl"])]);
    let sg = lang.features(&[("num", &["sg"])]);
    let stratum = StratumBuilder::new("main", Arc::clone(&lang.table))
        .with_entry(lang.root("tat", "N").with_stem(InflectedStem::new(&lang.table, "tod", pl.clone()).unwrap()))
        .build()
        .unwrap();

    let found = stratum.lookup(&analysis(&lang, "tod"));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].analysis.realizational, pl);

    let mut singular = analysis(&lang, "tod");
    singular.realizational = sg;
    assert!(stratum.lookup(&singular).is_empty());
}

// =============================================================================
// Analysis
// =============================================================================

#[test]
fn templates_attach_outside_stratum_rules() {
    let lang = Language::new();
    let template = AffixTemplate::new("noun")
        .with_slot(AffixSlot::new("number").with_rule(lang.suffix("pl", "s")).with_optional(true));
    let stratum = StratumBuilder::new("main", Arc::clone(&lang.table))
        .with_template(template)
        .with_morphological_rule(lang.suffix("dim", "o"))
        .with_entry(lang.root("tat", "N"))
        .build()
        .unwrap();

    assert_eq!(hits(&stratum, &lang, "tatos"), vec!["tat"]);
    assert!(hits(&stratum, &lang, "tatso").is_empty());
}

#[test]
fn linear_order_unapplies_each_rule_once() {
    let lang = Language::new();
    let stratum = StratumBuilder::new("main", Arc::clone(&lang.table))
        .with_morphological_rule(lang.suffix("pl", "s"))
        .with_morphological_rule(lang.suffix("dim", "o"))
        .with_entry(lang.root("tat", "N"))
        .build()
        .unwrap();

    // Rules listed later attach further out.
    assert_eq!(hits(&stratum, &lang, "tatso"), vec!["tat"]);
    assert!(hits(&stratum, &lang, "tatos").is_empty());
    assert!(hits(&stratum, &lang, "tatss").is_empty());
}

#[test]
fn unordered_rules_reapply_up_to_the_limit() {
    let lang = Language::new();
    let stratum = StratumBuilder::new("main", Arc::clone(&lang.table))
        .with_morphological_rule(lang.suffix("pl", "s"))
        .with_morphological_rule(lang.suffix("dim", "o"))
        .with_morphological_order(MorphologicalOrder::Unordered)
        .with_entry(lang.root("tat", "N"))
        .build()
        .unwrap();

    assert_eq!(hits(&stratum, &lang, "tatos"), vec!["tat"]);
    assert_eq!(hits(&stratum, &lang, "tatsos"), vec!["tat"]);
    assert!(hits(&stratum, &lang, "tatsss").is_empty());
}

#[test]
fn analysis_limit_caps_the_worklist() {
    let lang = Language::new();
    let stratum = StratumBuilder::new("main", Arc::clone(&lang.table))
        .with_morphological_rule(lang.suffix("pl", "s"))
        .with_morphological_order(MorphologicalOrder::Unordered)
        .with_entry(lang.root("tat", "N"))
        .build()
        .unwrap();
    let config = MorpherConfig::new().with_max_analyses_per_stratum(1);
    let result = stratum
        .analyze(0, analysis(&lang, "tatss"), &config, &mut NoTrace)
        .unwrap();
    assert_eq!(result.analyses.len(), 1);
    assert!(result.hits.is_empty());
}

// =============================================================================
// Synthesis
// =============================================================================

#[test]
fn synthesis_reapplies_rules_then_phonology() {
    let lang = Language::new();
    let stratum = StratumBuilder::new("main", Arc::clone(&lang.table))
        .with_phonological_rule(lang.rounding())
        .with_morphological_rule(lang.suffix("dim", "t"))
        .with_entry(lang.root("ta", "N"))
        .build()
        .unwrap();

    let result = stratum
        .analyze(0, analysis(&lang, "tot"), &MorpherConfig::default(), &mut NoTrace)
        .unwrap();
    let hit = result.hits.iter().find(|h| h.entry.id() == "ta").unwrap();
    assert_eq!(hit.analysis.unapplication_count("dim"), 1);

    let word = WordSynthesis::new(Arc::clone(&hit.entry), 0, &hit.analysis).unwrap();
    let words = stratum.synthesize(0, word, &mut NoTrace).unwrap();
    assert_eq!(words.len(), 1);
    assert_eq!(lang.table.render(&words[0].shape), "tot");
    assert_eq!(words[0].morpheme_ids(), vec!["ta", "dim"]);
    assert_eq!(words[0].applied.len(), 1);
}

#[test]
fn excluded_mpr_blocks_phonology() {
    let lang = Language::new();
    let seg = |repr: &str| SegmentContext::from_table(&lang.phonetic, &lang.table, repr).unwrap();
    let rounding = StandardRule::new("round", Pattern::new().segment(seg("a")))
        .unwrap()
        .with_subrule(
            &lang.phonetic,
            PhonologicalSubrule::new(Pattern::new().segment(seg("o")))
                .with_right(Pattern::new().segment(seg("t")).margin(MarginSide::Right))
                .with_excluded_mpr("irregular"),
        )
        .unwrap();
    let stratum = StratumBuilder::new("main", Arc::clone(&lang.table))
        .with_phonological_rule(rounding)
        .with_entry(lang.root("tat", "N").with_mpr("irregular"))
        .with_entry(lang.root("dat", "N"))
        .build()
        .unwrap();

    let surface = |form: &str| {
        let hit = &stratum.lookup(&analysis(&lang, form))[0];
        let word = WordSynthesis::new(Arc::clone(&hit.entry), 0, &hit.analysis).unwrap();
        let words = stratum.synthesize(0, word, &mut NoTrace).unwrap();
        lang.table.render(&words[0].shape)
    };
    assert_eq!(surface("tat"), "tat");
    assert_eq!(surface("dat"), "dot");
}
