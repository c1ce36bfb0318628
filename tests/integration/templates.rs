//! End-to-end tests for affix templates and inflected stems

use morphon_engine::Morpher;
use morphon_rules::{AffixSlot, AffixTemplate, InflectedStem};

use crate::{Language, parses};

fn nouns(lang: &Language) -> Morpher {
    let pl = lang.features(&[("num", &["pl"])]);
    let acc = lang.features(&[("case", &["acc"])]);
    let template = AffixTemplate::new("noun")
        .with_required_pos("N")
        .with_slot(
            AffixSlot::new("number")
                .with_rule(lang.suffix("pl", "s").with_realizational(pl.clone()))
                .with_optional(true),
        )
        .with_slot(
            AffixSlot::new("case")
                .with_rule(lang.suffix("acc", "o").with_realizational(acc))
                .with_optional(true),
        );
    let entry = lang
        .root("tat", "N")
        .with_stem(InflectedStem::new(&lang.table, "tot", pl).unwrap());
    lang.morpher(lang.stratum("inflection").with_template(template).with_entry(entry))
}

#[test]
fn irregular_plural_is_listed() {
    let lang = Language::new();
    let results = nouns(&lang).analyze_and_synthesize("tot").unwrap();
    assert_eq!(parses(&results), vec![vec!["tat"]]);
    assert_eq!(results[0].stem, Some(0));
    assert!(results[0].head.matches(&lang.features(&[("num", &["pl"])])));
}

#[test]
fn outer_slots_attach_to_the_irregular_stem() {
    let lang = Language::new();
    let results = nouns(&lang).analyze_and_synthesize("toto").unwrap();
    assert_eq!(parses(&results), vec![vec!["tat", "acc"]]);
    assert_eq!(results[0].stem, Some(0));
}

#[test]
fn irregular_stem_blocks_the_regular_affix() {
    let lang = Language::new();
    let morpher = nouns(&lang);
    assert!(morpher.analyze_and_synthesize("tats").unwrap().is_empty());
    assert!(morpher.analyze_and_synthesize("tatso").unwrap().is_empty());
}

#[test]
fn regular_slots_still_apply_elsewhere() {
    let lang = Language::new();
    let morpher = nouns(&lang);
    let results = morpher.analyze_and_synthesize("tato").unwrap();
    assert_eq!(parses(&results), vec![vec!["tat", "acc"]]);
    assert_eq!(results[0].stem, None);

    let bare = morpher.analyze_and_synthesize("tat").unwrap();
    assert_eq!(parses(&bare), vec![vec!["tat"]]);
}
