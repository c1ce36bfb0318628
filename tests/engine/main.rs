//! Integration tests for Layer 3: Engine
//!
//! Tests for the lexicon trie, strata, and the morpher.

mod strata;
mod trie;

use std::sync::Arc;

use morphon_foundation::{FeatureSystem, FeatureValues};
use morphon_phonetics::{CharacterDefinitionTable, MarginSide, NaturalClass, Pattern, SegmentContext};
use morphon_rules::{
    LexEntry, MorphologicalAllomorph, MorphologicalRule, PhonologicalSubrule, RootAllomorph, StandardRule,
    Transform,
};

/// Phonetic and morphosyntactic inventory shared by the engine tests.
pub struct Language {
    pub phonetic: FeatureSystem,
    pub syntax: FeatureSystem,
    pub table: Arc<CharacterDefinitionTable>,
}

impl Language {
    pub fn new() -> Self {
        let mut phonetic = FeatureSystem::phonetic();
        phonetic.add_feature_with_values("cons", &["+cons", "-cons"]).unwrap();
        phonetic.add_feature_with_values("voice", &["+voice", "-voice"]).unwrap();
        phonetic.add_feature_with_values("round", &["+round", "-round"]).unwrap();

        let mut syntax = FeatureSystem::morphosyntactic();
        syntax.add_feature_with_values("num", &["sg", "pl"]).unwrap();

        let mut table = CharacterDefinitionTable::new("surface");
        table.add_segment(&phonetic, "t", &["+cons", "-voice", "-round"]).unwrap();
        table.add_segment(&phonetic, "d", &["+cons", "+voice", "-round"]).unwrap();
        table.add_segment(&phonetic, "s", &["+cons", "-voice", "+round"]).unwrap();
        table.add_segment(&phonetic, "a", &["-cons", "+voice", "-round"]).unwrap();
        table.add_segment(&phonetic, "o", &["-cons", "+voice", "+round"]).unwrap();
        table.add_boundary("+");
        Self {
            phonetic,
            syntax,
            table: Arc::new(table),
        }
    }

    pub fn features(&self, pairs: &[(&str, &[&str])]) -> FeatureValues {
        FeatureValues::from_names(&self.syntax, pairs).unwrap()
    }

    pub fn root(&self, id: &str, pos: &str) -> LexEntry {
        LexEntry::new(id, pos).with_allomorph(RootAllomorph::new(&self.table, id).unwrap())
    }

    pub fn suffix(&self, name: &str, form: &str) -> MorphologicalRule {
        MorphologicalRule::new(name).with_allomorph(MorphologicalAllomorph::new(
            Transform::suffix(&self.phonetic, &self.table, form).unwrap(),
        ))
    }

    /// a -> o / _ C#
    pub fn rounding(&self) -> StandardRule {
        let seg = |repr: &str| SegmentContext::from_table(&self.phonetic, &self.table, repr).unwrap();
        StandardRule::new("round", Pattern::new().segment(seg("a")))
            .unwrap()
            .with_subrule(
                &self.phonetic,
                PhonologicalSubrule::new(Pattern::new().segment(seg("o"))).with_right(
                    Pattern::new()
                        .class(NaturalClass::new(&self.phonetic, "C", &["+cons"]).unwrap())
                        .margin(MarginSide::Right),
                ),
            )
            .unwrap()
    }
}
