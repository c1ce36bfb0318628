//! Integration tests for Layer 2: Rules
//!
//! Tests for phonological rules, transforms, morphological rules, affix
//! templates, and the constraints checked on finished words.

mod morphology;

use std::sync::Arc;

use morphon_foundation::{FeatureSystem, FeatureValues};
use morphon_phonetics::{CharacterDefinitionTable, NaturalClass, SegmentContext};
use morphon_rules::{
    LexEntry, MorphologicalAllomorph, MorphologicalRule, PendingRule, RootAllomorph, Transform,
    WordAnalysis, WordSynthesis,
};

/// A toy language: three phonetic features, five segments, a boundary, and
/// number and case for morphosyntax.
pub struct Language {
    pub phonetic: FeatureSystem,
    pub syntax: FeatureSystem,
    pub table: CharacterDefinitionTable,
}

impl Language {
    pub fn new() -> Self {
        let mut phonetic = FeatureSystem::phonetic();
        phonetic.add_feature_with_values("cons", &["+cons", "-cons"]).unwrap();
        phonetic.add_feature_with_values("voice", &["+voice", "-voice"]).unwrap();
        phonetic.add_feature_with_values("round", &["+round", "-round"]).unwrap();

        let mut syntax = FeatureSystem::morphosyntactic();
        syntax.add_feature_with_values("num", &["sg", "pl"]).unwrap();
        syntax.add_feature_with_values("case", &["nom", "acc"]).unwrap();

        let mut table = CharacterDefinitionTable::new("surface");
        table.add_segment(&phonetic, "t", &["+cons", "-voice", "-round"]).unwrap();
        table.add_segment(&phonetic, "d", &["+cons", "+voice", "-round"]).unwrap();
        table.add_segment(&phonetic, "s", &["+cons", "-voice", "+round"]).unwrap();
        table.add_segment(&phonetic, "a", &["-cons", "+voice", "-round"]).unwrap();
        table.add_segment(&phonetic, "o", &["-cons", "+voice", "+round"]).unwrap();
        table.add_boundary("+");
        Self { phonetic, syntax, table }
    }

    pub fn seg(&self, repr: &str) -> SegmentContext {
        SegmentContext::from_table(&self.phonetic, &self.table, repr).unwrap()
    }

    pub fn class(&self, name: &str, values: &[&str]) -> NaturalClass {
        NaturalClass::new(&self.phonetic, name, values).unwrap()
    }

    pub fn features(&self, pairs: &[(&str, &[&str])]) -> FeatureValues {
        FeatureValues::from_names(&self.syntax, pairs).unwrap()
    }

    pub fn root(&self, id: &str, pos: &str) -> LexEntry {
        LexEntry::new(id, pos).with_allomorph(RootAllomorph::new(&self.table, id).unwrap())
    }

    pub fn suffix(&self, name: &str, forms: &[&str]) -> MorphologicalRule {
        forms.iter().fold(MorphologicalRule::new(name), |rule, form| {
            rule.with_allomorph(MorphologicalAllomorph::new(
                Transform::suffix(&self.phonetic, &self.table, form).unwrap(),
            ))
        })
    }

    pub fn analysis(&self, form: &str) -> WordAnalysis {
        WordAnalysis::new(self.table.to_shape(form).unwrap(), 0)
    }

    /// Starts a synthesis of `entry` with `pending` to reapply, innermost
    /// rule first.
    pub fn synthesis(&self, entry: LexEntry, pending: &[PendingRule]) -> WordSynthesis {
        let mut analysis = WordAnalysis::new(entry.allomorphs()[0].shape().clone(), 0);
        for rule in pending.iter().rev() {
            analysis.record_unapplication(rule.clone());
        }
        WordSynthesis::new(Arc::new(entry), 0, &analysis).unwrap()
    }

    pub fn word(&self, form: &str) -> WordSynthesis {
        self.synthesis(self.root(form, "V"), &[])
    }

    pub fn render(&self, word: &WordSynthesis) -> String {
        self.table.render(&word.shape)
    }
}
