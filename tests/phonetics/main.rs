//! Integration tests for Layer 1: Phonetics
//!
//! Tests for phonetic shapes, character definition tables, and pattern
//! matching.

mod matching;
mod shapes;

use morphon_foundation::FeatureSystem;
use morphon_phonetics::CharacterDefinitionTable;

/// A small inventory: two consonants, two vowels, and a morpheme boundary.
pub fn inventory() -> (FeatureSystem, CharacterDefinitionTable) {
    let mut system = FeatureSystem::phonetic();
    system.add_feature_with_values("cons", &["+cons", "-cons"]).unwrap();
    system.add_feature_with_values("voice", &["+voice", "-voice"]).unwrap();
    system.add_feature_with_values("round", &["+round", "-round"]).unwrap();
    let mut table = CharacterDefinitionTable::new("surface");
    table.add_segment(&system, "t", &["+cons", "-voice", "-round"]).unwrap();
    table.add_segment(&system, "d", &["+cons", "+voice", "-round"]).unwrap();
    table.add_segment(&system, "a", &["-cons", "+voice", "-round"]).unwrap();
    table.add_segment(&system, "o", &["-cons", "+voice", "+round"]).unwrap();
    table.add_boundary("+");
    (system, table)
}
