//! Integration tests for the pattern matcher
//!
//! Tests natural classes, margins, quantifiers, direction, and agreement.

use morphon_foundation::{AlphaVariable, VariableConstraint, VariableValues};
use morphon_phonetics::{
    Direction, MarginSide, MatchOptions, Matcher, NaturalClass, NestedPattern, NodeId, Pattern, PatternNode,
    PhoneticShape, SegmentContext,
};

use crate::inventory;

fn first_segment(shape: &PhoneticShape) -> NodeId {
    shape.segments().next().unwrap()
}

#[test]
fn word_final_consonant() {
    let (system, table) = inventory();
    let cons = NaturalClass::new(&system, "C", &["+cons"]).unwrap();
    let pattern = Pattern::new().class(cons).margin(MarginSide::Right);
    let matcher = Matcher::new(&pattern, MatchOptions::default());

    let tat = table.to_shape("tat").unwrap();
    let found = matcher.find(&tat, tat.first(), &VariableValues::new()).unwrap();
    assert_eq!(found.first(), tat.segments().last());

    let ta = table.to_shape("ta").unwrap();
    assert!(matcher.find(&ta, ta.first(), &VariableValues::new()).is_none());
}

#[test]
fn right_to_left_returns_nodes_in_shape_order() {
    let (system, table) = inventory();
    let t = SegmentContext::from_table(&system, &table, "t").unwrap();
    let vowel = NaturalClass::new(&system, "V", &["-cons"]).unwrap();
    let pattern = Pattern::new().segment(t).class(vowel);
    let matcher = Matcher::new(&pattern, MatchOptions::synthesis(Direction::RightToLeft));

    let shape = table.to_shape("tata").unwrap();
    let found = matcher.find(&shape, shape.last(), &VariableValues::new()).unwrap();
    let ids: Vec<_> = shape.segments().collect();
    assert_eq!(found.nodes(), &[ids[2], ids[3]]);
}

#[test]
fn kleene_star_over_syllables() {
    let (system, table) = inventory();
    let cons = NaturalClass::new(&system, "C", &["+cons"]).unwrap();
    let vowel = NaturalClass::new(&system, "V", &["-cons"]).unwrap();
    let syllable = Pattern::new().class(cons).class(vowel);
    let pattern = Pattern::new()
        .margin(MarginSide::Left)
        .nested(syllable, 1, None)
        .margin(MarginSide::Right);
    let matcher = Matcher::new(&pattern, MatchOptions::default());

    let good = table.to_shape("tadato").unwrap();
    assert!(matcher.is_match(&good, good.first(), &VariableValues::new()));
    let bad = table.to_shape("tadat").unwrap();
    assert!(!matcher.is_match(&bad, bad.first(), &VariableValues::new()));
    let empty = table.to_shape("").unwrap();
    assert!(!matcher.is_match(&empty, empty.first(), &VariableValues::new()));
}

#[test]
fn optional_group_matches_with_and_without() {
    let (system, table) = inventory();
    let t = SegmentContext::from_table(&system, &table, "t").unwrap();
    let a = SegmentContext::from_table(&system, &table, "a").unwrap();
    let d = SegmentContext::from_table(&system, &table, "d").unwrap();
    let pattern = Pattern::new()
        .segment(t)
        .with(PatternNode::Nested(NestedPattern::new(Pattern::new().segment(a), 0, Some(1))))
        .segment(d);
    let matcher = Matcher::new(&pattern, MatchOptions::default());

    for word in ["tad", "td"] {
        let shape = table.to_shape(word).unwrap();
        assert!(matcher.is_match(&shape, first_segment(&shape), &VariableValues::new()), "{word}");
    }
    let shape = table.to_shape("taad").unwrap();
    assert!(!matcher.is_match(&shape, first_segment(&shape), &VariableValues::new()));
}

#[test]
fn voicing_agreement_across_a_vowel() {
    let (system, table) = inventory();
    let alpha = AlphaVariable::new(&system, "a", "voice").unwrap();
    let cons = NaturalClass::new(&system, "C", &["+cons"])
        .unwrap()
        .with_variable(VariableConstraint::agree(alpha));
    let vowel = NaturalClass::new(&system, "V", &["-cons"]).unwrap();
    let pattern = Pattern::new().class(cons.clone()).class(vowel).class(cons);
    let matcher = Matcher::new(&pattern, MatchOptions::default());

    let agree = table.to_shape("tat").unwrap();
    assert!(matcher.is_match(&agree, first_segment(&agree), &VariableValues::new()));
    let differ = table.to_shape("tad").unwrap();
    assert!(!matcher.is_match(&differ, first_segment(&differ), &VariableValues::new()));
}

#[test]
fn boundaries_are_transparent_to_environments() {
    let (system, table) = inventory();
    let cons = NaturalClass::new(&system, "C", &["+cons"]).unwrap();
    let vowel = NaturalClass::new(&system, "V", &["-cons"]).unwrap();
    let pattern = Pattern::new().class(vowel).class(cons);
    let matcher = Matcher::new(&pattern, MatchOptions::default());
    let shape = table.to_shape("ta+d").unwrap();
    let found = matcher.find(&shape, shape.first(), &VariableValues::new()).unwrap();
    assert_eq!(found.len(), 2);
}
