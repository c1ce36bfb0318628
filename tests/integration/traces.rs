//! End-to-end tests for tracing a morpher run

use morphon_debug::{HumanFormatter, TraceEvent, Tracer, TracerConfig};
use morphon_engine::Morpher;
use morphon_rules::FailureReason;

use crate::Language;

fn negating(lang: &Language, first: &str, elsewhere: &str) -> Morpher {
    lang.morpher(
        lang.stratum("surface")
            .with_morphological_rule(lang.negative(first, elsewhere))
            .with_entry(lang.root("tat", "V")),
    )
}

fn failures(tracer: &Tracer) -> Vec<(String, FailureReason)> {
    tracer
        .outcomes()
        .into_iter()
        .filter_map(|record| match &record.event {
            TraceEvent::Failed { surface, reason } => Some((surface.clone(), reason.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn surface_mismatches_are_explained() {
    let lang = Language::new();
    let mut tracer = Tracer::default();
    let results = negating(&lang, "a", "d").analyze_and_synthesize_traced("dtat", &mut tracer).unwrap();
    assert_eq!(results.len(), 1);

    assert_eq!(failures(&tracer), vec![("atat".to_string(), FailureReason::SurfaceMismatch)]);
    let end = tracer.buffer().by_event_type("analysis-end");
    assert!(matches!(&end[0].event, TraceEvent::AnalysisEnd { results: 1, .. }));
}

#[test]
fn outranked_allomorphs_are_explained() {
    let lang = Language::new();
    let mut tracer = Tracer::default();
    let results = negating(&lang, "a", "a").analyze_and_synthesize_traced("atat", &mut tracer).unwrap();
    assert_eq!(results.len(), 1);

    let reasons: Vec<FailureReason> = failures(&tracer).into_iter().map(|(_, reason)| reason).collect();
    assert!(reasons.contains(&FailureReason::Precedence));
    assert!(!reasons.contains(&FailureReason::SurfaceMismatch));
}

#[test]
fn outcomes_trace_back_to_the_input() {
    let lang = Language::new();
    let mut tracer = Tracer::default();
    negating(&lang, "a", "d").analyze_and_synthesize_traced("atat", &mut tracer).unwrap();

    let success = tracer
        .outcomes()
        .into_iter()
        .find(|r| matches!(r.event, TraceEvent::Successful { .. }))
        .unwrap();
    let path = tracer.buffer().path(success.id);
    assert!(matches!(&path[0].event, TraceEvent::AnalysisStart { word } if word == "atat"));
    assert!(path.iter().any(|r| matches!(r.event, TraceEvent::LexicalLookup { hits: 1, .. })));
    assert!(path.iter().any(|r| matches!(r.event, TraceEvent::MorphologicalRuleApplied { allomorph: 0, .. })));

    let text = HumanFormatter::new().format_tree(tracer.buffer());
    assert!(text.contains("=== ANALYZE atat ==="));
    assert!(text.contains("UNAPPLY +neg atat -> tat"));
    assert!(text.contains("OK atat"));
    assert!(text.contains("FAILED dtat"));
}

#[test]
fn disabled_tracer_records_nothing() {
    let lang = Language::new();
    let mut tracer = Tracer::new(TracerConfig::new().with_enabled(false));
    let results = negating(&lang, "a", "d").analyze_and_synthesize_traced("atat", &mut tracer).unwrap();
    assert_eq!(results.len(), 1);
    assert!(tracer.buffer().is_empty());
}

#[test]
fn event_filter_keeps_only_outcomes() {
    let lang = Language::new();
    let mut tracer = Tracer::new(TracerConfig::new().filter_events(["successful", "failed"]));
    negating(&lang, "a", "d").analyze_and_synthesize_traced("atat", &mut tracer).unwrap();
    assert_eq!(tracer.buffer().len(), 2);
    assert_eq!(tracer.outcomes().len(), 2);
}
