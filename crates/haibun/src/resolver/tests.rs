//! Tests for step resolution and disambiguation.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::collect::{Collected, SourceLibrary, expand};
use crate::domain::DomainRegistry;
use crate::feature::FeatureStep;
use crate::stepper::StepDefinition;
use crate::test_support::{FixedStepper, passing};
use crate::types::FeatureSource;

fn resolve_with(
    steppers: &[Arc<dyn Stepper>],
    library: &SourceLibrary,
    content: &str,
) -> Result<Vec<ResolvedFeature>, ResolveError> {
    let domains = DomainRegistry::new();
    let registry = StepRegistry::from_steppers(steppers, &domains)
        .unwrap_or_else(|err| panic!("steps should compile: {err}"));
    let collected = Collected {
        features: vec![FeatureSource::new("f.feature", content, "features")],
        directory_backgrounds: Vec::new(),
    };
    let expanded =
        expand(&collected, library).unwrap_or_else(|err| panic!("expand should succeed: {err}"));
    let mut resolver = Resolver::new(registry, steppers, library);
    resolver.resolve_backgrounds()?;
    resolver.resolve_features(&expanded)
}

fn first_step(features: &[ResolvedFeature]) -> &FeatureStep {
    features
        .first()
        .and_then(|feature| feature.steps.first())
        .unwrap_or_else(|| panic!("expected a resolved step"))
}

fn location() -> SourceLocation {
    SourceLocation::new("f.feature", 1)
}

#[rstest]
#[case::unique_first(true)]
#[case::unique_last(false)]
fn unique_step_wins_regardless_of_order(#[case] unique_first: bool) {
    let unique = StepDefinition::exact("special", "open the door", passing()).unique();
    let general = StepDefinition::template("general", "open {thing}", passing());
    let steps = if unique_first {
        vec![unique, general]
    } else {
        vec![general, unique]
    };
    let steppers = vec![FixedStepper::shared("doors", steps)];
    let library = SourceLibrary::default();
    let registry = StepRegistry::from_steppers(&steppers, &DomainRegistry::new())
        .unwrap_or_else(|err| panic!("steps should compile: {err}"));
    let resolver = Resolver::new(registry, &steppers, &library);
    let action = resolver
        .find_action("open the door", &location())
        .unwrap_or_else(|err| panic!("should resolve: {err}"));
    assert_eq!(action.qualified_name(), "doors.special");
}

#[test]
fn fallback_yields_to_specific_steps() {
    let steppers = vec![FixedStepper::shared(
        "prose",
        vec![
            StepDefinition::pattern("prose", r"^.+[.!?]$", passing()).fallback(),
            StepDefinition::template("say", "say {what}.", passing()),
        ],
    )];
    let features = resolve_with(&steppers, &SourceLibrary::default(), "say hello.\nJust prose.")
        .unwrap_or_else(|err| panic!("should resolve: {err}"));
    let names: Vec<String> = features
        .iter()
        .flat_map(|feature| feature.steps.iter())
        .map(|step| step.action.qualified_name())
        .collect();
    assert_eq!(names, vec!["prose.say", "prose.prose"]);
}

#[test]
fn precluded_candidates_are_dropped() {
    let steppers = vec![FixedStepper::shared(
        "vars",
        vec![
            StepDefinition::template("set", "set {what} to {value}", passing()),
            StepDefinition::template("setEmpty", "set empty {what} to {value}", passing())
                .precludes(["vars.set"]),
        ],
    )];
    let features = resolve_with(&steppers, &SourceLibrary::default(), "set empty x to 1")
        .unwrap_or_else(|err| panic!("should resolve: {err}"));
    assert_eq!(first_step(&features).action.qualified_name(), "vars.setEmpty");
}

#[test]
fn ambiguity_lists_every_candidate() {
    let steppers = vec![
        FixedStepper::shared("a", vec![StepDefinition::template("go", "go {where}", passing())]),
        FixedStepper::shared("b", vec![StepDefinition::exact("home", "go home", passing())]),
    ];
    let err = resolve_with(&steppers, &SourceLibrary::default(), "go home")
        .err()
        .unwrap_or_else(|| panic!("two candidates should be ambiguous"));
    let ResolveError::AmbiguousMatch { candidates, .. } = &err else {
        panic!("expected AmbiguousMatch, got {err}");
    };
    assert_eq!(candidates, &vec!["a.go", "b.home"]);
}

#[test]
fn unmatched_line_is_reported_with_location() {
    let steppers = vec![FixedStepper::shared("a", Vec::new())];
    let err = resolve_with(&steppers, &SourceLibrary::default(), "\ndo the thing")
        .err()
        .unwrap_or_else(|| panic!("nothing should match"));
    assert_eq!(err.to_string(), "f.feature:2: no step found for `do the thing`");
}

fn statement_steppers() -> Vec<Arc<dyn Stepper>> {
    vec![FixedStepper::shared(
        "logic",
        vec![
            StepDefinition::template("not", "not {what:statement}", passing()),
            StepDefinition::exact("ok", "ok", passing()),
            StepDefinition::exact("fine", "fine", passing()),
        ],
    )]
}

#[test]
fn statements_nest_with_extended_seq_paths() {
    let features = resolve_with(&statement_steppers(), &SourceLibrary::default(), "ok\nnot not ok")
        .unwrap_or_else(|err| panic!("should resolve: {err}"));
    let feature = features.first().unwrap_or_else(|| panic!("one feature"));
    let Some(outer) = feature.steps.get(1) else {
        panic!("expected two steps");
    };
    assert_eq!(outer.seq_path.to_string(), "1.2");
    let inner = outer
        .statement("what")
        .and_then(<[FeatureStep]>::first)
        .unwrap_or_else(|| panic!("outer statement should expand"));
    assert_eq!(inner.text, "not ok");
    assert_eq!(inner.seq_path.to_string(), "1.2.1");
    let innermost = inner
        .statement("what")
        .and_then(<[FeatureStep]>::first)
        .unwrap_or_else(|| panic!("inner statement should expand"));
    assert_eq!(innermost.action.qualified_name(), "logic.ok");
    assert_eq!(innermost.seq_path.to_string(), "1.2.1.1");
}

#[test]
fn statements_expand_background_includes() {
    let library = SourceLibrary::new(
        vec![FeatureSource::new("backgrounds/pair.feature", "ok\nfine", "backgrounds")],
        Vec::new(),
    );
    let features = resolve_with(&statement_steppers(), &library, "not Backgrounds: pair")
        .unwrap_or_else(|err| panic!("should resolve: {err}"));
    let nested = first_step(&features)
        .statement("what")
        .unwrap_or_else(|| panic!("statement should expand"));
    let paths: Vec<String> = nested.iter().map(|step| step.seq_path.to_string()).collect();
    assert_eq!(paths, vec!["1.1.1", "1.1.2"]);
    assert_eq!(
        nested.first().map(|step| step.source.path.as_str()),
        Some("backgrounds/pair.feature")
    );
}

#[test]
fn unresolvable_statement_becomes_failing_step() {
    let features = resolve_with(&statement_steppers(), &SourceLibrary::default(), "not gibberish")
        .unwrap_or_else(|err| panic!("outer line should still resolve: {err}"));
    let nested = first_step(&features)
        .statement("what")
        .and_then(<[FeatureStep]>::first)
        .unwrap_or_else(|| panic!("statement should expand"));
    assert!(nested.action.definition().is_none());
    assert!(
        nested
            .action
            .unresolved_message()
            .is_some_and(|message| message.contains("no step found"))
    );
}

#[test]
fn deep_nesting_is_cut_off() {
    let line = format!("{}ok", "not ".repeat(expand::MAX_STATEMENT_DEPTH + 2));
    let features = resolve_with(&statement_steppers(), &SourceLibrary::default(), &line)
        .unwrap_or_else(|err| panic!("outer line should still resolve: {err}"));
    let mut step = first_step(&features);
    while let Some(inner) = step.statement("what").and_then(<[FeatureStep]>::first) {
        step = inner;
    }
    assert!(
        step.action
            .unresolved_message()
            .is_some_and(|message| message.contains("nests too deeply"))
    );
}

struct Defining;

impl Stepper for Defining {
    fn name(&self) -> &str {
        "define"
    }

    fn steps(&self) -> Vec<StepDefinition> {
        Vec::new()
    }

    fn resolve_feature_line(&self, line: &str, source: &SourceLocation) -> LineDisposition {
        line.strip_prefix("Define: ")
            .map_or(LineDisposition::Continue, |text| {
                LineDisposition::Define(vec![
                    StepDefinition::exact(text, text, passing()).with_source(source.clone()),
                ])
            })
    }
}

#[test]
fn line_hooks_define_steps_for_later_lines() {
    let steppers: Vec<Arc<dyn Stepper>> = vec![Arc::new(Defining)];
    let features = resolve_with(
        &steppers,
        &SourceLibrary::default(),
        "Define: wave\nwave",
    )
    .unwrap_or_else(|err| panic!("should resolve: {err}"));
    let step = first_step(&features);
    assert_eq!(step.action.qualified_name(), "define.wave");
    assert_eq!(step.seq_path.to_string(), "1.1");
    assert_eq!(step.source.line, 1);
}

#[test]
fn broken_background_fails_the_pre_pass() {
    let library = SourceLibrary::new(
        vec![FeatureSource::new("backgrounds/bad.feature", "nonsense", "backgrounds")],
        Vec::new(),
    );
    let err = resolve_with(&statement_steppers(), &library, "ok")
        .err()
        .unwrap_or_else(|| panic!("background should fail"));
    assert!(matches!(err, ResolveError::Background { ref path, .. } if path == "backgrounds/bad.feature"));
}

#[test]
fn included_definitions_register_once() {
    let steppers: Vec<Arc<dyn Stepper>> = vec![Arc::new(Defining)];
    let library = SourceLibrary::new(
        vec![FeatureSource::new("backgrounds/waves.feature", "Define: wave", "backgrounds")],
        Vec::new(),
    );
    let features = resolve_with(&steppers, &library, "Backgrounds: waves\nwave\nwave")
        .unwrap_or_else(|err| panic!("should resolve: {err}"));
    let Some(feature) = features.first() else {
        panic!("expected a feature");
    };
    assert_eq!(feature.steps.len(), 2);
    assert!(
        feature
            .steps
            .iter()
            .all(|step| step.action.qualified_name() == "define.wave")
    );
    assert_eq!(first_step(&features).source.path, "backgrounds/waves.feature");
}
