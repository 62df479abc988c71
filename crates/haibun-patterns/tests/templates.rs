//! Behavioural tests for template compilation and matching.

use haibun_patterns::{Origin, PatternError, compile_template, normalize_exact};
use rstest::rstest;

fn compile(template: &str) -> haibun_patterns::CompiledTemplate {
    compile_template(template, None)
        .unwrap_or_else(|err| panic!("template `{template}` should compile: {err}"))
}

#[rstest]
#[case("{a} has {b:number} items", "box has 3 items", &[("a", "box", "string"), ("b", "3", "number")])]
#[case("move {from} to {to}", "move left to right", &[("from", "left", "string"), ("to", "right", "string")])]
#[case("wait {ms:number} ms", "wait 250 ms", &[("ms", "250", "number")])]
fn bare_literals_round_trip(
    #[case] template: &str,
    #[case] text: &str,
    #[case] expected: &[(&str, &str, &str)],
) {
    let compiled = compile(template);
    let captures = compiled
        .captures(text)
        .unwrap_or_else(|| panic!("`{text}` should match `{template}`"));
    let actual: Vec<_> = captures
        .iter()
        .map(|c| (c.label.as_str(), c.term.as_str(), c.domain.as_str()))
        .collect();
    assert_eq!(actual, expected);
    assert!(captures.iter().all(|c| c.origin == Origin::Fallthrough));
}

#[test]
fn greedy_tail_takes_remaining_text() {
    let compiled = compile("{first} and {second}");
    let captures = compiled
        .captures("a and b and c")
        .unwrap_or_else(|| panic!("should match"));
    let terms: Vec<_> = captures.iter().map(|c| c.term.as_str()).collect();
    assert_eq!(terms, vec!["a and b", "c"]);
}

#[test]
fn lazy_statement_stops_at_first_separator() {
    let compiled = compile("{cond:statement} and {other:statement}");
    let captures = compiled
        .captures("a and b and c")
        .unwrap_or_else(|| panic!("should match"));
    let terms: Vec<_> = captures.iter().map(|c| c.term.as_str()).collect();
    assert_eq!(terms, vec!["a", "b and c"]);
    assert!(captures.iter().all(|c| c.origin == Origin::Statement));
}

#[test]
fn mixed_forms_in_one_line() {
    let compiled = compile("log in as {user} with {password}");
    let captures = compiled
        .captures("When I log in as `admin` with <adminPassword>")
        .unwrap_or_else(|| panic!("should match"));
    let origins: Vec<_> = captures.iter().map(|c| c.origin).collect();
    assert_eq!(origins, vec![Origin::Var, Origin::Credential]);
}

#[test]
fn anchors_both_ends() {
    let compiled = compile("press {key}");
    assert!(!compiled.is_match("then press enter"));
    assert!(compiled.is_match("Then press enter"));
    assert!(!compiled.is_match("press"));
}

#[test]
fn exposes_placeholder_error_details() {
    let Err(err) = compile_template("{value:}", None) else {
        panic!("expected placeholder error");
    };
    let PatternError::Placeholder(info) = err else {
        panic!("expected placeholder error, got {err}");
    };
    assert_eq!(info.placeholder.as_deref(), Some("value"));
    assert!(info.to_string().contains("value"));
}

#[test]
fn exact_normalisation_ignores_prefixes() {
    assert_eq!(
        normalize_exact("When I have a test"),
        normalize_exact("have a test")
    );
    assert_ne!(normalize_exact("have a test"), normalize_exact("have tests"));
}
