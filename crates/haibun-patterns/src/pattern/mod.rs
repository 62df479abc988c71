//! Template lexing and compilation.

mod compiler;
mod lexer;

use regex::Regex;

use crate::capture::Capture;
use crate::errors::PatternError;
use crate::origin::Origin;

pub use compiler::build_template_regex;
use compiler::group_name;

/// Domain assumed when a placeholder does not name one.
pub const DEFAULT_DOMAIN: &str = "string";

/// Domain whose captured text is expanded into nested steps.
pub const STATEMENT_DOMAIN: &str = "statement";

/// One `{label[:domain]}` entry of a template's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Label used to address the captured value.
    pub label: String,
    /// Declared domain; `|` separates the members of a union.
    pub domain: String,
    /// Byte offset of the opening brace in the template.
    pub position: usize,
}

impl Placeholder {
    /// Whether the declared domain is a union of several domains.
    #[must_use]
    pub fn is_union(&self) -> bool {
        self.domain.contains('|')
    }

    /// Member domains of the declared domain, in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.domain.split('|')
    }

    /// Whether the placeholder holds a nested statement.
    #[must_use]
    pub fn is_statement(&self) -> bool {
        self.domain == STATEMENT_DOMAIN
    }
}

/// A template compiled into an anchored matcher and its placeholder schema.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    template: String,
    regex: Regex,
    schema: Vec<Placeholder>,
}

impl CompiledTemplate {
    /// The template text this matcher was compiled from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The compiled, anchored matcher.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Placeholders in declaration order.
    #[must_use]
    pub fn schema(&self) -> &[Placeholder] {
        &self.schema
    }

    /// Match `text` and return one [`Capture`] per placeholder.
    ///
    /// Returns `None` when the text does not match.
    ///
    /// # Examples
    /// ```
    /// use haibun_patterns::{Origin, compile_template};
    ///
    /// let template = compile_template("set {what} to {value}", None)
    ///     .unwrap_or_else(|err| panic!("template should compile: {err}"));
    /// let captures = template
    ///     .captures("Given I set `name` to \"Ada\"")
    ///     .unwrap_or_default();
    /// assert_eq!(captures.len(), 2);
    /// assert_eq!(captures[0].origin, Origin::Var);
    /// assert_eq!(captures[1].term, "Ada");
    /// ```
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Vec<Capture>> {
        let caps = self.regex.captures(text.trim())?;
        self.schema
            .iter()
            .enumerate()
            .map(|(index, placeholder)| {
                let (origin, term) = Origin::FORMS.into_iter().find_map(|origin| {
                    caps.name(&group_name(index, origin))
                        .map(|found| (origin, found.as_str()))
                })?;
                let origin = if placeholder.is_statement() {
                    Origin::Statement
                } else {
                    origin
                };
                Some(Capture {
                    label: placeholder.label.clone(),
                    term: term.to_string(),
                    origin,
                    domain: placeholder.domain.clone(),
                })
            })
            .collect()
    }

    /// Whether `text` matches the template.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text.trim())
    }
}

/// Compile a template into a [`CompiledTemplate`].
///
/// When `known_domains` is supplied, every declared domain (and every member
/// of a union) must appear in it. Otherwise domain validation is left to the
/// caller's registry.
///
/// # Errors
/// Returns [`PatternError`] for malformed placeholders, duplicate labels,
/// unknown domains or regex compilation failures.
pub fn compile_template(
    template: &str,
    known_domains: Option<&[&str]>,
) -> Result<CompiledTemplate, PatternError> {
    let (source, schema) = build_template_regex(template)?;
    if let Some(known) = known_domains {
        for placeholder in &schema {
            if let Some(unknown) = placeholder
                .members()
                .find(|member| !known.contains(member))
            {
                return Err(PatternError::UnknownDomain {
                    label: placeholder.label.clone(),
                    domain: unknown.to_string(),
                });
            }
        }
    }
    let regex = Regex::new(&source)?;
    Ok(CompiledTemplate {
        template: template.to_string(),
        regex,
        schema,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fmt::Display;

    fn expect_ok<T, E: Display>(result: Result<T, E>, context: &str) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("{context}: {err}"),
        }
    }

    fn capture_of(template: &str, text: &str) -> Capture {
        let compiled = expect_ok(compile_template(template, None), "template should compile");
        let Some(mut captures) = compiled.captures(text) else {
            panic!("`{text}` should match `{template}`");
        };
        assert_eq!(captures.len(), 1);
        captures.remove(0)
    }

    #[rstest]
    #[case("open `page`", Origin::Var, "page")]
    #[case("open {PAGE}", Origin::Env, "PAGE")]
    #[case("open [home]", Origin::Special, "home")]
    #[case("open <login>", Origin::Credential, "login")]
    #[case("open \"the page\"", Origin::Quoted, "the page")]
    #[case("open the page", Origin::Fallthrough, "the page")]
    fn recognises_each_form(#[case] text: &str, #[case] origin: Origin, #[case] term: &str) {
        let capture = capture_of("open {target}", text);
        assert_eq!(capture.origin, origin);
        assert_eq!(capture.term, term);
        assert_eq!(capture.domain, DEFAULT_DOMAIN);
    }

    #[test]
    fn quoted_form_must_span_whole_capture() {
        let capture = capture_of("open {target}", "open \"a\" and \"b\"");
        assert_eq!(capture.origin, Origin::Fallthrough);
        assert_eq!(capture.term, "\"a\" and \"b\"");
    }

    #[test]
    fn statement_domain_reports_statement_origin() {
        let capture = capture_of("not {what:statement}", "not \"x\"");
        assert_eq!(capture.origin, Origin::Statement);
        assert_eq!(capture.term, "x");
    }

    #[test]
    fn tolerates_keyword_and_politeness() {
        let compiled = expect_ok(compile_template("have a {thing}", None), "compiles");
        assert!(compiled.is_match("When I have a test"));
        assert!(compiled.is_match("And I'm  have a test"));
        assert!(!compiled.is_match("Have a test"));
        assert!(!compiled.is_match("When I have"));
    }

    #[test]
    fn validates_domains_when_list_supplied() {
        let known = ["string", "number"];
        let Err(err) = compile_template("go to {target:page|number}", Some(&known)) else {
            panic!("unknown member should be rejected");
        };
        assert!(matches!(
            err,
            PatternError::UnknownDomain { ref label, ref domain } if label == "target" && domain == "page"
        ));
        assert!(compile_template("wait {n:number}", Some(&known)).is_ok());
        assert!(compile_template("go to {target:page}", None).is_ok());
    }

    #[test]
    fn reports_union_members() {
        let compiled = expect_ok(compile_template("see {it:page|url}", None), "compiles");
        let placeholder = compiled.schema().first().cloned();
        let Some(placeholder) = placeholder else {
            panic!("schema should have one entry");
        };
        assert!(placeholder.is_union());
        assert_eq!(placeholder.members().collect::<Vec<_>>(), vec!["page", "url"]);
    }
}
