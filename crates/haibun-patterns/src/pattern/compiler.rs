//! Convert lexed tokens into anchored regular-expression sources.

use crate::errors::{PatternError, placeholder_error};
use crate::keyword::{POLITENESS, StepKeyword};
use crate::origin::Origin;

use super::lexer::{Token, lex_template};
use super::{DEFAULT_DOMAIN, Placeholder, STATEMENT_DOMAIN};

pub(crate) fn group_name(index: usize, origin: Origin) -> String {
    format!("p{index}_{}", origin.as_str())
}

/// Optional keyword and politeness prefix accepted before every template.
fn prefix_source() -> String {
    let keywords = StepKeyword::ALL
        .iter()
        .map(StepKeyword::as_str)
        .collect::<Vec<_>>()
        .join("|");
    let polite = POLITENESS
        .iter()
        .map(|phrase| regex::escape(phrase).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    format!(r"^(?:(?:{keywords})\s+)?(?:(?:{polite})\s+)?")
}

fn push_alternatives(regex: &mut String, index: usize, lazy: bool) {
    let forms = Origin::FORMS.map(|origin| {
        let group = group_name(index, origin);
        match origin.delimiters() {
            Some((open, close)) => {
                let repeat = if origin == Origin::Quoted { '*' } else { '+' };
                format!(
                    "{}(?P<{group}>[^{}]{repeat}){}",
                    regex::escape(&open.to_string()),
                    regex::escape(&close.to_string()),
                    regex::escape(&close.to_string()),
                )
            }
            None if lazy => format!("(?P<{group}>.+?)"),
            None => format!("(?P<{group}>.+)"),
        }
    });
    regex.push_str("(?:");
    regex.push_str(&forms.join("|"));
    regex.push(')');
}

/// Build an anchored regular expression and placeholder schema from a
/// template.
///
/// Each placeholder becomes a group of six alternatives, one per
/// [`Origin`] form, named `p{index}_{origin}`. The bare form is lazy only for
/// a `statement` placeholder that has another placeholder after it.
///
/// # Errors
/// Returns [`PatternError`] when the template contains malformed
/// placeholders, unbalanced braces or duplicate labels.
///
/// # Examples
/// ```
/// use haibun_patterns::build_template_regex;
///
/// let (source, schema) = build_template_regex("open {page}")
///     .unwrap_or_else(|err| panic!("template should compile: {err}"));
/// assert!(source.ends_with("(?P<p0_fallthrough>.+))$"));
/// assert_eq!(schema.len(), 1);
/// ```
pub fn build_template_regex(template: &str) -> Result<(String, Vec<Placeholder>), PatternError> {
    let tokens = lex_template(template)?;
    let total = tokens
        .iter()
        .filter(|token| matches!(token, Token::Placeholder { .. }))
        .count();
    let mut regex = prefix_source();
    let mut schema: Vec<Placeholder> = Vec::with_capacity(total);
    let mut stray_depth = 0usize;

    for token in tokens {
        match token {
            Token::Literal(text) => regex.push_str(&regex::escape(&text)),
            Token::Placeholder {
                start,
                label,
                domain,
            } => {
                if schema.iter().any(|existing| existing.label == label) {
                    return Err(PatternError::DuplicateLabel { label });
                }
                let domain = domain.unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
                let index = schema.len();
                let lazy = domain == STATEMENT_DOMAIN && index + 1 < total;
                push_alternatives(&mut regex, index, lazy);
                schema.push(Placeholder {
                    label,
                    domain,
                    position: start,
                });
            }
            Token::OpenBrace { .. } => {
                stray_depth = stray_depth.saturating_add(1);
                regex.push_str(&regex::escape("{"));
            }
            Token::CloseBrace { index } => {
                if stray_depth == 0 {
                    return Err(placeholder_error(
                        "unmatched closing brace '}' in step template",
                        index,
                        None,
                    ));
                }
                stray_depth -= 1;
                regex.push_str(&regex::escape("}"));
            }
        }
    }

    if stray_depth != 0 {
        return Err(placeholder_error(
            "unbalanced braces in step template",
            template.len(),
            None,
        ));
    }

    regex.push('$');
    Ok((regex, schema))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(template: &str) -> (String, Vec<Placeholder>) {
        build_template_regex(template)
            .unwrap_or_else(|err| panic!("template should compile: {err}"))
    }

    #[test]
    fn leading_literal_keeps_its_case() {
        let (source, _) = build("Set up");
        assert!(source.ends_with(")?Set up$"), "{source}");
    }

    #[test]
    fn leaves_leading_placeholder_untouched() {
        let (source, schema) = build("{what} is set");
        assert!(source.contains(r"(?:(?:Given|When|Then|And|But)\s+)?"));
        assert!(source.ends_with(" is set$"));
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn lazy_only_for_statement_followed_by_placeholder() {
        let (source, _) = build("if {cond:statement} then {act:statement}");
        assert!(source.contains("(?P<p0_fallthrough>.+?)"));
        assert!(source.contains("(?P<p1_fallthrough>.+))"));

        let (source, _) = build("{first} and {second}");
        assert!(source.contains("(?P<p0_fallthrough>.+))"));
    }

    #[test]
    fn rejects_duplicate_labels() {
        let Err(err) = build_template_regex("{a} and {a}") else {
            panic!("should fail");
        };
        assert!(matches!(err, PatternError::DuplicateLabel { label } if label == "a"));
    }

    #[test]
    fn errors_when_closing_brace_unmatched() {
        let Err(err) = build_template_regex("broken}") else {
            panic!("should fail");
        };
        assert!(
            err.to_string()
                .contains("unmatched closing brace '}' in step template")
        );
    }

    #[test]
    fn errors_when_open_braces_remain() {
        let Err(err) = build_template_regex("{ open") else {
            panic!("should fail");
        };
        assert!(err.to_string().contains("unbalanced braces"));
    }
}
