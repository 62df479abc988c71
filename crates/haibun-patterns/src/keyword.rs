//! Gherkin keywords and the politeness prefixes tolerated before a step.
//!
//! Feature lines may start with `Given`/`When`/`Then`/`And`/`But` followed
//! by `the`, `I`, `I'm` or `I am`. Templates never spell these out, so both
//! the compiled matchers and exact-form comparison skip them.

use std::fmt;
use std::str::FromStr;

/// Keyword that may prefix a feature line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKeyword {
    /// Setup preconditions for a scenario.
    Given,
    /// Perform an action when testing behaviour.
    When,
    /// Assert the expected outcome of a scenario.
    Then,
    /// Additional conditions that share context with the previous step.
    And,
    /// Negative or contrasting conditions.
    But,
}

impl StepKeyword {
    /// Every keyword, in the order they are tried.
    pub const ALL: [Self; 5] = [Self::Given, Self::When, Self::Then, Self::And, Self::But];

    /// Return the keyword as a string slice.
    ///
    /// # Examples
    ///
    /// ```
    /// use haibun_patterns::StepKeyword;
    ///
    /// assert_eq!(StepKeyword::Given.as_str(), "Given");
    /// assert_eq!(StepKeyword::And.as_str(), "And");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        }
    }
}

/// Error returned when parsing a [`StepKeyword`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepKeywordParseError(pub String);

impl fmt::Display for StepKeywordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid step keyword: {}", self.0)
    }
}

impl std::error::Error for StepKeywordParseError {}

impl FromStr for StepKeyword {
    type Err = StepKeywordParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|kw| trimmed.eq_ignore_ascii_case(kw.as_str()))
            .ok_or_else(|| StepKeywordParseError(trimmed.to_string()))
    }
}

pub(crate) const POLITENESS: [&str; 4] = ["the", "I'm", "I am", "I"];

fn strip_word<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(word)?;
    let trimmed = rest.trim_start();
    (trimmed.len() < rest.len()).then_some(trimmed)
}

/// Strip a leading keyword and politeness phrase from a feature line.
///
/// Returns the recognised keyword, if any, and the remaining text.
///
/// # Examples
///
/// ```
/// use haibun_patterns::{StepKeyword, strip_prefixes};
///
/// assert_eq!(
///     strip_prefixes("When I have a test"),
///     (Some(StepKeyword::When), "have a test")
/// );
/// assert_eq!(strip_prefixes("open the door"), (None, "open the door"));
/// ```
#[must_use]
pub fn strip_prefixes(line: &str) -> (Option<StepKeyword>, &str) {
    let mut rest = line.trim();
    let mut keyword = None;
    for kw in StepKeyword::ALL {
        if let Some(after) = strip_word(rest, kw.as_str()) {
            keyword = Some(kw);
            rest = after;
            break;
        }
    }
    for polite in POLITENESS {
        if let Some(after) = strip_word(rest, polite) {
            rest = after;
            break;
        }
    }
    (keyword, rest)
}

/// Normalise text for exact-form comparison.
///
/// Keyword and politeness prefixes are removed, whitespace runs collapse to
/// a single space and the first character is lower-cased.
///
/// # Examples
///
/// ```
/// use haibun_patterns::normalize_exact;
///
/// assert_eq!(normalize_exact("When I have a  test"), "have a test");
/// assert_eq!(normalize_exact("Then the test should pass"), "test should pass");
/// ```
#[must_use]
pub fn normalize_exact(text: &str) -> String {
    let (_, rest) = strip_prefixes(text);
    let collapsed = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Given", StepKeyword::Given)]
    #[case("given", StepKeyword::Given)]
    #[case(" WhEn ", StepKeyword::When)]
    #[case("THEN", StepKeyword::Then)]
    #[case(" but ", StepKeyword::But)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: StepKeyword) {
        assert_eq!(input.parse::<StepKeyword>(), Ok(expected));
    }

    #[test]
    fn rejects_invalid_keyword() {
        let Err(err) = "invalid".parse::<StepKeyword>() else {
            panic!("expected parse error for invalid keyword");
        };
        assert_eq!(err.0, "invalid");
    }

    #[rstest]
    #[case("Given the door is open", Some(StepKeyword::Given), "door is open")]
    #[case("And I'm logged in", Some(StepKeyword::And), "logged in")]
    #[case("But I am late", Some(StepKeyword::But), "late")]
    #[case("Then thereafter", Some(StepKeyword::Then), "thereafter")]
    #[case("Iguana sighted", None, "Iguana sighted")]
    #[case("Whenever", None, "Whenever")]
    fn strips_keyword_and_politeness(
        #[case] line: &str,
        #[case] keyword: Option<StepKeyword>,
        #[case] rest: &str,
    ) {
        assert_eq!(strip_prefixes(line), (keyword, rest));
    }

    #[test]
    fn normalises_empty_text() {
        assert_eq!(normalize_exact("  "), "");
    }
}
