//! Placeholder captures produced by a successful template match.

use crate::origin::Origin;

/// One placeholder's captured text from a matched line.
///
/// The value the text stands for is decided later, during variable
/// population, from `origin` and `domain`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Capture {
    /// Placeholder label from the template.
    pub label: String,
    /// Raw captured text with any delimiters removed.
    pub term: String,
    /// Which textual form matched.
    pub origin: Origin,
    /// Declared domain, possibly a `|` union.
    pub domain: String,
}

impl Capture {
    /// Whether the declared domain is a union.
    #[must_use]
    pub fn is_union(&self) -> bool {
        self.domain.contains('|')
    }
}
