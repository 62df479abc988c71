//! Error types shared by the template compilation modules.

use std::fmt;
use thiserror::Error;

/// Additional context for placeholder-related parsing errors.
///
/// # Examples
/// ```
/// use haibun_patterns::PlaceholderErrorInfo;
/// let info = PlaceholderErrorInfo::new("invalid placeholder", 3, Some("value".into()));
/// assert_eq!(info.placeholder.as_deref(), Some("value"));
/// assert_eq!(info.position, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderErrorInfo {
    /// Human-readable description of the failure.
    pub message: &'static str,
    /// Zero-based byte offset of the offending placeholder.
    pub position: usize,
    /// Placeholder label, when one was parsed before the failure.
    pub placeholder: Option<String>,
}

impl PlaceholderErrorInfo {
    /// Create a new error description for a placeholder failure.
    #[must_use]
    pub fn new(message: &'static str, position: usize, placeholder: Option<String>) -> Self {
        Self {
            message,
            position,
            placeholder,
        }
    }
}

impl fmt::Display for PlaceholderErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.placeholder {
            Some(name) => write!(
                f,
                "{} for placeholder `{}` at byte {} (zero-based)",
                self.message, name, self.position
            ),
            None => write!(f, "{} at byte {} (zero-based)", self.message, self.position),
        }
    }
}

/// Errors surfaced while compiling step templates.
///
/// # Examples
/// ```
/// use haibun_patterns::{PatternError, PlaceholderErrorInfo};
/// let info = PlaceholderErrorInfo::new("invalid", 2, Some("count".into()));
/// let err = PatternError::Placeholder(info.clone());
/// assert_eq!(err.to_string(), info.to_string());
/// ```
#[derive(Debug, Error)]
pub enum PatternError {
    /// A `{...}` span is malformed.
    #[error("{0}")]
    Placeholder(PlaceholderErrorInfo),
    /// Two placeholders share a label.
    #[error("duplicate placeholder `{label}` in template")]
    DuplicateLabel {
        /// The repeated label.
        label: String,
    },
    /// A placeholder names a domain outside the supplied domain list.
    #[error("placeholder `{label}` uses unknown domain `{domain}`")]
    UnknownDomain {
        /// Placeholder label.
        label: String,
        /// The unrecognised domain (or union member).
        domain: String,
    },
    /// The generated regex source could not be compiled.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub(crate) fn placeholder_error(
    message: &'static str,
    position: usize,
    placeholder: Option<String>,
) -> PatternError {
    PatternError::Placeholder(PlaceholderErrorInfo::new(message, position, placeholder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_placeholder_with_name() {
        let info = PlaceholderErrorInfo::new("invalid", 4, Some("count".into()));
        assert_eq!(
            info.to_string(),
            "invalid for placeholder `count` at byte 4 (zero-based)"
        );
    }

    #[test]
    fn formats_placeholder_without_name() {
        let info = PlaceholderErrorInfo::new("oops", 1, None);
        assert_eq!(info.to_string(), "oops at byte 1 (zero-based)");
    }

    #[test]
    fn names_label_and_domain_for_unknown_domains() {
        let err = PatternError::UnknownDomain {
            label: "page".into(),
            domain: "webpage".into(),
        };
        assert_eq!(
            err.to_string(),
            "placeholder `page` uses unknown domain `webpage`"
        );
    }
}
