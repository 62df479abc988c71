//! Failures raised while executing steps and hooks.

use std::error::Error as StdError;

use thiserror::Error;

use crate::errors::BoxError;
use crate::result::Topic;

/// Diagnostic kind recorded for errors and panics escaping an action.
pub const ACTION_THREW: &str = "ActionThrew";

/// An action returned an error or panicked.
///
/// Never propagated: the executor records it as a diagnostic topic on a
/// failed action result.
///
/// # Examples
///
/// ```
/// use haibun::execution::ActionThrew;
///
/// let threw = ActionThrew::new("boom", None);
/// assert_eq!(threw.to_string(), "boom");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionThrew {
    /// Error message.
    pub message: String,
    /// Chained causes, one per line.
    pub detail: Option<String>,
}

impl ActionThrew {
    /// Build from parts.
    #[must_use]
    pub fn new(message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            message: message.into(),
            detail,
        }
    }

    /// Describe an error returned by an action, keeping its source chain.
    #[must_use]
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        let detail = (!causes.is_empty()).then(|| causes.join("\n"));
        Self::new(err.to_string(), detail)
    }

    /// Describe a panic raised by an action.
    #[must_use]
    pub fn from_panic(message: &str) -> Self {
        Self::new(format!("action panicked: {message}"), None)
    }

    /// The diagnostic topic carrying this failure.
    #[must_use]
    pub fn into_topic(self) -> Topic {
        Topic::Diagnostic {
            kind: ACTION_THREW.to_string(),
            message: self.message,
            detail: self.detail,
        }
    }
}

/// A stepper lifecycle hook returned an error.
#[derive(Debug, Error)]
#[error("stepper `{stepper}` failed in `{hook}`: {source}")]
pub struct HookFailure {
    /// Stepper whose hook failed.
    pub stepper: String,
    /// Hook name.
    pub hook: &'static str,
    /// The hook's error.
    #[source]
    pub source: BoxError,
}
