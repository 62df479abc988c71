//! Pipeline stages and the failure type that aborts a run.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Boxed error returned by step actions, build handlers and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Pipeline stage at which a run can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Stepper aggregation: domains, step compilation, required domains.
    Steppers,
    /// Required stepper options were not supplied.
    RequiredOptions,
    /// Feature and background sources were gathered.
    Collect,
    /// Backgrounds and include directives were spliced into features.
    Expand,
    /// Feature lines were matched to step actions.
    Resolve,
    /// Build handlers ran ahead of execution.
    Build,
    /// Features were executed.
    Execute,
    /// Teardown hooks and build finalizers ran.
    Teardown,
}

impl Stage {
    /// Lower-case stage name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Steppers => "steppers",
            Self::RequiredOptions => "requiredoptions",
            Self::Collect => "collect",
            Self::Expand => "expand",
            Self::Resolve => "resolve",
            Self::Build => "build",
            Self::Execute => "execute",
            Self::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure that aborted the run at a given stage.
///
/// # Examples
///
/// ```
/// use haibun::{Stage, StageFailure};
///
/// let failure = StageFailure::new(Stage::Resolve, "no step found for `x`");
/// assert_eq!(failure.to_string(), "resolve failed: no step found for `x`");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{stage} failed: {message}")]
pub struct StageFailure {
    /// Stage that failed.
    pub stage: Stage,
    /// Rendered cause.
    pub message: String,
}

impl StageFailure {
    /// Create a failure for `stage` from anything displayable.
    #[must_use]
    pub fn new(stage: Stage, message: impl fmt::Display) -> Self {
        Self {
            stage,
            message: message.to_string(),
        }
    }
}
