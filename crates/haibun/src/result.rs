//! Outcome tree produced by execution.

use serde::Serialize;

use crate::populate::Variables;
use crate::types::{SeqPath, SourceLocation};

/// Side-channel data attached to an action result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Topic {
    /// Named output such as a captured page or file.
    Artifact {
        /// Artifact name.
        name: String,
        /// Artifact body.
        content: String,
    },
    /// A failure explanation.
    Diagnostic {
        /// Diagnostic kind, e.g. `ActionThrew`.
        kind: String,
        /// One-line message.
        message: String,
        /// Longer detail such as a chained error or panic payload.
        detail: Option<String>,
    },
    /// Free-form trace line.
    Trace {
        /// Trace text.
        message: String,
    },
    /// Stepper-specific payload.
    Extension {
        /// Arbitrary JSON.
        value: serde_json::Value,
    },
}

/// Outcome of one action invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    /// Qualified `stepper.action` name.
    pub name: String,
    /// Whether the action passed.
    pub ok: bool,
    /// Failure or informational message.
    pub message: Option<String>,
    /// Score reported with a failure.
    pub score: Option<f64>,
    /// Attachments.
    pub topics: Vec<Topic>,
}

/// Outcome of one feature line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// Whether every action passed.
    pub ok: bool,
    /// Raw line text.
    #[serde(rename = "in")]
    pub text: String,
    /// Position in the feature tree.
    pub seq_path: SeqPath,
    /// Where the line came from.
    pub source: SourceLocation,
    /// One entry per action invoked.
    pub actions: Vec<ActionResult>,
    /// Milliseconds since the run started.
    pub start_ms: u64,
    /// Step duration in milliseconds.
    pub duration_ms: u64,
    /// Populated variables.
    pub variables: Variables,
}

impl StepResult {
    /// The first failing action's message, if any.
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        self.actions
            .iter()
            .find(|action| !action.ok)
            .and_then(|action| action.message.as_deref())
    }

    /// Score of the first failing action, if it reported one.
    #[must_use]
    pub fn failure_score(&self) -> Option<f64> {
        self.actions
            .iter()
            .find(|action| !action.ok)
            .and_then(|action| action.score)
    }
}

/// Outcome of one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureResult {
    /// Feature file path.
    pub path: String,
    /// Title set by a `Feature:` line.
    pub title: Option<String>,
    /// Whether every executed step passed.
    pub ok: bool,
    /// Step outcomes in execution order.
    pub steps: Vec<StepResult>,
}

/// A failure the run continued past because it carried a score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFailure {
    /// Reported score.
    pub score: f64,
    /// Failure message.
    pub message: Option<String>,
    /// Qualified action name.
    pub action: String,
    /// Where the failing step sits.
    pub seq_path: SeqPath,
}
