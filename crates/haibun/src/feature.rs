//! Resolved feature trees.

use std::fmt;
use std::sync::Arc;

use haibun_patterns::Capture;

use crate::stepper::StepDefinition;
use crate::types::{SeqPath, SourceLocation};

#[derive(Clone)]
pub(crate) enum ActionKind {
    Step(Arc<StepDefinition>),
    Unresolved(String),
}

/// The step action a line resolved to.
#[derive(Clone)]
pub struct StepAction {
    /// Owning stepper name.
    pub stepper: String,
    /// Action name within the stepper.
    pub name: String,
    /// Placeholder captures from the line.
    pub captures: Vec<Capture>,
    pub(crate) kind: ActionKind,
}

const UNRESOLVED_STEPPER: &str = "haibun";
const UNRESOLVED_NAME: &str = "unresolved";

/// Whether `qualified` names the placeholder action of an unresolved line.
pub(crate) fn is_unresolved(qualified: &str) -> bool {
    qualified.split_once('.') == Some((UNRESOLVED_STEPPER, UNRESOLVED_NAME))
}

impl StepAction {
    pub(crate) fn resolved(
        stepper: &str,
        definition: Arc<StepDefinition>,
        captures: Vec<Capture>,
    ) -> Self {
        Self {
            stepper: stepper.to_string(),
            name: definition.name().to_string(),
            captures,
            kind: ActionKind::Step(definition),
        }
    }

    /// Placeholder for a line that failed to resolve inside a statement.
    /// Executing it fails with `message`.
    pub(crate) fn unresolved(message: String) -> Self {
        Self {
            stepper: String::from(UNRESOLVED_STEPPER),
            name: String::from(UNRESOLVED_NAME),
            captures: Vec::new(),
            kind: ActionKind::Unresolved(message),
        }
    }

    /// `stepper.action` name.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.stepper, self.name)
    }

    /// The matched definition, unless this is an unresolved placeholder.
    #[must_use]
    pub fn definition(&self) -> Option<&Arc<StepDefinition>> {
        match &self.kind {
            ActionKind::Step(definition) => Some(definition),
            ActionKind::Unresolved(_) => None,
        }
    }

    /// Resolution failure carried by an unresolved placeholder.
    #[must_use]
    pub fn unresolved_message(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Unresolved(message) => Some(message),
            ActionKind::Step(_) => None,
        }
    }

    /// Capture for `label`.
    #[must_use]
    pub fn capture(&self, label: &str) -> Option<&Capture> {
        self.captures.iter().find(|capture| capture.label == label)
    }
}

impl fmt::Debug for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepAction")
            .field("name", &self.qualified_name())
            .field("captures", &self.captures)
            .field("unresolved", &self.unresolved_message())
            .finish()
    }
}

/// Sub-steps expanded from one `statement` placeholder.
#[derive(Debug, Clone)]
pub struct NestedStatement {
    /// Placeholder label.
    pub label: String,
    /// Resolved sub-steps, in order.
    pub steps: Vec<FeatureStep>,
}

/// One resolved line.
#[derive(Debug, Clone)]
pub struct FeatureStep {
    /// Reported location.
    pub source: SourceLocation,
    /// Raw line text.
    pub text: String,
    /// Position in the feature tree.
    pub seq_path: SeqPath,
    /// The action it resolved to.
    pub action: StepAction,
    /// Expanded `statement` placeholders.
    pub nested: Vec<NestedStatement>,
}

impl FeatureStep {
    /// Sub-steps of the statement captured under `label`.
    #[must_use]
    pub fn statement(&self, label: &str) -> Option<&[FeatureStep]> {
        self.nested
            .iter()
            .find(|nested| nested.label == label)
            .map(|nested| nested.steps.as_slice())
    }
}

/// A feature whose every line resolved.
#[derive(Debug, Clone)]
pub struct ResolvedFeature {
    /// Feature file path.
    pub path: String,
    /// Root the feature was discovered under.
    pub base: String,
    /// Steps in line order.
    pub steps: Vec<FeatureStep>,
}
