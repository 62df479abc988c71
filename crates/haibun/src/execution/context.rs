//! Handles passed to step actions and build handlers.

use std::sync::Arc;

use camino::Utf8Path;
use haibun_patterns::Origin;

use super::{ExecutionShared, run_step};
use crate::context::World;
use crate::domain::DomainRegistry;
use crate::feature::FeatureStep;
use crate::populate::Variables;
use crate::result::StepResult;
use crate::value::Value;

/// Everything an action can see while it runs.
#[derive(Clone)]
pub struct ActionContext {
    pub(super) vars: Arc<Variables>,
    pub(super) world: World,
    pub(super) step: Arc<FeatureStep>,
    pub(super) shared: Arc<ExecutionShared>,
}

impl ActionContext {
    /// Populated variables.
    #[must_use]
    pub fn variables(&self) -> &Variables {
        &self.vars
    }

    /// Coerced value for `label`.
    #[must_use]
    pub fn value(&self, label: &str) -> Option<&Value> {
        self.vars.get(label).map(|populated| &populated.value)
    }

    /// Coerced value for `label`, rendered as text.
    #[must_use]
    pub fn text(&self, label: &str) -> Option<String> {
        self.value(label).map(ToString::to_string)
    }

    /// Numeric value for `label`.
    #[must_use]
    pub fn number(&self, label: &str) -> Option<f64> {
        self.value(label).and_then(Value::as_number)
    }

    /// Text captured for `label` before any lookup.
    #[must_use]
    pub fn term(&self, label: &str) -> Option<&str> {
        self.step
            .action
            .capture(label)
            .map(|capture| capture.term.as_str())
    }

    /// How `label` was written on the line.
    #[must_use]
    pub fn origin(&self, label: &str) -> Option<Origin> {
        self.step.action.capture(label).map(|capture| capture.origin)
    }

    /// The run's world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The step being executed.
    #[must_use]
    pub fn step(&self) -> &FeatureStep {
        &self.step
    }

    /// The run's domains.
    #[must_use]
    pub fn domains(&self) -> &DomainRegistry {
        &self.shared.domains
    }

    /// Configured option `name` of the stepper that owns this step.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&str> {
        self.shared.config.option(&self.step.action.stepper, name)
    }

    /// Execute the nested steps of the statement captured under `label`.
    ///
    /// Runs until the first failure; the failing result is the last one
    /// returned. An unknown label yields no results.
    pub async fn run_statement(&self, label: &str) -> Vec<StepResult> {
        let steps: Vec<FeatureStep> = self
            .step
            .statement(label)
            .map(<[FeatureStep]>::to_vec)
            .unwrap_or_default();
        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            let result = run_step(
                Arc::clone(&self.shared),
                Arc::new(step),
                self.world.clone(),
            )
            .await;
            let ok = result.ok;
            results.push(result);
            if !ok {
                break;
            }
        }
        results
    }
}

/// Everything a build handler can see.
pub struct BuildContext {
    pub(crate) vars: Variables,
    pub(crate) world: World,
    pub(crate) step: Arc<FeatureStep>,
    pub(crate) workspace: String,
}

impl BuildContext {
    /// Populated variables.
    #[must_use]
    pub fn variables(&self) -> &Variables {
        &self.vars
    }

    /// Coerced value for `label`, rendered as text.
    #[must_use]
    pub fn text(&self, label: &str) -> Option<String> {
        self.vars
            .get(label)
            .map(|populated| populated.value.to_string())
    }

    /// The run's world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The step whose definition carries the build handler.
    #[must_use]
    pub fn step(&self) -> &FeatureStep {
        &self.step
    }

    /// Workspace scope the build output belongs to.
    #[must_use]
    pub fn workspace(&self) -> &Utf8Path {
        Utf8Path::new(&self.workspace)
    }
}
