//! Helpers shared by unit tests.

use std::sync::Arc;

use crate::stepper::{ActionHandler, ActionOutcome, StepDefinition, Stepper, action};

/// A stepper built from a fixed list of definitions.
pub(crate) struct FixedStepper {
    name: String,
    steps: Vec<StepDefinition>,
}

impl FixedStepper {
    pub(crate) fn new(name: &str, steps: Vec<StepDefinition>) -> Self {
        Self {
            name: name.to_string(),
            steps,
        }
    }

    pub(crate) fn shared(name: &str, steps: Vec<StepDefinition>) -> Arc<dyn Stepper> {
        Arc::new(Self::new(name, steps))
    }
}

impl Stepper for FixedStepper {
    fn name(&self) -> &str {
        &self.name
    }

    fn steps(&self) -> Vec<StepDefinition> {
        self.steps.clone()
    }
}

/// An action that always passes.
pub(crate) fn passing() -> ActionHandler {
    action(|_ctx| async { Ok(ActionOutcome::ok()) })
}
