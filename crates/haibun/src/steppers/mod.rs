//! Steppers shipped with the engine.
//!
//! [`HaibunStepper`] covers document structure and control flow;
//! [`VarsStepper`] reads and writes shared variables.

mod haibun;
mod vars;

use std::sync::Arc;

use crate::stepper::Stepper;

pub use haibun::{HaibunStepper, PAUSE_LIMIT_MS};
pub use vars::VarsStepper;

/// Fresh instances of every built-in stepper.
///
/// # Examples
///
/// ```
/// let names: Vec<String> = haibun::steppers::builtin()
///     .iter()
///     .map(|stepper| stepper.name().to_string())
///     .collect();
/// assert_eq!(names, vec!["haibun", "vars"]);
/// ```
#[must_use]
pub fn builtin() -> Vec<Arc<dyn Stepper>> {
    vec![Arc::new(HaibunStepper), Arc::new(VarsStepper)]
}
