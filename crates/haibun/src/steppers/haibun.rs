//! Document structure and control-flow steps.

use std::time::Duration;

use crate::execution::ActionContext;
use crate::feature::is_unresolved;
use crate::stepper::{ActionOutcome, StepDefinition, Stepper, StepperOption, action};

/// Option capping `pause for {ms}ms`, in milliseconds.
pub const PAUSE_LIMIT_MS: &str = "PAUSE_LIMIT_MS";

const DEFAULT_PAUSE_LIMIT_MS: &str = "60000";

/// Titles, prose, negation and pauses.
#[derive(Debug, Default, Clone, Copy)]
pub struct HaibunStepper;

fn feature() -> StepDefinition {
    StepDefinition::pattern(
        "feature",
        r"^Feature:\s*(?P<feature>.+)$",
        action(|ctx: ActionContext| async move {
            if let Some(title) = ctx.text("feature") {
                ctx.world().set_feature_title(title);
            }
            Ok(ActionOutcome::ok())
        }),
    )
    .unique()
}

fn scenario() -> StepDefinition {
    StepDefinition::pattern(
        "scenario",
        r"^Scenario:\s*(?P<scenario>.+)$",
        action(|ctx: ActionContext| async move {
            if let Some(title) = ctx.text("scenario") {
                ctx.world().set_scenario_title(title);
            }
            Ok(ActionOutcome::ok())
        }),
    )
    .unique()
}

fn prose() -> StepDefinition {
    StepDefinition::pattern(
        "prose",
        r"^.+[.!?:]$",
        action(|_ctx| async { Ok(ActionOutcome::ok()) }),
    )
    .fallback()
}

fn ends_with() -> StepDefinition {
    StepDefinition::template(
        "endsWith",
        "ends with {result}",
        action(|ctx: ActionContext| async move {
            let result = ctx.text("result").unwrap_or_default();
            Ok(if result == "ok" {
                ActionOutcome::ok()
            } else {
                ActionOutcome::not_ok(format!("ends with {result}"))
            })
        }),
    )
}

fn not() -> StepDefinition {
    StepDefinition::template(
        "not",
        "not {what:statement}",
        action(|ctx: ActionContext| async move {
            let results = ctx.run_statement("what").await;
            Ok(match results.last() {
                Some(last) if last.actions.iter().any(|action| is_unresolved(&action.name)) => {
                    ActionOutcome::not_ok(format!(
                        "statement did not resolve: {}",
                        last.failure_message().unwrap_or(last.text.as_str())
                    ))
                }
                Some(last) if !last.ok => ActionOutcome::ok(),
                Some(_) => ActionOutcome::not_ok("statement passed"),
                None => ActionOutcome::not_ok("statement has no steps"),
            })
        }),
    )
    .unique()
}

fn pause() -> StepDefinition {
    StepDefinition::template(
        "pause",
        "pause for {ms:number}ms",
        action(|ctx: ActionContext| async move {
            let text = ctx.text("ms").unwrap_or_default();
            let Ok(ms) = text.parse::<u64>() else {
                return Ok(ActionOutcome::not_ok(format!(
                    "pause needs a whole number of milliseconds, got {text}"
                )));
            };
            let limit = ctx
                .option(PAUSE_LIMIT_MS)
                .and_then(|limit| limit.parse::<u64>().ok())
                .unwrap_or(u64::MAX);
            if ms > limit {
                return Ok(ActionOutcome::not_ok(format!(
                    "pause of {ms}ms exceeds the {limit}ms limit"
                )));
            }
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(ActionOutcome::ok())
        }),
    )
}

impl Stepper for HaibunStepper {
    fn name(&self) -> &str {
        "haibun"
    }

    fn steps(&self) -> Vec<StepDefinition> {
        vec![feature(), scenario(), prose(), ends_with(), not(), pause()]
    }

    fn options(&self) -> Vec<StepperOption> {
        vec![
            StepperOption::optional(PAUSE_LIMIT_MS, "longest allowed pause")
                .with_default(DEFAULT_PAUSE_LIMIT_MS),
        ]
    }
}

