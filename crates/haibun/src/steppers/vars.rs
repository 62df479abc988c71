//! Steps that read and write shared variables.
//!
//! The `{what}` placeholder names a variable by its written term, so
//! `set "x" to 1` and `set x to 1` both address `x`. A `<name>` term
//! addresses the credential store instead.

use haibun_patterns::Origin;

use crate::context::{StoredValue, credential_key};
use crate::domain::CoerceRequest;
use crate::execution::ActionContext;
use crate::result::Topic;
use crate::stepper::{ActionOutcome, StepDefinition, Stepper, action};

/// Shared variable steps.
#[derive(Debug, Default, Clone, Copy)]
pub struct VarsStepper;

fn variable_key(ctx: &ActionContext) -> Option<String> {
    let term = ctx.term("what")?;
    Some(if ctx.origin("what") == Some(Origin::Credential) {
        credential_key(term)
    } else {
        term.to_string()
    })
}

fn populated_value(ctx: &ActionContext) -> Option<StoredValue> {
    ctx.variables().get("value").map(|populated| StoredValue {
        value: populated.value.clone(),
        domain: Some(populated.domain.clone()),
        origin: populated.origin,
    })
}

fn store(ctx: &ActionContext, only_if_empty: bool) -> ActionOutcome {
    let (Some(key), Some(value)) = (variable_key(ctx), populated_value(ctx)) else {
        return ActionOutcome::not_ok("nothing to set");
    };
    if only_if_empty && ctx.world().get(&key).is_some() {
        log::debug!("`{key}` is already set, leaving it");
        return ActionOutcome::ok();
    }
    ctx.world().set(key, value);
    ActionOutcome::ok()
}

fn set() -> StepDefinition {
    StepDefinition::template(
        "set",
        "set {what} to {value}",
        action(|ctx: ActionContext| async move { Ok(store(&ctx, false)) }),
    )
}

fn set_empty() -> StepDefinition {
    StepDefinition::template(
        "setEmpty",
        "set empty {what} to {value}",
        action(|ctx: ActionContext| async move { Ok(store(&ctx, true)) }),
    )
    .precludes(["vars.set"])
}

fn set_as() -> StepDefinition {
    StepDefinition::template(
        "setAs",
        "set {what} as {domain} to {value}",
        action(|ctx: ActionContext| async move {
            let (Some(key), Some(domain), Some(raw)) =
                (variable_key(&ctx), ctx.text("domain"), ctx.text("value"))
            else {
                return Ok(ActionOutcome::not_ok("nothing to set"));
            };
            let coerced = ctx.domains().coerce(&CoerceRequest {
                label: "value",
                origin: ctx.origin("value").unwrap_or(Origin::Quoted),
                raw: &raw,
                declared: &domain,
                stored: None,
            });
            Ok(match coerced {
                Ok(coerced) => {
                    ctx.world().set(
                        key,
                        StoredValue {
                            value: coerced.value,
                            domain: Some(coerced.domain),
                            origin: ctx.origin("value").unwrap_or(Origin::Quoted),
                        },
                    );
                    ActionOutcome::ok()
                }
                Err(err) => ActionOutcome::not_ok(err.to_string()),
            })
        }),
    )
    .precludes(["vars.set"])
}

fn is() -> StepDefinition {
    StepDefinition::template(
        "is",
        "{what} is {value}",
        action(|ctx: ActionContext| async move {
            let Some(key) = variable_key(&ctx) else {
                return Ok(ActionOutcome::not_ok("no variable named"));
            };
            let expected = ctx.text("value").unwrap_or_default();
            Ok(match ctx.world().get(&key) {
                Some(stored) if stored.value.to_string() == expected => ActionOutcome::ok(),
                Some(stored) => {
                    ActionOutcome::not_ok(format!("{key} is {}, expected {expected}", stored.value))
                }
                None => ActionOutcome::not_ok(format!("{key} is not set")),
            })
        }),
    )
}

fn is_set() -> StepDefinition {
    StepDefinition::template(
        "isSet",
        "{what} is set",
        action(|ctx: ActionContext| async move {
            let set = variable_key(&ctx).is_some_and(|key| ctx.world().get(&key).is_some());
            Ok(if set {
                ActionOutcome::ok()
            } else {
                ActionOutcome::not_ok(format!("{} is not set", ctx.term("what").unwrap_or("?")))
            })
        }),
    )
    .precludes(["vars.is"])
}

fn show() -> StepDefinition {
    StepDefinition::template(
        "show",
        "show var {what}",
        action(|ctx: ActionContext| async move {
            let Some(key) = variable_key(&ctx) else {
                return Ok(ActionOutcome::not_ok("no variable named"));
            };
            let message = ctx.world().get(&key).map_or_else(
                || format!("{key} is not set"),
                |stored| {
                    format!(
                        "{key} = {} ({})",
                        stored.value,
                        stored.domain.as_deref().unwrap_or("unknown")
                    )
                },
            );
            log::info!("{message}");
            Ok(ActionOutcome::ok().with_topic(Topic::Trace { message }))
        }),
    )
}

impl Stepper for VarsStepper {
    fn name(&self) -> &str {
        "vars"
    }

    fn steps(&self) -> Vec<StepDefinition> {
        vec![set(), set_empty(), set_as(), is(), is_set(), show()]
    }
}
