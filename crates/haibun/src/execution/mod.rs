//! Running resolved features.
//!
//! Steps run one at a time in line order. Each action runs on its own Tokio
//! task so that an error or a panic becomes a failed result instead of
//! unwinding through the executor. A failed step stops the rest of its
//! feature unless it carries a score and score continuation is enabled.

mod context;
mod error;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RunConfig;
use crate::context::World;
use crate::domain::DomainRegistry;
use crate::feature::{ActionKind, FeatureStep, ResolvedFeature};
use crate::panic::panic_message;
use crate::populate::{Variables, populate};
use crate::result::{ActionResult, FeatureResult, ScoredFailure, StepResult};
use crate::stepper::{ActionOutcome, Stepper};

pub use context::{ActionContext, BuildContext};
pub use error::{ACTION_THREW, ActionThrew, HookFailure};

/// State shared by every step of a run.
pub(crate) struct ExecutionShared {
    pub(crate) domains: Arc<DomainRegistry>,
    pub(crate) steppers: Vec<Arc<dyn Stepper>>,
    pub(crate) config: Arc<RunConfig>,
    pub(crate) started: Instant,
}

type StepFuture = Pin<Box<dyn Future<Output = StepResult> + Send>>;

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn failed_action(name: String, message: String, threw: Option<ActionThrew>) -> ActionResult {
    ActionResult {
        name,
        ok: false,
        message: Some(message),
        score: None,
        topics: threw.map(ActionThrew::into_topic).into_iter().collect(),
    }
}

fn threw(name: String, threw: ActionThrew) -> ActionResult {
    failed_action(name, threw.message.clone(), Some(threw))
}

async fn invoke(
    shared: &Arc<ExecutionShared>,
    step: &Arc<FeatureStep>,
    world: &World,
) -> (Variables, ActionResult) {
    let name = step.action.qualified_name();
    let definition = match &step.action.kind {
        ActionKind::Step(definition) => Arc::clone(definition),
        ActionKind::Unresolved(message) => {
            return (Variables::default(), failed_action(name, message.clone(), None));
        }
    };
    let variables = match populate(step, world, &shared.domains, &shared.config.env) {
        Ok(variables) => variables,
        Err(err) => return (Variables::default(), failed_action(name, err.to_string(), None)),
    };

    let ctx = ActionContext {
        vars: Arc::new(variables.clone()),
        world: world.clone(),
        step: Arc::clone(step),
        shared: Arc::clone(shared),
    };
    let handler = Arc::clone(definition.action());
    let joined = tokio::spawn(async move { handler(ctx).await }).await;
    let result = match joined {
        Ok(Ok(ActionOutcome {
            ok,
            message,
            score,
            topics,
        })) => ActionResult {
            name,
            ok,
            message,
            score,
            topics,
        },
        Ok(Err(err)) => threw(name, ActionThrew::from_error(err.as_ref())),
        Err(join) => match join.try_into_panic() {
            Ok(payload) => threw(name, ActionThrew::from_panic(&panic_message(payload.as_ref()))),
            Err(join) => threw(name, ActionThrew::new(join.to_string(), None)),
        },
    };
    (variables, result)
}

/// Execute one step, turning every failure into a not-ok result.
pub(crate) fn run_step(shared: Arc<ExecutionShared>, step: Arc<FeatureStep>, world: World) -> StepFuture {
    Box::pin(async move {
        let started = Instant::now();
        let start_ms = millis(shared.started.elapsed());
        let (variables, action) = invoke(&shared, &step, &world).await;
        if !action.ok {
            log::warn!(
                "{} {} failed: {}",
                step.source,
                step.text,
                action.message.as_deref().unwrap_or("no message")
            );
        }
        StepResult {
            ok: action.ok,
            text: step.text.clone(),
            seq_path: step.seq_path.clone(),
            source: step.source.clone(),
            actions: vec![action],
            start_ms,
            duration_ms: millis(started.elapsed()),
            variables,
        }
    })
}

/// Results gathered by [`Executor::execute_features`].
#[derive(Debug, Default)]
pub(crate) struct Executed {
    pub(crate) features: Vec<FeatureResult>,
    pub(crate) scored: Vec<ScoredFailure>,
    pub(crate) aborted: Option<HookFailure>,
}

/// Runs features step by step and applies the continuation policy.
pub(crate) struct Executor {
    shared: Arc<ExecutionShared>,
}

impl Executor {
    pub(crate) fn new(shared: Arc<ExecutionShared>) -> Self {
        Self { shared }
    }

    /// Execute features in order. A failing hook stops the run and is
    /// recorded in [`Executed::aborted`] alongside the results so far.
    pub(crate) async fn execute_features(
        &self,
        features: &[ResolvedFeature],
        world: &World,
    ) -> Executed {
        let mut executed = Executed::default();
        for feature in features {
            match self.execute_feature(feature, world, &mut executed.scored).await {
                Ok(result) => executed.features.push(result),
                Err((result, failure)) => {
                    executed.features.push(result);
                    executed.aborted = Some(failure);
                    break;
                }
            }
        }
        executed
    }

    async fn execute_feature(
        &self,
        feature: &ResolvedFeature,
        world: &World,
        scored: &mut Vec<ScoredFailure>,
    ) -> Result<FeatureResult, (FeatureResult, HookFailure)> {
        world.reset_feature();
        log::info!("feature {} starting", feature.path);
        let config = &self.shared.config;
        let mut ok = true;
        let mut steps = Vec::with_capacity(feature.steps.len());
        let mut hook_failure = None;

        for step in &feature.steps {
            let result = run_step(
                Arc::clone(&self.shared),
                Arc::new(step.clone()),
                world.clone(),
            )
            .await;
            let passed = result.ok;
            if !passed {
                hook_failure = self.on_failure(&result, world).await.err();
            }
            let score = result.failure_score();
            let message = result.failure_message().map(str::to_string);
            steps.push(result);

            if hook_failure.is_some() {
                ok = false;
                break;
            }
            if !passed {
                match score.filter(|_| config.continue_on_score) {
                    Some(score) => {
                        log::info!("{} continuing past scored failure ({score})", step.seq_path);
                        scored.push(ScoredFailure {
                            score,
                            message,
                            action: step.action.qualified_name(),
                            seq_path: step.seq_path.clone(),
                        });
                    }
                    None => {
                        ok = false;
                        break;
                    }
                }
            }
            if let Some(delay) = config.step_delay {
                tokio::time::sleep(delay).await;
            }
        }

        if hook_failure.is_none() && !config.stay {
            hook_failure = self.end_feature(world).await.err();
        }
        let result = FeatureResult {
            path: feature.path.clone(),
            title: world.feature_title(),
            ok: ok && hook_failure.is_none(),
            steps,
        };
        log::info!(
            "feature {} {}",
            feature.path,
            if result.ok { "passed" } else { "failed" }
        );
        if let Some(failure) = hook_failure {
            return Err((result, failure));
        }
        Ok(result)
    }

    async fn on_failure(&self, result: &StepResult, world: &World) -> Result<(), HookFailure> {
        for stepper in &self.shared.steppers {
            stepper
                .on_failure(result, world)
                .await
                .map_err(|source| HookFailure {
                    stepper: stepper.name().to_string(),
                    hook: "on_failure",
                    source,
                })?;
        }
        Ok(())
    }

    async fn end_feature(&self, world: &World) -> Result<(), HookFailure> {
        for stepper in &self.shared.steppers {
            stepper
                .end_feature(world)
                .await
                .map_err(|source| HookFailure {
                    stepper: stepper.name().to_string(),
                    hook: "end_feature",
                    source,
                })?;
        }
        Ok(())
    }
}
