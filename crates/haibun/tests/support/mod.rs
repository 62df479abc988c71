//! Steppers and helpers shared by the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use haibun::{
    ActionContext, ActionOutcome, BoxError, DomainDefinition, FeatureSource, RunConfig, RunResult,
    Runner, StepDefinition, Stepper, StepperOption, StoredValue, Topic, Value, World, action, build,
    steppers,
};

/// Counts of lifecycle hook calls.
#[derive(Debug, Default)]
pub struct HookCounts {
    /// `on_failure` calls.
    pub failures: AtomicUsize,
    /// `end_feature` calls.
    pub ends: AtomicUsize,
    /// `close` calls.
    pub closes: AtomicUsize,
}

impl HookCounts {
    /// Read a counter.
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// The stepper used by most end-to-end tests.
#[derive(Default)]
pub struct TestStepper {
    /// Hook call counts.
    pub hooks: Arc<HookCounts>,
    /// `workspace:target` entries recorded by finalizers.
    pub finalized: Arc<Mutex<Vec<String>>>,
    /// Declare a required `token` option.
    pub required_option: bool,
}

impl TestStepper {
    /// Entries recorded by finalizers so far.
    pub fn finalized(&self) -> Vec<String> {
        self.finalized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn have_a_test() -> StepDefinition {
    StepDefinition::exact(
        "have",
        "When I have a test",
        action(|ctx: ActionContext| async move {
            ctx.world().set("test", StoredValue::text("present", haibun::Origin::Quoted));
            Ok(ActionOutcome::ok())
        }),
    )
}

fn should_pass() -> StepDefinition {
    StepDefinition::exact(
        "passes",
        "Then the test should pass",
        action(|ctx: ActionContext| async move {
            Ok(if ctx.world().get("test").is_some() {
                ActionOutcome::ok()
            } else {
                ActionOutcome::not_ok("no test")
            })
        }),
    )
}

fn should_fail() -> StepDefinition {
    StepDefinition::exact(
        "fails",
        "Then the test can fail",
        action(|_ctx| async { Ok(ActionOutcome::not_ok("failed on purpose")) }),
    )
}

fn scored() -> StepDefinition {
    StepDefinition::template(
        "scored",
        "score {points:number}",
        action(|ctx: ActionContext| async move {
            let points = ctx.number("points").unwrap_or_default();
            Ok(ActionOutcome::not_ok("below threshold").with_score(points))
        }),
    )
}

fn compile(finalized: Arc<Mutex<Vec<String>>>) -> StepDefinition {
    StepDefinition::template(
        "compile",
        "compile {target}",
        action(|_ctx| async { Ok(ActionOutcome::ok()) }),
    )
    .with_build(build(move |ctx| {
        let finalized = Arc::clone(&finalized);
        async move {
            let target = ctx.text("target").unwrap_or_default();
            let finalizer: haibun::Finalizer = Box::new(move |workspace: &str| {
                finalized
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(format!("{workspace}:{target}"));
                Ok(())
            });
            Ok(Some(finalizer))
        }
    }))
}

fn page_url() -> Vec<StepDefinition> {
    vec![StepDefinition::template(
        "visit",
        "visit {where:page|url}",
        action(|ctx: ActionContext| async move {
            let domain = ctx
                .variables()
                .get("where")
                .map(|populated| populated.domain.clone())
                .unwrap_or_default();
            Ok(ActionOutcome::ok().with_topic(Topic::Trace { message: domain }))
        }),
    )]
}

#[async_trait]
impl Stepper for TestStepper {
    fn name(&self) -> &str {
        "test"
    }

    fn steps(&self) -> Vec<StepDefinition> {
        let mut steps = vec![
            have_a_test(),
            should_pass(),
            should_fail(),
            scored(),
            compile(Arc::clone(&self.finalized)),
        ];
        steps.extend(page_url());
        steps
    }

    fn domains(&self) -> Vec<DomainDefinition> {
        vec![
            DomainDefinition::new("page", |raw| Ok(Value::from(format!("page:{raw}")))),
            DomainDefinition::new("url", |raw| Ok(Value::from(format!("url:{raw}")))),
        ]
    }

    fn options(&self) -> Vec<StepperOption> {
        if self.required_option {
            vec![StepperOption::required("token", "API token")]
        } else {
            Vec::new()
        }
    }

    async fn on_failure(
        &self,
        _result: &haibun::StepResult,
        _world: &World,
    ) -> Result<(), BoxError> {
        self.hooks.failures.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn end_feature(&self, _world: &World) -> Result<(), BoxError> {
        self.hooks.ends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.hooks.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Built-in steppers plus `stepper`.
pub fn with_builtin(stepper: Arc<TestStepper>) -> Vec<Arc<dyn Stepper>> {
    let mut all = steppers::builtin();
    all.push(stepper);
    all
}

/// A feature under `features/`.
pub fn feature(name: &str, content: &str) -> FeatureSource {
    FeatureSource::new(format!("features/{name}.feature"), content, "features")
}

/// Run `features` with the built-ins and `stepper`.
pub async fn run(
    stepper: &Arc<TestStepper>,
    config: RunConfig,
    features: Vec<FeatureSource>,
    backgrounds: Vec<FeatureSource>,
) -> RunResult {
    Runner::new(with_builtin(Arc::clone(stepper)), config)
        .run(features, backgrounds)
        .await
}
