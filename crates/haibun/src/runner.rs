//! One run through every stage.
//!
//! A [`Runner`] owns its steppers and configuration and drives the stages in
//! order: steppers, required options, collect, expand, resolve, build,
//! execute. Teardown always follows, even after a failed stage.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::builder::Builder;
use crate::collect::{SourceLibrary, collect, expand};
use crate::config::{DEFAULT_TAG, RunConfig};
use crate::context::World;
use crate::domain::DomainRegistry;
use crate::errors::{Stage, StageFailure};
use crate::execution::{ExecutionShared, Executor};
use crate::feature::ResolvedFeature;
use crate::registry::StepRegistry;
use crate::resolver::Resolver;
use crate::result::{FeatureResult, ScoredFailure};
use crate::stepper::Stepper;
use crate::types::FeatureSource;

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    /// Split tag.
    pub tag: String,
    /// Whether every stage succeeded and every feature passed.
    pub ok: bool,
    /// Feature outcomes, in execution order.
    pub features: Vec<FeatureResult>,
    /// Failures the run continued past.
    pub scored: Vec<ScoredFailure>,
    /// The stage that aborted the run, if any.
    pub failure: Option<StageFailure>,
}

/// Counts for human-readable output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Features executed.
    pub features: usize,
    /// Features that failed.
    pub failed_features: usize,
    /// Steps executed.
    pub steps: usize,
    /// Steps that failed.
    pub failed_steps: usize,
    /// Scored failures continued past.
    pub scored: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} features ({} failed), {} steps ({} failed)",
            self.features, self.failed_features, self.steps, self.failed_steps
        )?;
        if self.scored > 0 {
            write!(f, ", {} scored", self.scored)?;
        }
        Ok(())
    }
}

impl RunResult {
    fn aborted(tag: &str, failure: StageFailure) -> Self {
        Self {
            tag: tag.to_string(),
            ok: false,
            features: Vec::new(),
            scored: Vec::new(),
            failure: Some(failure),
        }
    }

    /// Tally features and steps.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let steps = self.features.iter().flat_map(|feature| feature.steps.iter());
        RunSummary {
            features: self.features.len(),
            failed_features: self.features.iter().filter(|feature| !feature.ok).count(),
            steps: steps.clone().count(),
            failed_steps: steps.filter(|step| !step.ok).count(),
            scored: self.scored.len(),
        }
    }
}

/// Drives one configured run.
pub struct Runner {
    steppers: Vec<Arc<dyn Stepper>>,
    config: RunConfig,
    tag: String,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.steppers.iter().map(|stepper| stepper.name()).collect();
        f.debug_struct("Runner")
            .field("steppers", &names)
            .field("config", &self.config)
            .field("tag", &self.tag)
            .finish()
    }
}

/// Everything the execute stage needs after the earlier stages succeeded.
struct Prepared {
    features: Vec<ResolvedFeature>,
    shared: Arc<ExecutionShared>,
}

impl Runner {
    /// A runner over `steppers`, tagged [`DEFAULT_TAG`].
    #[must_use]
    pub fn new(steppers: Vec<Arc<dyn Stepper>>, config: RunConfig) -> Self {
        Self {
            steppers,
            config,
            tag: DEFAULT_TAG.to_string(),
        }
    }

    /// Set the tag reported with results.
    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    /// Run `features`, with `backgrounds` available to include directives.
    ///
    /// Stage failures are reported in [`RunResult::failure`]; this never
    /// returns an error.
    pub async fn run(
        &self,
        features: Vec<FeatureSource>,
        backgrounds: Vec<FeatureSource>,
    ) -> RunResult {
        let world = World::new(&self.tag);
        let mut builder = Builder::new();
        log::info!("run `{}` starting with {} sources", self.tag, features.len());

        let outcome = match self.prepare(features, backgrounds) {
            Ok(prepared) => self.build_and_execute(prepared, &world, &mut builder).await,
            Err(failure) => Err(failure),
        };
        let teardown = self.teardown(&mut builder).await;

        let mut result = match outcome {
            Ok(result) => result,
            Err(failure) => RunResult::aborted(&self.tag, failure),
        };
        if let Err(failure) = teardown {
            if result.failure.is_some() {
                log::warn!("run `{}`: {failure}", self.tag);
            } else {
                result.failure = Some(failure);
            }
            result.ok = false;
        }
        if let Some(failure) = &result.failure {
            log::warn!("run `{}` aborted: {failure}", self.tag);
            return result;
        }
        log::info!("run `{}` finished: {}", self.tag, result.summary());
        result
    }

    fn prepare(
        &self,
        features: Vec<FeatureSource>,
        backgrounds: Vec<FeatureSource>,
    ) -> Result<Prepared, StageFailure> {
        let domains = self.domains().map_err(|err| StageFailure::new(Stage::Steppers, err))?;
        let registry = StepRegistry::from_steppers(&self.steppers, &domains)
            .map_err(|err| StageFailure::new(Stage::Steppers, err))?;
        let config = self.effective_config()?;

        let collected = collect(features).map_err(|err| StageFailure::new(Stage::Collect, err))?;
        let library = SourceLibrary::new(backgrounds, collected.features.clone());
        let expanded =
            expand(&collected, &library).map_err(|err| StageFailure::new(Stage::Expand, err))?;

        let mut resolver = Resolver::new(registry, &self.steppers, &library);
        resolver
            .resolve_backgrounds()
            .map_err(|err| StageFailure::new(Stage::Resolve, err))?;
        let resolved = resolver
            .resolve_features(&expanded)
            .map_err(|err| StageFailure::new(Stage::Resolve, err))?;

        Ok(Prepared {
            features: resolved,
            shared: Arc::new(ExecutionShared {
                domains: Arc::new(domains),
                steppers: self.steppers.clone(),
                config: Arc::new(config),
                started: Instant::now(),
            }),
        })
    }

    fn domains(&self) -> Result<DomainRegistry, crate::domain::DomainError> {
        let mut domains = DomainRegistry::new();
        for stepper in &self.steppers {
            for definition in stepper.domains() {
                domains.register(definition)?;
            }
        }
        for stepper in &self.steppers {
            domains.require(stepper.name(), &stepper.required_domains())?;
        }
        Ok(domains)
    }

    /// Fill option defaults and check required options.
    fn effective_config(&self) -> Result<RunConfig, StageFailure> {
        let mut config = self.config.clone();
        for stepper in &self.steppers {
            for option in stepper.options() {
                if config.option(stepper.name(), &option.name).is_some() {
                    continue;
                }
                if let Some(default) = &option.default {
                    config.set_option(stepper.name(), &option.name, default);
                } else if option.required {
                    return Err(StageFailure::new(
                        Stage::RequiredOptions,
                        format!(
                            "stepper `{}` requires option `{}`; set {}",
                            stepper.name(),
                            option.name,
                            RunConfig::option_var(stepper.name(), &option.name)
                        ),
                    ));
                }
            }
        }
        Ok(config)
    }

    async fn build_and_execute(
        &self,
        prepared: Prepared,
        world: &World,
        builder: &mut Builder,
    ) -> Result<RunResult, StageFailure> {
        let Prepared { features, shared } = prepared;
        if shared.config.build {
            builder
                .build_features(&features, world, &shared.domains, &shared.config)
                .await
                .map_err(|err| StageFailure::new(Stage::Build, err))?;
        }

        let executed = Executor::new(Arc::clone(&shared))
            .execute_features(&features, world)
            .await;
        let failure = executed
            .aborted
            .map(|hook| StageFailure::new(Stage::Execute, hook));
        let ok = failure.is_none() && executed.features.iter().all(|feature| feature.ok);
        Ok(RunResult {
            tag: self.tag.clone(),
            ok,
            features: executed.features,
            scored: executed.scored,
            failure,
        })
    }

    async fn teardown(&self, builder: &mut Builder) -> Result<(), StageFailure> {
        let finalized = builder
            .finalize()
            .map_err(|err| StageFailure::new(Stage::Teardown, err));
        if self.config.stay {
            log::info!("run `{}` staying open; skipping close hooks", self.tag);
            return finalized;
        }
        let mut closed = Ok(());
        for stepper in &self.steppers {
            if let Err(err) = stepper.close().await {
                log::warn!("stepper `{}` failed to close: {err}", stepper.name());
                if closed.is_ok() {
                    closed = Err(StageFailure::new(
                        Stage::Teardown,
                        format!("stepper `{}` failed to close: {err}", stepper.name()),
                    ));
                }
            }
        }
        finalized.and(closed)
    }
}
