//! Stepper modules and the step definitions they contribute.
//!
//! A [`Stepper`] is a named bundle of [`StepDefinition`]s, optional
//! [`DomainDefinition`]s and lifecycle hooks. Runs are assembled from an
//! explicit list of steppers; there is no global registration.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::builder::Finalizer;
use crate::context::World;
use crate::domain::DomainDefinition;
use crate::errors::BoxError;
use crate::execution::{ActionContext, BuildContext};
use crate::result::{StepResult, Topic};
use crate::types::SourceLocation;

/// Future returned by a step action.
pub type ActionFuture = Pin<Box<dyn Future<Output = Result<ActionOutcome, BoxError>> + Send>>;

/// Shared step action.
pub type ActionHandler = Arc<dyn Fn(ActionContext) -> ActionFuture + Send + Sync>;

/// Future returned by a build handler.
pub type BuildFuture = Pin<Box<dyn Future<Output = Result<Option<Finalizer>, BoxError>> + Send>>;

/// Shared build handler.
pub type BuildHandler = Arc<dyn Fn(BuildContext) -> BuildFuture + Send + Sync>;

/// Wrap an async closure as an [`ActionHandler`].
///
/// # Examples
///
/// ```
/// use haibun::{ActionOutcome, action};
///
/// let handler = action(|_ctx| async { Ok(ActionOutcome::ok()) });
/// # let _ = handler;
/// ```
pub fn action<F, Fut>(f: F) -> ActionHandler
where
    F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ActionOutcome, BoxError>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Wrap an async closure as a [`BuildHandler`].
pub fn build<F, Fut>(f: F) -> BuildHandler
where
    F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Finalizer>, BoxError>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// What a step action reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Whether the step passed.
    pub ok: bool,
    /// Failure (or informational) message.
    pub message: Option<String>,
    /// Score attached to a failure; lets the run continue when enabled.
    pub score: Option<f64>,
    /// Structured attachments.
    pub topics: Vec<Topic>,
}

impl ActionOutcome {
    /// A passing outcome.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            ok: true,
            message: None,
            score: None,
            topics: Vec::new(),
        }
    }

    /// A failing outcome with a message.
    #[must_use]
    pub fn not_ok(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
            score: None,
            topics: Vec::new(),
        }
    }

    /// Attach a score.
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Attach a topic.
    #[must_use]
    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topics.push(topic);
        self
    }
}

/// How a step definition matches feature lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepForm {
    /// Literal equality after keyword/politeness normalisation.
    Exact(String),
    /// Regular expression; named groups become captures.
    Pattern(String),
    /// Phrase with `{label[:domain]}` placeholders.
    Template(String),
}

impl StepForm {
    /// The declared text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Exact(text) | Self::Pattern(text) | Self::Template(text) => text,
        }
    }
}

/// One step a stepper offers.
#[derive(Clone)]
pub struct StepDefinition {
    name: String,
    form: StepForm,
    unique: bool,
    fallback: bool,
    precludes: Vec<String>,
    source: Option<SourceLocation>,
    action: ActionHandler,
    build: Option<BuildHandler>,
}

impl StepDefinition {
    fn with_form(name: impl Into<String>, form: StepForm, action: ActionHandler) -> Self {
        Self {
            name: name.into(),
            form,
            unique: false,
            fallback: false,
            precludes: Vec::new(),
            source: None,
            action,
            build: None,
        }
    }

    /// A step matched by normalised literal equality.
    pub fn exact(name: impl Into<String>, text: impl Into<String>, action: ActionHandler) -> Self {
        Self::with_form(name, StepForm::Exact(text.into()), action)
    }

    /// A step matched by a regular expression.
    pub fn pattern(
        name: impl Into<String>,
        pattern: impl Into<String>,
        action: ActionHandler,
    ) -> Self {
        Self::with_form(name, StepForm::Pattern(pattern.into()), action)
    }

    /// A step matched by a placeholder template.
    ///
    /// # Examples
    ///
    /// ```
    /// use haibun::{ActionOutcome, StepDefinition, action};
    ///
    /// let step = StepDefinition::template(
    ///     "greet",
    ///     "greet {name}",
    ///     action(|_ctx| async { Ok(ActionOutcome::ok()) }),
    /// )
    /// .unique();
    /// assert!(step.is_unique());
    /// assert_eq!(step.form().text(), "greet {name}");
    /// ```
    pub fn template(
        name: impl Into<String>,
        template: impl Into<String>,
        action: ActionHandler,
    ) -> Self {
        Self::with_form(name, StepForm::Template(template.into()), action)
    }

    /// Win any ambiguity this step takes part in.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Yield to any non-fallback step matching the same line.
    #[must_use]
    pub fn fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    /// Remove the named `stepper.action` candidates when this step matches.
    #[must_use]
    pub fn precludes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precludes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Report matched lines at this location instead of the feature line.
    #[must_use]
    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }

    /// Run `handler` during the build pre-pass.
    #[must_use]
    pub fn with_build(mut self, handler: BuildHandler) -> Self {
        self.build = Some(handler);
        self
    }

    /// Action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Match form.
    #[must_use]
    pub fn form(&self) -> &StepForm {
        &self.form
    }

    /// Whether the step wins ambiguities.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether the step yields to other matches.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// `stepper.action` names this step precludes.
    #[must_use]
    pub fn precluded(&self) -> &[String] {
        &self.precludes
    }

    /// Declared source location.
    #[must_use]
    pub fn source(&self) -> Option<&SourceLocation> {
        self.source.as_ref()
    }

    /// Step action.
    #[must_use]
    pub fn action(&self) -> &ActionHandler {
        &self.action
    }

    /// Build handler, if any.
    #[must_use]
    pub fn build_handler(&self) -> Option<&BuildHandler> {
        self.build.as_ref()
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("name", &self.name)
            .field("form", &self.form)
            .field("unique", &self.unique)
            .field("fallback", &self.fallback)
            .field("precludes", &self.precludes)
            .field("source", &self.source)
            .field("build", &self.build.is_some())
            .finish_non_exhaustive()
    }
}

/// What a stepper's line hook decided about a feature line.
#[derive(Debug, Default)]
pub enum LineDisposition {
    /// Resolve the line normally.
    #[default]
    Continue,
    /// The hook handled the line; it yields no step.
    Consumed,
    /// The hook handled the line and contributes new step definitions.
    Define(Vec<StepDefinition>),
}

/// A named option a stepper reads from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepperOption {
    /// Option name, matched case-insensitively.
    pub name: String,
    /// Whether the run fails at `RequiredOptions` when it is absent.
    pub required: bool,
    /// Value used when the option is absent.
    pub default: Option<String>,
    /// One-line description.
    pub description: String,
}

impl StepperOption {
    /// An optional setting.
    #[must_use]
    pub fn optional(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            default: None,
            description: description.to_string(),
        }
    }

    /// A setting the run cannot start without.
    #[must_use]
    pub fn required(name: &str, description: &str) -> Self {
        Self {
            required: true,
            ..Self::optional(name, description)
        }
    }

    /// Set a default value.
    #[must_use]
    pub fn with_default(mut self, value: &str) -> Self {
        self.default = Some(value.to_string());
        self
    }
}

/// A module of steps, domains and lifecycle hooks.
///
/// Only [`name`](Self::name) and [`steps`](Self::steps) are mandatory.
/// Hooks returning an error abort the run at the stage they run in.
#[async_trait]
pub trait Stepper: Send + Sync {
    /// Stepper name, used to qualify its actions as `stepper.action`.
    fn name(&self) -> &str;

    /// Step definitions offered by the stepper.
    fn steps(&self) -> Vec<StepDefinition>;

    /// Domains the stepper contributes.
    fn domains(&self) -> Vec<DomainDefinition> {
        Vec::new()
    }

    /// Domains that must be registered by some stepper.
    fn required_domains(&self) -> Vec<String> {
        Vec::new()
    }

    /// Options the stepper reads.
    fn options(&self) -> Vec<StepperOption> {
        Vec::new()
    }

    /// Called before each feature is resolved.
    fn start_feature_resolution(&self, _path: &str) {}

    /// Offered each feature and background line before normal resolution.
    fn resolve_feature_line(&self, _line: &str, _source: &SourceLocation) -> LineDisposition {
        LineDisposition::Continue
    }

    /// Called right after a step fails.
    async fn on_failure(&self, _result: &StepResult, _world: &World) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called after each feature unless the run was asked to stay open.
    async fn end_feature(&self, _world: &World) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once at teardown unless the run was asked to stay open.
    async fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }
}
