//! Compiled step registry.
//!
//! Definitions from every stepper are compiled once, against the run's
//! domain names, into [`RegisteredStep`]s. The resolver asks the registry
//! for every candidate matching a line.

use std::sync::Arc;

use haibun_patterns::{
    Capture, CompiledTemplate, DEFAULT_DOMAIN, Origin, PatternError, compile_template,
    normalize_exact,
};
use regex::Regex;
use thiserror::Error;

use crate::domain::DomainRegistry;
use crate::stepper::{StepDefinition, StepForm, Stepper};

/// A step definition failed to compile.
#[derive(Debug, Error)]
#[error("step `{step}` is invalid: {source}")]
pub struct RegistryError {
    /// Qualified `stepper.action` name.
    pub step: String,
    /// Compilation failure.
    #[source]
    pub source: PatternError,
}

/// Compiled matcher for a step definition.
#[derive(Debug, Clone)]
pub enum MatchForm {
    /// Normalised literal text.
    Exact(String),
    /// Author-supplied regular expression.
    Pattern(Regex),
    /// Compiled placeholder template.
    Template(CompiledTemplate),
}

impl MatchForm {
    fn compile(form: &StepForm, domains: &[&str]) -> Result<Self, PatternError> {
        Ok(match form {
            StepForm::Exact(text) => Self::Exact(normalize_exact(text)),
            StepForm::Pattern(pattern) => Self::Pattern(Regex::new(pattern)?),
            StepForm::Template(template) => {
                Self::Template(compile_template(template, Some(domains))?)
            }
        })
    }

    /// Captures for `line`, or `None` when it does not match.
    ///
    /// Named regex groups become quoted captures of domain `string`.
    #[must_use]
    pub fn matches(&self, line: &str) -> Option<Vec<Capture>> {
        match self {
            Self::Exact(normalised) => (normalize_exact(line) == *normalised).then(Vec::new),
            Self::Pattern(regex) => {
                let caps = regex.captures(line.trim())?;
                let captures = regex
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        caps.name(name).map(|found| Capture {
                            label: name.to_string(),
                            term: found.as_str().to_string(),
                            origin: Origin::Quoted,
                            domain: DEFAULT_DOMAIN.to_string(),
                        })
                    })
                    .collect();
                Some(captures)
            }
            Self::Template(template) => template.captures(line),
        }
    }
}

/// A compiled definition and the stepper that owns it.
#[derive(Debug, Clone)]
pub struct RegisteredStep {
    /// Owning stepper name.
    pub stepper: String,
    /// The definition.
    pub definition: Arc<StepDefinition>,
    /// Compiled matcher.
    pub matcher: MatchForm,
}

impl RegisteredStep {
    /// `stepper.action` name.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.stepper, self.definition.name())
    }
}

/// A registered step that matched a line, with its captures.
#[derive(Debug, Clone)]
pub struct Candidate<'r> {
    /// The matching step.
    pub step: &'r RegisteredStep,
    /// Captures from the line.
    pub captures: Vec<Capture>,
}

/// All steps available to a run.
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    steps: Vec<RegisteredStep>,
    domains: Vec<String>,
}

impl StepRegistry {
    /// Empty registry validating templates against `domains`.
    #[must_use]
    pub fn new(domains: &DomainRegistry) -> Self {
        Self {
            steps: Vec::new(),
            domains: domains.names().into_iter().map(str::to_string).collect(),
        }
    }

    /// Compile and register every step of every stepper, in order.
    ///
    /// # Errors
    /// Returns [`RegistryError`] for the first definition that fails to
    /// compile.
    pub fn from_steppers(
        steppers: &[Arc<dyn Stepper>],
        domains: &DomainRegistry,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(domains);
        for stepper in steppers {
            for definition in stepper.steps() {
                registry.register(stepper.name(), definition)?;
            }
        }
        Ok(registry)
    }

    /// Compile and register one definition.
    ///
    /// # Errors
    /// Returns [`RegistryError`] when the definition fails to compile.
    pub fn register(
        &mut self,
        stepper: &str,
        definition: StepDefinition,
    ) -> Result<(), RegistryError> {
        let known: Vec<&str> = self.domains.iter().map(String::as_str).collect();
        let matcher =
            MatchForm::compile(definition.form(), &known).map_err(|source| RegistryError {
                step: format!("{stepper}.{}", definition.name()),
                source,
            })?;
        log::debug!("registered step `{stepper}.{}`", definition.name());
        self.steps.push(RegisteredStep {
            stepper: stepper.to_string(),
            definition: Arc::new(definition),
            matcher,
        });
        Ok(())
    }

    /// Every registered step matching `line`, in registration order.
    #[must_use]
    pub fn candidates(&self, line: &str) -> Vec<Candidate<'_>> {
        self.steps
            .iter()
            .filter_map(|step| {
                step.matcher
                    .matches(line)
                    .map(|captures| Candidate { step, captures })
            })
            .collect()
    }

    /// Number of registered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Registered steps in order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredStep> {
        self.steps.iter()
    }
}
