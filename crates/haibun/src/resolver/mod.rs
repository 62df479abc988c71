//! Matching feature lines to step actions.
//!
//! For every line the resolver first lets steppers intercept it, then
//! gathers all matching steps and narrows them down:
//!
//! 1. a single `unique` candidate wins outright;
//! 2. fallback candidates are dropped when anything else matched;
//! 3. candidates precluded by a remaining candidate are dropped;
//! 4. exactly one must remain.
//!
//! Captures of domain `statement` are themselves resolved into nested
//! steps (see [`expand`]).

mod error;
mod expand;

use std::collections::HashSet;
use std::sync::Arc;

use crate::collect::{ExpandedFeature, SourceLibrary, SourcedLine, feature_lines, parse_include};
use crate::feature::{ResolvedFeature, StepAction};
use crate::registry::{Candidate, StepRegistry};
use crate::stepper::{LineDisposition, Stepper};
use crate::types::{SeqPath, SourceLocation};

pub use error::ResolveError;

/// Turns expanded features into resolved step trees.
pub struct Resolver<'a> {
    registry: StepRegistry,
    steppers: &'a [Arc<dyn Stepper>],
    library: &'a SourceLibrary,
    /// Steps defined by line hooks, keyed by qualified name and defining
    /// line. Background lines are offered again wherever they are included.
    defined: HashSet<(String, SourceLocation)>,
}

fn disambiguate(candidates: Vec<Candidate<'_>>) -> Result<Candidate<'_>, Vec<String>> {
    let names: Vec<String> = candidates
        .iter()
        .map(|candidate| candidate.step.qualified_name())
        .collect();

    let mut uniques = candidates
        .iter()
        .filter(|candidate| candidate.step.definition.is_unique());
    if let (Some(only), None) = (uniques.next(), uniques.next()) {
        return Ok(only.clone());
    }

    let mut remaining = candidates;
    if remaining
        .iter()
        .any(|candidate| !candidate.step.definition.is_fallback())
    {
        remaining.retain(|candidate| !candidate.step.definition.is_fallback());
    }
    let precluded: HashSet<String> = remaining
        .iter()
        .flat_map(|candidate| candidate.step.definition.precluded().to_vec())
        .collect();
    remaining.retain(|candidate| !precluded.contains(&candidate.step.qualified_name()));

    match (remaining.pop(), remaining.is_empty()) {
        (Some(chosen), true) => Ok(chosen),
        _ => Err(names),
    }
}

impl<'a> Resolver<'a> {
    /// Resolver over a compiled registry.
    #[must_use]
    pub fn new(
        registry: StepRegistry,
        steppers: &'a [Arc<dyn Stepper>],
        library: &'a SourceLibrary,
    ) -> Self {
        Self {
            registry,
            steppers,
            library,
            defined: HashSet::new(),
        }
    }

    /// The registry, including steps defined during resolution.
    #[must_use]
    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Offer `line` to the stepper hooks. Returns `true` when a hook took it.
    fn offer_line(&mut self, line: &SourcedLine) -> Result<bool, ResolveError> {
        let steppers = self.steppers;
        for stepper in steppers {
            match stepper.resolve_feature_line(&line.text, &line.source) {
                LineDisposition::Continue => {}
                LineDisposition::Consumed => return Ok(true),
                LineDisposition::Define(definitions) => {
                    for definition in definitions {
                        let key = (
                            format!("{}.{}", stepper.name(), definition.name()),
                            line.source.clone(),
                        );
                        if self.defined.contains(&key) {
                            log::debug!("`{}` already defined at {}", key.0, key.1);
                            continue;
                        }
                        self.registry.register(stepper.name(), definition)?;
                        self.defined.insert(key);
                    }
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Pre-pass over every named background.
    ///
    /// Lets steppers register line-scoped definitions before any feature
    /// resolves, and checks that every background line resolves.
    ///
    /// # Errors
    /// Returns [`ResolveError::Background`] naming the first failing
    /// background.
    pub fn resolve_backgrounds(&mut self) -> Result<(), ResolveError> {
        let library = self.library;
        for background in library.backgrounds() {
            for line in feature_lines(background) {
                self.prepass_line(&line)
                    .map_err(|source| ResolveError::Background {
                        path: background.path.clone(),
                        source: Box::new(source),
                    })?;
            }
        }
        Ok(())
    }

    fn prepass_line(&mut self, line: &SourcedLine) -> Result<(), ResolveError> {
        if self.offer_line(line)? || parse_include(&line.text).is_some() {
            return Ok(());
        }
        self.find_action(&line.text, &line.source).map(drop)
    }

    /// Resolve every feature, numbering them from one.
    ///
    /// # Errors
    /// Returns the first [`ResolveError`] met.
    pub fn resolve_features(
        &mut self,
        features: &[ExpandedFeature],
    ) -> Result<Vec<ResolvedFeature>, ResolveError> {
        let mut resolved = Vec::with_capacity(features.len());
        let mut index = 0u32;
        for feature in features {
            index = index.saturating_add(1);
            resolved.push(self.resolve_feature(index, feature)?);
        }
        Ok(resolved)
    }

    fn resolve_feature(
        &mut self,
        index: u32,
        feature: &ExpandedFeature,
    ) -> Result<ResolvedFeature, ResolveError> {
        for stepper in self.steppers {
            stepper.start_feature_resolution(&feature.path);
        }
        let mut steps = Vec::new();
        let mut position = 0u32;
        for line in &feature.lines {
            if self.offer_line(line)? {
                continue;
            }
            let action = self.find_action(&line.text, &line.source)?;
            position = position.saturating_add(1);
            let seq_path = SeqPath::from(vec![index, position]);
            steps.push(self.build_step(action, line, seq_path, 0));
        }
        log::debug!("resolved {} steps for {}", steps.len(), feature.path);
        Ok(ResolvedFeature {
            path: feature.path.clone(),
            base: feature.base.clone(),
            steps,
        })
    }

    /// Resolve one line to a single step action.
    ///
    /// # Errors
    /// Returns [`ResolveError::NoStepFound`] or
    /// [`ResolveError::AmbiguousMatch`].
    pub fn find_action(
        &self,
        text: &str,
        location: &SourceLocation,
    ) -> Result<StepAction, ResolveError> {
        let candidates = self.registry.candidates(text);
        if candidates.is_empty() {
            return Err(ResolveError::NoStepFound {
                text: text.to_string(),
                location: location.clone(),
            });
        }
        let chosen = disambiguate(candidates).map_err(|candidates| {
            ResolveError::AmbiguousMatch {
                text: text.to_string(),
                location: location.clone(),
                candidates,
            }
        })?;
        log::debug!("{location}: `{text}` -> {}", chosen.step.qualified_name());
        Ok(StepAction::resolved(
            &chosen.step.stepper,
            Arc::clone(&chosen.step.definition),
            chosen.captures,
        ))
    }
}

#[cfg(test)]
mod tests;
