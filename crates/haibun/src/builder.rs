//! Build pre-pass and deferred finalizers.
//!
//! When building is enabled, the first step of each feature whose
//! definition carries a build handler runs before execution. Handlers may
//! return a [`Finalizer`], queued under the feature's workspace and run
//! once at teardown.

use std::sync::Arc;

use camino::Utf8Path;
use thiserror::Error;

use crate::config::RunConfig;
use crate::context::World;
use crate::domain::DomainRegistry;
use crate::errors::BoxError;
use crate::execution::BuildContext;
use crate::feature::{FeatureStep, ResolvedFeature};
use crate::populate::{PopulateError, populate};

/// Deferred work registered by a build handler; receives its workspace.
pub type Finalizer = Box<dyn FnOnce(&str) -> Result<(), BoxError> + Send>;

/// Errors from the build pre-pass and finalizers.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A build step's variables could not be populated.
    #[error("{location}: cannot build `{step}`: {source}")]
    Populate {
        /// Qualified action name.
        step: String,
        /// Step location.
        location: String,
        /// Population failure.
        #[source]
        source: PopulateError,
    },
    /// A build handler returned an error.
    #[error("{location}: build of `{step}` failed: {source}")]
    Handler {
        /// Qualified action name.
        step: String,
        /// Step location.
        location: String,
        /// Handler error.
        #[source]
        source: BoxError,
    },
    /// A finalizer returned an error.
    #[error("finalizer for `{workspace}` failed: {source}")]
    Finalizer {
        /// Workspace the finalizer was registered under.
        workspace: String,
        /// Finalizer error.
        #[source]
        source: BoxError,
    },
}

/// Finalizers grouped by workspace, in registration order.
#[derive(Default)]
pub struct Builder {
    scopes: Vec<(String, Vec<Finalizer>)>,
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("pending", &self.pending())
            .finish()
    }
}

fn workspace_of(feature: &ResolvedFeature) -> String {
    Utf8Path::new(&feature.path)
        .parent()
        .map_or_else(String::new, ToString::to_string)
}

impl Builder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `finalizer` under `workspace`.
    pub fn register(&mut self, workspace: &str, finalizer: Finalizer) {
        if let Some((_, queue)) = self.scopes.iter_mut().find(|(scope, _)| scope == workspace) {
            queue.push(finalizer);
            return;
        }
        self.scopes.push((workspace.to_string(), vec![finalizer]));
    }

    /// Number of queued finalizers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.scopes.iter().map(|(_, queue)| queue.len()).sum()
    }

    /// Run the build handler of each feature's first buildable step.
    ///
    /// # Errors
    /// Returns the first [`BuildError`]; later features are not built.
    pub(crate) async fn build_features(
        &mut self,
        features: &[ResolvedFeature],
        world: &World,
        domains: &DomainRegistry,
        config: &RunConfig,
    ) -> Result<(), BuildError> {
        for feature in features {
            let Some((step, handler)) = feature.steps.iter().find_map(|step| {
                step.action
                    .definition()
                    .and_then(|definition| definition.build_handler())
                    .map(|handler| (step, Arc::clone(handler)))
            }) else {
                continue;
            };
            world.reset_feature();
            let workspace = workspace_of(feature);
            let name = step.action.qualified_name();
            log::info!("building {name} for workspace `{workspace}`");
            let vars = populate(step, world, domains, &config.env).map_err(|source| {
                BuildError::Populate {
                    step: name.clone(),
                    location: step.source.to_string(),
                    source,
                }
            })?;
            let ctx = BuildContext {
                vars,
                world: world.clone(),
                step: Arc::new(FeatureStep::clone(step)),
                workspace: workspace.clone(),
            };
            let finalizer = handler(ctx).await.map_err(|source| BuildError::Handler {
                step: name,
                location: step.source.to_string(),
                source,
            })?;
            if let Some(finalizer) = finalizer {
                self.register(&workspace, finalizer);
            }
        }
        Ok(())
    }

    /// Drain and run every finalizer, scope by scope in registration order.
    ///
    /// Every finalizer runs even if an earlier one fails; a second call
    /// does nothing.
    ///
    /// # Errors
    /// Returns the first [`BuildError::Finalizer`].
    pub fn finalize(&mut self) -> Result<(), BuildError> {
        let mut first_error = None;
        for (workspace, queue) in std::mem::take(&mut self.scopes) {
            for finalizer in queue {
                if let Err(source) = finalizer(&workspace) {
                    log::warn!("finalizer for `{workspace}` failed: {source}");
                    first_error.get_or_insert(BuildError::Finalizer {
                        workspace: workspace.clone(),
                        source,
                    });
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, PoisonError};

    use super::*;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, label: &'static str) -> Finalizer {
        let log = Arc::clone(log);
        Box::new(move |workspace: &str| {
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("{workspace}:{label}"));
            Ok(())
        })
    }

    #[test]
    fn finalizers_run_once_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = Builder::new();
        builder.register("a", recorder(&log, "first"));
        builder.register("b", recorder(&log, "second"));
        builder.register("a", recorder(&log, "third"));
        assert_eq!(builder.pending(), 3);

        assert!(builder.finalize().is_ok());
        assert!(builder.finalize().is_ok());
        let seen = log.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(seen, vec!["a:first", "a:third", "b:second"]);
        assert_eq!(builder.pending(), 0);
    }

    #[test]
    fn failing_finalizer_does_not_stop_the_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = Builder::new();
        builder.register("a", Box::new(|_: &str| -> Result<(), BoxError> { Err("disk full".into()) }));
        builder.register("a", recorder(&log, "after"));
        let err = builder
            .finalize()
            .err()
            .unwrap_or_else(|| panic!("failure should be reported"));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(log.lock().unwrap_or_else(PoisonError::into_inner).len(), 1);
    }
}
