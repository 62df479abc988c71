//! Core library for `haibun`.
//!
//! Plain-text feature lines are matched against step definitions contributed
//! by [`Stepper`]s, resolved into executable [`FeatureStep`] trees and run
//! one step at a time. A [`Runner`] drives a single run through every stage;
//! [`split::run_splits`] runs one [`Runner`] per env variant concurrently.
//!
//! ```
//! use haibun::{FeatureSource, RunConfig, Runner, steppers};
//!
//! # tokio::runtime::Builder::new_current_thread()
//! #     .enable_time()
//! #     .build()
//! #     .unwrap_or_else(|err| panic!("runtime: {err}"))
//! #     .block_on(async {
//! let feature = FeatureSource::new(
//!     "features/hello.feature",
//!     "Feature: Greeting\nset greeting to \"hello\"\ngreeting is hello",
//!     "features",
//! );
//! let result = Runner::new(steppers::builtin(), RunConfig::default())
//!     .run(vec![feature], Vec::new())
//!     .await;
//! assert!(result.ok);
//! # });
//! ```

pub mod builder;
pub mod collect;
pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod execution;
pub mod feature;
mod panic;
pub mod populate;
pub mod registry;
pub mod reporting;
pub mod resolver;
pub mod result;
pub mod runner;
pub mod split;
pub mod stepper;
pub mod steppers;
pub mod types;
pub mod value;

#[cfg(test)]
mod test_support;

pub use builder::{Builder, Finalizer};
pub use collect::{IncludeKind, parse_include};
pub use config::RunConfig;
pub use context::{Context, StoredValue, World, credential_key};
pub use domain::{DomainDefinition, DomainRegistry, union_key};
pub use errors::{BoxError, Stage, StageFailure};
pub use execution::{ActionContext, BuildContext};
pub use feature::{FeatureStep, ResolvedFeature};
pub use haibun_patterns::{Capture, Origin};
pub use panic::panic_message;
pub use result::{ActionResult, FeatureResult, StepResult, Topic};
pub use runner::{RunResult, Runner};
pub use split::{SplitResult, run_splits};
pub use stepper::{ActionOutcome, StepDefinition, Stepper, StepperOption, action, build};
pub use types::{FeatureSource, SeqPath, SourceLocation};
pub use value::Value;
