//! Command line runner for haibun features.
//!
//! The `haibun` binary discovers `.feature` files under a directory, runs
//! them once per env variant with the built-in steppers and reports the
//! outcome as text or JSON.
//!
//! # Configuration
//!
//! - `HAIBUN_LOG_LEVEL`: log verbosity (trace, debug, info, warn, error)
//! - the `HAIBUN_*` run settings read by [`haibun::RunConfig`]
//!
//! Command line flags take precedence over the environment.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod output;

use eyre::{Context, Result};
use haibun::split::SplitResult;
use haibun::{run_splits, steppers};

use crate::cli::Args;
use crate::config::CliConfig;
use crate::discovery::discover;

/// Discover features and run every split to completion.
///
/// # Errors
///
/// Returns an error if discovery fails or the runtime cannot start. Failed
/// features are reported in the result, not as errors.
pub fn run(args: &Args, config: &CliConfig) -> Result<SplitResult> {
    let features = discover(&args.features)
        .wrap_err_with(|| format!("failed to discover features in {}", args.features))?;
    let backgrounds = match &args.backgrounds {
        Some(dir) => discover(dir)
            .wrap_err_with(|| format!("failed to discover backgrounds in {dir}"))?,
        None => Vec::new(),
    };
    if features.is_empty() {
        tracing::warn!(dir = %args.features, "no feature files found");
    }
    tracing::info!(
        features = features.len(),
        backgrounds = backgrounds.len(),
        "running features"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to start the async runtime")?;
    Ok(runtime.block_on(run_splits(
        steppers::builtin,
        &config.run,
        &features,
        &backgrounds,
    )))
}
