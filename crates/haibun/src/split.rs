//! Running env variants concurrently.
//!
//! Each combination of `HAIBUN_ENVC` values becomes a split with its own
//! steppers, world and domains. Splits run on separate Tokio tasks and are
//! gathered in tag order once all have settled.

use std::sync::Arc;

use serde::Serialize;

use crate::config::RunConfig;
use crate::panic::panic_message;
use crate::runner::{RunResult, Runner};
use crate::stepper::Stepper;
use crate::types::FeatureSource;

/// How a split ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SplitOutcome {
    /// The run completed, passing or failing.
    Settled(RunResult),
    /// The task died before producing a result.
    Rejected {
        /// Panic or cancellation message.
        reason: String,
    },
}

/// One split and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitRun {
    /// `k=v,...` choices, or `default`.
    pub tag: String,
    /// Outcome of the split.
    pub outcome: SplitOutcome,
}

impl SplitRun {
    /// Whether the split settled and passed.
    #[must_use]
    pub fn ok(&self) -> bool {
        matches!(&self.outcome, SplitOutcome::Settled(result) if result.ok)
    }

    /// The run result, if the split settled.
    #[must_use]
    pub fn result(&self) -> Option<&RunResult> {
        match &self.outcome {
            SplitOutcome::Settled(result) => Some(result),
            SplitOutcome::Rejected { .. } => None,
        }
    }
}

/// Outcome of every split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitResult {
    /// Whether every split settled and passed.
    pub ok: bool,
    /// Splits in tag order.
    pub runs: Vec<SplitRun>,
}

/// Run one split per env variant combination.
///
/// `steppers` is called once per split so that no stepper state is shared
/// between concurrently running splits.
pub async fn run_splits<F>(
    steppers: F,
    config: &RunConfig,
    features: &[FeatureSource],
    backgrounds: &[FeatureSource],
) -> SplitResult
where
    F: Fn() -> Vec<Arc<dyn Stepper>>,
{
    let handles: Vec<_> = config
        .splits()
        .into_iter()
        .map(|(tag, split)| {
            let runner = Runner::new(steppers(), split).with_tag(&tag);
            let features = features.to_vec();
            let backgrounds = backgrounds.to_vec();
            log::debug!("spawning split `{tag}`");
            let handle =
                tokio::spawn(async move { runner.run(features, backgrounds).await });
            (tag, handle)
        })
        .collect();

    let mut runs = Vec::with_capacity(handles.len());
    for (tag, handle) in handles {
        let outcome = match handle.await {
            Ok(result) => SplitOutcome::Settled(result),
            Err(join) => {
                let reason = match join.try_into_panic() {
                    Ok(payload) => panic_message(payload.as_ref()),
                    Err(join) => join.to_string(),
                };
                log::warn!("split `{tag}` rejected: {reason}");
                SplitOutcome::Rejected { reason }
            }
        };
        runs.push(SplitRun { tag, outcome });
    }
    SplitResult {
        ok: runs.iter().all(SplitRun::ok),
        runs,
    }
}
