//! JSON writer for run results.
//!
//! The document keeps a predictable shape: every level carries a lowercase
//! `status`, sequence paths are rendered as dotted strings and stage
//! failures appear under `stage_failure`.

use std::io::Write;

use serde::Serialize;

use super::status_label;
use crate::errors::StageFailure;
use crate::populate::Variables;
use crate::result::{ActionResult, FeatureResult, ScoredFailure, StepResult};
use crate::runner::RunResult;
use crate::split::{SplitOutcome, SplitResult};

#[derive(Serialize)]
struct JsonReport<'a> {
    ok: bool,
    status: &'static str,
    splits: Vec<JsonSplit<'a>>,
}

#[derive(Serialize)]
struct JsonSplit<'a> {
    tag: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejected: Option<&'a str>,
    #[serde(flatten)]
    run: Option<JsonRun<'a>>,
}

#[derive(Serialize)]
struct JsonRun<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage_failure: Option<&'a StageFailure>,
    features: Vec<JsonFeature<'a>>,
    scored: Vec<JsonScored<'a>>,
}

#[derive(Serialize)]
struct JsonFeature<'a> {
    path: &'a str,
    title: Option<&'a str>,
    status: &'static str,
    steps: Vec<JsonStep<'a>>,
}

#[derive(Serialize)]
struct JsonStep<'a> {
    seq_path: String,
    #[serde(rename = "in")]
    text: &'a str,
    source: String,
    status: &'static str,
    start_ms: u64,
    duration_ms: u64,
    actions: &'a [ActionResult],
    variables: &'a Variables,
}

#[derive(Serialize)]
struct JsonScored<'a> {
    seq_path: String,
    action: &'a str,
    score: f64,
    message: Option<&'a str>,
}

impl<'a> From<&'a StepResult> for JsonStep<'a> {
    fn from(step: &'a StepResult) -> Self {
        Self {
            seq_path: step.seq_path.to_string(),
            text: &step.text,
            source: step.source.to_string(),
            status: status_label(step.ok),
            start_ms: step.start_ms,
            duration_ms: step.duration_ms,
            actions: &step.actions,
            variables: &step.variables,
        }
    }
}

impl<'a> From<&'a FeatureResult> for JsonFeature<'a> {
    fn from(feature: &'a FeatureResult) -> Self {
        Self {
            path: &feature.path,
            title: feature.title.as_deref(),
            status: status_label(feature.ok),
            steps: feature.steps.iter().map(JsonStep::from).collect(),
        }
    }
}

impl<'a> From<&'a ScoredFailure> for JsonScored<'a> {
    fn from(scored: &'a ScoredFailure) -> Self {
        Self {
            seq_path: scored.seq_path.to_string(),
            action: &scored.action,
            score: scored.score,
            message: scored.message.as_deref(),
        }
    }
}

impl<'a> From<&'a RunResult> for JsonRun<'a> {
    fn from(run: &'a RunResult) -> Self {
        Self {
            ok: run.ok,
            stage_failure: run.failure.as_ref(),
            features: run.features.iter().map(JsonFeature::from).collect(),
            scored: run.scored.iter().map(JsonScored::from).collect(),
        }
    }
}

impl<'a> From<&'a SplitResult> for JsonReport<'a> {
    fn from(result: &'a SplitResult) -> Self {
        let splits = result
            .runs
            .iter()
            .map(|split| {
                let (rejected, run) = match &split.outcome {
                    SplitOutcome::Settled(run) => (None, Some(JsonRun::from(run))),
                    SplitOutcome::Rejected { reason } => (Some(reason.as_str()), None),
                };
                JsonSplit {
                    tag: &split.tag,
                    status: status_label(split.ok()),
                    rejected,
                    run,
                }
            })
            .collect();
        Self {
            ok: result.ok,
            status: status_label(result.ok),
            splits,
        }
    }
}

/// Serialize a single run into the supplied writer.
///
/// # Errors
/// Returns an error when serialization or writing fails.
pub fn write_run<W: Write>(writer: &mut W, run: &RunResult) -> serde_json::Result<()> {
    serde_json::to_writer(writer, &JsonRun::from(run))
}

/// Serialize every split into the supplied writer.
///
/// # Errors
/// Returns an error when serialization or writing fails.
pub fn write_splits<W: Write>(writer: &mut W, result: &SplitResult) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, &JsonReport::from(result))
}

/// Produce the JSON document for every split as a string.
///
/// # Errors
/// Returns an error when serialization fails.
pub fn to_string(result: &SplitResult) -> serde_json::Result<String> {
    serde_json::to_string(&JsonReport::from(result))
}
