//! Rendering run outcomes.
//!
//! [`json`] writes a machine-readable document; [`write_summary`] writes the
//! plain-text summary shown on a terminal. Both use lowercase status labels.

use std::io::{self, Write};

use crate::runner::RunResult;
use crate::split::{SplitOutcome, SplitResult};

/// JSON writer for run results.
pub mod json;

/// Status label for an `ok` flag.
#[must_use]
pub const fn status_label(ok: bool) -> &'static str {
    if ok { "passed" } else { "failed" }
}

fn write_run<W: Write>(writer: &mut W, run: &RunResult) -> io::Result<()> {
    for feature in &run.features {
        let title = feature.title.as_deref().unwrap_or(feature.path.as_str());
        writeln!(writer, "  {} {title}", status_label(feature.ok))?;
        for step in feature.steps.iter().filter(|step| !step.ok) {
            writeln!(
                writer,
                "    {} {} ({}): {}",
                step.seq_path,
                step.text,
                step.source,
                step.failure_message().unwrap_or("failed")
            )?;
        }
    }
    for scored in &run.scored {
        writeln!(
            writer,
            "  scored {} at {}: {}",
            scored.score,
            scored.seq_path,
            scored.message.as_deref().unwrap_or(scored.action.as_str())
        )?;
    }
    if let Some(failure) = &run.failure {
        writeln!(writer, "  {failure}")?;
    }
    writeln!(writer, "  {}", run.summary())
}

/// Write a per-split, per-feature summary.
///
/// # Errors
/// Returns any error raised by `writer`.
pub fn write_summary<W: Write>(writer: &mut W, result: &SplitResult) -> io::Result<()> {
    for split in &result.runs {
        writeln!(writer, "{} [{}]", status_label(split.ok()), split.tag)?;
        match &split.outcome {
            SplitOutcome::Settled(run) => write_run(writer, run)?,
            SplitOutcome::Rejected { reason } => writeln!(writer, "  rejected: {reason}")?,
        }
    }
    writeln!(writer, "{}", status_label(result.ok))
}
