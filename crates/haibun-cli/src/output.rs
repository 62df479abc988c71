//! Report rendering for the `haibun` binary.

use std::io::Write;

use eyre::{Context, Result};
use haibun::reporting::{json, write_summary};
use haibun::split::SplitResult;

/// Write `result` as JSON or as a text summary.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_report<W: Write>(writer: &mut W, result: &SplitResult, as_json: bool) -> Result<()> {
    if as_json {
        json::write_splits(writer, result).wrap_err("failed to write JSON report")?;
        writeln!(writer).wrap_err("failed to write JSON report")?;
    } else {
        write_summary(writer, result).wrap_err("failed to write summary")?;
    }
    writer.flush().wrap_err("failed to flush report")
}
