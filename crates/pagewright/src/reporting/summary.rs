//! Plain-text rendering of a [`RunSummary`].

use std::io::{self, Write};

use super::RunSummary;

/// Write the one-line totals, e.g.
/// `3 scenarios (2 passed, 1 failed, 0 skipped) in 1.20s`.
///
/// A second line counts setup failures when there are any.
///
/// # Errors
/// Returns any error from `writer`.
pub fn write_summary<W: Write>(writer: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(
        writer,
        "{} scenarios ({} passed, {} failed, {} skipped) in {:.2?}",
        summary.total(),
        summary.passed,
        summary.failed,
        summary.skipped,
        summary.duration
    )?;
    if !summary.setup_failures.is_empty() {
        writeln!(writer, "{} setup failure(s)", summary.setup_failures.len())?;
    }
    Ok(())
}

/// Write every failure with its scenario, step text and reason.
///
/// Writes nothing for a successful run.
///
/// # Errors
/// Returns any error from `writer`.
pub fn write_failures<W: Write>(writer: &mut W, summary: &RunSummary) -> io::Result<()> {
    for failure in &summary.setup_failures {
        writeln!(
            writer,
            "setup failure ({}) in {}: {}",
            failure.kind.label(),
            failure.scope,
            failure.message
        )?;
    }
    for failure in &summary.failures {
        writeln!(writer, "FAILED {} :: {}", failure.feature, failure.scenario)?;
        writeln!(writer, "  step:   {}", failure.step)?;
        writeln!(writer, "  reason: {}", failure.reason)?;
    }
    Ok(())
}
