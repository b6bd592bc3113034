//! Writing run results to the terminal and to disk.

use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use eyre::{Context, Result};
use pagewright::reporting::{json, summary};
use pagewright::{BindingDiagnostic, PatternOverlap, RunSummary, ScenarioResult, StepRegistry};

pub(crate) fn write_outcome<O: Write, E: Write>(
    stdout: &mut O,
    stderr: &mut E,
    run: &RunSummary,
) -> Result<()> {
    summary::write_summary(stdout, run).wrap_err("failed to write run summary")?;
    stdout.flush().wrap_err("failed to flush run summary")?;
    summary::write_failures(stderr, run).wrap_err("failed to write failure list")
}

pub(crate) fn write_report(
    path: &Utf8Path,
    results: &[ScenarioResult],
    run: &RunSummary,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create report directory {parent}"))?;
    }
    let file = File::create(path).wrap_err_with(|| format!("failed to create report {path}"))?;
    let mut writer = BufWriter::new(file);
    json::write(&mut writer, results, run)
        .wrap_err_with(|| format!("failed to write report {path}"))?;
    writer
        .flush()
        .wrap_err_with(|| format!("failed to flush report {path}"))
}

pub(crate) fn write_diagnostics(
    writer: &mut dyn Write,
    diagnostics: &[BindingDiagnostic],
) -> Result<()> {
    for diagnostic in diagnostics {
        writeln!(
            writer,
            "{}:{}: {}",
            diagnostic.scenario, diagnostic.line, diagnostic.error
        )
        .wrap_err("failed to write binding diagnostic")?;
    }
    Ok(())
}

pub(crate) fn write_overlaps(
    writer: &mut dyn Write,
    overlaps: &[PatternOverlap],
) -> Result<()> {
    for overlap in overlaps {
        writeln!(
            writer,
            "ambiguous patterns: '{}' and '{}' can match the same step",
            overlap.first, overlap.second
        )
        .wrap_err("failed to write pattern overlap")?;
    }
    Ok(())
}

pub(crate) fn write_steps(writer: &mut dyn Write, registry: &StepRegistry) -> Result<()> {
    let listing = registry
        .to_json()
        .wrap_err("failed to serialise step definitions")?;
    writeln!(writer, "{listing}").wrap_err("failed to write step definitions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewright::BindingError;

    #[test]
    fn overlaps_name_both_patterns() {
        let overlaps = [PatternOverlap {
            first: "the cart has {int} items".into(),
            second: "the cart has {word} items".into(),
        }];
        let mut out = Vec::new();
        assert!(write_overlaps(&mut out, &overlaps).is_ok());
        assert_eq!(
            String::from_utf8_lossy(&out),
            "ambiguous patterns: 'the cart has {int} items' and 'the cart has {word} items' \
             can match the same step\n"
        );
    }

    #[test]
    fn diagnostics_name_scenario_and_line() {
        let diagnostics = [BindingDiagnostic {
            scenario: "Login".into(),
            line: 4,
            error: BindingError::NoMatchingStep {
                text: "the User waves".into(),
            },
        }];
        let mut out = Vec::new();
        assert!(write_diagnostics(&mut out, &diagnostics).is_ok());
        let text = String::from_utf8_lossy(&out);
        assert!(text.starts_with("Login:4: "), "{text}");
        assert!(text.contains("the User waves"), "{text}");
    }
}
