//! JSON writer for run results.
//!
//! The schema keeps status labels in lowercase so downstream tools can rely
//! on consistent casing. Durations are whole milliseconds.

use std::io::Write;

use serde::Serialize;

use super::{RunSummary, ScenarioResult, SetupFailure, StepOutcome, StepResult, duration_ms};

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: JsonSummary,
    scenarios: Vec<JsonScenario<'a>>,
    setup_failures: Vec<JsonSetupFailure<'a>>,
}

#[derive(Serialize)]
struct JsonSummary {
    success: bool,
    total: usize,
    passed: usize,
    failed: usize,
    skipped: usize,
    duration_ms: u64,
}

#[derive(Serialize)]
struct JsonScenario<'a> {
    feature: &'a str,
    scenario: &'a str,
    line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    tags: &'a [String],
    status: &'static str,
    duration_ms: u64,
    steps: Vec<JsonStep<'a>>,
}

#[derive(Serialize)]
struct JsonStep<'a> {
    keyword: &'static str,
    text: &'a str,
    line: usize,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    duration_ms: u64,
}

#[derive(Serialize)]
struct JsonSetupFailure<'a> {
    scope: &'a str,
    kind: &'static str,
    message: &'a str,
}

impl From<&RunSummary> for JsonSummary {
    fn from(summary: &RunSummary) -> Self {
        Self {
            success: summary.is_success(),
            total: summary.total(),
            passed: summary.passed,
            failed: summary.failed,
            skipped: summary.skipped,
            duration_ms: duration_ms(summary.duration),
        }
    }
}

impl<'a> From<&'a StepResult> for JsonStep<'a> {
    fn from(step: &'a StepResult) -> Self {
        let (failure_kind, reason) = match &step.outcome {
            StepOutcome::Failed { kind, reason } => (Some(kind.label()), Some(reason.as_str())),
            StepOutcome::Passed | StepOutcome::Skipped => (None, None),
        };
        Self {
            keyword: step.keyword.as_str(),
            text: &step.text,
            line: step.line,
            status: step.outcome.label(),
            failure_kind,
            reason,
            duration_ms: duration_ms(step.duration),
        }
    }
}

impl<'a> From<&'a ScenarioResult> for JsonScenario<'a> {
    fn from(result: &'a ScenarioResult) -> Self {
        Self {
            feature: result.feature(),
            scenario: result.scenario(),
            line: result.line(),
            example: result.example(),
            role: result.role(),
            tags: result.tags(),
            status: result.status().label(),
            duration_ms: duration_ms(result.duration()),
            steps: result.steps().iter().map(JsonStep::from).collect(),
        }
    }
}

impl<'a> From<&'a SetupFailure> for JsonSetupFailure<'a> {
    fn from(failure: &'a SetupFailure) -> Self {
        Self {
            scope: &failure.scope,
            kind: failure.kind.label(),
            message: &failure.message,
        }
    }
}

fn report<'a>(results: &'a [ScenarioResult], summary: &'a RunSummary) -> JsonReport<'a> {
    JsonReport {
        summary: JsonSummary::from(summary),
        scenarios: results.iter().map(JsonScenario::from).collect(),
        setup_failures: summary
            .setup_failures
            .iter()
            .map(JsonSetupFailure::from)
            .collect(),
    }
}

/// Serialize `results` and `summary` into `writer`.
///
/// # Errors
/// Returns an error when serialization or writing fails.
pub fn write<W: Write>(
    writer: &mut W,
    results: &[ScenarioResult],
    summary: &RunSummary,
) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, &report(results, summary))
}

/// Produce a compact JSON string for `results` and `summary`.
///
/// # Errors
/// Returns an error when serialization fails.
pub fn to_string(results: &[ScenarioResult], summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string(&report(results, summary))
}
