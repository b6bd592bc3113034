//! Scenario reporting collector.
//!
//! A [`Reporter`] stores the outcome of each executed scenario and the
//! run-level setup failures. Results stream to registered [`ReportSink`]s as
//! soon as they are recorded, and the collected entries can be rendered as a
//! [`RunSummary`], as JSON through [`json`], or as text through [`summary`].

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// JSON report writer.
pub mod json;
mod record;
/// Human-readable summary and failure list.
pub mod summary;

pub use record::{
    FailureKind, ScenarioResult, ScenarioStatus, SetupFailure, SetupFailureKind, StepOutcome,
    StepResult,
};

/// Receives results as they are recorded.
pub trait ReportSink: Send + Sync {
    /// Called once per finished scenario, in completion order.
    fn scenario_finished(&self, result: &ScenarioResult);

    /// Called once per run-level failure.
    fn setup_failed(&self, _failure: &SetupFailure) {}
}

/// Logs each finished scenario through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn scenario_finished(&self, result: &ScenarioResult) {
        match result.failed_step() {
            Some(step) => warn!(
                feature = result.feature(),
                scenario = result.scenario(),
                step = %step.text,
                line = step.line,
                reason = %failure_reason(step),
                "scenario failed"
            ),
            None => info!(
                feature = result.feature(),
                scenario = result.scenario(),
                status = result.status().label(),
                duration_ms = duration_ms(result.duration()),
                "scenario finished"
            ),
        }
    }

    fn setup_failed(&self, failure: &SetupFailure) {
        warn!(
            scope = %failure.scope,
            kind = failure.kind.label(),
            message = %failure.message,
            "setup failed"
        );
    }
}

fn failure_reason(step: &StepResult) -> &str {
    match &step.outcome {
        StepOutcome::Failed { reason, .. } => reason,
        StepOutcome::Passed | StepOutcome::Skipped => "",
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A failed scenario as listed in the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    /// Feature source name.
    pub feature: String,
    /// Scenario display name.
    pub scenario: String,
    /// Keyword and text of the failing step.
    pub step: String,
    /// Why it failed.
    pub reason: String,
}

/// Aggregated outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Scenarios whose steps all passed.
    pub passed: usize,
    /// Scenarios with a failed step.
    pub failed: usize,
    /// Scenarios that were not executed.
    pub skipped: usize,
    /// Every failed scenario in run order.
    pub failures: Vec<FailureEntry>,
    /// Run-level failures in the order they occurred.
    pub setup_failures: Vec<SetupFailure>,
    /// Wall-clock time since the reporter was created.
    pub duration: Duration,
}

impl RunSummary {
    /// True iff no scenario failed and there were no setup failures.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.setup_failures.is_empty()
    }

    /// Number of scenarios recorded.
    #[must_use]
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// Thread-safe collector for one run.
pub struct Reporter {
    started: Instant,
    results: Mutex<Vec<ScenarioResult>>,
    setup_failures: Mutex<Vec<SetupFailure>>,
    sinks: Vec<Box<dyn ReportSink>>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Reporter {
    /// Create a reporter with no sinks. The run clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            results: Mutex::new(Vec::new()),
            setup_failures: Mutex::new(Vec::new()),
            sinks: Vec::new(),
        }
    }

    /// Add a sink notified of every recorded result.
    #[must_use]
    pub fn with_sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Record a finished scenario and notify sinks.
    pub fn record(&self, result: ScenarioResult) {
        for sink in &self.sinks {
            sink.scenario_finished(&result);
        }
        lock(&self.results).push(result);
    }

    /// Record a run-level failure and notify sinks.
    pub fn record_setup_failure(&self, failure: SetupFailure) {
        for sink in &self.sinks {
            sink.setup_failed(&failure);
        }
        lock(&self.setup_failures).push(failure);
    }

    /// Recorded results in run order.
    #[must_use]
    pub fn results(&self) -> Vec<ScenarioResult> {
        let mut results = lock(&self.results).clone();
        results.sort_by_key(ScenarioResult::position);
        results
    }

    /// Recorded setup failures.
    #[must_use]
    pub fn setup_failures(&self) -> Vec<SetupFailure> {
        lock(&self.setup_failures).clone()
    }

    /// Aggregate everything recorded so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let results = self.results();
        let mut summary = RunSummary {
            passed: 0,
            failed: 0,
            skipped: 0,
            failures: Vec::new(),
            setup_failures: self.setup_failures(),
            duration: self.started.elapsed(),
        };
        for result in &results {
            match result.status() {
                ScenarioStatus::Passed => summary.passed += 1,
                ScenarioStatus::Skipped => summary.skipped += 1,
                ScenarioStatus::Failed => summary.failed += 1,
            }
            if let Some(step) = result.failed_step() {
                summary.failures.push(FailureEntry {
                    feature: result.feature().to_owned(),
                    scenario: result.scenario().to_owned(),
                    step: format!("{} {}", step.keyword, step.text),
                    reason: failure_reason(step).to_owned(),
                });
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests;
