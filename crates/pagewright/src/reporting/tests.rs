//! Tests for the reporter, JSON writer and text summary.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pagewright_patterns::StepKeyword;
use rstest::{fixture, rstest};

use super::*;
use crate::error::AuthSetupError;
use crate::feature::{Scenario, Step};

fn step(text: &str, line: usize) -> Step {
    Step {
        keyword: StepKeyword::When,
        text: text.to_owned(),
        line,
        docstring: None,
        table: None,
    }
}

fn scenario(name: &str, tags: &[&str]) -> Scenario {
    Scenario {
        name: name.to_owned(),
        tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
        line: 3,
        steps: vec![step("the User opens the page", 4), step("the User logs in", 5)],
        example: None,
    }
}

fn passed(name: &str, position: usize) -> ScenarioResult {
    let scenario = scenario(name, &[]);
    let steps = scenario
        .steps
        .iter()
        .map(|s| StepResult::new(s, StepOutcome::Passed, Duration::from_millis(5)))
        .collect();
    ScenarioResult::new("login.feature", &scenario, steps, Duration::from_millis(10))
        .with_position(position)
}

fn failed(name: &str, position: usize) -> ScenarioResult {
    let scenario = scenario(name, &["@role:admin"]);
    let (Some(first), Some(second)) = (scenario.steps.first(), scenario.steps.get(1)) else {
        panic!("two steps expected");
    };
    let steps = vec![
        StepResult::new(
            first,
            StepOutcome::failed(FailureKind::Step, "element not found: css=#login"),
            Duration::from_millis(7),
        ),
        StepResult::skipped(second),
    ];
    ScenarioResult::new("login.feature", &scenario, steps, Duration::from_millis(7))
        .with_position(position)
}

#[fixture]
fn reporter() -> Reporter {
    let reporter = Reporter::new();
    reporter.record(failed("Bad login", 1));
    reporter.record(passed("Good login", 0));
    reporter.record(
        ScenarioResult::not_executed("login.feature", &scenario("Later", &["@skip"]))
            .with_position(2),
    );
    reporter
}

#[rstest]
fn results_are_returned_in_run_order(reporter: Reporter) {
    let names: Vec<_> = reporter
        .results()
        .iter()
        .map(|result| result.scenario().to_owned())
        .collect();
    assert_eq!(names, ["Good login", "Bad login", "Later"]);
}

#[rstest]
fn summary_counts_and_lists_failures(reporter: Reporter) {
    let summary = reporter.summary();
    assert_eq!((summary.passed, summary.failed, summary.skipped), (1, 1, 1));
    assert_eq!(summary.total(), 3);
    assert!(!summary.is_success());
    assert_eq!(
        summary.failures,
        [FailureEntry {
            feature: "login.feature".into(),
            scenario: "Bad login".into(),
            step: "When the User opens the page".into(),
            reason: "element not found: css=#login".into(),
        }]
    );
}

#[test]
fn setup_failure_alone_fails_the_run() {
    let reporter = Reporter::new();
    reporter.record(passed("Good login", 0));
    reporter.record_setup_failure(SetupFailure::from(&AuthSetupError::new("admin", "boom")));
    let summary = reporter.summary();
    assert_eq!(summary.failed, 0);
    assert!(!summary.is_success());
}

#[test]
fn status_follows_step_outcomes() {
    assert_eq!(passed("a", 0).status(), ScenarioStatus::Passed);
    assert_eq!(failed("b", 0).status(), ScenarioStatus::Failed);
    let skipped = ScenarioResult::not_executed("f", &scenario("c", &["@skip"]));
    assert_eq!(skipped.status(), ScenarioStatus::Skipped);
    assert!(skipped.steps().iter().all(|s| s.outcome == StepOutcome::Skipped));
}

struct CountingSink(Arc<AtomicUsize>);

impl ReportSink for CountingSink {
    fn scenario_finished(&self, _result: &ScenarioResult) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn sinks_see_results_as_they_are_recorded() {
    let seen = Arc::new(AtomicUsize::new(0));
    let reporter = Reporter::new()
        .with_sink(CountingSink(Arc::clone(&seen)))
        .with_sink(TracingSink);
    reporter.record(passed("a", 0));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    reporter.record(failed("b", 1));
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[rstest]
#[expect(clippy::indexing_slicing, reason = "JSON assertions index for clarity")]
fn json_report_uses_lowercase_labels(reporter: Reporter) {
    let summary = reporter.summary();
    let Ok(text) = json::to_string(&reporter.results(), &summary) else {
        panic!("report should serialise");
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
        panic!("report should be valid JSON");
    };
    assert_eq!(value["summary"]["failed"], 1);
    assert_eq!(value["summary"]["success"], false);
    assert_eq!(value["scenarios"][1]["status"], "failed");
    assert_eq!(value["scenarios"][1]["role"], "admin");
    assert_eq!(value["scenarios"][1]["steps"][0]["failure_kind"], "step");
    assert_eq!(value["scenarios"][1]["steps"][1]["status"], "skipped");
    assert!(value["scenarios"][0].get("role").is_none());
}

#[rstest]
fn text_summary_lists_every_failure(reporter: Reporter) {
    let mut run = reporter.summary();
    run.duration = Duration::from_millis(1200);
    let mut totals = Vec::new();
    let mut failures = Vec::new();
    assert!(summary::write_summary(&mut totals, &run).is_ok());
    assert!(summary::write_failures(&mut failures, &run).is_ok());
    assert_eq!(
        String::from_utf8_lossy(&totals),
        "3 scenarios (1 passed, 1 failed, 1 skipped) in 1.20s\n"
    );
    assert_eq!(
        String::from_utf8_lossy(&failures),
        "FAILED login.feature :: Bad login\n  step:   When the User opens the page\n  reason: element not found: css=#login\n"
    );
}
