//! Running the steps of a single scenario.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};

use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::browser::BrowserAdapter;
use crate::context::{ExecutionContext, TEARDOWN_GRACE};
use crate::feature::{Scenario, Step};
use crate::panic::panic_message;
use crate::registry::StepRegistry;
use crate::reporting::{FailureKind, ScenarioResult, StepOutcome, StepResult};
use crate::storage::SessionState;

/// Resolve and run `step`, converting every failure into an outcome.
async fn run_step(
    registry: &StepRegistry,
    ctx: &mut ExecutionContext,
    step: &Step,
    deadline: Option<Instant>,
) -> StepOutcome {
    let resolved = match registry.resolve_step(step) {
        Ok(resolved) => resolved,
        Err(err) => return StepOutcome::failed(FailureKind::from(&err), err.to_string()),
    };
    let call = AssertUnwindSafe(resolved.definition.handler().call(ctx, resolved.args))
        .catch_unwind();
    let joined = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
            Ok(joined) => joined,
            Err(_) => {
                return StepOutcome::failed(
                    FailureKind::Timeout,
                    "run deadline exceeded while the step was running",
                );
            }
        },
        None => call.await,
    };
    match joined {
        Ok(Ok(())) => StepOutcome::Passed,
        Ok(Err(err)) => StepOutcome::failed(FailureKind::Step, err.to_string()),
        Err(payload) => StepOutcome::failed(
            FailureKind::Panic,
            format!("step panicked: {}", panic_message(payload.as_ref())),
        ),
    }
}

/// Run `steps` in order, stopping at the first failure.
///
/// Every step gets a result: those after a failure are Skipped and never
/// executed.
pub(crate) async fn run_steps(
    registry: &StepRegistry,
    ctx: &mut ExecutionContext,
    steps: &[Step],
    deadline: Option<Instant>,
) -> Vec<StepResult> {
    let mut results = Vec::with_capacity(steps.len());
    let mut remaining = steps.iter();
    for step in remaining.by_ref() {
        debug!(keyword = %step.keyword, text = %step.text, line = step.line, "running step");
        let started = StdInstant::now();
        let outcome = run_step(registry, ctx, step, deadline).await;
        let failed = outcome.is_failed();
        results.push(StepResult::new(step, outcome, started.elapsed()));
        if failed {
            break;
        }
    }
    results.extend(remaining.map(StepResult::skipped));
    results
}

/// Results for a scenario that failed before its first step ran.
pub(super) fn failed_before_start(
    scenario: &Scenario,
    kind: FailureKind,
    reason: &str,
) -> Vec<StepResult> {
    let mut steps = scenario.steps.iter();
    steps
        .next()
        .map(|first| StepResult::new(first, StepOutcome::failed(kind, reason), Duration::ZERO))
        .into_iter()
        .chain(steps.map(StepResult::skipped))
        .collect()
}

/// Everything a scenario task needs that is shared across the run.
pub(super) struct Shared {
    pub(super) registry: Arc<StepRegistry>,
    pub(super) adapter: Arc<dyn BrowserAdapter>,
    pub(super) base_url: Option<String>,
}

/// One scenario queued for execution.
pub(super) struct Job {
    pub(super) position: usize,
    pub(super) feature: String,
    pub(super) scenario: Scenario,
    pub(super) session: Option<SessionState>,
}

impl Job {
    pub(super) fn finish(&self, steps: Vec<StepResult>, duration: Duration) -> ScenarioResult {
        ScenarioResult::new(self.feature.clone(), &self.scenario, steps, duration)
            .with_position(self.position)
    }
}

/// Open a page, run the scenario and tear the context down.
pub(super) async fn run_scenario(
    shared: &Shared,
    job: &Job,
    deadline: Option<Instant>,
) -> ScenarioResult {
    let started = StdInstant::now();
    let scenario = &job.scenario;
    if scenario.steps.is_empty() {
        return job.finish(Vec::new(), Duration::ZERO);
    }
    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
        let steps = failed_before_start(
            scenario,
            FailureKind::Timeout,
            "run deadline passed before the scenario started",
        );
        return job.finish(steps, Duration::ZERO);
    }

    debug!(feature = %job.feature, scenario = %scenario.display_name(), "scenario started");
    let opening = shared.adapter.open_page(job.session.as_ref());
    let opened = match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, opening).await,
        None => Ok(opening.await),
    };
    let page = match opened {
        Ok(Ok(page)) => page,
        Err(_) => {
            let steps = failed_before_start(
                scenario,
                FailureKind::Timeout,
                "run deadline exceeded while opening a browser page",
            );
            return job.finish(steps, started.elapsed());
        }
        Ok(Err(err)) => {
            let reason = format!("could not open a browser page: {err}");
            let steps = failed_before_start(scenario, FailureKind::Browser, &reason);
            return job.finish(steps, started.elapsed());
        }
    };
    let mut ctx = ExecutionContext::new(page).with_base_url(shared.base_url.clone());
    let steps = run_steps(&shared.registry, &mut ctx, &scenario.steps, deadline).await;
    match tokio::time::timeout(TEARDOWN_GRACE, ctx.teardown()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(scenario = %scenario.display_name(), error = %err, "teardown failed"),
        Err(_) => warn!(scenario = %scenario.display_name(), "teardown timed out"),
    }
    debug!(feature = %job.feature, scenario = %scenario.display_name(), "scenario finished");
    job.finish(steps, started.elapsed())
}
