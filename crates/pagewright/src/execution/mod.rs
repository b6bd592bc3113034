//! Scenario execution.
//!
//! The [`Executor`] runs a [`RunPlan`] against a browser adapter. Role suites
//! are authenticated first through the [`StorageStateManager`]; scenarios are
//! then dispatched in document order, each on its own page, with at most
//! `workers` in flight. Every outcome lands in the shared [`Reporter`] as
//! soon as the scenario finishes.

mod plan;
mod scenario;

use std::sync::Arc;
use std::time::Duration;

use hashbrown::HashMap;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::browser::BrowserAdapter;
use crate::config::RunConfig;
use crate::error::AuthSetupError;
use crate::registry::StepRegistry;
use crate::reporting::{FailureKind, Reporter, RunSummary, ScenarioResult, SetupFailure};
use crate::storage::{SessionState, StorageStateManager};

pub use plan::{PlannedScenario, RunPlan, Suite};
pub(crate) use scenario::run_steps;
use scenario::{Job, Shared, failed_before_start, run_scenario};

type Sessions = HashMap<String, Result<SessionState, AuthSetupError>>;

/// Runs planned scenarios against a browser.
pub struct Executor {
    registry: Arc<StepRegistry>,
    adapter: Arc<dyn BrowserAdapter>,
    workers: usize,
    run_timeout: Option<Duration>,
    base_url: Option<String>,
}

impl Executor {
    /// A sequential executor with no run deadline.
    #[must_use]
    pub fn new(registry: Arc<StepRegistry>, adapter: Arc<dyn BrowserAdapter>) -> Self {
        Self {
            registry,
            adapter,
            workers: 1,
            run_timeout: None,
            base_url: None,
        }
    }

    /// Build an executor from the run configuration.
    #[must_use]
    pub fn from_config(
        registry: Arc<StepRegistry>,
        adapter: Arc<dyn BrowserAdapter>,
        config: &RunConfig,
    ) -> Self {
        Self::new(registry, adapter)
            .with_workers(config.workers)
            .with_run_timeout(config.run_timeout)
            .with_base_url(config.base_url.clone())
    }

    /// Run up to `workers` scenarios at once. Zero is treated as one.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Bound the whole run by `timeout`.
    #[must_use]
    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Base URL handed to every scenario's execution context.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Execute `plan`, recording every outcome in `reporter`.
    ///
    /// Planning failures are forwarded to the reporter first. Each role the
    /// plan needs is then authenticated once through `storage`; when that
    /// fails, every scenario of the role is recorded as failed without
    /// opening a page. Scenarios tagged `@skip` are recorded as skipped.
    pub async fn run(
        &self,
        plan: &RunPlan,
        reporter: &Arc<Reporter>,
        storage: Option<&StorageStateManager>,
    ) -> RunSummary {
        let deadline = self
            .run_timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));
        for failure in plan.setup_failures() {
            reporter.record_setup_failure(failure.clone());
        }
        let sessions = authenticate(plan, reporter, storage, deadline).await;

        info!(
            scenarios = plan.scenario_count(),
            workers = self.workers,
            "run started"
        );
        let shared = Arc::new(Shared {
            registry: Arc::clone(&self.registry),
            adapter: Arc::clone(&self.adapter),
            base_url: self.base_url.clone(),
        });
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut running = Vec::new();
        for (position, planned) in plan.scenarios().iter().enumerate() {
            let scenario = &planned.scenario;
            if scenario.is_skipped() {
                reporter.record(
                    ScenarioResult::not_executed(planned.feature.clone(), scenario)
                        .with_position(position),
                );
                continue;
            }
            let session = match scenario.role() {
                None => None,
                Some(role) => match session_for(&sessions, role) {
                    Ok(state) => Some(state),
                    Err(err) => {
                        let steps =
                            failed_before_start(scenario, FailureKind::AuthSetup, &err.to_string());
                        reporter.record(
                            ScenarioResult::new(
                                planned.feature.clone(),
                                scenario,
                                steps,
                                Duration::ZERO,
                            )
                            .with_position(position),
                        );
                        continue;
                    }
                },
            };

            let job = Job {
                position,
                feature: planned.feature.clone(),
                scenario: scenario.clone(),
                session,
            };
            // Acquired in document order so scenarios start in that order.
            let permit = Arc::clone(&semaphore).acquire_owned().await.ok();
            let shared = Arc::clone(&shared);
            let sink = Arc::clone(reporter);
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let result = run_scenario(&shared, &job, deadline).await;
                sink.record(result);
            });
            running.push((handle, position, planned));
        }

        for (handle, position, planned) in running {
            if let Err(err) = handle.await {
                warn!(scenario = %planned.scenario.display_name(), error = %err, "scenario task failed");
                let reason = format!("scenario task failed: {err}");
                let steps = failed_before_start(&planned.scenario, FailureKind::Panic, &reason);
                reporter.record(
                    ScenarioResult::new(
                        planned.feature.clone(),
                        &planned.scenario,
                        steps,
                        Duration::ZERO,
                    )
                    .with_position(position),
                );
            }
        }

        let summary = reporter.summary();
        info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "run finished"
        );
        summary
    }
}

fn session_for(sessions: &Sessions, role: &str) -> Result<SessionState, AuthSetupError> {
    sessions.get(role).cloned().unwrap_or_else(|| {
        Err(AuthSetupError::new(
            role,
            "no session state was prepared for the role",
        ))
    })
}

/// Produce session state for every role with a scenario left to run.
async fn authenticate(
    plan: &RunPlan,
    reporter: &Reporter,
    storage: Option<&StorageStateManager>,
    deadline: Option<Instant>,
) -> Sessions {
    let mut sessions = Sessions::new();
    for suite in plan.suites() {
        let Some(role) = suite.role else {
            continue;
        };
        if suite
            .scenarios
            .iter()
            .all(|planned| planned.scenario.is_skipped())
        {
            debug!(role, "every scenario of the suite is skipped");
            continue;
        }
        let outcome = match storage {
            None => Err(AuthSetupError::new(
                role,
                "no storage state manager is configured",
            )),
            Some(manager) => manager.ensure_before(role, deadline).await,
        };
        if let Err(err) = &outcome {
            reporter.record_setup_failure(SetupFailure::from(err));
        }
        sessions.insert(role.to_owned(), outcome);
    }
    sessions
}
