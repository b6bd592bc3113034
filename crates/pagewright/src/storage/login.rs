//! Login flows that establish a role's authenticated session.

use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::HashMap;

use crate::context::ExecutionContext;
use crate::error::StepError;
use crate::execution::run_steps;
use crate::feature::Scenario;
use crate::registry::StepRegistry;
use crate::reporting::StepOutcome;

/// Logs a role in on the page owned by `ctx`.
#[async_trait]
pub trait LoginFlow: Send + Sync {
    /// Perform the login for `role`.
    ///
    /// # Errors
    /// Returns [`StepError`] when the login does not succeed.
    async fn login(&self, role: &str, ctx: &mut ExecutionContext) -> Result<(), StepError>;
}

/// Logs in by running a dedicated scenario through the step registry.
///
/// Scenarios tagged `@login:<role>` are picked up by
/// [`from_tagged`](Self::from_tagged), so login flows can live in feature
/// files next to the suites that use them.
pub struct ScenarioLoginFlow {
    registry: Arc<StepRegistry>,
    scenarios: HashMap<String, Scenario>,
}

impl ScenarioLoginFlow {
    /// Create a flow with no roles.
    #[must_use]
    pub fn new(registry: Arc<StepRegistry>) -> Self {
        Self {
            registry,
            scenarios: HashMap::new(),
        }
    }

    /// Use `scenario` to log in as `role`.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>, scenario: Scenario) -> Self {
        self.scenarios.insert(role.into(), scenario);
        self
    }

    /// Collect every scenario tagged `@login:<role>`. When two scenarios
    /// claim a role, the first wins.
    #[must_use]
    pub fn from_tagged<'a>(
        registry: Arc<StepRegistry>,
        scenarios: impl IntoIterator<Item = &'a Scenario>,
    ) -> Self {
        let mut flow = Self::new(registry);
        for scenario in scenarios {
            if let Some(role) = scenario.login_role() {
                flow.scenarios
                    .entry(role.to_owned())
                    .or_insert_with(|| scenario.clone());
            }
        }
        flow
    }

    /// Roles this flow can log in.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }
}

#[async_trait]
impl LoginFlow for ScenarioLoginFlow {
    async fn login(&self, role: &str, ctx: &mut ExecutionContext) -> Result<(), StepError> {
        let scenario = self.scenarios.get(role).ok_or_else(|| {
            StepError::Other(format!("no login scenario is defined for role '{role}'"))
        })?;
        let results = run_steps(&self.registry, ctx, &scenario.steps, None).await;
        for result in &results {
            if let StepOutcome::Failed { reason, .. } = &result.outcome {
                return Err(StepError::Other(format!(
                    "login step '{} {}' failed: {reason}",
                    result.keyword, result.text
                )));
            }
        }
        Ok(())
    }
}
