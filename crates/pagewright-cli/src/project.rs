//! What a suite supplies to the runner.

use std::sync::Arc;

use pagewright::{
    BrowserAdapter, LoginFlow, RegistrationError, RunConfig, RunPlan, ScenarioLoginFlow,
    StepRegistry,
};

/// A suite of step definitions bound to a browser.
///
/// A binary built on this crate implements `Project` and hands it to
/// [`run`](crate::run).
pub trait Project {
    /// Register every step definition.
    ///
    /// # Errors
    /// Returns [`RegistrationError`] for an invalid or duplicate pattern.
    fn register_steps(&self, registry: &mut StepRegistry) -> Result<(), RegistrationError>;

    /// Browser adapter used for scenarios and logins.
    ///
    /// # Errors
    /// Returns an error when the browser cannot be started.
    fn browser(&self, config: &RunConfig) -> eyre::Result<Arc<dyn BrowserAdapter>>;

    /// How roles log in. Defaults to the `@login:<role>` scenarios found in
    /// the features.
    fn login_flow(&self, registry: Arc<StepRegistry>, plan: &RunPlan) -> Arc<dyn LoginFlow> {
        Arc::new(ScenarioLoginFlow::from_tagged(
            registry,
            plan.login_scenarios(),
        ))
    }
}
