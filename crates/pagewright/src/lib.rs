//! Browser-driven BDD runner.
//!
//! `pagewright` loads Gherkin feature files, binds each step to a handler in
//! an explicitly constructed [`StepRegistry`], and executes scenarios against
//! a browser through page objects. Role-scoped suites reuse authenticated
//! session state produced once per role by the [`StorageStateManager`], and
//! outcomes stream into a [`Reporter`].
//!
//! The browser itself is an external collaborator reached through the
//! [`BrowserAdapter`] and [`BrowserPage`] traits.
//!
//! ```
//! use pagewright::{ExecutionContext, StepArgs, StepFuture, StepRegistry};
//!
//! fn open_login(ctx: &mut ExecutionContext, _args: StepArgs) -> StepFuture<'_> {
//!     Box::pin(async move {
//!         ctx.page()?.goto("/").await?;
//!         Ok(())
//!     })
//! }
//!
//! let mut registry = StepRegistry::new();
//! registry.given("the User is on the login page", open_login)?;
//! assert_eq!(registry.len(), 1);
//! # Ok::<(), pagewright::RegistrationError>(())
//! ```

pub mod browser;
pub mod config;
pub mod context;
pub mod error;
pub mod execution;
pub mod feature;
pub mod page;
mod panic;
pub mod registry;
pub mod reporting;
pub mod storage;
pub mod test_support;

pub use browser::{BrowserAdapter, BrowserError, BrowserPage, Locator};
pub use config::{LogLevel, RunConfig, RunOverrides};
pub use context::ExecutionContext;
pub use error::{
    AuthSetupError, BindingError, ConfigError, ExpansionError, ParseError, ParseErrorKind,
    RegistrationError, StepError,
};
pub use execution::{Executor, PlannedScenario, RunPlan, Suite};
pub use feature::{
    ExampleRef, ExampleRow, ExpandedFeature, FeatureDocument, Scenario, ScenarioDefinition,
    ScenarioOutline, Step,
};
pub use page::{ActionError, Element, PageObject, perform};
pub use pagewright_patterns::{CapturedValue, ParamKind, StepKeyword};
pub use panic::panic_message;
pub use registry::{
    BindingDiagnostic, PatternOverlap, ResolvedStep, StepArgs, StepDefinition, StepFuture,
    StepHandler, StepRegistry,
};
pub use reporting::{
    FailureKind, Reporter, RunSummary, ScenarioResult, ScenarioStatus, SetupFailure, StepOutcome,
    StepResult,
};
pub use storage::{
    FileStateStore, LoginFlow, ScenarioLoginFlow, SessionState, StateStore, StorageStateManager,
};
