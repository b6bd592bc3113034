//! Command-line entry point for pagewright suites.
//!
//! A suite binary implements [`Project`] to supply its step definitions and
//! browser, then calls [`run`] from `main`:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use pagewright::{BrowserAdapter, RegistrationError, RunConfig, StepRegistry};
//! # struct Shop;
//! # impl pagewright_cli::Project for Shop {
//! #     fn register_steps(&self, _: &mut StepRegistry) -> Result<(), RegistrationError> { Ok(()) }
//! #     fn browser(&self, _: &RunConfig) -> eyre::Result<Arc<dyn BrowserAdapter>> {
//! #         Ok(Arc::new(pagewright::test_support::RecordingBrowser::new()))
//! #     }
//! # }
//! fn main() -> std::process::ExitCode {
//!     pagewright_cli::run(&Shop)
//! }
//! ```
//!
//! Configuration comes from `PAGEWRIGHT_*` environment variables with
//! command-line flags layered on top. The exit code is 0 when every executed
//! scenario passed and no setup failure occurred, 1 for a failed run and 2
//! for invalid configuration.

pub mod cli;
pub mod logging;
mod output;
pub mod project;

use std::fmt::Display;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use pagewright::feature::discover_features;
use pagewright::reporting::TracingSink;
use pagewright::{
    Executor, FileStateStore, Reporter, RunConfig, RunPlan, StepRegistry, StorageStateManager,
};
use tracing::{error, info, warn};

pub use cli::Cli;
use logging::init_logging;
pub use project::Project;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every executed scenario passed.
    Passed,
    /// A scenario or setup step failed.
    Failed,
    /// The run could not be configured.
    ConfigError,
}

impl Outcome {
    /// Process exit code for the outcome.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::Failed => 1,
            Self::ConfigError => 2,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        Self::from(outcome.code())
    }
}

/// Parse the process arguments and environment, then run `project`.
pub fn run<P: Project + ?Sized>(project: &P) -> ExitCode {
    let cli = Cli::parse();
    let outcome = match RunConfig::from_env() {
        Ok(base) => execute(project, &cli, base),
        Err(err) => {
            init_logging(&RunConfig::default());
            config_error("invalid configuration", &err)
        }
    };
    outcome.into()
}

fn config_error(context: &str, err: &dyn Display) -> Outcome {
    error!(error = %err, "{context}");
    Outcome::ConfigError
}

/// Run `project` with `cli` applied on top of `base`.
///
/// The summary is written to stdout and the failure list to stderr.
pub fn execute<P: Project + ?Sized>(project: &P, cli: &Cli, base: RunConfig) -> Outcome {
    let config = match base.apply_overrides(cli.overrides()) {
        Ok(config) => config,
        Err(err) => {
            init_logging(&RunConfig::default());
            return config_error("invalid configuration", &err);
        }
    };
    init_logging(&config);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        features = %config.features_dir,
        "starting pagewright"
    );

    let mut registry = StepRegistry::new();
    if let Err(err) = project.register_steps(&mut registry) {
        return config_error("step registration failed", &err);
    }
    let registry = Arc::new(registry);
    if cli.list_steps {
        return match output::write_steps(&mut io::stdout(), &registry) {
            Ok(()) => Outcome::Passed,
            Err(err) => {
                error!(error = ?err, "could not list steps");
                Outcome::Failed
            }
        };
    }

    let paths = match discover_features(&config.features_dir) {
        Ok(paths) => paths,
        Err(err) => return config_error("could not read the features directory", &err),
    };
    if paths.is_empty() {
        warn!(dir = %config.features_dir, "no feature files found");
    }
    let plan = RunPlan::load(&paths).select_roles(&cli.roles, cli.include_anonymous);

    if cli.check {
        return check(&plan, &registry);
    }
    run_plan(project, cli, &config, &plan, registry)
}

fn check(plan: &RunPlan, registry: &StepRegistry) -> Outcome {
    let diagnostics = plan.validate(registry);
    for failure in plan.setup_failures() {
        error!(scope = %failure.scope, message = %failure.message, "setup failure");
    }
    let overlaps = registry.overlapping_patterns();
    let mut stderr = io::stderr();
    let written = output::write_overlaps(&mut stderr, &overlaps)
        .and_then(|()| output::write_diagnostics(&mut stderr, &diagnostics));
    if let Err(err) = written {
        error!(error = ?err, "could not report diagnostics");
        return Outcome::Failed;
    }
    if overlaps.is_empty() && diagnostics.is_empty() && plan.setup_failures().is_empty() {
        info!(scenarios = plan.scenario_count(), "every step is bound");
        Outcome::Passed
    } else {
        Outcome::Failed
    }
}

fn run_plan<P: Project + ?Sized>(
    project: &P,
    cli: &Cli,
    config: &RunConfig,
    plan: &RunPlan,
    registry: Arc<StepRegistry>,
) -> Outcome {
    let adapter = match project.browser(config) {
        Ok(adapter) => adapter,
        Err(err) => return config_error("could not start the browser", &err),
    };
    let store = match FileStateStore::open(&config.state_dir) {
        Ok(store) => store,
        Err(err) => return config_error("could not open the state directory", &err),
    };
    let storage = StorageStateManager::new(
        Arc::clone(&adapter),
        Arc::new(store),
        project.login_flow(Arc::clone(&registry), plan),
    )
    .with_regeneration(config.regenerate_state)
    .with_base_url(config.base_url.clone());
    let executor = Executor::from_config(registry, adapter, config);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "could not start the async runtime");
            return Outcome::Failed;
        }
    };
    let reporter = Arc::new(Reporter::new().with_sink(TracingSink));
    let summary = runtime.block_on(executor.run(plan, &reporter, Some(&storage)));

    let mut written = output::write_outcome(&mut io::stdout(), &mut io::stderr(), &summary);
    if let Some(path) = &cli.report {
        written =
            written.and_then(|()| output::write_report(path, &reporter.results(), &summary));
    }
    if let Err(err) = written {
        error!(error = ?err, "could not write run results");
        return Outcome::Failed;
    }
    if summary.is_success() {
        Outcome::Passed
    } else {
        Outcome::Failed
    }
}
