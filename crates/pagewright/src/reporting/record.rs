//! Immutable per-step and per-scenario outcomes.

use std::time::Duration;

use pagewright_patterns::StepKeyword;

use crate::error::{AuthSetupError, BindingError, ExpansionError, ParseError};
use crate::feature::{Scenario, Step};

/// Category of a step failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No definition matched the step text.
    NoMatchingStep,
    /// Several definitions matched the step text.
    AmbiguousStep,
    /// The handler returned an error.
    Step,
    /// The handler panicked.
    Panic,
    /// The run deadline passed.
    Timeout,
    /// The scenario's role could not be authenticated.
    AuthSetup,
    /// A browser page could not be opened for the scenario.
    Browser,
}

impl FailureKind {
    /// Lowercase label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoMatchingStep => "no_matching_step",
            Self::AmbiguousStep => "ambiguous_step",
            Self::Step => "step",
            Self::Panic => "panic",
            Self::Timeout => "timeout",
            Self::AuthSetup => "auth_setup",
            Self::Browser => "browser",
        }
    }
}

impl From<&BindingError> for FailureKind {
    fn from(err: &BindingError) -> Self {
        match err {
            BindingError::NoMatchingStep { .. } => Self::NoMatchingStep,
            BindingError::AmbiguousStep { .. } => Self::AmbiguousStep,
        }
    }
}

/// What happened to one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The handler completed successfully.
    Passed,
    /// The step could not be bound or its handler failed.
    Failed {
        /// Failure category.
        kind: FailureKind,
        /// Human-readable reason.
        reason: String,
    },
    /// The step was never executed.
    Skipped,
}

impl StepOutcome {
    /// Build a failure outcome.
    #[must_use]
    pub fn failed(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            reason: reason.into(),
        }
    }

    /// Lowercase label used in reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Whether this is a failure.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// Keyword as written.
    pub keyword: StepKeyword,
    /// Step text.
    pub text: String,
    /// One-based line of the step.
    pub line: usize,
    /// What happened.
    pub outcome: StepOutcome,
    /// Time spent in the step. Zero for skipped steps.
    pub duration: Duration,
}

impl StepResult {
    /// Record `outcome` for `step`.
    #[must_use]
    pub fn new(step: &Step, outcome: StepOutcome, duration: Duration) -> Self {
        Self {
            keyword: step.keyword,
            text: step.text.clone(),
            line: step.line,
            outcome,
            duration,
        }
    }

    /// A skipped result for `step`.
    #[must_use]
    pub fn skipped(step: &Step) -> Self {
        Self::new(step, StepOutcome::Skipped, Duration::ZERO)
    }
}

/// Terminal status of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioStatus {
    /// Every step passed.
    Passed,
    /// A step failed.
    Failed,
    /// The scenario was not executed.
    Skipped,
}

impl ScenarioStatus {
    /// Lowercase label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Outcome of one scenario. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioResult {
    position: usize,
    feature: String,
    scenario: String,
    line: usize,
    example: Option<usize>,
    tags: Vec<String>,
    role: Option<String>,
    steps: Vec<StepResult>,
    duration: Duration,
    not_executed: bool,
}

impl ScenarioResult {
    /// Record the step results of `scenario` from `feature`.
    #[must_use]
    pub fn new(
        feature: impl Into<String>,
        scenario: &Scenario,
        steps: Vec<StepResult>,
        duration: Duration,
    ) -> Self {
        Self {
            position: 0,
            feature: feature.into(),
            scenario: scenario.display_name(),
            line: scenario.line,
            example: scenario.example.as_ref().map(|example| example.index),
            tags: scenario.tags.clone(),
            role: scenario.role().map(str::to_owned),
            steps,
            duration,
            not_executed: false,
        }
    }

    /// A scenario that was deliberately not executed; every step is Skipped.
    #[must_use]
    pub fn not_executed(feature: impl Into<String>, scenario: &Scenario) -> Self {
        let steps = scenario.steps.iter().map(StepResult::skipped).collect();
        let mut result = Self::new(feature, scenario, steps, Duration::ZERO);
        result.not_executed = true;
        result
    }

    /// Set the scenario's ordinal among every scenario of the run.
    #[must_use]
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Ordinal in run order; results are reported sorted by it.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Feature source name.
    #[must_use]
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Scenario display name.
    #[must_use]
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// One-based line of the scenario header.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Zero-based Examples row for expanded outlines.
    #[must_use]
    pub fn example(&self) -> Option<usize> {
        self.example
    }

    /// Own and inherited tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Role whose suite the scenario belongs to.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Step results in step order.
    #[must_use]
    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    /// Wall-clock time of the scenario.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Failed if any step failed, Skipped if never executed, else Passed.
    #[must_use]
    pub fn status(&self) -> ScenarioStatus {
        if self.steps.iter().any(|step| step.outcome.is_failed()) {
            ScenarioStatus::Failed
        } else if self.not_executed {
            ScenarioStatus::Skipped
        } else {
            ScenarioStatus::Passed
        }
    }

    /// The first failed step.
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.steps.iter().find(|step| step.outcome.is_failed())
    }
}

/// What kind of run-level failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupFailureKind {
    /// A feature file could not be read or parsed.
    Parse,
    /// An outline could not be expanded.
    Expansion,
    /// A role could not be authenticated.
    AuthSetup,
}

impl SetupFailureKind {
    /// Lowercase label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Expansion => "expansion",
            Self::AuthSetup => "auth_setup",
        }
    }
}

/// A failure that is not attached to a single scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupFailure {
    /// Feature, outline or role the failure applies to.
    pub scope: String,
    /// Failure category.
    pub kind: SetupFailureKind,
    /// Human-readable message.
    pub message: String,
}

impl From<&ParseError> for SetupFailure {
    fn from(err: &ParseError) -> Self {
        Self {
            scope: err.source_name.clone(),
            kind: SetupFailureKind::Parse,
            message: err.to_string(),
        }
    }
}

impl From<&ExpansionError> for SetupFailure {
    fn from(err: &ExpansionError) -> Self {
        let ExpansionError::UnboundPlaceholder {
            feature, outline, ..
        } = err;
        Self {
            scope: format!("{feature}: {outline}"),
            kind: SetupFailureKind::Expansion,
            message: err.to_string(),
        }
    }
}

impl From<&AuthSetupError> for SetupFailure {
    fn from(err: &AuthSetupError) -> Self {
        Self {
            scope: format!("role {}", err.role),
            kind: SetupFailureKind::AuthSetup,
            message: err.to_string(),
        }
    }
}
