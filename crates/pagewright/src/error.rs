//! Error taxonomy for loading, binding and executing features.
//!
//! Each error is scoped to the unit it aborts: a [`ParseError`] to one feature
//! file, an [`ExpansionError`] to one outline, a [`BindingError`] or
//! [`StepError`] to one step, and an [`AuthSetupError`] to every scenario of a
//! role. None of them abort the run.

use std::fmt;

use pagewright_patterns::PatternError;
use thiserror::Error;

use crate::browser::BrowserError;
use crate::page::ActionError;

/// What was wrong with a feature source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// A table row has a different number of cells from the table's first row.
    #[error("malformed table: row has {actual} cells, expected {expected}")]
    TableRowWidth {
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },
    /// A Scenario Outline has no Examples block.
    #[error("Scenario Outline '{name}' has no Examples table")]
    MissingExamples {
        /// Outline name.
        name: String,
    },
    /// The Gherkin parser rejected the source.
    #[error("{0}")]
    Syntax(String),
    /// The feature file could not be read.
    #[error("failed to read feature file: {0}")]
    Read(String),
}

/// Malformed feature source. Fatal to that feature only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// File path or logical name of the feature.
    pub source_name: String,
    /// One-based line of the problem, when known.
    pub line: Option<usize>,
    /// Description of the problem.
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(
        source_name: impl Into<String>,
        line: Option<usize>,
        kind: ParseErrorKind,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            line,
            kind,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.source_name, line, self.kind),
            None => write!(f, "{}: {}", self.source_name, self.kind),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Step definition registration failure. A configuration error.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// An equivalent pattern is already registered.
    #[error("step pattern '{pattern}' duplicates already registered pattern '{existing}'")]
    DuplicatePattern {
        /// Pattern being registered.
        pattern: String,
        /// Equivalent pattern registered earlier.
        existing: String,
    },
    /// The pattern could not be compiled.
    #[error("invalid step pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern being registered.
        pattern: String,
        /// Underlying compilation failure.
        #[source]
        source: PatternError,
    },
}

/// Step text could not be bound to exactly one definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// No registered pattern matches the step text.
    #[error("no step definition matches '{text}'")]
    NoMatchingStep {
        /// Step text.
        text: String,
    },
    /// More than one registered pattern matches the step text.
    #[error("step '{text}' is ambiguous; it matches: {}", .candidates.join(", "))]
    AmbiguousStep {
        /// Step text.
        text: String,
        /// Sources of every matching pattern, in registration order.
        candidates: Vec<String>,
    },
}

/// Scenario Outline expansion failure. Fatal to that outline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    /// A `<name>` token has no column in the Examples table.
    #[error(
        "{feature}:{line}: Scenario Outline '{outline}' uses <{placeholder}> but no Examples column is named '{placeholder}'"
    )]
    UnboundPlaceholder {
        /// Feature source name.
        feature: String,
        /// Outline name.
        outline: String,
        /// Token name without the angle brackets.
        placeholder: String,
        /// One-based line of the outline header.
        line: usize,
    },
}

/// A role's session state could not be produced. Fatal to every scenario that
/// depends on the role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("authentication setup for role '{role}' failed: {reason}")]
pub struct AuthSetupError {
    /// Role whose setup failed.
    pub role: String,
    /// Why it failed.
    pub reason: String,
}

impl AuthSetupError {
    /// Describe a setup failure for `role`.
    #[must_use]
    pub fn new(role: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            reason: reason.into(),
        }
    }
}

/// Error returned by a step handler. Its message becomes the failure reason.
#[derive(Debug, Error)]
pub enum StepError {
    /// A page-object action failed.
    #[error(transparent)]
    Action(#[from] ActionError),
    /// A direct adapter call failed.
    #[error(transparent)]
    Browser(#[from] BrowserError),
    /// An expectation about page state did not hold.
    #[error("assertion failed: {0}")]
    Assertion(String),
    /// A captured argument was missing or of the wrong kind.
    #[error("invalid step argument: {0}")]
    Argument(String),
    /// A named fixture is absent from the context or has another type.
    #[error("fixture '{name}' {problem}")]
    Fixture {
        /// Fixture name.
        name: String,
        /// What was wrong with it.
        problem: &'static str,
    },
    /// The scenario's browser page has already been closed.
    #[error("no browser page is open for this scenario")]
    NoPage,
    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl StepError {
    /// Build an [`Assertion`](Self::Assertion) failure.
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }
}

/// Invalid run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A setting holds a value that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_includes_line_when_known() {
        let err = ParseError::new(
            "features/login.feature",
            Some(12),
            ParseErrorKind::TableRowWidth {
                expected: 2,
                actual: 3,
            },
        );
        assert_eq!(
            err.to_string(),
            "features/login.feature:12: malformed table: row has 3 cells, expected 2"
        );
    }

    #[test]
    fn parse_error_without_line() {
        let err = ParseError::new("inline", None, ParseErrorKind::Syntax("bad".into()));
        assert_eq!(err.to_string(), "inline: bad");
    }

    #[test]
    fn ambiguous_step_lists_candidates() {
        let err = BindingError::AmbiguousStep {
            text: "I have 3 cukes".into(),
            candidates: vec!["I have {int} cukes".into(), "I have {word} cukes".into()],
        };
        assert_eq!(
            err.to_string(),
            "step 'I have 3 cukes' is ambiguous; it matches: I have {int} cukes, I have {word} cukes"
        );
    }

    #[test]
    fn auth_setup_error_names_role() {
        let err = AuthSetupError::new("admin", "login button missing");
        assert_eq!(
            err.to_string(),
            "authentication setup for role 'admin' failed: login button missing"
        );
    }
}
