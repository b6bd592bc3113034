//! Error types raised while compiling step patterns.

use std::fmt;
use thiserror::Error;

/// Location and description of a malformed parameter or brace.
///
/// # Examples
/// ```
/// use pagewright_patterns::PlaceholderErrorInfo;
/// let info = PlaceholderErrorInfo::new("unknown parameter type", 6, Some("float".into()));
/// assert_eq!(
///     info.to_string(),
///     "unknown parameter type for placeholder `float` at byte 6 (zero-based)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderErrorInfo {
    /// Human-readable description of the problem.
    pub message: &'static str,
    /// Byte offset into the pattern where the problem starts.
    pub position: usize,
    /// Parameter name, when the problem concerns a parameter.
    pub placeholder: Option<String>,
}

impl PlaceholderErrorInfo {
    /// Describe a pattern failure at `position`.
    #[must_use]
    pub fn new(message: &'static str, position: usize, placeholder: Option<String>) -> Self {
        Self {
            message,
            position,
            placeholder,
        }
    }
}

impl fmt::Display for PlaceholderErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.placeholder {
            Some(name) => write!(
                f,
                "{} for placeholder `{}` at byte {} (zero-based)",
                self.message, name, self.position
            ),
            None => write!(f, "{} at byte {} (zero-based)", self.message, self.position),
        }
    }
}

/// Errors surfaced while converting step patterns into regular expressions.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A parameter or brace in the pattern is malformed.
    #[error("{0}")]
    Placeholder(PlaceholderErrorInfo),
    /// The generated regular expression failed to compile.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub(crate) fn placeholder_error(
    message: &'static str,
    position: usize,
    placeholder: Option<String>,
) -> PatternError {
    PatternError::Placeholder(PlaceholderErrorInfo::new(message, position, placeholder))
}
