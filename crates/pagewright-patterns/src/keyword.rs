//! Step keyword type.
//!
//! Keywords carry no behaviour: a step definition matches step text under any
//! keyword. They are kept so reports and listings read like the feature file.

use gherkin::StepType;
use std::fmt;
use std::str::FromStr;

/// Keyword introducing a step line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKeyword {
    /// `Given`
    Given,
    /// `When`
    When,
    /// `Then`
    Then,
    /// `And`
    And,
    /// `But`
    But,
}

impl StepKeyword {
    /// The keyword as written in a feature file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        }
    }

    /// Determine the keyword of a parsed Gherkin step.
    ///
    /// The literal keyword text wins so `And`/`But` survive for display. The
    /// parser's step type is the fallback for `*` bullets and localised
    /// keywords.
    #[must_use]
    pub fn from_gherkin(keyword_text: &str, ty: StepType) -> Self {
        keyword_text.parse().unwrap_or_else(|_| Self::from(ty))
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text is not a recognised step keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepKeywordParseError(pub String);

impl fmt::Display for StepKeywordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid step keyword: {}", self.0)
    }
}

impl std::error::Error for StepKeywordParseError {}

impl FromStr for StepKeyword {
    type Err = StepKeywordParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        [Self::Given, Self::When, Self::Then, Self::And, Self::But]
            .into_iter()
            .find(|keyword| trimmed.eq_ignore_ascii_case(keyword.as_str()))
            .ok_or_else(|| StepKeywordParseError(trimmed.to_owned()))
    }
}

impl From<StepType> for StepKeyword {
    fn from(ty: StepType) -> Self {
        match ty {
            StepType::Given => Self::Given,
            StepType::When => Self::When,
            StepType::Then => Self::Then,
        }
    }
}
