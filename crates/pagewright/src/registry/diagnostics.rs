//! Pre-run checks and listings over a registry.
//!
//! Nothing here opens a browser, so a suite can be validated before any
//! scenario runs.

use pagewright_patterns::StepKeyword;
use serde::Serialize;

use super::StepRegistry;
use crate::error::BindingError;
use crate::feature::Scenario;

/// A step that cannot be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDiagnostic {
    /// Display name of the scenario holding the step.
    pub scenario: String,
    /// One-based line of the step.
    pub line: usize,
    /// Why the step cannot be bound.
    pub error: BindingError,
}

/// Two registered patterns that some step text would match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternOverlap {
    /// Pattern registered first.
    pub first: String,
    /// Pattern registered later.
    pub second: String,
}

#[derive(Serialize)]
struct ListedStep<'a> {
    keyword: Option<&'static str>,
    pattern: &'a str,
    params: Vec<&'static str>,
}

impl StepRegistry {
    /// Try to bind every step of every scenario, returning the failures.
    ///
    /// Results follow scenario order, then step order.
    #[must_use]
    pub fn validate<'a>(
        &self,
        scenarios: impl IntoIterator<Item = &'a Scenario>,
    ) -> Vec<BindingDiagnostic> {
        let mut diagnostics = Vec::new();
        for scenario in scenarios {
            for step in &scenario.steps {
                if let Err(error) = self.resolve(&step.text) {
                    diagnostics.push(BindingDiagnostic {
                        scenario: scenario.display_name(),
                        line: step.line,
                        error,
                    });
                }
            }
        }
        diagnostics
    }

    /// Pairs of registered patterns that would both match some text.
    ///
    /// Detection tries each pattern's sample text against the other
    /// pattern, so it reports every overlap that [`resolve`](Self::resolve)
    /// would turn into [`BindingError::AmbiguousStep`] for sample-shaped text.
    #[must_use]
    pub fn overlapping_patterns(&self) -> Vec<PatternOverlap> {
        let mut overlaps = Vec::new();
        for (index, first) in self.definitions.iter().enumerate() {
            for second in self.definitions.iter().skip(index + 1) {
                if first.pattern().overlaps(second.pattern()) {
                    overlaps.push(PatternOverlap {
                        first: first.pattern().source().to_owned(),
                        second: second.pattern().source().to_owned(),
                    });
                }
            }
        }
        overlaps
    }

    /// Serialise the registered definitions as a JSON array.
    ///
    /// # Errors
    /// Returns the serialisation error, which cannot occur for well-formed
    /// UTF-8 patterns.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let listed: Vec<_> = self
            .definitions
            .iter()
            .map(|definition| ListedStep {
                keyword: definition.keyword().map(StepKeyword::as_str),
                pattern: definition.pattern().source(),
                params: definition
                    .pattern()
                    .params()
                    .iter()
                    .map(|kind| kind.as_str())
                    .collect(),
            })
            .collect();
        serde_json::to_string(&listed)
    }
}
