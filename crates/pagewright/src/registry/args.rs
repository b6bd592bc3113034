//! Values handed to a step handler.

use pagewright_patterns::{CapturedValue, ParamKind};

use crate::error::StepError;

/// Captured parameters plus the step's doc string and data table.
///
/// Accessors index captures left to right, starting at zero, and report a
/// missing or mistyped capture as [`StepError::Argument`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArgs {
    values: Vec<CapturedValue>,
    docstring: Option<String>,
    table: Option<Vec<Vec<String>>>,
}

impl StepArgs {
    /// Wrap captured values with no doc string or table.
    #[must_use]
    pub fn new(values: Vec<CapturedValue>) -> Self {
        Self {
            values,
            docstring: None,
            table: None,
        }
    }

    /// Attach a doc string.
    #[must_use]
    pub fn with_docstring(mut self, docstring: Option<String>) -> Self {
        self.docstring = docstring;
        self
    }

    /// Attach a data table.
    #[must_use]
    pub fn with_table(mut self, table: Option<Vec<Vec<String>>>) -> Self {
        self.table = table;
        self
    }

    /// All captured values in order.
    #[must_use]
    pub fn values(&self) -> &[CapturedValue] {
        &self.values
    }

    /// Number of captured values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn value(&self, index: usize) -> Result<&CapturedValue, StepError> {
        self.values.get(index).ok_or_else(|| {
            StepError::Argument(format!(
                "step captured {} value(s); no value at index {index}",
                self.values.len()
            ))
        })
    }

    fn mismatch(index: usize, expected: ParamKind, found: &CapturedValue) -> StepError {
        StepError::Argument(format!(
            "value {index} is a {{{}}} capture, not {{{expected}}}",
            found.kind()
        ))
    }

    /// The `{string}` capture at `index`, unquoted.
    ///
    /// # Errors
    /// Returns [`StepError::Argument`] when absent or of another kind.
    pub fn string(&self, index: usize) -> Result<&str, StepError> {
        match self.value(index)? {
            CapturedValue::String(text) => Ok(text),
            other => Err(Self::mismatch(index, ParamKind::String, other)),
        }
    }

    /// The `{word}` capture at `index`.
    ///
    /// # Errors
    /// Returns [`StepError::Argument`] when absent or of another kind.
    pub fn word(&self, index: usize) -> Result<&str, StepError> {
        match self.value(index)? {
            CapturedValue::Word(text) => Ok(text),
            other => Err(Self::mismatch(index, ParamKind::Word, other)),
        }
    }

    /// The `{string}` or `{word}` capture at `index`.
    ///
    /// # Errors
    /// Returns [`StepError::Argument`] when absent or an `{int}`.
    pub fn text(&self, index: usize) -> Result<&str, StepError> {
        let value = self.value(index)?;
        value
            .as_text()
            .ok_or_else(|| Self::mismatch(index, ParamKind::String, value))
    }

    /// The `{int}` capture at `index`.
    ///
    /// # Errors
    /// Returns [`StepError::Argument`] when absent or of another kind.
    pub fn int(&self, index: usize) -> Result<i64, StepError> {
        match self.value(index)? {
            CapturedValue::Int(number) => Ok(*number),
            other => Err(Self::mismatch(index, ParamKind::Int, other)),
        }
    }

    /// The step's doc string.
    #[must_use]
    pub fn docstring(&self) -> Option<&str> {
        self.docstring.as_deref()
    }

    /// The step's data table, header row included.
    #[must_use]
    pub fn table(&self) -> Option<&[Vec<String>]> {
        self.table.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> StepArgs {
        StepArgs::new(vec![
            CapturedValue::String("Sauce Labs Backpack".into()),
            CapturedValue::Int(2),
            CapturedValue::Word("standard_user".into()),
        ])
    }

    #[test]
    fn typed_accessors_return_values() {
        let args = args();
        assert_eq!(args.string(0).ok(), Some("Sauce Labs Backpack"));
        assert_eq!(args.int(1).ok(), Some(2));
        assert_eq!(args.word(2).ok(), Some("standard_user"));
        assert_eq!(args.text(2).ok(), Some("standard_user"));
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn mismatched_kind_names_both_kinds() {
        let Err(err) = args().int(0) else {
            panic!("string is not an int");
        };
        assert_eq!(
            err.to_string(),
            "invalid step argument: value 0 is a {string} capture, not {int}"
        );
    }

    #[test]
    fn missing_index_is_an_argument_error() {
        assert!(matches!(args().word(7), Err(StepError::Argument(_))));
    }

    #[test]
    fn carries_docstring_and_table() {
        let args = StepArgs::default()
            .with_docstring(Some("hello".into()))
            .with_table(Some(vec![vec!["name".into()]]));
        assert_eq!(args.docstring(), Some("hello"));
        assert_eq!(args.table().map(<[_]>::len), Some(1));
        assert!(args.is_empty());
    }
}
