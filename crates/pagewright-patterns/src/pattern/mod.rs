//! Step-pattern lexing and compilation.

mod compiler;
mod lexer;
mod placeholder;

use regex::Regex;

use crate::capture::extract_captured_values;
use crate::errors::PatternError;
use crate::param::{CapturedValue, ParamKind};

pub use compiler::build_regex_from_pattern;

/// A step pattern compiled into an anchored regular expression.
///
/// Two patterns are equivalent when their [`signature`](Self::signature)s are
/// equal: the same literal text with the same parameter kinds in the same
/// positions.
///
/// # Examples
/// ```
/// use pagewright_patterns::{CapturedValue, CompiledPattern};
///
/// let pattern = CompiledPattern::compile("the User logs in as {word}")?;
/// assert_eq!(
///     pattern.match_text("the User logs in as standard_user"),
///     Some(vec![CapturedValue::Word("standard_user".into())])
/// );
/// assert_eq!(pattern.match_text("the User logs out"), None);
/// # Ok::<(), pagewright_patterns::PatternError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
    params: Vec<ParamKind>,
    sample: String,
}

impl CompiledPattern {
    /// Compile `source` into a matcher.
    ///
    /// # Errors
    /// Returns [`PatternError`] when the pattern is malformed or the generated
    /// regular expression cannot be compiled.
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        let parts = compiler::compile_parts(source)?;
        let regex = Regex::new(&parts.regex)?;
        Ok(Self {
            source: source.to_owned(),
            regex,
            params: parts.params,
            sample: parts.sample,
        })
    }

    /// The pattern text as registered.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parameter kinds in left-to-right order.
    #[must_use]
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    /// Canonical form used to detect equivalent patterns.
    #[must_use]
    pub fn signature(&self) -> &str {
        self.regex.as_str()
    }

    /// Step text this pattern is guaranteed to match.
    #[must_use]
    pub fn sample_text(&self) -> &str {
        &self.sample
    }

    /// Match the full `text` and coerce each capture by its parameter kind.
    ///
    /// Returns `None` when the text does not match structurally or when a
    /// capture fails to coerce.
    #[must_use]
    pub fn match_text(&self, text: &str) -> Option<Vec<CapturedValue>> {
        let raw = extract_captured_values(&self.regex, text)?;
        self.params
            .iter()
            .zip(raw.iter())
            .map(|(kind, value)| kind.coerce(value))
            .collect()
    }

    /// Whether some step text would be matched by both patterns.
    ///
    /// Each pattern's sample text is tried against the other. This finds the
    /// overlaps that arise in practice (a `{word}` where another pattern has
    /// a literal or an `{int}`) without attempting a full regular-language
    /// intersection.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.signature() == other.signature()
            || other.match_text(self.sample_text()).is_some()
            || self.match_text(other.sample_text()).is_some()
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.signature() == other.signature()
    }
}

impl Eq for CompiledPattern {}
