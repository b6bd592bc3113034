//! Typed step parameters and the coercion of captured text into values.

use std::fmt;
use std::str::FromStr;

/// The type of a `{...}` parameter in a step pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// `{string}`: a double- or single-quoted substring.
    String,
    /// `{int}`: an optionally signed decimal integer.
    Int,
    /// `{word}`: a run of non-whitespace characters.
    Word,
}

impl ParamKind {
    /// Name of the parameter as written inside the braces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Word => "word",
        }
    }

    /// Regular-expression fragment matching this parameter, without the
    /// surrounding capture group.
    #[must_use]
    pub const fn regex_fragment(self) -> &'static str {
        match self {
            Self::String => r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#,
            Self::Int => r"[+-]?[0-9]+",
            Self::Word => r"[^\s]+",
        }
    }

    /// Text that this parameter is guaranteed to match.
    ///
    /// Used to build representative step text when probing patterns for
    /// overlap.
    #[must_use]
    pub const fn sample(self) -> &'static str {
        match self {
            Self::String => "\"sample\"",
            Self::Int => "0",
            Self::Word => "sample",
        }
    }

    /// Convert the raw text captured for this parameter into a value.
    ///
    /// Returns `None` when the text cannot be represented, for example an
    /// integer that overflows `i64`. Callers treat that as a non-match.
    ///
    /// # Examples
    /// ```
    /// use pagewright_patterns::{CapturedValue, ParamKind};
    ///
    /// assert_eq!(ParamKind::Int.coerce("-12"), Some(CapturedValue::Int(-12)));
    /// assert_eq!(ParamKind::Int.coerce("99999999999999999999"), None);
    /// assert_eq!(
    ///     ParamKind::String.coerce(r#""say \"hi\"""#),
    ///     Some(CapturedValue::String("say \"hi\"".into()))
    /// );
    /// ```
    #[must_use]
    pub fn coerce(self, raw: &str) -> Option<CapturedValue> {
        match self {
            Self::String => unquote(raw).map(CapturedValue::String),
            Self::Int => raw.parse::<i64>().ok().map(CapturedValue::Int),
            Self::Word => Some(CapturedValue::Word(raw.to_owned())),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a parameter name is not one of the supported kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownParamKind(pub String);

impl fmt::Display for UnknownParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown parameter type: {}", self.0)
    }
}

impl std::error::Error for UnknownParamKind {}

impl FromStr for ParamKind {
    type Err = UnknownParamKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "string" => Ok(Self::String),
            "int" => Ok(Self::Int),
            "word" => Ok(Self::Word),
            other => Err(UnknownParamKind(other.to_owned())),
        }
    }
}

/// A value captured from step text by a typed parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CapturedValue {
    /// Unescaped contents of a quoted string.
    String(String),
    /// A signed integer.
    Int(i64),
    /// A single whitespace-free word.
    Word(String),
}

impl CapturedValue {
    /// The parameter kind that produced this value.
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        match self {
            Self::String(_) => ParamKind::String,
            Self::Int(_) => ParamKind::Int,
            Self::Word(_) => ParamKind::Word,
        }
    }

    /// Borrow the text of a `String` or `Word` capture.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(text) | Self::Word(text) => Some(text),
            Self::Int(_) => None,
        }
    }

    /// Return the integer of an `Int` capture.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::String(_) | Self::Word(_) => None,
        }
    }
}

impl fmt::Display for CapturedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(text) => write!(f, "{text:?}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Word(text) => f.write_str(text),
        }
    }
}

/// Strip the surrounding quotes and resolve backslash escapes.
fn unquote(raw: &str) -> Option<String> {
    let mut chars = raw.chars();
    let open = chars.next()?;
    let close = chars.next_back()?;
    if open != close || !matches!(open, '"' | '\'') {
        return None;
    }
    let mut out = String::with_capacity(raw.len());
    let mut escaped = false;
    for ch in chars {
        if escaped {
            out.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            out.push(ch);
        }
    }
    Some(out)
}
