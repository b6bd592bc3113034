//! Step-pattern parsing utilities for pagewright.
//!
//! Patterns are literal text interleaved with typed parameters (`{string}`,
//! `{int}` and `{word}`). They compile into anchored regular expressions and
//! captured text is coerced into [`CapturedValue`]s by explicit per-kind
//! conversion functions.

mod capture;
mod errors;
mod keyword;
mod param;
mod pattern;

pub use capture::extract_captured_values;
pub use errors::{PatternError, PlaceholderErrorInfo};
pub use keyword::{StepKeyword, StepKeywordParseError};
pub use param::{CapturedValue, ParamKind, UnknownParamKind};
pub use pattern::{CompiledPattern, build_regex_from_pattern};
