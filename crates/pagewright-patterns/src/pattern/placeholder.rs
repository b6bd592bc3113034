//! Parameter parsing used by the lexer.

use crate::errors::{PatternError, placeholder_error};
use crate::param::ParamKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParamSpec {
    pub kind: ParamKind,
    /// Byte offset one past the closing brace.
    pub end: usize,
}

/// Parse the parameter whose opening brace sits at byte `start`.
pub(crate) fn parse_placeholder(pattern: &str, start: usize) -> Result<ParamSpec, PatternError> {
    let body_start = start.saturating_add(1);
    let body = pattern.get(body_start..).unwrap_or_default();
    let name_len = body
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .count();
    let name = body.get(..name_len).unwrap_or_default();

    match body.get(name_len..).and_then(|rest| rest.chars().next()) {
        Some('}') => {}
        Some(_) => {
            return Err(placeholder_error(
                "invalid placeholder in step pattern",
                start,
                Some(name.to_owned()),
            ));
        }
        None => {
            return Err(placeholder_error(
                "missing closing '}' for placeholder",
                start,
                Some(name.to_owned()),
            ));
        }
    }

    let kind = name.parse::<ParamKind>().map_err(|_| {
        placeholder_error("unknown parameter type", start, Some(name.to_owned()))
    })?;

    Ok(ParamSpec {
        kind,
        end: body_start + name_len + 1,
    })
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests exercise placeholder parser fallibility"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("{string}", ParamKind::String)]
    #[case("{int}", ParamKind::Int)]
    #[case("{word}", ParamKind::Word)]
    fn parses_supported_kinds(#[case] pattern: &str, #[case] kind: ParamKind) {
        let spec = parse_placeholder(pattern, 0).unwrap();
        assert_eq!(spec.kind, kind);
        assert_eq!(spec.end, pattern.len());
    }

    #[test]
    fn reports_end_of_later_placeholder() {
        let spec = parse_placeholder("count {int} items", 6).unwrap();
        assert_eq!(spec.end, 11);
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = parse_placeholder("{float}", 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown parameter type for placeholder `float` at byte 0 (zero-based)"
        );
    }

    #[rstest]
    #[case("{int:u32}")]
    #[case("{int }")]
    #[case("{my-name}")]
    fn rejects_malformed_bodies(#[case] pattern: &str) {
        let err = parse_placeholder(pattern, 0).unwrap_err();
        assert!(
            err.to_string()
                .contains("invalid placeholder in step pattern")
        );
    }

    #[test]
    fn errors_on_missing_closing_brace() {
        let err = parse_placeholder("{int", 0).unwrap_err();
        assert!(err.to_string().contains("missing closing '}'"));
    }
}
