//! Convert lexed tokens into anchored regular-expression sources.

use crate::errors::{PatternError, placeholder_error};
use crate::param::ParamKind;

use super::lexer::{Token, lex_pattern};

/// Regex source, parameter kinds and sample text derived from one pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledParts {
    pub regex: String,
    pub params: Vec<ParamKind>,
    pub sample: String,
}

pub(crate) fn compile_parts(pat: &str) -> Result<CompiledParts, PatternError> {
    let tokens = lex_pattern(pat)?;
    let mut regex = String::with_capacity(pat.len().saturating_mul(2) + 2);
    let mut params = Vec::new();
    let mut sample = String::with_capacity(pat.len());
    regex.push('^');
    let mut stray_depth = 0usize;

    for token in tokens {
        match token {
            Token::Literal(text) => {
                regex.push_str(&regex::escape(&text));
                sample.push_str(&text);
            }
            Token::Param(kind) => {
                regex.push('(');
                regex.push_str(kind.regex_fragment());
                regex.push(')');
                sample.push_str(kind.sample());
                params.push(kind);
            }
            Token::OpenBrace { .. } => {
                stray_depth = stray_depth.saturating_add(1);
                regex.push_str(&regex::escape("{"));
                sample.push('{');
            }
            Token::CloseBrace { index } => {
                if stray_depth == 0 {
                    return Err(placeholder_error(
                        "unmatched closing brace '}' in step pattern",
                        index,
                        None,
                    ));
                }
                stray_depth -= 1;
                regex.push_str(&regex::escape("}"));
                sample.push('}');
            }
        }
    }

    if stray_depth != 0 {
        return Err(placeholder_error(
            "unbalanced braces in step pattern",
            pat.len(),
            None,
        ));
    }

    regex.push('$');
    Ok(CompiledParts {
        regex,
        params,
        sample,
    })
}

/// Build an anchored regular expression source from a step pattern.
///
/// # Errors
/// Returns [`PatternError`] when the pattern contains malformed or unknown
/// parameters, or unbalanced braces.
///
/// # Examples
/// ```
/// use pagewright_patterns::build_regex_from_pattern;
/// let regex = build_regex_from_pattern("I wait {int} seconds")?;
/// assert_eq!(regex, r"^I wait ([+-]?[0-9]+) seconds$");
/// # Ok::<(), pagewright_patterns::PatternError>(())
/// ```
pub fn build_regex_from_pattern(pat: &str) -> Result<String, PatternError> {
    compile_parts(pat).map(|parts| parts.regex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_text_is_escaped() {
        let regex = build_regex_from_pattern("the total is $5.00 (approx)")
            .unwrap_or_else(|err| panic!("pattern should compile: {err}"));
        assert_eq!(regex, r"^the total is \$5\.00 \(approx\)$");
    }

    #[test]
    fn records_params_in_order_and_builds_sample() {
        let parts = compile_parts("{word} adds {int} of {string}")
            .unwrap_or_else(|err| panic!("pattern should compile: {err}"));
        assert_eq!(
            parts.params,
            vec![ParamKind::Word, ParamKind::Int, ParamKind::String]
        );
        assert_eq!(parts.sample, "sample adds 0 of \"sample\"");
    }

    #[test]
    fn balanced_stray_braces_are_literal() {
        let parts = compile_parts("a { 1 } b")
            .unwrap_or_else(|err| panic!("pattern should compile: {err}"));
        assert_eq!(parts.regex, r"^a \{ 1 \} b$");
        assert!(parts.params.is_empty());
    }

    #[test]
    fn errors_when_closing_brace_unmatched() {
        let Err(err) = build_regex_from_pattern("broken}") else {
            panic!("should fail");
        };
        assert!(
            err.to_string()
                .contains("unmatched closing brace '}' in step pattern")
        );
    }

    #[test]
    fn errors_when_open_braces_remain() {
        let Err(err) = build_regex_from_pattern("dangling { brace") else {
            panic!("should fail");
        };
        assert!(err.to_string().contains("unbalanced braces in step pattern"));
    }
}
