//! Pattern lexer converting pattern strings into semantic tokens.

use crate::errors::PatternError;
use crate::param::ParamKind;

use super::placeholder::parse_placeholder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(String),
    Param(ParamKind),
    OpenBrace { index: usize },
    CloseBrace { index: usize },
}

fn flush_literal(literal: &mut String, tokens: &mut Vec<Token>) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}

pub(crate) fn lex_pattern(pattern: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, escaped)) => literal.push(escaped),
                None => literal.push('\\'),
            },
            '{' => {
                if chars.next_if(|&(_, next)| next == '{').is_some() {
                    literal.push('{');
                    continue;
                }
                let starts_param = chars
                    .peek()
                    .is_some_and(|&(_, next)| next.is_ascii_alphabetic() || next == '_');
                flush_literal(&mut literal, &mut tokens);
                if starts_param {
                    let spec = parse_placeholder(pattern, index)?;
                    tokens.push(Token::Param(spec.kind));
                    while chars.next_if(|&(i, _)| i < spec.end).is_some() {}
                } else {
                    tokens.push(Token::OpenBrace { index });
                }
            }
            '}' => {
                if chars.next_if(|&(_, next)| next == '}').is_some() {
                    literal.push('}');
                    continue;
                }
                flush_literal(&mut literal, &mut tokens);
                tokens.push(Token::CloseBrace { index });
            }
            other => literal.push(other),
        }
    }

    flush_literal(&mut literal, &mut tokens);
    Ok(tokens)
}
