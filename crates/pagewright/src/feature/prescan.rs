//! Line-oriented structural checks run before Gherkin parsing.
//!
//! The parser's own errors carry no reliable line for these two mistakes, so
//! they are caught here with one-based line numbers: table rows whose width
//! differs from the first row of their table, and outlines that never reach
//! an `Examples:` block.

use crate::error::{ParseError, ParseErrorKind};

const OUTLINE_HEADERS: [&str; 2] = ["Scenario Outline:", "Scenario Template:"];
const BLOCK_HEADERS: [&str; 5] = ["Feature:", "Rule:", "Background:", "Scenario:", "Example:"];
const EXAMPLES_HEADERS: [&str; 2] = ["Examples:", "Scenarios:"];

struct OpenOutline {
    name: String,
    line: usize,
}

/// Count the cells of a `| a | b |` row, honouring `\|` escapes.
fn count_cells(row: &str) -> usize {
    let mut pipes = 0usize;
    let mut escaped = false;
    for ch in row.trim().chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '|' => pipes += 1,
            _ => {}
        }
    }
    pipes.saturating_sub(1)
}

fn header_text<'a>(line: &'a str, headers: &[&str]) -> Option<&'a str> {
    headers
        .iter()
        .find_map(|header| line.strip_prefix(header))
        .map(str::trim)
}

fn is_docstring_fence(line: &str) -> bool {
    line.starts_with("\"\"\"") || line.starts_with("```")
}

pub(crate) fn check_structure(source_name: &str, text: &str) -> Result<(), ParseError> {
    let mut in_docstring = false;
    let mut table_width: Option<usize> = None;
    let mut outline: Option<OpenOutline> = None;

    let missing_examples = |open: OpenOutline| {
        ParseError::new(
            source_name,
            Some(open.line),
            ParseErrorKind::MissingExamples { name: open.name },
        )
    };

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_start();

        if is_docstring_fence(line) {
            in_docstring = !in_docstring;
            continue;
        }
        if in_docstring || line.starts_with('#') {
            continue;
        }

        if line.starts_with('|') {
            let width = count_cells(line);
            match table_width {
                None => table_width = Some(width),
                Some(expected) if expected != width => {
                    return Err(ParseError::new(
                        source_name,
                        Some(line_no),
                        ParseErrorKind::TableRowWidth {
                            expected,
                            actual: width,
                        },
                    ));
                }
                Some(_) => {}
            }
            continue;
        }
        table_width = None;

        if header_text(line, &EXAMPLES_HEADERS).is_some() {
            outline = None;
        } else if let Some(name) = header_text(line, &OUTLINE_HEADERS) {
            if let Some(open) = outline.take() {
                return Err(missing_examples(open));
            }
            outline = Some(OpenOutline {
                name: name.to_owned(),
                line: line_no,
            });
        } else if header_text(line, &BLOCK_HEADERS).is_some() {
            if let Some(open) = outline.take() {
                return Err(missing_examples(open));
            }
        }
    }

    outline.map_or(Ok(()), |open| Err(missing_examples(open)))
}
