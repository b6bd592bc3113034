//! Scenario Outline expansion.
//!
//! A placeholder is `<` followed by one or more characters other than `<`,
//! `>` or a line break, closed by `>`. Every placeholder in the outline's
//! name and step text must name an Examples column. Doc strings and table
//! cells are substituted too, but an unmatched token there is left as
//! written, so markup such as `<div>` survives expansion.

use super::{ExampleRef, ExampleRow, Scenario, ScenarioOutline, Step};
use crate::error::ExpansionError;

/// Split `text` into literal and placeholder segments.
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some((before, after)) = rest.split_once('<') {
        let token = after
            .split_once('>')
            .filter(|(name, _)| !name.is_empty() && !name.contains(['<', '\n', '\r']));
        match token {
            Some((name, tail)) => {
                if !before.is_empty() {
                    out.push(Segment::Literal(before));
                }
                out.push(Segment::Placeholder(name));
                rest = tail;
            }
            None => {
                // Keep the `<` and continue after it.
                let consumed = before.len() + 1;
                let (literal, tail) = rest.split_at(consumed);
                out.push(Segment::Literal(literal));
                rest = tail;
            }
        }
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    out
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn placeholders(text: &str) -> impl Iterator<Item = &str> {
    segments(text).into_iter().filter_map(|segment| match segment {
        Segment::Placeholder(name) => Some(name),
        Segment::Literal(_) => None,
    })
}

fn substitute(text: &str, row: &ExampleRow) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Literal(literal) => out.push_str(literal),
            Segment::Placeholder(name) => match row.value(name) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('<');
                    out.push_str(name);
                    out.push('>');
                }
            },
        }
    }
    out
}

/// Outline texts whose placeholders must all be bound.
fn template_texts(outline: &ScenarioOutline) -> impl Iterator<Item = &str> {
    std::iter::once(outline.name.as_str())
        .chain(outline.steps.iter().map(|step| step.text.as_str()))
}

fn check_bound(source: &str, outline: &ScenarioOutline) -> Result<(), ExpansionError> {
    let unbound = template_texts(outline)
        .flat_map(placeholders)
        .find(|name| {
            outline
                .examples
                .iter()
                .any(|row| row.value(name).is_none())
        });
    match unbound {
        Some(name) => Err(ExpansionError::UnboundPlaceholder {
            feature: source.to_owned(),
            outline: outline.name.clone(),
            placeholder: name.to_owned(),
            line: outline.line,
        }),
        None => Ok(()),
    }
}

fn expand_step(step: &Step, row: &ExampleRow) -> Step {
    Step {
        keyword: step.keyword,
        text: substitute(&step.text, row),
        line: step.line,
        docstring: step.docstring.as_deref().map(|doc| substitute(doc, row)),
        table: step.table.as_ref().map(|rows| {
            rows.iter()
                .map(|cells| cells.iter().map(|cell| substitute(cell, row)).collect())
                .collect()
        }),
    }
}

/// Expand `outline` into one scenario per Examples row, in row order.
pub(super) fn expand_outline(
    source: &str,
    outline: &ScenarioOutline,
) -> Result<Vec<Scenario>, ExpansionError> {
    check_bound(source, outline)?;
    let scenarios = outline
        .examples
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut tags = outline.tags.clone();
            for tag in &row.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
            Scenario {
                name: substitute(&outline.name, row),
                tags,
                line: outline.line,
                steps: outline
                    .steps
                    .iter()
                    .map(|step| expand_step(step, row))
                    .collect(),
                example: Some(ExampleRef {
                    index,
                    line: row.line,
                    values: row.values.clone(),
                }),
            }
        })
        .collect();
    Ok(scenarios)
}
