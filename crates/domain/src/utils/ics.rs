//! iCalendar (RFC 5545) content-line and component parser.
//!
//! Produces a generic [`Component`] tree; interpretation of properties lives
//! in [`crate::utils::event_parser`].

use crate::errors::{CalarmError, Result};

/// One unfolded content line: `NAME;PARAM=VALUE:VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Property name, upper case.
    pub name: String,
    /// Parameters in declaration order; names upper case, values unquoted.
    pub params: Vec<(String, String)>,
    pub value: String,
}

impl ContentLine {
    /// Case-insensitive parameter lookup.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A `BEGIN`/`END` block with its properties and nested blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Component {
    /// Component name, upper case (`VCALENDAR`, `VEVENT`, `VALARM`).
    pub name: String,
    pub properties: Vec<ContentLine>,
    pub children: Vec<Component>,
}

impl Component {
    fn named(name: String) -> Self {
        Self { name, ..Self::default() }
    }

    /// First property with the given name.
    pub fn property(&self, name: &str) -> Option<&ContentLine> {
        self.properties.iter().find(|line| line.name.eq_ignore_ascii_case(name))
    }

    /// All properties with the given name.
    pub fn properties_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a ContentLine> + 'a {
        self.properties.iter().filter(move |line| line.name.eq_ignore_ascii_case(name))
    }

    /// Trimmed value of the first property with the given name.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.property(name).map(|line| line.value.trim())
    }

    /// Direct children with the given component name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Component> + 'a {
        self.children.iter().filter(move |child| child.name.eq_ignore_ascii_case(name))
    }
}

/// Undo RFC 5545 line folding.
///
/// Accepts CRLF or bare LF line endings; a line starting with a space or tab
/// continues the previous one. Blank lines are dropped.
pub fn unfold_lines(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for physical in raw.split('\n') {
        let physical = physical.strip_suffix('\r').unwrap_or(physical);
        match physical.chars().next() {
            Some(' ' | '\t') => {
                if let Some(last) = lines.last_mut() {
                    last.push_str(&physical[1..]);
                }
            }
            Some(_) => lines.push(physical.to_string()),
            None => {}
        }
    }

    lines
}

/// Parse a single unfolded content line.
///
/// # Errors
/// Returns `CalarmError::Parse` when the line has no `:` separator or an
/// empty name.
pub fn parse_content_line(line: &str) -> Result<ContentLine> {
    let mut in_quotes = false;
    let mut separators = Vec::new();
    let mut value_start = None;

    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => separators.push(index),
            ':' if !in_quotes => {
                value_start = Some(index);
                break;
            }
            _ => {}
        }
    }

    let colon = value_start
        .ok_or_else(|| CalarmError::Parse(format!("Content line without value: {line}")))?;
    let head = &line[..colon];
    let value = line[colon + 1..].to_string();

    let name_end = separators.first().copied().unwrap_or(colon);
    let name = line[..name_end].trim().to_uppercase();
    if name.is_empty() {
        return Err(CalarmError::Parse(format!("Content line without name: {line}")));
    }

    let mut params = Vec::new();
    for (position, start) in separators.iter().enumerate() {
        let end = separators.get(position + 1).copied().unwrap_or(head.len());
        let raw_param = &head[start + 1..end];
        if let Some((key, param_value)) = raw_param.split_once('=') {
            params.push((key.trim().to_uppercase(), unquote(param_value.trim()).to_string()));
        }
    }

    Ok(ContentLine { name, params, value })
}

/// Parse raw iCalendar text and return its `VCALENDAR` component.
///
/// # Errors
/// Returns `CalarmError::Parse` when a line is malformed, `BEGIN`/`END` are
/// unbalanced, or no `VCALENDAR` is present.
pub fn parse_calendar(raw: &str) -> Result<Component> {
    let mut stack: Vec<Component> = Vec::new();
    let mut roots: Vec<Component> = Vec::new();

    for line in unfold_lines(raw) {
        let content = parse_content_line(&line)?;
        match content.name.as_str() {
            "BEGIN" => stack.push(Component::named(content.value.trim().to_uppercase())),
            "END" => {
                let closing = content.value.trim().to_uppercase();
                let finished = stack.pop().ok_or_else(|| {
                    CalarmError::Parse(format!("END:{closing} without matching BEGIN"))
                })?;
                if finished.name != closing {
                    return Err(CalarmError::Parse(format!(
                        "END:{closing} does not close BEGIN:{}",
                        finished.name
                    )));
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(finished),
                    None => roots.push(finished),
                }
            }
            _ => match stack.last_mut() {
                Some(current) => current.properties.push(content),
                None => {
                    return Err(CalarmError::Parse(format!(
                        "Property {} outside of any component",
                        content.name
                    )))
                }
            },
        }
    }

    if let Some(open) = stack.last() {
        return Err(CalarmError::Parse(format!("BEGIN:{} is never closed", open.name)));
    }

    roots
        .into_iter()
        .find(|component| component.name == "VCALENDAR")
        .ok_or_else(|| CalarmError::Parse("No VCALENDAR component".to_string()))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}
