//! Address templates
//!
//! A template such as `"{housenumber} {street}, {postcode} {city}"` is parsed
//! once and then filled from each geocoding result. Placeholders whose key is
//! missing (or null) in the result render as an empty string; `{{` and `}}`
//! produce literal braces.

use serde_json::Value;

use crate::fetcher::FetchOutcome;

/// Template syntax errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// `{` without a closing `}`
    #[error("unclosed placeholder starting at byte {0}")]
    Unclosed(usize),

    /// `}` that is neither a placeholder end nor `}}`
    #[error("unmatched '}}' at byte {0}")]
    UnmatchedClose(usize),

    /// `{}`
    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed address template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTemplate {
    segments: Vec<Segment>,
}

impl AddressTemplate {
    /// Parse a template. A `:spec` suffix inside a placeholder is ignored.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnmatchedClose(pos)),
                '{' => {
                    let mut key = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        key.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed(pos));
                    }
                    let name = key.split(':').next().unwrap_or_default().trim();
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder(pos));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name.to_string()));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Placeholder names in order of appearance
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Fill the template from a result object
    pub fn render(&self, result: &Value) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => out.push_str(&lookup_or_default(result, name)),
            }
        }
        out
    }

    /// Standardized address for one outcome; empty when there is no result
    pub fn standardize(&self, outcome: &FetchOutcome<Value>) -> String {
        match outcome {
            FetchOutcome::Success(result) => self.render(result),
            _ => String::new(),
        }
    }
}

/// Look up `key` in a JSON object, substituting "" when it is absent
pub fn lookup_or_default(result: &Value, key: &str) -> String {
    match result.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
