//! Filename template grammar
//!
//! A template is literal text mixed with `{field}` placeholders and `[...]`
//! optional spans, which may nest:
//!
//! ```text
//! {platform}_{product}_{datetime}[.{extension}]
//! ```
//!
//! Parsing produces a [`Segment`] tree. Matching and assembly are built from
//! that tree in [`crate::compiler`]; nothing here knows about field rules.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// Template grammar errors, reported with the byte offset they occur at
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("placeholder opened at offset {0} is never closed")]
    UnclosedPlaceholder(usize),

    #[error("empty placeholder at offset {0}")]
    EmptyPlaceholder(usize),

    #[error("invalid character {ch:?} in placeholder at offset {offset}")]
    InvalidPlaceholder { ch: char, offset: usize },

    #[error("unmatched '{ch}' at offset {offset}")]
    Unmatched { ch: char, offset: usize },

    #[error("optional group opened at offset {0} is never closed")]
    UnclosedOptional(usize),

    #[error("optional group at offset {0} contains no placeholder")]
    EmptyOptional(usize),
}

/// One element of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text that must appear verbatim
    Literal(String),
    /// `{name}`
    Placeholder(String),
    /// `[...]`, present or absent as a unit
    Optional(Vec<Segment>),
}

/// A parsed filename template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut parser = Parser {
            chars: source.char_indices().collect(),
            pos: 0,
        };
        let segments = parser.sequence(None)?;
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Distinct placeholder names in left-to-right order of first appearance
    pub fn fields_order(&self) -> Vec<String> {
        let mut order = Vec::new();
        visit_placeholders(&self.segments, false, &mut |name, _| {
            if !order.iter().any(|seen: &String| seen == name) {
                order.push(name.to_string());
            }
        });
        order
    }

    /// Placeholders that occur at least once outside every optional group
    pub fn compulsory_placeholders(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        visit_placeholders(&self.segments, false, &mut |name, optional| {
            if !optional {
                names.insert(name.to_string());
            }
        });
        names
    }

    /// Every placeholder name in the template
    pub fn placeholders(&self) -> BTreeSet<String> {
        self.fields_order().into_iter().collect()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn visit_placeholders(segments: &[Segment], optional: bool, visit: &mut impl FnMut(&str, bool)) {
    for segment in segments {
        match segment {
            Segment::Literal(_) => {}
            Segment::Placeholder(name) => visit(name, optional),
            Segment::Optional(inner) => visit_placeholders(inner, true, visit),
        }
    }
}

/// Whether a segment list holds a placeholder at any depth
pub(crate) fn has_placeholder(segments: &[Segment]) -> bool {
    segments.iter().any(|segment| match segment {
        Segment::Literal(_) => false,
        Segment::Placeholder(_) => true,
        Segment::Optional(inner) => has_placeholder(inner),
    })
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<(usize, char)> {
        self.chars.get(self.pos).copied()
    }

    /// Parse until end of input, or until the `]` closing the group opened at `open`
    fn sequence(&mut self, open: Option<usize>) -> Result<Vec<Segment>, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();

        while let Some((offset, ch)) = self.peek() {
            match ch {
                '{' => {
                    flush(&mut literal, &mut segments);
                    self.pos += 1;
                    segments.push(Segment::Placeholder(self.placeholder(offset)?));
                }
                '[' => {
                    flush(&mut literal, &mut segments);
                    self.pos += 1;
                    let inner = self.sequence(Some(offset))?;
                    if !has_placeholder(&inner) {
                        return Err(TemplateError::EmptyOptional(offset));
                    }
                    segments.push(Segment::Optional(inner));
                }
                ']' => {
                    if open.is_none() {
                        return Err(TemplateError::Unmatched { ch, offset });
                    }
                    self.pos += 1;
                    flush(&mut literal, &mut segments);
                    return Ok(segments);
                }
                '}' => return Err(TemplateError::Unmatched { ch, offset }),
                _ => {
                    literal.push(ch);
                    self.pos += 1;
                }
            }
        }

        if let Some(open) = open {
            return Err(TemplateError::UnclosedOptional(open));
        }
        flush(&mut literal, &mut segments);
        Ok(segments)
    }

    fn placeholder(&mut self, open: usize) -> Result<String, TemplateError> {
        let mut name = String::new();
        while let Some((offset, ch)) = self.peek() {
            self.pos += 1;
            match ch {
                '}' if name.is_empty() => return Err(TemplateError::EmptyPlaceholder(open)),
                '}' => return Ok(name),
                c if c.is_ascii_alphanumeric() || c == '_' => name.push(c),
                c => return Err(TemplateError::InvalidPlaceholder { ch: c, offset }),
            }
        }
        Err(TemplateError::UnclosedPlaceholder(open))
    }
}

fn flush(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}
