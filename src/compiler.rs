//! Template compilation
//!
//! Turns a [`SchemaDocument`]'s template into the two artifacts the
//! transcoder needs:
//!
//! - a whole-string [`Regex`] in which every placeholder is a named capture
//!   group built from its field rule and every optional group is an optional
//!   non-capturing group
//! - an assembly plan of [`EmitStep`]s mirroring the template
//!
//! Both are pure functions of the document and are cached on it
//! (see [`SchemaDocument::compiled`]).

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::schema::{FieldMap, SchemaDocument};
use crate::template::Segment;

/// One step of the assembly plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitStep {
    Literal(String),
    Field(String),
    /// Emitted only when every field directly inside it has a value
    Optional(Vec<EmitStep>),
}

/// Where and why a filename stopped matching a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub schema_id: String,
    /// Field name, or a description of the literal text expected
    pub segment: String,
    pub expected: String,
    pub value: String,
    /// Byte offset into the filename where matching failed
    pub offset: usize,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "schema {} rejects {:?} at offset {} for {}: expected {}",
            self.schema_id, self.value, self.offset, self.segment, self.expected
        )
    }
}

/// Capture group to field binding. Repeated placeholders get their own group.
#[derive(Debug, Clone)]
struct Slot {
    group: String,
    field: String,
}

/// Top-level template segment kept for mismatch diagnostics
#[derive(Debug, Clone)]
struct Step {
    segment: String,
    expected: String,
    fragment: String,
}

/// Matcher and assembly plan for one schema
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    schema_id: String,
    matcher: Regex,
    slots: Vec<Slot>,
    steps: Vec<Step>,
    plan: Vec<EmitStep>,
    fields_order: Vec<String>,
    first_compulsory: Option<String>,
}

impl CompiledSchema {
    pub fn compile(doc: &SchemaDocument) -> Result<Self, regex::Error> {
        let mut builder = Builder {
            doc,
            slots: Vec::new(),
            occurrences: HashMap::new(),
        };

        let mut steps = Vec::with_capacity(doc.template().segments().len());
        for segment in doc.template().segments() {
            let fragment = builder.segment(segment);
            let (label, expected) = match segment {
                Segment::Literal(text) => (format!("literal {text:?}"), format!("{text:?}")),
                Segment::Placeholder(name) => (
                    name.clone(),
                    doc.field(name)
                        .map(|f| f.rule().describe())
                        .unwrap_or_else(|| "a value".to_string()),
                ),
                Segment::Optional(_) => ("optional group".to_string(), "anything".to_string()),
            };
            steps.push(Step {
                segment: label,
                expected,
                fragment,
            });
        }

        let body: String = steps.iter().map(|s| s.fragment.as_str()).collect();
        let matcher = Regex::new(&format!("^(?:{body})$"))?;

        let fields_order = doc.template().fields_order();
        let first_compulsory = fields_order
            .iter()
            .find(|name| doc.required().contains(*name))
            .cloned();

        Ok(Self {
            schema_id: doc.schema_id().to_string(),
            matcher,
            slots: builder.slots,
            steps,
            plan: plan(doc.template().segments()),
            fields_order,
            first_compulsory,
        })
    }

    /// Anchored whole-filename regex
    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    pub fn is_match(&self, filename: &str) -> bool {
        self.matcher.is_match(filename)
    }

    pub fn plan(&self) -> &[EmitStep] {
        &self.plan
    }

    pub fn fields_order(&self) -> &[String] {
        &self.fields_order
    }

    /// First required field in template order; anchors automatic schema selection
    pub fn first_compulsory(&self) -> Option<&str> {
        self.first_compulsory.as_deref()
    }

    /// Raw tokens captured from `filename`, or `None` if it does not match.
    ///
    /// Fields inside an omitted optional group are absent from the result.
    /// A placeholder used more than once must capture the same text each time.
    pub fn extract(&self, filename: &str) -> Option<FieldMap> {
        let caps = self.matcher.captures(filename)?;
        let mut tokens = FieldMap::new();
        for slot in &self.slots {
            let Some(m) = caps.name(&slot.group) else {
                continue;
            };
            match tokens.get(&slot.field) {
                Some(previous) if previous != m.as_str() => return None,
                Some(_) => {}
                None => {
                    tokens.insert(slot.field.clone(), m.as_str().to_string());
                }
            }
        }
        Some(tokens)
    }

    /// Run the assembly plan. `Err` names a field with no token that is
    /// either compulsory or needed to place another supplied field.
    pub fn render(&self, tokens: &FieldMap) -> Result<String, String> {
        let mut out = String::new();
        for step in &self.plan {
            match step {
                EmitStep::Literal(text) => out.push_str(text),
                EmitStep::Field(name) => out.push_str(tokens.get(name).ok_or_else(|| name.clone())?),
                EmitStep::Optional(inner) => {
                    if let Some(text) = render_optional(inner, tokens)? {
                        out.push_str(&text);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Locate the first template segment `filename` fails on.
    ///
    /// Matches progressively longer template prefixes; returns `None` when the
    /// filename actually matches.
    pub fn explain_mismatch(&self, filename: &str) -> Option<Mismatch> {
        if self.is_match(filename) {
            return None;
        }

        let mut prefix = String::from("^");
        let mut matched_end = 0;
        for step in &self.steps {
            let candidate = format!("{prefix}{}", step.fragment);
            let rx = Regex::new(&candidate).ok()?;
            match rx.find(filename) {
                Some(m) => {
                    prefix = candidate;
                    matched_end = m.end();
                }
                None => {
                    return Some(Mismatch {
                        schema_id: self.schema_id.clone(),
                        segment: step.segment.clone(),
                        expected: step.expected.clone(),
                        value: token_at(filename, matched_end).to_string(),
                        offset: matched_end,
                    });
                }
            }
        }

        let rest = &filename[matched_end..];
        Some(Mismatch {
            schema_id: self.schema_id.clone(),
            segment: "end of filename".to_string(),
            expected: if rest.is_empty() {
                "repeated fields to carry identical values".to_string()
            } else {
                "no further text".to_string()
            },
            value: rest.to_string(),
            offset: matched_end,
        })
    }
}

struct Builder<'a> {
    doc: &'a SchemaDocument,
    slots: Vec<Slot>,
    occurrences: HashMap<String, usize>,
}

impl Builder<'_> {
    fn segment(&mut self, segment: &Segment) -> String {
        match segment {
            Segment::Literal(text) => regex::escape(text),
            Segment::Placeholder(name) => {
                let seen = self.occurrences.entry(name.clone()).or_insert(0);
                // Field names start with a letter, so generated names cannot collide
                let group = if *seen == 0 {
                    name.clone()
                } else {
                    format!("_{seen}_{name}")
                };
                *seen += 1;
                self.slots.push(Slot {
                    group: group.clone(),
                    field: name.clone(),
                });
                let inner = self
                    .doc
                    .field(name)
                    .map(|f| f.rule().regex_fragment())
                    .unwrap_or_else(|| "(?:.+?)".to_string());
                format!("(?P<{group}>{inner})")
            }
            Segment::Optional(inner) => {
                let body: String = inner.iter().map(|s| self.segment(s)).collect();
                format!("(?:{body})?")
            }
        }
    }
}

fn plan(segments: &[Segment]) -> Vec<EmitStep> {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Literal(text) => EmitStep::Literal(text.clone()),
            Segment::Placeholder(name) => EmitStep::Field(name.clone()),
            Segment::Optional(inner) => EmitStep::Optional(plan(inner)),
        })
        .collect()
}

/// `Ok(None)` when the group carries no value at all. A group holding some
/// value but missing one of its direct fields cannot be placed, and that
/// missing field is the error.
fn render_optional(steps: &[EmitStep], tokens: &FieldMap) -> Result<Option<String>, String> {
    let mut out = String::new();
    let mut has_value = false;
    for step in steps {
        match step {
            EmitStep::Literal(text) => out.push_str(text),
            EmitStep::Field(name) => match tokens.get(name) {
                Some(value) => {
                    out.push_str(value);
                    has_value = true;
                }
                None if carries_value(steps, tokens) => return Err(name.clone()),
                None => return Ok(None),
            },
            EmitStep::Optional(inner) => {
                if let Some(text) = render_optional(inner, tokens)? {
                    out.push_str(&text);
                    has_value = true;
                }
            }
        }
    }
    Ok(has_value.then_some(out))
}

fn carries_value(steps: &[EmitStep], tokens: &FieldMap) -> bool {
    steps.iter().any(|step| match step {
        EmitStep::Literal(_) => false,
        EmitStep::Field(name) => tokens.contains_key(name),
        EmitStep::Optional(inner) => carries_value(inner, tokens),
    })
}

/// Text from `start` up to the next `_`, `.` or `-` separator
fn token_at(filename: &str, start: usize) -> &str {
    let rest = &filename[start..];
    let end = rest
        .char_indices()
        .find(|(i, c)| *i > 0 && matches!(c, '_' | '.' | '-'))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scenario() -> SchemaDocument {
        SchemaDocument::from_value(json!({
            "schema_id": "test:scenario",
            "schema_version": "1.0.0",
            "template": "{platform}_{level}_{datetime}[.{extension}]",
            "fields": {
                "platform": {"enum": ["S2A", "S2B"]},
                "level": {"enum": ["L1C", "L2A"]},
                "datetime": {"pattern": "\\d{8}T\\d{6}"},
                "extension": {"enum": ["SAFE", "zip"]}
            }
        }))
        .unwrap()
    }

    fn tokens(pairs: &[(&str, &str)]) -> FieldMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_matcher_shape() {
        let doc = scenario();
        let compiled = doc.compiled().unwrap();
        assert_eq!(
            compiled.matcher().as_str(),
            "^(?:(?P<platform>(?:S2A|S2B))_(?P<level>(?:L1C|L2A))_(?P<datetime>(?:\\d{8}T\\d{6}))(?:\\.(?P<extension>(?:SAFE|zip)))?)$"
        );
        assert_eq!(compiled.fields_order(), &["platform", "level", "datetime", "extension"]);
        assert_eq!(compiled.first_compulsory(), Some("platform"));
    }

    #[test]
    fn test_optional_group_omission() {
        let doc = scenario();
        let compiled = doc.compiled().unwrap();
        let base = tokens(&[("platform", "S2B"), ("level", "L2A"), ("datetime", "20241123T224759")]);
        assert_eq!(compiled.render(&base).unwrap(), "S2B_L2A_20241123T224759");

        let mut with_ext = base.clone();
        with_ext.insert("extension".into(), "SAFE".into());
        assert_eq!(compiled.render(&with_ext).unwrap(), "S2B_L2A_20241123T224759.SAFE");

        assert_eq!(compiled.extract("S2B_L2A_20241123T224759").unwrap(), base);
        assert_eq!(compiled.extract("S2B_L2A_20241123T224759.SAFE").unwrap(), with_ext);
    }

    #[test]
    fn test_whole_string_only() {
        let doc = scenario();
        let compiled = doc.compiled().unwrap();
        assert!(compiled.extract("xS2B_L2A_20241123T224759").is_none());
        assert!(compiled.extract("S2B_L2A_20241123T224759.SAFE.tmp").is_none());
        assert!(compiled.extract("S2B_L2A_20241123T224759\n").is_none());
    }

    #[test]
    fn test_missing_compulsory_field() {
        let doc = scenario();
        let compiled = doc.compiled().unwrap();
        let partial = tokens(&[("platform", "S2B"), ("level", "L2A")]);
        assert_eq!(compiled.render(&partial), Err("datetime".to_string()));
    }

    #[test]
    fn test_nested_optional_groups() {
        let doc = SchemaDocument::from_value(json!({
            "schema_id": "test:nested",
            "schema_version": "1.0.0",
            "template": "{a}[_{b}[-{c}]]",
            "fields": {
                "a": {"pattern": "[a-z]+"},
                "b": {"pattern": "\\d+"},
                "c": {"pattern": "[A-Z]+"}
            }
        }))
        .unwrap();
        let compiled = doc.compiled().unwrap();
        assert_eq!(compiled.render(&tokens(&[("a", "x")])).unwrap(), "x");
        assert_eq!(compiled.render(&tokens(&[("a", "x"), ("b", "1")])).unwrap(), "x_1");
        assert_eq!(compiled.render(&tokens(&[("a", "x"), ("b", "1"), ("c", "Z")])).unwrap(), "x_1-Z");
        // c alone cannot be placed without its enclosing b
        assert_eq!(compiled.render(&tokens(&[("a", "x"), ("c", "Z")])), Err("b".to_string()));
        assert_eq!(compiled.extract("x_1-Z").unwrap(), tokens(&[("a", "x"), ("b", "1"), ("c", "Z")]));
    }

    #[test]
    fn test_repeated_placeholder_must_agree() {
        let doc = SchemaDocument::from_value(json!({
            "schema_id": "test:repeat",
            "schema_version": "1.0.0",
            "template": "{tile}/{date}_{tile}.tif",
            "fields": {
                "tile": {"pattern": "T\\d{2}[A-Z]{3}"},
                "date": {"pattern": "\\d{8}"}
            }
        }))
        .unwrap();
        let compiled = doc.compiled().unwrap();
        let fields = compiled.extract("T32TNS/20210101_T32TNS.tif").unwrap();
        assert_eq!(fields, tokens(&[("tile", "T32TNS"), ("date", "20210101")]));
        assert!(compiled.extract("T32TNS/20210101_T33UUP.tif").is_none());
        assert_eq!(compiled.render(&fields).unwrap(), "T32TNS/20210101_T32TNS.tif");
    }

    #[test]
    fn test_explain_mismatch() {
        let doc = scenario();
        let compiled = doc.compiled().unwrap();
        assert!(compiled.explain_mismatch("S2B_L2A_20241123T224759").is_none());

        let miss = compiled.explain_mismatch("S2B_L3X_20241123T224759").unwrap();
        assert_eq!(miss.segment, "level");
        assert_eq!(miss.value, "L3X");
        assert_eq!(miss.offset, 4);
        assert_eq!(miss.expected, "one of [L1C, L2A]");

        let miss = compiled.explain_mismatch("S2B_L2A_20241123T224759.tar").unwrap();
        assert_eq!(miss.segment, "end of filename");
        assert_eq!(miss.value, ".tar");
    }
}
