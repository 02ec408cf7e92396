//! Schema document model
//!
//! A [`SchemaDocument`] is the validated, immutable form of one filename
//! schema file. Everything that can be checked without a filename in hand is
//! checked here, so later stages can assume a structurally sound document:
//! template grammar, field/placeholder correspondence, value-rule regexes and
//! `stac_map` invertibility.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checksum::Checksum;
use crate::compiler::CompiledSchema;
use crate::error::{Result, SchemaError};
use crate::template::{Template, TemplateError};
use crate::version::SchemaVersion;

/// Field name to value mapping, used for both raw tokens and semantic fields
pub type FieldMap = BTreeMap<String, String>;

// =============================================================================
// Lifecycle status
// =============================================================================

/// Lifecycle tag of a schema version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SchemaStatus {
    Current,
    Deprecated,
    /// Any other tag a schema author chose (e.g. "draft")
    Custom(String),
}

impl SchemaStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SchemaStatus::Current => "current",
            SchemaStatus::Deprecated => "deprecated",
            SchemaStatus::Custom(tag) => tag,
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, SchemaStatus::Current)
    }
}

impl From<String> for SchemaStatus {
    fn from(tag: String) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "current" => SchemaStatus::Current,
            "deprecated" => SchemaStatus::Deprecated,
            _ => SchemaStatus::Custom(tag),
        }
    }
}

impl From<SchemaStatus> for String {
    fn from(status: SchemaStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for SchemaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Value rules
// =============================================================================

/// What a single filename token may look like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueRule {
    /// Fixed set of allowed strings
    Enum(Vec<String>),
    /// Regular expression, stored without leading `^` / trailing `$`
    Pattern(String),
    /// Alternatives tried in listed order; the first branch that matches wins
    OneOf(Vec<ValueRule>),
}

impl ValueRule {
    /// Regex fragment for this rule, wrapped so it can be embedded anywhere.
    ///
    /// Enum values are escaped and ordered longest first so a short value
    /// never shadows a longer one sharing its prefix.
    pub fn regex_fragment(&self) -> String {
        match self {
            ValueRule::Enum(values) => {
                let mut sorted: Vec<&String> = values.iter().collect();
                sorted.sort_by(|a, b| b.len().cmp(&a.len()));
                let alternatives: Vec<String> = sorted.iter().map(|v| regex::escape(v)).collect();
                format!("(?:{})", alternatives.join("|"))
            }
            ValueRule::Pattern(pattern) => format!("(?:{})", pattern),
            ValueRule::OneOf(branches) => {
                let alternatives: Vec<String> = branches.iter().map(|b| b.regex_fragment()).collect();
                format!("(?:{})", alternatives.join("|"))
            }
        }
    }

    /// Human readable expectation, used in error messages
    pub fn describe(&self) -> String {
        match self {
            ValueRule::Enum(values) => format!("one of [{}]", values.join(", ")),
            ValueRule::Pattern(pattern) => format!("pattern {}", pattern),
            ValueRule::OneOf(branches) => {
                let parts: Vec<String> = branches.iter().map(|b| b.describe()).collect();
                format!("any of ({})", parts.join(" | "))
            }
        }
    }

    fn from_raw(raw: &RawFieldSpec, path: &str) -> std::result::Result<Self, String> {
        let declared = [raw.enumeration.is_some(), raw.pattern.is_some(), raw.one_of.is_some()]
            .iter()
            .filter(|d| **d)
            .count();
        if declared != 1 {
            return Err(format!("{path} must declare exactly one of enum, pattern or oneOf"));
        }

        let rule = if let Some(values) = &raw.enumeration {
            if values.is_empty() {
                return Err(format!("{path} has an empty enum"));
            }
            let values = values
                .iter()
                .map(|v| scalar_to_string(v).ok_or_else(|| format!("{path} enum values must be scalars")))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            ValueRule::Enum(values)
        } else if let Some(pattern) = &raw.pattern {
            let pattern = strip_anchors(pattern);
            if pattern.is_empty() {
                return Err(format!("{path} has an empty pattern"));
            }
            ValueRule::Pattern(pattern.to_string())
        } else {
            let branches = raw.one_of.as_deref().unwrap_or_default();
            if branches.is_empty() {
                return Err(format!("{path} has an empty oneOf"));
            }
            let mut rules = Vec::with_capacity(branches.len());
            for (i, branch) in branches.iter().enumerate() {
                let branch_path = format!("{path}.oneOf[{i}]");
                if branch.stac_map.is_some() {
                    return Err(format!("{branch_path}: stac_map is only allowed on the field itself"));
                }
                rules.push(ValueRule::from_raw(branch, &branch_path)?);
            }
            ValueRule::OneOf(rules)
        };

        anchored(&rule.regex_fragment()).map_err(|e| format!("{path} does not compile: {e}"))?;
        Ok(rule)
    }
}

fn strip_anchors(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
    match pattern.strip_suffix('$') {
        Some(body) => {
            let escapes = body.chars().rev().take_while(|c| *c == '\\').count();
            if escapes % 2 == 0 {
                body
            } else {
                pattern
            }
        }
        None => pattern,
    }
}

fn anchored(fragment: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!("^{fragment}$"))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// =============================================================================
// STAC mappings
// =============================================================================

/// Relation between a raw token and the semantic fields derived from it
#[derive(Debug, Clone)]
pub enum StacMap {
    /// Each raw value maps to a fixed set of semantic values
    Enumeration {
        values: BTreeMap<String, FieldMap>,
        preserve_original_as: Option<String>,
    },
    /// Semantic values are built from the field regex's capture groups
    Capture {
        groups: BTreeMap<String, GroupTemplate>,
        raw: Option<GroupTemplate>,
        preserve_original_as: Option<String>,
    },
}

impl StacMap {
    pub fn preserve_original_as(&self) -> Option<&str> {
        match self {
            StacMap::Enumeration { preserve_original_as, .. }
            | StacMap::Capture { preserve_original_as, .. } => preserve_original_as.as_deref(),
        }
    }

    /// Every semantic field this mapping can produce, excluding the alias
    pub fn targets(&self) -> BTreeSet<&str> {
        match self {
            StacMap::Enumeration { values, .. } => values
                .values()
                .flat_map(|targets| targets.keys().map(String::as_str))
                .collect(),
            StacMap::Capture { groups, .. } => groups.keys().map(String::as_str).collect(),
        }
    }

    fn from_raw(
        raw: &RawStacMap,
        path: &str,
        rule: &ValueRule,
        matcher: &Regex,
    ) -> std::result::Result<Self, String> {
        let preserve_original_as = match &raw.preserve_original_as {
            Some(alias) if alias.trim().is_empty() => {
                return Err(format!("{path}.preserve_original_as is empty"));
            }
            other => other.clone(),
        };

        if let Some(groups) = &raw.groups {
            if raw.values.is_some() {
                return Err(format!("{path} cannot declare both values and groups"));
            }
            return Self::capture_from_raw(groups, raw.raw.as_deref(), preserve_original_as, path, matcher);
        }
        if raw.raw.is_some() {
            return Err(format!("{path}.raw is only meaningful next to groups"));
        }

        let mut values = BTreeMap::new();
        let entries: Vec<(&String, &Value)> = match &raw.values {
            Some(v) => {
                if !raw.shorthand.is_empty() {
                    let keys: Vec<&str> = raw.shorthand.keys().map(String::as_str).collect();
                    return Err(format!("{path} has unexpected keys next to values: {}", keys.join(", ")));
                }
                v.iter().collect()
            }
            None => raw.shorthand.iter().collect(),
        };
        for (token, targets) in entries {
            let Value::Object(targets) = targets else {
                return Err(format!("{path}.{token} must map to an object of semantic fields"));
            };
            let mut mapped = FieldMap::new();
            for (target, value) in targets {
                let value = scalar_to_string(value)
                    .ok_or_else(|| format!("{path}.{token}.{target} must be a scalar"))?;
                mapped.insert(target.clone(), value);
            }
            values.insert(token.clone(), mapped);
        }
        if values.is_empty() {
            return Err(format!("{path} declares no mapping entries"));
        }
        if let ValueRule::Enum(allowed) = rule {
            if let Some(unknown) = values.keys().find(|token| !allowed.contains(token)) {
                return Err(format!("{path} maps {unknown:?}, which is not an allowed value"));
            }
        }

        Ok(StacMap::Enumeration {
            values,
            preserve_original_as,
        })
    }

    fn capture_from_raw(
        groups: &BTreeMap<String, String>,
        raw: Option<&str>,
        preserve_original_as: Option<String>,
        path: &str,
        matcher: &Regex,
    ) -> std::result::Result<Self, String> {
        if groups.is_empty() {
            return Err(format!("{path}.groups is empty"));
        }
        // captures_len counts group 0
        let available = matcher.captures_len();
        let check = |template: &GroupTemplate, at: String| -> std::result::Result<(), String> {
            match template.group_indices().find(|i| *i >= available) {
                Some(i) => Err(format!("{at} references ${i} but the field pattern has {} group(s)", available - 1)),
                None => Ok(()),
            }
        };

        let mut parsed = BTreeMap::new();
        for (target, source) in groups {
            let at = format!("{path}.groups.{target}");
            let template = GroupTemplate::parse(source).map_err(|e| format!("{at}: {e}"))?;
            check(&template, at)?;
            parsed.insert(target.clone(), template);
        }

        let raw = match raw {
            Some(source) => {
                let at = format!("{path}.raw");
                let template = GroupTemplate::parse(source).map_err(|e| format!("{at}: {e}"))?;
                if template.group_indices().any(|i| i == 0) {
                    return Err(format!("{at} cannot reference $0"));
                }
                check(&template, at.clone())?;
                let carried: BTreeSet<usize> = parsed.values().flat_map(|t| t.group_indices()).collect();
                if let Some(i) = template.group_indices().find(|i| !carried.contains(i)) {
                    return Err(format!("{at} references ${i}, which no semantic field carries"));
                }
                Some(template)
            }
            None => None,
        };

        let whole_match_mapped = parsed.values().any(|t| t.group_indices().any(|i| i == 0));
        if raw.is_none() && !whole_match_mapped {
            return Err(format!("{path} cannot be inverted: reference $0 in a group or declare raw"));
        }

        Ok(StacMap::Capture {
            groups: parsed,
            raw,
            preserve_original_as,
        })
    }
}

/// Text with `$N` capture-group references (`$$` for a literal dollar)
#[derive(Debug, Clone)]
pub struct GroupTemplate {
    source: String,
    pieces: Vec<Piece>,
    reverse: Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Group(usize),
}

impl GroupTemplate {
    pub fn parse(source: &str) -> std::result::Result<Self, String> {
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                text.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    text.push('$');
                }
                Some(d) if d.is_ascii_digit() => {
                    if !text.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut text)));
                    }
                    let mut digits = String::new();
                    while let Some(&d) = chars.peek() {
                        if !d.is_ascii_digit() {
                            break;
                        }
                        digits.push(d);
                        chars.next();
                    }
                    let index = digits.parse().map_err(|_| format!("group number {digits} is too large"))?;
                    pieces.push(Piece::Group(index));
                }
                _ => return Err(format!("'$' must be followed by a group number or '$' in {source:?}")),
            }
        }
        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }

        let mut reverse = String::from("^");
        for piece in &pieces {
            match piece {
                Piece::Text(t) => reverse.push_str(&regex::escape(t)),
                Piece::Group(_) => reverse.push_str("(.*?)"),
            }
        }
        reverse.push('$');
        let reverse = Regex::new(&reverse).map_err(|e| e.to_string())?;

        Ok(Self {
            source: source.to_string(),
            pieces,
            reverse,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Group numbers in the order they are referenced (repeats included)
    pub fn group_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.pieces.iter().filter_map(|p| match p {
            Piece::Group(i) => Some(*i),
            Piece::Text(_) => None,
        })
    }

    /// Substitute group references; `None` if a referenced group is unavailable
    pub fn render<'a>(&self, group: impl Fn(usize) -> Option<&'a str>) -> Option<String> {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(t) => out.push_str(t),
                Piece::Group(i) => out.push_str(group(*i)?),
            }
        }
        Some(out)
    }

    /// Regex matching any rendering of this template; one capture per group reference
    pub(crate) fn reverse(&self) -> &Regex {
        &self.reverse
    }
}

// =============================================================================
// Field specs
// =============================================================================

/// Contract for one filename token
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    rule: ValueRule,
    required: bool,
    description: Option<String>,
    translation: Option<StacMap>,
    matcher: Regex,
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(&self) -> &ValueRule {
        &self.rule
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn translation(&self) -> Option<&StacMap> {
        self.translation.as_ref()
    }

    /// Anchored regex for this field's rule alone
    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    /// Whether `value` is a valid token for this field
    pub fn accepts(&self, value: &str) -> bool {
        self.matcher.is_match(value)
    }
}

// =============================================================================
// Schema documents
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawSchemaDocument {
    schema_id: Option<String>,
    schema_version: Option<String>,
    family: Option<String>,
    status: Option<SchemaStatus>,
    description: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, RawFieldSpec>,
    required: Option<Vec<String>>,
    template: Option<String>,
    #[serde(default)]
    examples: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFieldSpec {
    #[serde(rename = "enum")]
    enumeration: Option<Vec<Value>>,
    pattern: Option<String>,
    #[serde(rename = "oneOf")]
    one_of: Option<Vec<RawFieldSpec>>,
    description: Option<String>,
    stac_map: Option<RawStacMap>,
}

#[derive(Debug, Deserialize)]
struct RawStacMap {
    values: Option<BTreeMap<String, Value>>,
    groups: Option<BTreeMap<String, String>>,
    raw: Option<String>,
    preserve_original_as: Option<String>,
    #[serde(flatten)]
    shorthand: BTreeMap<String, Value>,
}

/// A validated filename schema
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    schema_id: String,
    family: String,
    version: SchemaVersion,
    status: SchemaStatus,
    description: Option<String>,
    fields: BTreeMap<String, FieldSpec>,
    required: BTreeSet<String>,
    template: Template,
    examples: Vec<String>,
    checksum: Checksum,
    compiled: OnceLock<std::result::Result<CompiledSchema, String>>,
}

impl SchemaDocument {
    /// Load a schema from a JSON file (a leading UTF-8 BOM is tolerated)
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse and validate a schema from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Validate a schema from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let checksum = Checksum::from_json(&value);
        let hint = value
            .get("schema_id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        let raw: RawSchemaDocument =
            serde_json::from_value(value).map_err(|e| SchemaError::malformed(&hint, e.to_string()))?;
        Self::build(raw, checksum)
    }

    fn build(raw: RawSchemaDocument, checksum: Checksum) -> Result<Self> {
        let schema_id = match raw.schema_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(SchemaError::malformed("<unknown>", "missing schema_id")),
        };
        let malformed = |reason: String| SchemaError::malformed(&schema_id, reason);

        let version = raw
            .schema_version
            .as_deref()
            .ok_or_else(|| malformed("missing schema_version".to_string()))?;
        let version = SchemaVersion::parse(version)
            .map_err(|e| malformed(format!("invalid schema_version {version:?}: {e}")))?;

        let template_src = raw
            .template
            .as_deref()
            .ok_or_else(|| malformed("missing template".to_string()))?;
        let template =
            Template::parse(template_src).map_err(|e: TemplateError| malformed(format!("template: {e}")))?;

        let placeholders = template.placeholders();
        if let Some(undefined) = placeholders.iter().find(|p| !raw.fields.contains_key(*p)) {
            return Err(malformed(format!("template placeholder {{{undefined}}} has no field definition")));
        }
        if let Some(unused) = raw.fields.keys().find(|f| !placeholders.contains(*f)) {
            return Err(malformed(format!("field '{unused}' is never used by the template")));
        }
        if let Some(bad) = raw.fields.keys().find(|f| !is_field_name(f)) {
            return Err(malformed(format!("field name '{bad}' must match [A-Za-z][A-Za-z0-9_]*")));
        }

        let compulsory = template.compulsory_placeholders();
        let mut required = compulsory.clone();
        if let Some(listed) = &raw.required {
            for name in listed {
                if !raw.fields.contains_key(name) {
                    return Err(malformed(format!("required field '{name}' is not defined under fields")));
                }
                if !compulsory.contains(name) {
                    return Err(malformed(format!(
                        "required field '{name}' only appears inside optional groups"
                    )));
                }
                required.insert(name.clone());
            }
        }

        let mut fields = BTreeMap::new();
        // Semantic field name to the template field whose mapping writes it
        let mut producers: BTreeMap<String, String> = BTreeMap::new();
        for (name, spec) in &raw.fields {
            let path = format!("fields.{name}");
            let rule = ValueRule::from_raw(spec, &path).map_err(&malformed)?;
            let matcher = anchored(&rule.regex_fragment()).map_err(|e| malformed(format!("{path}: {e}")))?;
            let translation = match &spec.stac_map {
                Some(map) => {
                    let map = StacMap::from_raw(map, &format!("{path}.stac_map"), &rule, &matcher)
                        .map_err(&malformed)?;
                    let clash = map
                        .preserve_original_as()
                        .into_iter()
                        .chain(map.targets())
                        .find(|target| placeholders.contains(*target));
                    if let Some(clash) = clash {
                        return Err(malformed(format!(
                            "{path}.stac_map writes '{clash}', which is a template field"
                        )));
                    }
                    for target in map.preserve_original_as().into_iter().chain(map.targets()) {
                        if let Some(other) = producers.insert(target.to_string(), name.clone()) {
                            return Err(malformed(format!(
                                "{path}.stac_map writes '{target}', which fields.{other} also writes"
                            )));
                        }
                    }
                    Some(map)
                }
                None => None,
            };
            fields.insert(
                name.clone(),
                FieldSpec {
                    name: name.clone(),
                    rule,
                    required: required.contains(name),
                    description: spec.description.clone(),
                    translation,
                    matcher,
                },
            );
        }

        let family = match raw.family.as_deref().map(str::trim) {
            Some(f) if !f.is_empty() => f.to_uppercase(),
            _ => family_from_id(&schema_id),
        };

        let examples = raw
            .examples
            .iter()
            .filter_map(|e| e.as_str().map(str::to_string))
            .collect();

        let doc = Self {
            schema_id,
            family,
            version,
            status: raw.status.unwrap_or(SchemaStatus::Current),
            description: raw.description,
            fields,
            required,
            template,
            examples,
            checksum,
            compiled: OnceLock::new(),
        };

        // Field patterns are fine alone but may still clash once embedded,
        // e.g. a named group reusing another field's name
        let compiled = CompiledSchema::compile(&doc)
            .map_err(|e| SchemaError::malformed(&doc.schema_id, format!("template does not compile: {e}")))?;
        let _ = doc.compiled.set(Ok(compiled));
        Ok(doc)
    }

    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }

    pub fn status(&self) -> &SchemaStatus {
        &self.status
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldSpec> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// `schema_id@version`, unique within a registry
    pub fn key(&self) -> String {
        format!("{}@{}", self.schema_id, self.version)
    }

    /// Compiled matcher and assembly plan, built during construction and cached
    pub fn compiled(&self) -> Result<&CompiledSchema> {
        self.compiled
            .get_or_init(|| {
                tracing::debug!(schema = %self.key(), "compiling template");
                CompiledSchema::compile(self).map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|reason| SchemaError::malformed(&self.schema_id, reason.clone()))
    }

    /// Summary of the schema for listings and the CLI
    pub fn describe(&self) -> SchemaDescription {
        SchemaDescription {
            schema_id: self.schema_id.clone(),
            family: self.family.clone(),
            schema_version: self.version.clone(),
            status: self.status.clone(),
            description: self.description.clone(),
            template: self.template.source().to_string(),
            fields_order: self.template.fields_order(),
            fields: self
                .fields
                .iter()
                .map(|(name, spec)| {
                    let field = FieldDescription {
                        rule: spec.rule.describe(),
                        required: spec.required,
                        description: spec.description.clone(),
                        maps_to: spec
                            .translation
                            .as_ref()
                            .map(|m| m.targets().into_iter().map(str::to_string).collect())
                            .unwrap_or_default(),
                    };
                    (name.clone(), field)
                })
                .collect(),
            examples: self.examples.clone(),
            checksum: self.checksum.to_string(),
        }
    }
}

/// Serializable schema summary
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDescription {
    pub schema_id: String,
    pub family: String,
    pub schema_version: SchemaVersion,
    pub status: SchemaStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub template: String,
    pub fields_order: Vec<String>,
    pub fields: BTreeMap<String, FieldDescription>,
    pub examples: Vec<String>,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDescription {
    pub rule: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub maps_to: Vec<String>,
}

fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Family key derived from the last `:` or `.` segment of a schema id
pub fn family_from_id(schema_id: &str) -> String {
    schema_id
        .rsplit(|c| c == ':' || c == '.')
        .next()
        .unwrap_or(schema_id)
        .to_uppercase()
}
