//! Filename transcoding
//!
//! [`Transcoder`] is the public surface: [`Transcoder::parse`] turns a
//! filename into fields, [`Transcoder::assemble`] turns fields back into a
//! filename, and [`Transcoder::validate_examples`] checks that a schema's own
//! examples survive the round trip.

use serde::Serialize;

use crate::compiler::{CompiledSchema, Mismatch};
use crate::error::{Result, SchemaError};
use crate::registry::{SchemaRegistry, Scope};
use crate::schema::{FieldMap, SchemaDocument, SchemaStatus};
use crate::translate;
use crate::version::SchemaVersion;

/// A successful parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub schema_id: String,
    pub family: String,
    pub version: SchemaVersion,
    pub status: SchemaStatus,
    /// Raw tokens plus every semantic field derived from them
    pub fields: FieldMap,
}

/// How one example fared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExampleStatus {
    Passed,
    ParseFailed { error: String },
    AssembleFailed { error: String },
    /// Parsed and assembled, but to a different string
    Mismatch { assembled: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleOutcome {
    pub example: String,
    #[serde(flatten)]
    pub status: ExampleStatus,
}

/// Round-trip results for every example of one schema
#[derive(Debug, Clone, Serialize)]
pub struct ExampleReport {
    pub schema_id: String,
    pub version: SchemaVersion,
    pub outcomes: Vec<ExampleOutcome>,
    /// Examples that automatic parsing would attribute to another schema
    pub warnings: Vec<String>,
}

impl ExampleReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status == ExampleStatus::Passed).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExampleOutcome> {
        self.outcomes.iter().filter(|o| o.status != ExampleStatus::Passed)
    }

    /// No failures and no warnings
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none() && self.warnings.is_empty()
    }
}

/// Parses and assembles filenames against a registry
#[derive(Debug)]
pub struct Transcoder {
    registry: SchemaRegistry,
}

impl Transcoder {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Parse `filename` with the first candidate in `scope` that matches it whole
    pub fn parse(&self, filename: &str, scope: Scope<'_>) -> Result<ParseResult> {
        let mut nearest: Option<Mismatch> = None;

        for doc in self.registry.candidates(scope)? {
            let Some(compiled) = compiled_or_warn(doc) else {
                continue;
            };
            tracing::trace!(schema = %doc.key(), filename, "trying schema");

            if let Some(tokens) = compiled.extract(filename) {
                tracing::debug!(schema = %doc.key(), filename, "filename matched");
                return Ok(ParseResult {
                    schema_id: doc.schema_id().to_string(),
                    family: doc.family().to_string(),
                    version: doc.version().clone(),
                    status: doc.status().clone(),
                    fields: translate::expand_all(doc, &tokens),
                });
            }

            if let Some(miss) = compiled.explain_mismatch(filename) {
                if nearest.as_ref().map_or(true, |best| miss.offset > best.offset) {
                    nearest = Some(miss);
                }
            }
        }

        Err(SchemaError::NoSchemaMatched {
            filename: filename.to_string(),
            nearest,
        })
    }

    /// Build a filename from raw tokens and/or semantic fields.
    ///
    /// A document or family scope assembles with exactly that schema (a
    /// family's resolved default when no version is pinned). [`Scope::All`]
    /// selects automatically among every family's default.
    pub fn assemble(&self, fields: &FieldMap, scope: Scope<'_>) -> Result<String> {
        match scope {
            Scope::All => self.assemble_auto(fields),
            _ => {
                let targets = self.registry.defaults(scope)?;
                let doc = targets.first().ok_or_else(|| not_found(&scope))?;
                let tokens = resolve_tokens(doc, fields)?;
                emit(doc, &tokens)
            }
        }
    }

    fn assemble_auto(&self, fields: &FieldMap) -> Result<String> {
        let defaults = self.registry.defaults(Scope::All)?;

        // Shortlist by the first compulsory field alone
        let mut shortlisted = Vec::new();
        for &doc in &defaults {
            let Some(compiled) = compiled_or_warn(doc) else {
                continue;
            };
            let Some(spec) = compiled.first_compulsory().and_then(|anchor| doc.field(anchor)) else {
                continue;
            };
            match translate::collapse(doc.schema_id(), spec, fields) {
                Ok(Some(raw)) if spec.accepts(&raw) => shortlisted.push(doc),
                Ok(_) => {}
                Err(err) => tracing::trace!(schema = %doc.key(), error = %err, "anchor not resolvable"),
            }
        }

        let mut satisfiable = Vec::new();
        let mut first_error = None;
        for doc in shortlisted {
            match resolve_tokens(doc, fields) {
                Ok(tokens) => satisfiable.push((doc, tokens)),
                Err(err) => {
                    tracing::debug!(schema = %doc.key(), error = %err, "candidate not satisfiable");
                    first_error.get_or_insert(err);
                }
            }
        }

        match satisfiable.as_slice() {
            [(doc, tokens)] => {
                tracing::debug!(schema = %doc.key(), "selected schema for assembly");
                emit(doc, tokens)
            }
            [] => Err(match first_error {
                Some(err) => err,
                None => unanchored(&defaults),
            }),
            several => Err(SchemaError::AmbiguousSchemaSelection {
                candidates: several.iter().map(|(doc, _)| doc.key()).collect(),
            }),
        }
    }

    /// Parse then re-assemble every example of `doc`, collecting every outcome
    pub fn validate_examples(&self, doc: &SchemaDocument) -> ExampleReport {
        let mut outcomes = Vec::with_capacity(doc.examples().len());
        let mut warnings = Vec::new();

        for example in doc.examples() {
            let status = match self.parse(example, Scope::Document(doc)) {
                Err(err) => ExampleStatus::ParseFailed { error: err.to_string() },
                Ok(parsed) => match self.assemble(&parsed.fields, Scope::Document(doc)) {
                    Err(err) => ExampleStatus::AssembleFailed { error: err.to_string() },
                    Ok(assembled) if assembled == *example => ExampleStatus::Passed,
                    Ok(assembled) => ExampleStatus::Mismatch { assembled },
                },
            };

            if status == ExampleStatus::Passed {
                if let Ok(auto) = self.parse(example, Scope::All) {
                    if auto.schema_id != doc.schema_id() || &auto.version != doc.version() {
                        warnings.push(format!(
                            "{example} is attributed to {}@{} when parsed without a scope",
                            auto.schema_id, auto.version
                        ));
                    }
                }
            }

            outcomes.push(ExampleOutcome {
                example: example.clone(),
                status,
            });
        }

        ExampleReport {
            schema_id: doc.schema_id().to_string(),
            version: doc.version().clone(),
            outcomes,
            warnings,
        }
    }

    /// Example reports for every registered document, by family then version
    pub fn validate_all(&self) -> Vec<ExampleReport> {
        self.registry.iter().map(|doc| self.validate_examples(doc)).collect()
    }
}

fn compiled_or_warn(doc: &SchemaDocument) -> Option<&CompiledSchema> {
    match doc.compiled() {
        Ok(compiled) => Some(compiled),
        Err(err) => {
            tracing::warn!(schema = %doc.key(), error = %err, "skipping schema that does not compile");
            None
        }
    }
}

/// Collapse supplied fields to raw tokens and check them against the field rules
fn resolve_tokens(doc: &SchemaDocument, fields: &FieldMap) -> Result<FieldMap> {
    let tokens = translate::collapse_all(doc, fields)?;
    let order = doc.template().fields_order();

    if let Some(missing) = order
        .iter()
        .find(|name| doc.required().contains(*name) && !tokens.contains_key(*name))
    {
        return Err(SchemaError::MissingRequiredField {
            schema_id: doc.schema_id().to_string(),
            field: missing.clone(),
        });
    }

    for name in &order {
        let (Some(value), Some(spec)) = (tokens.get(name), doc.field(name)) else {
            continue;
        };
        if !spec.accepts(value) {
            return Err(SchemaError::InvalidFieldValue {
                schema_id: doc.schema_id().to_string(),
                field: name.clone(),
                value: value.clone(),
                expected: spec.rule().describe(),
            });
        }
    }
    Ok(tokens)
}

/// Run the assembly plan and check the result against the schema's own matcher
fn emit(doc: &SchemaDocument, tokens: &FieldMap) -> Result<String> {
    let compiled = doc.compiled()?;
    let filename = compiled
        .render(tokens)
        .map_err(|field| SchemaError::MissingRequiredField {
            schema_id: doc.schema_id().to_string(),
            field,
        })?;

    if compiled.extract(&filename).is_none() {
        tracing::error!(schema = %doc.key(), filename = %filename, "assembled filename fails its own schema");
        return Err(SchemaError::AssemblyProducedInvalidFilename {
            schema_id: doc.schema_id().to_string(),
            filename,
        });
    }
    Ok(filename)
}

fn unanchored(defaults: &[&SchemaDocument]) -> SchemaError {
    let anchor = defaults.first().and_then(|doc| {
        let compiled = doc.compiled().ok()?;
        Some((doc.schema_id(), compiled.first_compulsory()?))
    });
    match anchor {
        Some((schema_id, field)) => SchemaError::MissingRequiredField {
            schema_id: schema_id.to_string(),
            field: field.to_string(),
        },
        None => SchemaError::NotFound {
            name: "schema".to_string(),
            version: "any".to_string(),
        },
    }
}

fn not_found(scope: &Scope<'_>) -> SchemaError {
    let (name, version) = match scope {
        Scope::Family { name, version } => (name.to_string(), version.unwrap_or("any").to_string()),
        Scope::Document(doc) => (doc.schema_id().to_string(), doc.version().to_string()),
        Scope::All => ("schema".to_string(), "any".to_string()),
    };
    SchemaError::NotFound { name, version }
}
