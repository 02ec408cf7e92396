//! Error types for schema loading, parsing and assembly

use thiserror::Error;

use crate::compiler::Mismatch;

/// Result type for naming operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Naming errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Malformed schema {schema_id}: {reason}")]
    MalformedSchema { schema_id: String, reason: String },

    #[error("No schema matched {filename:?}{}", nearest_suffix(.nearest))]
    NoSchemaMatched {
        filename: String,
        nearest: Option<Mismatch>,
    },

    #[error("Missing required field '{field}' for schema {schema_id}")]
    MissingRequiredField { schema_id: String, field: String },

    #[error("Ambiguous schema selection, candidates: {}", .candidates.join(", "))]
    AmbiguousSchemaSelection { candidates: Vec<String> },

    #[error("Cannot resolve field '{field}' of schema {schema_id}: {reason}")]
    AmbiguousOrUnknownMapping {
        schema_id: String,
        field: String,
        reason: String,
    },

    #[error("Schema {schema_id} assembled {filename:?}, which its own template rejects")]
    AssemblyProducedInvalidFilename { schema_id: String, filename: String },

    #[error("Family {family} has more than one current version: {}", .versions.join(", "))]
    AmbiguousCurrentVersion { family: String, versions: Vec<String> },

    #[error("Invalid value {value:?} for field '{field}' of schema {schema_id}: expected {expected}")]
    InvalidFieldValue {
        schema_id: String,
        field: String,
        value: String,
        expected: String,
    },

    #[error("Unknown family: {0}")]
    UnknownFamily(String),

    #[error("Schema not found: {name} version {version}")]
    NotFound { name: String, version: String },

    #[error("Schema already exists with different content: {name} version {version}")]
    AlreadyExists { name: String, version: String },

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl SchemaError {
    pub(crate) fn malformed(schema_id: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::MalformedSchema {
            schema_id: schema_id.into(),
            reason: reason.into(),
        }
    }
}

fn nearest_suffix(nearest: &Option<Mismatch>) -> String {
    match nearest {
        Some(m) => format!(" (nearest match: {m})"),
        None => String::new(),
    }
}
