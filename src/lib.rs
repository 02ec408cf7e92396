//! EO Naming
//!
//! Schema-driven conversion between Earth-observation product filenames and
//! field dictionaries. Every product line is described by a JSON schema
//! document; no code changes per product.
//!
//! ## Features
//!
//! - **Parsing**: match a filename against a template compiled to a regex and
//!   extract its tokens
//! - **Assembly**: rebuild a filename from tokens or from semantic fields,
//!   with automatic schema selection
//! - **STAC mapping**: translate raw tokens to semantic (STAC) fields and back
//! - **Versioned families**: several schema versions per product line, with
//!   `current`/`deprecated` lifecycle tags
//! - **Self-validation**: every schema's examples must survive a round trip
//!
//! ## Schema documents
//!
//! ```text
//! {
//!   "schema_id": "esa:sentinel:s2",
//!   "schema_version": "1.0.0",
//!   "status": "current",
//!   "template": "{mission}_{product_type}_{sensing_time}_..._{generation_time}[.{extension}]",
//!   "fields": {
//!     "mission": {"enum": ["S2A", "S2B", "S2C"], "stac_map": {...}},
//!     ...
//!   },
//!   "examples": ["S2B_MSIL2A_20241123T224759_N0511_R101_T03VUL_20241123T230829.SAFE"]
//! }
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use eo_naming::{Scope, SchemaRegistry, Transcoder};
//!
//! let transcoder = Transcoder::new(SchemaRegistry::bundled()?);
//! let parsed = transcoder.parse(
//!     "S2B_MSIL2A_20241123T224759_N0511_R101_T03VUL_20241123T230829.SAFE",
//!     Scope::All,
//! )?;
//! let filename = transcoder.assemble(&parsed.fields, Scope::family(&parsed.family))?;
//! # Ok::<(), eo_naming::SchemaError>(())
//! ```

pub mod checksum;
pub mod compiler;
pub mod config;
pub mod error;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod template;
pub mod transcoder;
pub mod translate;
pub mod version;

pub use checksum::Checksum;
pub use compiler::{CompiledSchema, EmitStep, Mismatch};
pub use config::NamingConfig;
pub use error::{Result, SchemaError};
pub use loader::{LoadFilter, LoadReport};
pub use registry::{SchemaRegistry, Scope};
pub use schema::{FieldMap, FieldSpec, SchemaDocument, SchemaStatus, StacMap, ValueRule};
pub use template::{Segment, Template, TemplateError};
pub use transcoder::{ExampleOutcome, ExampleReport, ExampleStatus, ParseResult, Transcoder};
pub use version::SchemaVersion;
