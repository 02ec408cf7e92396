//! Schema Loading
//!
//! Reads schema documents from a directory tree or from the set embedded in
//! the binary and inserts them into a [`SchemaRegistry`]. Each file is
//! isolated: a malformed document is recorded in the [`LoadReport`] and
//! loading carries on with the rest.

use std::fs;
use std::path::Path;

use include_dir::{include_dir, Dir};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::registry::SchemaRegistry;
use crate::schema::SchemaDocument;

static BUNDLED_SCHEMAS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/schemas");

/// Schemas shipped with the crate
pub fn bundled_schemas() -> &'static Dir<'static> {
    &BUNDLED_SCHEMAS
}

/// Which files count as schema documents
#[derive(Debug, Clone)]
pub struct LoadFilter {
    /// Only `.json` files whose name contains this are loaded (empty: all)
    pub file_filter: String,
    /// Skip files whose path relative to the root starts with one of these
    pub skip_prefixes: Vec<String>,
}

impl Default for LoadFilter {
    fn default() -> Self {
        Self {
            file_filter: "filename_v".to_string(),
            skip_prefixes: vec![
                "target/".to_string(),
                ".git/".to_string(),
                "node_modules/".to_string(),
            ],
        }
    }
}

impl From<&RegistryConfig> for LoadFilter {
    fn from(config: &RegistryConfig) -> Self {
        Self {
            file_filter: config.file_filter.clone(),
            skip_prefixes: config.skip_prefixes.clone(),
        }
    }
}

impl LoadFilter {
    fn accepts(&self, relative: &Path) -> bool {
        if relative.extension().map(|e| e != "json").unwrap_or(true) {
            return false;
        }
        let name = relative.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        if !self.file_filter.is_empty() && !name.contains(self.file_filter.as_str()) {
            return false;
        }
        let relative_str = relative.to_string_lossy().replace('\\', "/");
        !self.skip_prefixes.iter().any(|p| relative_str.starts_with(p.as_str()))
    }
}

/// A file that could not be registered
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub path: String,
    pub error: String,
}

/// Outcome of loading a batch of schema files
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// `schema_id@version` of each newly registered document
    pub loaded: Vec<String>,
    /// Files identical to an already registered document
    pub unchanged: Vec<String>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, registry: &mut SchemaRegistry, path: String, parsed: Result<SchemaDocument>) {
        let outcome = parsed.and_then(|doc| {
            let key = doc.key();
            registry.insert(doc).map(|added| (key, added))
        });
        match outcome {
            Ok((key, true)) => self.loaded.push(key),
            Ok((_, false)) => self.unchanged.push(path),
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "skipping schema file");
                self.failures.push(LoadFailure {
                    path,
                    error: err.to_string(),
                });
            }
        }
    }
}

/// Load every matching schema file under `root`.
///
/// Symlinks are followed. Only an unreadable `root` fails the call; a walk
/// error further down is recorded against the offending path.
pub fn load_dir(registry: &mut SchemaRegistry, root: &Path, filter: &LoadFilter) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(err.into()),
            Err(err) => {
                let path = err.path().unwrap_or(root).display().to_string();
                tracing::warn!(path = %path, error = %err, "skipping unreadable entry");
                report.failures.push(LoadFailure {
                    path,
                    error: err.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if !filter.accepts(relative) {
            continue;
        }

        let parsed = fs::read_to_string(path)
            .map_err(SchemaError::from)
            .and_then(|content| SchemaDocument::from_json(&content));
        report.record(registry, path.display().to_string(), parsed);
    }

    tracing::debug!(
        root = %root.display(),
        loaded = report.loaded.len(),
        failed = report.failures.len(),
        "loaded schema directory"
    );
    Ok(report)
}

/// Load every matching schema file from an embedded directory
pub fn load_embedded(registry: &mut SchemaRegistry, dir: &Dir<'_>, filter: &LoadFilter) -> LoadReport {
    let mut files = Vec::new();
    collect_embedded_files(dir, &mut files);
    files.sort_by(|a, b| a.0.cmp(b.0));

    let mut report = LoadReport::default();
    for (path, content) in files {
        if !filter.accepts(path) {
            continue;
        }
        let parsed = match content {
            Some(text) => SchemaDocument::from_json(text),
            None => Err(SchemaError::malformed("<unknown>", "file is not valid UTF-8")),
        };
        report.record(registry, path.display().to_string(), parsed);
    }
    report
}

fn collect_embedded_files<'a>(dir: &'a Dir<'_>, files: &mut Vec<(&'a Path, Option<&'a str>)>) {
    for file in dir.files() {
        files.push((file.path(), file.contents_utf8()));
    }
    for subdir in dir.dirs() {
        collect_embedded_files(subdir, files);
    }
}
