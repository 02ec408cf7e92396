//! Schema Registry
//!
//! Indexes validated schema documents by family and version, and decides
//! which document(s) a [`Scope`] refers to. Documents are immutable once
//! inserted; the compiled matcher of each is built lazily and cached on the
//! document itself, so a registry can be shared between threads by reference.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, SchemaError};
use crate::loader::{self, LoadFilter};
use crate::schema::SchemaDocument;
use crate::version::SchemaVersion;

/// Which schemas an operation may consider
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// Every family, in family order
    All,
    /// One family; with a version pinned, exactly that document
    Family { name: &'a str, version: Option<&'a str> },
    /// A specific document, bypassing resolution
    Document(&'a SchemaDocument),
}

impl<'a> Scope<'a> {
    pub fn family(name: &'a str) -> Self {
        Scope::Family { name, version: None }
    }

    pub fn family_version(name: &'a str, version: &'a str) -> Self {
        Scope::Family {
            name,
            version: Some(version),
        }
    }
}

/// Validated schema documents grouped by family
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    documents: Vec<SchemaDocument>,
    /// `schema_id@version` to document index
    by_key: HashMap<String, usize>,
    /// Upper-cased family name to document indices
    families: BTreeMap<String, Vec<usize>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the schemas shipped with this crate
    pub fn bundled() -> Result<Self> {
        let mut registry = Self::new();
        let report = loader::load_embedded(&mut registry, loader::bundled_schemas(), &LoadFilter::default());
        for failure in &report.failures {
            tracing::warn!(path = %failure.path, error = %failure.error, "bundled schema rejected");
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Add a document.
    ///
    /// Returns `false` when an identical document (same id, version and
    /// checksum) is already registered. A different document under the same
    /// id and version, or the same family and version, is rejected.
    pub fn insert(&mut self, doc: SchemaDocument) -> Result<bool> {
        let key = doc.key();
        if let Some(&index) = self.by_key.get(&key) {
            let existing = &self.documents[index];
            if existing.checksum() == doc.checksum() {
                tracing::debug!(schema = %key, "identical schema already registered");
                return Ok(false);
            }
            return Err(SchemaError::AlreadyExists {
                name: doc.schema_id().to_string(),
                version: doc.version().to_string(),
            });
        }

        let family = doc.family().to_string();
        let clash = self
            .families
            .get(&family)
            .into_iter()
            .flatten()
            .any(|&i| self.documents[i].version() == doc.version());
        if clash {
            return Err(SchemaError::AlreadyExists {
                name: family,
                version: doc.version().to_string(),
            });
        }

        tracing::debug!(
            schema = %key,
            family = %family,
            status = %doc.status(),
            checksum = %doc.checksum().short(),
            "registered schema"
        );
        let index = self.documents.len();
        self.documents.push(doc);
        self.by_key.insert(key, index);
        self.families.entry(family).or_default().push(index);
        Ok(true)
    }

    /// Family names, sorted
    pub fn families(&self) -> Vec<&str> {
        self.families.keys().map(String::as_str).collect()
    }

    /// All versions of a family, oldest first
    pub fn versions(&self, family: &str) -> Result<Vec<&SchemaDocument>> {
        let key = family.trim().to_uppercase();
        let indices = self
            .families
            .get(&key)
            .ok_or_else(|| SchemaError::UnknownFamily(family.to_string()))?;
        let mut docs: Vec<&SchemaDocument> = indices.iter().map(|&i| &self.documents[i]).collect();
        docs.sort_by(|a, b| a.version().cmp(b.version()));
        Ok(docs)
    }

    /// Every document, by family then version
    pub fn iter(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.families.keys().flat_map(|family| self.versions(family).unwrap_or_default())
    }

    /// The document a family (and optional exact version) refers to.
    ///
    /// Without a version: the unique `current` document, or the highest
    /// version when none is current. Several `current` documents is a
    /// configuration conflict.
    pub fn resolve(&self, family: &str, version: Option<&str>) -> Result<&SchemaDocument> {
        let docs = self.versions(family)?;
        match version {
            Some(requested) => {
                let wanted = SchemaVersion::parse(requested)
                    .map_err(|_| SchemaError::InvalidVersion(requested.to_string()))?;
                docs.into_iter()
                    .find(|d| d.version() == &wanted)
                    .ok_or_else(|| SchemaError::NotFound {
                        name: family.to_string(),
                        version: requested.to_string(),
                    })
            }
            None => default_version(family, &docs),
        }
    }

    /// Look up a document by schema id; without a version, resolved like a family
    pub fn get(&self, schema_id: &str, version: Option<&str>) -> Result<&SchemaDocument> {
        let mut docs: Vec<&SchemaDocument> =
            self.documents.iter().filter(|d| d.schema_id() == schema_id).collect();
        let not_found = || SchemaError::NotFound {
            name: schema_id.to_string(),
            version: version.unwrap_or("any").to_string(),
        };
        if docs.is_empty() {
            return Err(not_found());
        }
        docs.sort_by(|a, b| a.version().cmp(b.version()));

        match version {
            Some(requested) => {
                let wanted = SchemaVersion::parse(requested)
                    .map_err(|_| SchemaError::InvalidVersion(requested.to_string()))?;
                docs.into_iter().find(|d| d.version() == &wanted).ok_or_else(not_found)
            }
            None => default_version(schema_id, &docs),
        }
    }

    /// Candidate documents for `scope`, in search order.
    ///
    /// Families ascending by name; within a family the resolved default
    /// first, then the remaining versions newest first.
    pub fn candidates<'r>(&'r self, scope: Scope<'r>) -> Result<Vec<&'r SchemaDocument>> {
        match scope {
            Scope::Document(doc) => Ok(vec![doc]),
            Scope::Family {
                name,
                version: Some(version),
            } => Ok(vec![self.resolve(name, Some(version))?]),
            Scope::Family { name, version: None } => self.family_order(name),
            Scope::All => {
                let mut out = Vec::with_capacity(self.documents.len());
                for family in self.families.keys() {
                    out.extend(self.family_order(family)?);
                }
                Ok(out)
            }
        }
    }

    /// Each family's resolved default, for automatic assembly.
    ///
    /// Families with conflicting `current` tags are left out with a warning.
    pub fn defaults<'r>(&'r self, scope: Scope<'r>) -> Result<Vec<&'r SchemaDocument>> {
        match scope {
            Scope::Document(doc) => Ok(vec![doc]),
            Scope::Family { name, version } => Ok(vec![self.resolve(name, version)?]),
            Scope::All => {
                let mut out = Vec::with_capacity(self.families.len());
                for family in self.families.keys() {
                    match self.resolve(family, None) {
                        Ok(doc) => out.push(doc),
                        Err(err @ SchemaError::AmbiguousCurrentVersion { .. }) => {
                            tracing::warn!(family = %family, error = %err, "family skipped for automatic selection");
                        }
                        Err(err) => return Err(err),
                    }
                }
                Ok(out)
            }
        }
    }

    fn family_order(&self, family: &str) -> Result<Vec<&SchemaDocument>> {
        let mut docs = self.versions(family)?;
        docs.reverse();
        match default_version(family, &docs) {
            Ok(default) => {
                let key = default.key();
                docs.retain(|d| d.key() != key);
                docs.insert(0, default);
            }
            Err(err) => {
                tracing::warn!(family = %family, error = %err, "falling back to newest-first order");
            }
        }
        Ok(docs)
    }
}

fn default_version<'r>(label: &str, docs: &[&'r SchemaDocument]) -> Result<&'r SchemaDocument> {
    let current: Vec<&SchemaDocument> = docs.iter().copied().filter(|d| d.status().is_current()).collect();
    match current.as_slice() {
        [only] => Ok(*only),
        [] => docs
            .iter()
            .copied()
            .max_by(|a, b| a.version().cmp(b.version()))
            .ok_or_else(|| SchemaError::UnknownFamily(label.to_string())),
        several => Err(SchemaError::AmbiguousCurrentVersion {
            family: label.to_uppercase(),
            versions: several.iter().map(|d| d.version().to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn schema(id: &str, version: &str, status: &str) -> Value {
        json!({
            "schema_id": id,
            "schema_version": version,
            "status": status,
            "template": "ABC_{id}",
            "fields": {"id": {"pattern": "[0-9]+"}}
        })
    }

    fn registry(docs: &[Value]) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        for doc in docs {
            registry.insert(SchemaDocument::from_value(doc.clone()).unwrap()).unwrap();
        }
        registry
    }

    fn versions(docs: &[&SchemaDocument]) -> Vec<String> {
        docs.iter().map(|d| d.version().to_string()).collect()
    }

    #[test]
    fn test_create_registry() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.families().is_empty());
        assert!(matches!(registry.resolve("abc", None), Err(SchemaError::UnknownFamily(_))));
    }

    #[test]
    fn test_current_preferred_over_newer() {
        let registry = registry(&[
            schema("x:abc", "1.0.0", "current"),
            schema("x:abc", "2.0.0", "draft"),
            schema("x:abc", "0.5.0", "deprecated"),
        ]);
        assert_eq!(registry.resolve("abc", None).unwrap().version().to_string(), "1.0.0");
        assert_eq!(registry.resolve("ABC", Some("v2.0")).unwrap().status().as_str(), "draft");

        let order = registry.candidates(Scope::family("abc")).unwrap();
        assert_eq!(versions(&order), vec!["1.0.0", "2.0.0", "0.5.0"]);
    }

    #[test]
    fn test_highest_version_without_current() {
        let registry = registry(&[
            schema("x:abc", "1.0.0", "deprecated"),
            schema("x:abc", "1.10.0", "deprecated"),
            schema("x:abc", "1.2.0", "deprecated"),
        ]);
        assert_eq!(registry.resolve("abc", None).unwrap().version().to_string(), "1.10.0");
    }

    #[test]
    fn test_ambiguous_current() {
        let registry = registry(&[schema("x:abc", "1.0.0", "current"), schema("x:abc", "2.0.0", "current")]);
        match registry.resolve("abc", None) {
            Err(SchemaError::AmbiguousCurrentVersion { family, versions }) => {
                assert_eq!(family, "ABC");
                assert_eq!(versions, vec!["1.0.0", "2.0.0"]);
            }
            other => panic!("expected AmbiguousCurrentVersion, got {:?}", other.map(|d| d.key())),
        }
        // Search order still works, newest first
        let order = registry.candidates(Scope::All).unwrap();
        assert_eq!(versions(&order), vec!["2.0.0", "1.0.0"]);
        assert!(registry.defaults(Scope::All).unwrap().is_empty());
    }

    #[test]
    fn test_pinned_version_not_found() {
        let registry = registry(&[schema("x:abc", "1.0.0", "current")]);
        assert!(matches!(
            registry.resolve("abc", Some("3.0.0")),
            Err(SchemaError::NotFound { .. })
        ));
        assert!(matches!(
            registry.resolve("abc", Some("one")),
            Err(SchemaError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_idempotent_insert() {
        let mut registry = registry(&[schema("x:abc", "1.0.0", "current")]);
        let same = SchemaDocument::from_value(schema("x:abc", "1.0.0", "current")).unwrap();
        assert!(!registry.insert(same).unwrap());
        assert_eq!(registry.len(), 1);

        let changed = SchemaDocument::from_value(schema("x:abc", "1.0.0", "deprecated")).unwrap();
        assert!(matches!(registry.insert(changed), Err(SchemaError::AlreadyExists { .. })));

        // Another id landing on the same family and version
        let other = SchemaDocument::from_value(schema("y:abc", "1.0.0", "current")).unwrap();
        assert!(matches!(registry.insert(other), Err(SchemaError::AlreadyExists { .. })));
    }

    #[test]
    fn test_all_scope_orders_families() {
        let registry = registry(&[
            schema("x:zeta", "1.0.0", "current"),
            schema("x:alpha", "1.0.0", "current"),
            schema("x:alpha", "0.1.0", "deprecated"),
        ]);
        assert_eq!(registry.families(), vec!["ALPHA", "ZETA"]);
        let keys: Vec<String> = registry.candidates(Scope::All).unwrap().iter().map(|d| d.key()).collect();
        assert_eq!(keys, vec!["x:alpha@1.0.0", "x:alpha@0.1.0", "x:zeta@1.0.0"]);

        let all: Vec<String> = registry.iter().map(|d| d.key()).collect();
        assert_eq!(all, vec!["x:alpha@0.1.0", "x:alpha@1.0.0", "x:zeta@1.0.0"]);
    }

    #[test]
    fn test_get_by_schema_id() {
        let registry = registry(&[schema("x:abc", "1.0.0", "deprecated"), schema("x:abc", "1.1.0", "current")]);
        assert_eq!(registry.get("x:abc", None).unwrap().version().to_string(), "1.1.0");
        assert_eq!(registry.get("x:abc", Some("1.0.0")).unwrap().version().to_string(), "1.0.0");
        assert!(matches!(registry.get("x:nope", None), Err(SchemaError::NotFound { .. })));
    }
}
