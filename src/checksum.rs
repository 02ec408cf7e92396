//! Content checksums used to tell identical schema registrations apart from conflicting ones

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA256 checksum of a schema document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a JSON value.
    ///
    /// `serde_json` keeps object keys sorted unless `preserve_order` is
    /// enabled, so two documents that differ only in key order or
    /// whitespace hash the same.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let canonical = serde_json::to_string(value).unwrap_or_default();
        Self::from_bytes(canonical.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines and listings
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checksum_consistency() {
        let a = Checksum::from_json(&json!({"schema_id": "x:y", "schema_version": "1.0.0"}));
        let b = Checksum::from_json(&json!({"schema_version": "1.0.0", "schema_id": "x:y"}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_checksum_different_content() {
        let a = Checksum::from_json(&json!({"template": "{a}"}));
        let b = Checksum::from_json(&json!({"template": "{b}"}));
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 12);
    }
}
