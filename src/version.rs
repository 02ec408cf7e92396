//! Schema versioning utilities

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic version of a schema document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(Version);

impl SchemaVersion {
    /// Create a new schema version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Create from a version string.
    ///
    /// Accepts a leading `v` and the short `MAJOR.MINOR` / `MAJOR` forms that
    /// schema authors tend to write, padding the missing components with zero.
    pub fn parse(version_str: &str) -> Result<Self, semver::Error> {
        let version_str = version_str.trim();
        let version_str = version_str.strip_prefix('v').unwrap_or(version_str);
        match Version::parse(version_str) {
            Ok(version) => Ok(Self(version)),
            Err(err) => {
                let dots = version_str.chars().filter(|c| *c == '.').count();
                let all_numeric = version_str
                    .split('.')
                    .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
                if dots < 2 && all_numeric {
                    let padded = format!("{}{}", version_str, ".0".repeat(2 - dots));
                    Version::parse(&padded).map(Self)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Get the underlying semver value
    pub fn as_semver(&self) -> &Version {
        &self.0
    }

    /// Get the version string (e.g., "1.2.3")
    pub fn version_string(&self) -> String {
        self.0.to_string()
    }

    /// Get the tag string (e.g., "v1.2.3")
    pub fn tag_string(&self) -> String {
        format!("v{}", self.0)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        let v = SchemaVersion::parse("1.2.3").unwrap();
        assert_eq!(v.version_string(), "1.2.3");
        assert_eq!(v.tag_string(), "v1.2.3");
    }

    #[test]
    fn test_version_with_v_prefix() {
        let v = SchemaVersion::parse("v1.2.3").unwrap();
        assert_eq!(v, SchemaVersion::new(1, 2, 3));
    }

    #[test]
    fn test_short_versions_are_padded() {
        assert_eq!(SchemaVersion::parse("2").unwrap(), SchemaVersion::new(2, 0, 0));
        assert_eq!(SchemaVersion::parse("1.4").unwrap(), SchemaVersion::new(1, 4, 0));
        assert!(SchemaVersion::parse("1.x").is_err());
    }

    #[test]
    fn test_version_ordering() {
        let mut versions = vec![
            SchemaVersion::parse("1.10.0").unwrap(),
            SchemaVersion::parse("1.2.0").unwrap(),
            SchemaVersion::parse("0.9.1").unwrap(),
        ];
        versions.sort();
        let ordered: Vec<_> = versions.iter().map(|v| v.to_string()).collect();
        assert_eq!(ordered, vec!["0.9.1", "1.2.0", "1.10.0"]);
    }
}
