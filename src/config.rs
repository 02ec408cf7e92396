//! Configuration for the naming tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (naming.toml)
//! - Environment variables (EO_NAMING__*)
//!
//! ## Example config file (naming.toml):
//! ```toml
//! [registry]
//! schema_dirs = ["./schemas", "/opt/eo/schemas"]
//! include_bundled = true
//! file_filter = "filename_v"
//! skip_prefixes = ["target/", ".git/"]
//!
//! [validation]
//! fail_on_warnings = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::loader::{self, LoadFilter, LoadReport};
use crate::registry::SchemaRegistry;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Where schemas come from
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Example validation settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Schema source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Extra directories searched recursively for schema files
    #[serde(default)]
    pub schema_dirs: Vec<PathBuf>,

    /// Load the schemas compiled into the binary
    #[serde(default = "default_true")]
    pub include_bundled: bool,

    /// Only JSON files whose name contains this are loaded
    #[serde(default = "default_file_filter")]
    pub file_filter: String,

    /// Relative path prefixes skipped while walking schema directories
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,
}

/// Validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Treat shadowed examples and rejected schema files as failures
    #[serde(default)]
    pub fail_on_warnings: bool,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_file_filter() -> String {
    LoadFilter::default().file_filter
}

fn default_skip_prefixes() -> Vec<String> {
    LoadFilter::default().skip_prefixes
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            schema_dirs: Vec::new(),
            include_bundled: true,
            file_filter: default_file_filter(),
            skip_prefixes: default_skip_prefixes(),
        }
    }
}

impl NamingConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["naming.toml", ".naming.toml", "config/naming.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("org", "eo", "naming") {
            let xdg_config = config_dir.config_dir().join("naming.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // EO_NAMING__REGISTRY__INCLUDE_BUNDLED=false
        builder = builder.add_source(
            Environment::with_prefix("EO_NAMING")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Schema directories with relative paths resolved against the working directory
    pub fn schema_dirs(&self) -> Vec<PathBuf> {
        self.registry
            .schema_dirs
            .iter()
            .map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    std::env::current_dir().unwrap_or_default().join(p)
                }
            })
            .collect()
    }

    /// Build a registry from the configured sources.
    ///
    /// Bundled schemas load first, so a directory can only add versions,
    /// never replace a shipped one.
    pub fn build_registry(&self) -> Result<(SchemaRegistry, LoadReport)> {
        let filter = LoadFilter::from(&self.registry);
        let mut registry = SchemaRegistry::new();
        let mut report = LoadReport::default();

        if self.registry.include_bundled {
            let bundled = loader::load_embedded(&mut registry, loader::bundled_schemas(), &filter);
            merge(&mut report, bundled);
        }
        for dir in self.schema_dirs() {
            let loaded = loader::load_dir(&mut registry, &dir, &filter)?;
            merge(&mut report, loaded);
        }

        tracing::debug!(
            schemas = registry.len(),
            families = registry.families().len(),
            failures = report.failures.len(),
            "registry ready"
        );
        Ok((registry, report))
    }
}

fn merge(into: &mut LoadReport, from: LoadReport) {
    into.loaded.extend(from.loaded);
    into.unchanged.extend(from.unchanged);
    into.failures.extend(from.failures);
}
