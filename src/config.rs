//! Configuration management for schema navigation
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-nav.toml)
//! - Environment variables (SCHEMA_NAV__*)
//!
//! ## Example config file (schema-nav.toml):
//! ```toml
//! [schema]
//! path = "./schema.json"
//! root = "Root"
//! strict = false
//!
//! [advisor]
//! sample_suffix = "sample"
//!
//! [output]
//! format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::advisor::DEFAULT_SAMPLE_SUFFIX;
use crate::registry::RegistryOptions;

/// Main configuration for the navigator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Where the compiled schema lives and which definition is the root
    #[serde(default)]
    pub schema: SchemaSection,

    /// Edit advisor settings
    #[serde(default)]
    pub advisor: AdvisorConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Schema source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSection {
    /// Compiled schema file, or a directory of definition files
    #[serde(default = "default_schema_path")]
    pub path: PathBuf,

    /// Definition documents are validated against
    #[serde(default = "default_root")]
    pub root: String,

    /// Refuse schemas with unresolved discriminator targets
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Suffix of the synthetic `{key}-{suffix}` element key
    #[serde(default = "default_sample_suffix")]
    pub sample_suffix: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    /// Render a serializable value in this format
    pub fn render<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            Self::Pretty => serde_json::to_string_pretty(value),
            Self::Compact => serde_json::to_string(value),
        }
    }
}

// Default value functions
fn default_schema_path() -> PathBuf {
    PathBuf::from("schema.json")
}

fn default_root() -> String {
    "Root".to_string()
}

fn default_sample_suffix() -> String {
    DEFAULT_SAMPLE_SUFFIX.to_string()
}

impl Default for SchemaSection {
    fn default() -> Self {
        Self {
            path: default_schema_path(),
            root: default_root(),
            strict: false,
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            sample_suffix: default_sample_suffix(),
        }
    }
}

impl NavigatorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, with `config_path` layered over the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "schema-nav.toml",
            ".schema-nav.toml",
            "config/schema-nav.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "schema-nav", "schema-nav") {
            let xdg_config = config_dir.config_dir().join("schema-nav.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // SCHEMA_NAV__SCHEMA__ROOT=Other overrides [schema] root
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_NAV")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Schema path, resolved against the working directory when relative
    pub fn schema_path(&self) -> PathBuf {
        if self.schema.path.is_absolute() {
            self.schema.path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.schema.path)
        }
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            strict: self.schema.strict,
        }
    }
}
