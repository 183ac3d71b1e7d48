//! Error types for schema loading and registry construction
//!
//! These are setup failures. Problems found in a document are never
//! raised through this type; see [`crate::validator::ValidationError`].

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema loading and registry errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema definition not found: {name}")]
    NotFound { name: String },

    #[error("Invalid schema format at {path}: {reason}")]
    InvalidFormat { path: String, reason: String },

    #[error("Discriminator in {owner} maps tag '{tag}' to unknown definition '{target}'")]
    UnresolvedReference {
        owner: String,
        tag: String,
        target: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    pub(crate) fn invalid_format(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
