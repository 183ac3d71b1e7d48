//! Navigator facade
//!
//! Binds a registry to the root definition documents are edited against
//! and exposes the editor-facing operations in one place.

use indexmap::IndexMap;
use serde_json::Value;

use crate::advisor::{EditAdvisor, InsertCandidate, DEFAULT_SAMPLE_SUFFIX};
use crate::config::NavigatorConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::loader;
use crate::path::{value_at, PathStep};
use crate::registry::NodeRegistry;
use crate::removal::{remove_at, RemovalCheck};
use crate::resolver::{NavigationError, Resolved, Resolver};
use crate::validator::{ValidationError, Validator};

/// Schema-aware operations on documents of one root definition
#[derive(Debug, Clone)]
pub struct SchemaNavigator {
    registry: NodeRegistry,
    root: String,
    sample_suffix: String,
}

impl SchemaNavigator {
    /// Wrap a built registry. Fails when `root` is not a definition.
    pub fn new(registry: NodeRegistry, root: impl Into<String>) -> Result<Self> {
        let root = root.into();
        registry.require(&root)?;
        Ok(Self {
            registry,
            root,
            sample_suffix: DEFAULT_SAMPLE_SUFFIX.to_string(),
        })
    }

    /// Load the schema named in `config` and bind its root definition
    pub fn from_config(config: &NavigatorConfig) -> Result<Self> {
        let path = config.schema_path();
        tracing::info!(path = %path.display(), root = %config.schema.root, "Loading schema");
        let registry = loader::load(&path, &config.registry_options())?;
        Ok(Self::new(registry, config.schema.root.clone())?
            .with_sample_suffix(config.advisor.sample_suffix.clone()))
    }

    pub fn with_sample_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.sample_suffix = suffix.into();
        self
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Schema defects recorded while the registry was built
    pub fn diagnostics(&self) -> &Diagnostics {
        self.registry.diagnostics()
    }

    pub fn resolve(
        &self,
        path: &[PathStep],
        document: Option<&Value>,
    ) -> std::result::Result<Resolved<'_>, NavigationError> {
        Resolver::new(&self.registry).resolve(&self.root, path, document)
    }

    /// Validate a whole document against the root definition
    pub fn validate(&self, document: &Value) -> Vec<ValidationError> {
        match self.registry.get(&self.root) {
            Some(root) => Validator::new(&self.registry).validate(document, root),
            // `new` checked the root exists.
            None => Vec::new(),
        }
    }

    /// Validate the sub-document at `path` against the node there
    pub fn validate_at(
        &self,
        document: &Value,
        path: &[PathStep],
    ) -> std::result::Result<Vec<ValidationError>, NavigationError> {
        let node = Resolver::new(&self.registry).node_at(&self.root, path, Some(document))?;
        let absent = Value::Null;
        let value = value_at(document, path).unwrap_or(&absent);
        let mut errors = Validator::new(&self.registry).validate(value, node);
        for error in &mut errors {
            let mut full = path.to_vec();
            full.append(&mut error.path);
            error.path = full;
        }
        Ok(errors)
    }

    pub fn valid_insert_keys(
        &self,
        parent_path: &[PathStep],
        document: &Value,
    ) -> std::result::Result<IndexMap<String, String>, NavigationError> {
        self.advisor().valid_insert_keys(&self.root, parent_path, document)
    }

    pub fn insert_candidates(
        &self,
        parent_path: &[PathStep],
        document: &Value,
    ) -> std::result::Result<Vec<InsertCandidate>, NavigationError> {
        self.advisor().insert_candidates(&self.root, parent_path, document)
    }

    pub fn suggest_values(
        &self,
        path: &[PathStep],
        document: Option<&Value>,
    ) -> std::result::Result<Vec<String>, NavigationError> {
        self.advisor().suggest_values(&self.root, path, document)
    }

    /// Check whether the value at `path` may be removed
    pub fn remove_node(
        &self,
        document: &Value,
        path: &[PathStep],
    ) -> std::result::Result<(), NavigationError> {
        RemovalCheck::new(&self.registry).check(&self.root, document, path)
    }

    /// Remove the value at `path` if allowed, returning the edited copy
    pub fn remove(
        &self,
        document: &Value,
        path: &[PathStep],
    ) -> std::result::Result<Value, NavigationError> {
        self.remove_node(document, path)?;
        Ok(remove_at(document, path))
    }

    fn advisor(&self) -> EditAdvisor<'_> {
        EditAdvisor::new(&self.registry).with_sample_suffix(self.sample_suffix.as_str())
    }
}
