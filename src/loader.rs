//! Schema Loading
//!
//! Reads compiled node trees from JSON and builds a [`NodeRegistry`].
//! Turning OpenAPI or JSON Schema source into this form happens upstream;
//! this module only accepts the already-compiled shape.
//!
//! ```json
//! {
//!   "definitions": {
//!     "Root": {
//!       "type": "object",
//!       "properties": {
//!         "name": { "type": "string", "isRequired": true },
//!         "tags": { "type": "array", "items": { "type": "string" }, "minItems": 1 }
//!       }
//!     }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{Result, SchemaError};
use crate::node::{DataType, Discriminator, NodeBody, SchemaNode};
use crate::registry::{NodeRegistry, RegistryOptions};

/// One node of a compiled schema, as serialized
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDef {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, NodeDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<NodeDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<NodeDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<i64>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub possible_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// A file holding several definitions
#[derive(Debug, Clone, Deserialize)]
struct DefinitionsFile {
    definitions: IndexMap<String, NodeDef>,
}

impl NodeDef {
    /// Compile into a [`SchemaNode`]. `location` names the node in errors.
    pub fn compile(&self, location: &str) -> Result<SchemaNode> {
        let kind = self
            .kind
            .as_deref()
            .map(DataType::parse)
            .unwrap_or_default();

        let body = match kind {
            DataType::Object if self.properties.is_empty() && self.additional_properties.is_some() => {
                self.map_body(location)?
            }
            DataType::Object => {
                let mut properties = IndexMap::with_capacity(self.properties.len());
                for (key, child) in &self.properties {
                    properties.insert(key.clone(), child.compile(&format!("{}.{}", location, key))?);
                }
                NodeBody::Object { properties }
            }
            DataType::Map => self.map_body(location)?,
            DataType::Array => {
                let items = self.items.as_ref().ok_or_else(|| {
                    SchemaError::invalid_format(location, "array node has no items")
                })?;
                NodeBody::Array {
                    items: Box::new(items.compile(&format!("{}[]", location))?),
                    min_items: self.min_items,
                    max_items: self.max_items,
                }
            }
            DataType::String => NodeBody::String {
                possible_values: self.possible_values.clone(),
                literal: match &self.example {
                    None => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(other) => return Err(wrong_literal(location, kind, other)),
                },
            },
            DataType::Number => NodeBody::Number {
                minimum: self.minimum,
                maximum: self.maximum,
                literal: match &self.example {
                    None => None,
                    Some(Value::Number(n)) => Some(n.clone()),
                    Some(other) => return Err(wrong_literal(location, kind, other)),
                },
            },
            DataType::Boolean => NodeBody::Boolean {
                literal: match &self.example {
                    None => None,
                    Some(Value::Bool(b)) => Some(*b),
                    Some(other) => return Err(wrong_literal(location, kind, other)),
                },
            },
            DataType::Unspecified => NodeBody::Unspecified {
                literal: self.example.clone(),
            },
        };

        let mut node = SchemaNode::new(body);
        node.description = self.description.clone();
        node.is_required = self.is_required;
        node.discriminator = self.discriminator.clone();
        Ok(node)
    }

    fn map_body(&self, location: &str) -> Result<NodeBody> {
        let values = self.additional_properties.as_ref().ok_or_else(|| {
            SchemaError::invalid_format(location, "map node has no additionalProperties")
        })?;
        Ok(NodeBody::Map {
            values: Box::new(values.compile(&format!("{}[*]", location))?),
        })
    }
}

fn wrong_literal(location: &str, kind: DataType, literal: &Value) -> SchemaError {
    SchemaError::invalid_format(
        location,
        format!("example {} does not fit a {} node", literal, kind),
    )
}

/// Compile a name -> definition table
pub fn compile_definitions(
    definitions: &IndexMap<String, NodeDef>,
) -> Result<IndexMap<String, SchemaNode>> {
    let mut compiled = IndexMap::with_capacity(definitions.len());
    for (name, def) in definitions {
        compiled.insert(name.clone(), def.compile(name)?);
    }
    Ok(compiled)
}

/// Build a registry from a JSON value.
///
/// Accepts `{ "definitions": { ... } }` or a bare name -> definition object.
pub fn registry_from_value(value: Value, options: &RegistryOptions) -> Result<NodeRegistry> {
    let definitions = if value.get("definitions").is_some() {
        serde_json::from_value::<DefinitionsFile>(value)?.definitions
    } else {
        serde_json::from_value::<IndexMap<String, NodeDef>>(value)?
    };
    NodeRegistry::build_with(compile_definitions(&definitions)?, options)
}

/// Build a registry from a single JSON file
pub fn load_from_file(path: &Path, options: &RegistryOptions) -> Result<NodeRegistry> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    tracing::debug!(path = %path.display(), "Loading compiled schema file");
    registry_from_value(value, options)
}

/// Build a registry from a directory of `*.json` files, one definition
/// per file, named by file stem
pub fn load_from_directory(dir: &Path, options: &RegistryOptions) -> Result<NodeRegistry> {
    let mut definitions = IndexMap::new();

    let mut entries: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    // Deterministic definition order regardless of filesystem
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    for entry in entries {
        let path = entry.path();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .trim_end_matches(".node")
            .to_string();
        if name.is_empty() {
            continue;
        }

        let content = fs::read_to_string(path)?;
        let def: NodeDef = serde_json::from_str(&content)?;
        if definitions.insert(name.clone(), def).is_some() {
            return Err(SchemaError::invalid_format(
                path.display().to_string(),
                format!("duplicate definition '{}'", name),
            ));
        }
    }

    tracing::debug!(dir = %dir.display(), count = definitions.len(), "Loaded definition files");
    NodeRegistry::build_with(compile_definitions(&definitions)?, options)
}

/// Load from a file or a directory, whichever `path` is
pub fn load(path: &Path, options: &RegistryOptions) -> Result<NodeRegistry> {
    if path.is_dir() {
        load_from_directory(path, options)
    } else {
        load_from_file(path, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_compile_all_kinds() {
        let def: NodeDef = serde_json::from_value(json!({
            "type": "object",
            "description": "root",
            "properties": {
                "name": { "type": "string", "isRequired": true, "enum": ["a", "b"], "example": "a" },
                "count": { "type": "integer", "minimum": 1, "maximum": 9 },
                "flag": { "type": "boolean", "example": true },
                "list": { "type": "array", "items": { "type": "string" }, "minItems": 1, "maxItems": 3 },
                "labels": { "type": "object", "additionalProperties": { "type": "string" } },
                "raw": { "type": "null" }
            }
        }))
        .unwrap();

        let node = def.compile("Root").unwrap();
        let props = node.properties().unwrap();
        assert_eq!(node.description.as_deref(), Some("root"));
        assert!(props["name"].is_required);
        assert_eq!(props["name"].possible_values(), ["a", "b"]);
        assert_eq!(props["count"].kind(), DataType::Number);
        assert_eq!(props["flag"].body, NodeBody::Boolean { literal: Some(true) });
        assert!(matches!(
            props["list"].body,
            NodeBody::Array { min_items: Some(1), max_items: Some(3), .. }
        ));
        assert_eq!(props["labels"].kind(), DataType::Map);
        assert_eq!(props["raw"].kind(), DataType::Unspecified);
    }

    #[test]
    fn test_structural_defects_are_errors() {
        let array: NodeDef = serde_json::from_value(json!({ "type": "array" })).unwrap();
        let err = array.compile("Root.list").unwrap_err();
        assert!(err.to_string().contains("Root.list"));

        let map: NodeDef = serde_json::from_value(json!({ "type": "map" })).unwrap();
        assert!(map.compile("Root").is_err());

        let bad: NodeDef =
            serde_json::from_value(json!({ "type": "number", "example": "ten" })).unwrap();
        assert!(matches!(
            bad.compile("Root"),
            Err(SchemaError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_registry_from_wrapped_and_bare_values() {
        let wrapped = json!({ "definitions": { "A": { "type": "string" } } });
        let bare = json!({ "A": { "type": "string" }, "B": { "type": "number" } });

        let options = RegistryOptions::default();
        assert_eq!(registry_from_value(wrapped, &options).unwrap().len(), 1);
        assert_eq!(registry_from_value(bare, &options).unwrap().len(), 2);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("shapes")).unwrap();
        fs::write(
            dir.path().join("shapes/Circle.json"),
            r#"{ "type": "object", "properties": { "radius": { "type": "number" } } }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("Root.node.json"),
            r#"{ "type": "object", "discriminator": { "propertyName": "kind", "mapping": { "circle": "Circle" } } }"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = load(dir.path(), &RegistryOptions::default()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Root"));
        assert!(registry.get("Circle").unwrap().is_read_only("kind"));
        assert!(registry.diagnostics().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, r#"{ "definitions": { "Root": { "type": "boolean" } } }"#).unwrap();

        let registry = load(&path, &RegistryOptions::default()).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Root"]);
    }
}
