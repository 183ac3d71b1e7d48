//! Node removal
//!
//! Decides whether the value at a path may be deleted from a document
//! without breaking the schema, and performs the deletion on a copy.

use serde_json::Value;

use crate::node::NodeBody;
use crate::path::{value_at, PathStep};
use crate::registry::NodeRegistry;
use crate::resolver::{NavigationError, Resolver};
use crate::validator::ErrorKind;

/// Removal guard for one registry
pub struct RemovalCheck<'r> {
    registry: &'r NodeRegistry,
    resolver: Resolver<'r>,
}

impl<'r> RemovalCheck<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self {
            registry,
            resolver: Resolver::new(registry),
        }
    }

    /// Check that deleting the value at `path` keeps `document` valid.
    ///
    /// Fails with `InvalidPath` for the root or an unresolvable path,
    /// `DiscriminatorMissing` for a discriminator tag, `RequiredField` for
    /// a required field and `ArrayTooShort` when the array would drop
    /// below its `minItems`.
    pub fn check(&self, group: &str, document: &Value, path: &[PathStep]) -> Result<(), NavigationError> {
        let Some((last, parent_path)) = path.split_last() else {
            return Err(NavigationError::invalid_path(group, path));
        };
        self.resolver.node_at(group, path, Some(document))?;

        let declared = self.resolver.node_at(group, parent_path, Some(document))?;
        let current = value_at(document, parent_path);
        let parent = self
            .registry
            .select_variant(declared, current)
            .unwrap_or(declared);
        let refuse = |kind| Err(NavigationError::new(group, path, kind));

        match &parent.body {
            NodeBody::Object { properties } => {
                let key = last.as_key();
                let is_tag = parent
                    .discriminator
                    .as_ref()
                    .map(|d| d.property_name == key)
                    .unwrap_or(false);
                if is_tag || parent.is_read_only(&key) {
                    return refuse(ErrorKind::DiscriminatorMissing);
                }
                if properties.get(&key).map(|child| child.is_required).unwrap_or(false) {
                    return refuse(ErrorKind::RequiredField);
                }
                Ok(())
            }
            NodeBody::Array { min_items, .. } => {
                let len = current.and_then(Value::as_array).map(Vec::len).unwrap_or(0);
                let present = current.and_then(|v| last.lookup(v)).is_some();
                let remaining = if present { len - 1 } else { len };
                match min_items {
                    Some(min) if *min >= 0 && (remaining as i64) < *min => {
                        refuse(ErrorKind::ArrayTooShort)
                    }
                    _ => Ok(()),
                }
            }
            NodeBody::Map { .. } => Ok(()),
            NodeBody::String { .. }
            | NodeBody::Number { .. }
            | NodeBody::Boolean { .. }
            | NodeBody::Unspecified { .. } => Err(NavigationError::invalid_path(group, path)),
        }
    }
}

/// Copy of `document` with the value at `path` deleted.
///
/// Absent paths and the root path leave the copy unchanged.
pub fn remove_at(document: &Value, path: &[PathStep]) -> Value {
    let mut copy = document.clone();
    let Some((last, parent_path)) = path.split_last() else {
        return copy;
    };

    let mut parent = &mut copy;
    for step in parent_path {
        let next = match parent {
            Value::Object(map) => map.get_mut(&step.as_key()),
            Value::Array(items) => step.as_key().parse::<usize>().ok().and_then(|i| items.get_mut(i)),
            _ => None,
        };
        let Some(value) = next else {
            return document.clone();
        };
        parent = value;
    }

    match parent {
        Value::Object(map) => {
            map.remove(&last.as_key());
        }
        Value::Array(items) => {
            if let Ok(i) = last.as_key().parse::<usize>() {
                if i < items.len() {
                    items.remove(i);
                }
            }
        }
        _ => {}
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Discriminator, SchemaNode};
    use crate::path::parse_path;
    use indexmap::IndexMap;
    use serde_json::json;

    fn registry() -> NodeRegistry {
        let mut defs = IndexMap::new();
        defs.insert(
            "Cron".to_string(),
            SchemaNode::object([("expression", SchemaNode::string())]),
        );
        defs.insert(
            "Root".to_string(),
            SchemaNode::object([
                ("name", SchemaNode::string().required()),
                ("note", SchemaNode::string()),
                (
                    "hosts",
                    SchemaNode::array(SchemaNode::string()).with_item_bounds(Some(2), None),
                ),
                ("labels", SchemaNode::map(SchemaNode::string())),
                (
                    "responses",
                    SchemaNode::object([
                        ("200", SchemaNode::string().required()),
                        ("404", SchemaNode::string()),
                    ]),
                ),
                (
                    "trigger",
                    SchemaNode::object(Vec::<(String, SchemaNode)>::new())
                        .with_discriminator(Discriminator::new("type", [("cron", "Cron")])),
                ),
            ]),
        );
        NodeRegistry::build(defs)
    }

    fn document() -> Value {
        json!({
            "name": "n",
            "note": "x",
            "hosts": ["a", "b", "c"],
            "labels": { "k": "v" },
            "responses": { "200": "OK", "404": "Not found" },
            "trigger": { "type": "cron", "expression": "* * * * *" }
        })
    }

    fn check(path: &str) -> Result<(), ErrorKind> {
        let registry = registry();
        RemovalCheck::new(&registry)
            .check("Root", &document(), &parse_path(path))
            .map_err(|e| e.kind)
    }

    #[test]
    fn test_optional_values_can_be_removed() {
        assert_eq!(check("note"), Ok(()));
        assert_eq!(check("labels.k"), Ok(()));
        assert_eq!(check("trigger.expression"), Ok(()));
        assert_eq!(check("hosts.0"), Ok(()));
    }

    #[test]
    fn test_required_field_is_refused() {
        assert_eq!(check("name"), Err(ErrorKind::RequiredField));
    }

    #[test]
    fn test_numeric_property_names() {
        assert_eq!(check("responses.200"), Err(ErrorKind::RequiredField));
        assert_eq!(check("responses.404"), Ok(()));

        let removed = remove_at(&document(), &parse_path("responses.404"));
        assert_eq!(removed["responses"], json!({ "200": "OK" }));
    }

    #[test]
    fn test_discriminator_tag_is_refused() {
        assert_eq!(check("trigger.type"), Err(ErrorKind::DiscriminatorMissing));
    }

    #[test]
    fn test_array_min_items() {
        let registry = registry();
        let checker = RemovalCheck::new(&registry);
        let doc = json!({ "name": "n", "hosts": ["a", "b"] });
        let err = checker.check("Root", &doc, &parse_path("hosts.1")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArrayTooShort);
        assert_eq!(err.path, parse_path("hosts.1"));
    }

    #[test]
    fn test_invalid_paths() {
        assert_eq!(check(""), Err(ErrorKind::InvalidPath));
        assert_eq!(check("missing"), Err(ErrorKind::InvalidPath));
        assert_eq!(check("name.inner"), Err(ErrorKind::InvalidPath));
    }

    #[test]
    fn test_remove_at() {
        let doc = document();
        let removed = remove_at(&doc, &parse_path("hosts.1"));
        assert_eq!(removed["hosts"], json!(["a", "c"]));

        let removed = remove_at(&doc, &parse_path("labels.k"));
        assert_eq!(removed["labels"], json!({}));

        assert_eq!(remove_at(&doc, &parse_path("missing.deep")), doc);
        assert_eq!(remove_at(&doc, &[]), doc);
    }
}
