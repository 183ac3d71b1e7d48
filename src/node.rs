//! Schema node model
//!
//! A compiled schema is a tree of [`SchemaNode`]s. The per-variant
//! payload lives in the closed [`NodeBody`] enum so every walker
//! (resolver, validator, advisor) matches all variants exhaustively.
//!
//! Nodes never point at other definitions directly. A [`Discriminator`]
//! names its variants, and the names are resolved through the
//! [`crate::registry::NodeRegistry`].

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Object,
    Array,
    Map,
    String,
    Number,
    Boolean,
    #[default]
    Unspecified,
}

impl DataType {
    /// Parse a compiled `type` keyword. Unknown keywords are unspecified.
    pub fn parse(keyword: &str) -> Self {
        match keyword {
            "object" => Self::Object,
            "array" => Self::Array,
            "map" => Self::Map,
            "string" => Self::String,
            // Integers take the number checks (range, numeric strings)
            "number" | "integer" => Self::Number,
            "boolean" => Self::Boolean,
            _ => Self::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Map => "map",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged-union selector
///
/// The value of `property_name` in a document selects which named
/// definition governs the rest of the object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    /// Tag value -> definition reference, in declaration order
    pub mapping: IndexMap<String, String>,
}

impl Discriminator {
    pub fn new<I, K, V>(property_name: impl Into<String>, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            property_name: property_name.into(),
            mapping: mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Definition name a mapping entry points at.
    ///
    /// References may be JSON-pointer style (`#/components/schemas/Foo`);
    /// the last segment is the name.
    pub fn target_of(&self, tag: &str) -> Option<&str> {
        self.mapping.get(tag).map(|reference| definition_name(reference))
    }

    /// Iterate `(tag, definition name)` pairs in declaration order
    pub fn targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mapping
            .iter()
            .map(|(tag, reference)| (tag.as_str(), definition_name(reference)))
    }
}

/// Last `/`-separated segment of a definition reference
pub fn definition_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Variant payload of a [`SchemaNode`]
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Object {
        properties: IndexMap<String, SchemaNode>,
    },
    Array {
        /// Template for every element
        items: Box<SchemaNode>,
        /// Signed so that a defective negative bound reaches diagnostics
        min_items: Option<i64>,
        max_items: Option<i64>,
    },
    Map {
        /// Template for every value under an arbitrary key
        values: Box<SchemaNode>,
    },
    String {
        /// Allowed literals, empty when unconstrained
        possible_values: Vec<String>,
        literal: Option<String>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
        literal: Option<serde_json::Number>,
    },
    Boolean {
        literal: Option<bool>,
    },
    Unspecified {
        literal: Option<Value>,
    },
}

/// Compiled representation of one schema definition or sub-definition
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub description: Option<String>,
    pub is_required: bool,
    pub discriminator: Option<Discriminator>,
    /// Fields injected by a discriminator; not user editable
    pub read_only_fields: IndexSet<String>,
    pub body: NodeBody,
}

impl SchemaNode {
    pub fn new(body: NodeBody) -> Self {
        Self {
            description: None,
            is_required: false,
            discriminator: None,
            read_only_fields: IndexSet::new(),
            body,
        }
    }

    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaNode)>,
        K: Into<String>,
    {
        Self::new(NodeBody::Object {
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::new(NodeBody::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        })
    }

    pub fn map(values: SchemaNode) -> Self {
        Self::new(NodeBody::Map {
            values: Box::new(values),
        })
    }

    pub fn string() -> Self {
        Self::new(NodeBody::String {
            possible_values: Vec::new(),
            literal: None,
        })
    }

    pub fn number() -> Self {
        Self::new(NodeBody::Number {
            minimum: None,
            maximum: None,
            literal: None,
        })
    }

    pub fn boolean() -> Self {
        Self::new(NodeBody::Boolean { literal: None })
    }

    pub fn unspecified() -> Self {
        Self::new(NodeBody::Unspecified { literal: None })
    }

    // --- builder modifiers ---

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    /// Set array bounds; no effect on other variants
    pub fn with_item_bounds(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        if let NodeBody::Array {
            min_items,
            max_items,
            ..
        } = &mut self.body
        {
            *min_items = min;
            *max_items = max;
        }
        self
    }

    /// Set number range; no effect on other variants
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        if let NodeBody::Number {
            minimum, maximum, ..
        } = &mut self.body
        {
            *minimum = min;
            *maximum = max;
        }
        self
    }

    /// Set enumerated string values; no effect on other variants
    pub fn with_possible_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let NodeBody::String {
            possible_values, ..
        } = &mut self.body
        {
            *possible_values = values.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Set the literal default/example value.
    ///
    /// Ignored when `value` does not fit the node's variant.
    pub fn with_literal(mut self, value: Value) -> Self {
        match (&mut self.body, value) {
            (NodeBody::String { literal, .. }, Value::String(s)) => *literal = Some(s),
            (NodeBody::Number { literal, .. }, Value::Number(n)) => *literal = Some(n),
            (NodeBody::Boolean { literal }, Value::Bool(b)) => *literal = Some(b),
            (NodeBody::Unspecified { literal }, value) => *literal = Some(value),
            _ => {}
        }
        self
    }

    // --- accessors ---

    pub fn kind(&self) -> DataType {
        match &self.body {
            NodeBody::Object { .. } => DataType::Object,
            NodeBody::Array { .. } => DataType::Array,
            NodeBody::Map { .. } => DataType::Map,
            NodeBody::String { .. } => DataType::String,
            NodeBody::Number { .. } => DataType::Number,
            NodeBody::Boolean { .. } => DataType::Boolean,
            NodeBody::Unspecified { .. } => DataType::Unspecified,
        }
    }

    /// Declared children of an object node
    pub fn properties(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match &self.body {
            NodeBody::Object { properties } => Some(properties),
            _ => None,
        }
    }

    /// Element/value template of an array or map node
    pub fn sample(&self) -> Option<&SchemaNode> {
        match &self.body {
            NodeBody::Array { items, .. } => Some(items),
            NodeBody::Map { values } => Some(values),
            _ => None,
        }
    }

    pub fn possible_values(&self) -> &[String] {
        match &self.body {
            NodeBody::String {
                possible_values, ..
            } => possible_values,
            _ => &[],
        }
    }

    pub fn is_read_only(&self, field: &str) -> bool {
        self.read_only_fields.contains(field)
    }

    /// Add `field` to the read-only set. Returns false if already present.
    pub fn mark_read_only(&mut self, field: &str) -> bool {
        self.read_only_fields.insert(field.to_string())
    }

    /// Carry a discriminator tag: mark the property read-only and, for
    /// object nodes, pin it to a required string literal child.
    ///
    /// Returns false when the node is not an object and could only be
    /// marked.
    pub fn inject_tag(&mut self, property_name: &str, tag: &str) -> bool {
        self.mark_read_only(property_name);
        match &mut self.body {
            NodeBody::Object { properties } => {
                let literal = SchemaNode::string()
                    .required()
                    .with_literal(Value::String(tag.to_string()));
                properties.insert(property_name.to_string(), literal);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_type_keywords() {
        assert_eq!(DataType::parse("object"), DataType::Object);
        assert_eq!(DataType::parse("integer"), DataType::Number);
        assert_eq!(DataType::parse("null"), DataType::Unspecified);
    }

    #[test]
    fn test_definition_name_strips_pointer() {
        assert_eq!(definition_name("#/components/schemas/DefA"), "DefA");
        assert_eq!(definition_name("DefB"), "DefB");

        let disc = Discriminator::new("type", [("a", "#/defs/DefA"), ("b", "DefB")]);
        assert_eq!(disc.target_of("a"), Some("DefA"));
        assert_eq!(disc.target_of("c"), None);
        let targets: Vec<_> = disc.targets().collect();
        assert_eq!(targets, vec![("a", "DefA"), ("b", "DefB")]);
    }

    #[test]
    fn test_builders_only_touch_matching_variant() {
        let node = SchemaNode::string()
            .with_item_bounds(Some(1), Some(2))
            .with_literal(json!(5));
        assert_eq!(
            node.body,
            NodeBody::String {
                possible_values: vec![],
                literal: None
            }
        );

        let arr = SchemaNode::array(SchemaNode::string()).with_item_bounds(Some(1), None);
        assert!(matches!(
            arr.body,
            NodeBody::Array {
                min_items: Some(1),
                max_items: None,
                ..
            }
        ));
        assert_eq!(arr.kind(), DataType::Array);
    }

    #[test]
    fn test_mark_read_only_is_idempotent() {
        let mut node = SchemaNode::object([("name", SchemaNode::string())]);
        assert!(node.mark_read_only("type"));
        assert!(!node.mark_read_only("type"));
        assert_eq!(node.read_only_fields.len(), 1);
    }

    #[test]
    fn test_inject_tag_on_object_and_primitive() {
        let mut obj = SchemaNode::object([("name", SchemaNode::string())]);
        assert!(obj.inject_tag("type", "a"));
        let tag = &obj.properties().unwrap()["type"];
        assert!(tag.is_required);
        assert!(matches!(&tag.body, NodeBody::String { literal: Some(t), .. } if t == "a"));

        let mut prim = SchemaNode::number();
        assert!(!prim.inject_tag("type", "a"));
        assert!(prim.is_read_only("type"));
    }
}
