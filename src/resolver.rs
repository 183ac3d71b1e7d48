//! Path Resolver
//!
//! Answers "what sits at this path" for a definition in the registry.
//! Array and map positions always resolve to the element template, even
//! when the document has no element there yet, so an editor can preview
//! what an insertion would look like.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::node::{NodeBody, SchemaNode};
use crate::path::{format_path, JsonPath, PathStep};
use crate::registry::NodeRegistry;
use crate::validator::ErrorKind;

/// Upper bound on elements a materialized array template repeats
pub const MAX_MATERIALIZED_ITEMS: usize = 64;

/// A path query or edit that cannot be answered
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {} in '{group}'", format_path(.path))]
pub struct NavigationError {
    /// Root definition the path was walked from
    pub group: String,
    /// Path prefix at which the walk failed
    pub path: JsonPath,
    pub kind: ErrorKind,
}

impl NavigationError {
    pub fn new(group: impl Into<String>, path: &[PathStep], kind: ErrorKind) -> Self {
        Self {
            group: group.into(),
            path: path.to_vec(),
            kind,
        }
    }

    pub fn invalid_path(group: impl Into<String>, path: &[PathStep]) -> Self {
        Self::new(group, path, ErrorKind::InvalidPath)
    }
}

/// The answer to a successful path query
#[derive(Debug, Clone)]
pub struct Resolved<'r> {
    pub group: String,
    pub node: &'r SchemaNode,
    /// Representative value for `node` (see [`Resolver::materialize`])
    pub data: Value,
}

impl fmt::Display for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} node in '{}'", self.node.kind(), self.group)
    }
}

/// Walks paths through the registry
pub struct Resolver<'r> {
    registry: &'r NodeRegistry,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self { registry }
    }

    /// Resolve `path` starting at the definition named `group`.
    ///
    /// When `document` is given, a discriminator along the way follows
    /// the tag the document carries there.
    pub fn resolve(
        &self,
        group: &str,
        path: &[PathStep],
        document: Option<&Value>,
    ) -> Result<Resolved<'r>, NavigationError> {
        let node = self.node_at(group, path, document)?;
        Ok(Resolved {
            group: group.to_string(),
            node,
            data: self.materialize(node),
        })
    }

    /// Like [`Resolver::resolve`] without materializing a value
    pub fn node_at(
        &self,
        group: &str,
        path: &[PathStep],
        document: Option<&Value>,
    ) -> Result<&'r SchemaNode, NavigationError> {
        let mut node = self
            .registry
            .get(group)
            .ok_or_else(|| NavigationError::invalid_path(group, &[]))?;
        let mut value = document;

        for (i, step) in path.iter().enumerate() {
            if let Some(variant) = self.registry.select_variant(node, value) {
                node = variant;
            }
            node = self
                .step_into(node, step)
                .ok_or_else(|| NavigationError::invalid_path(group, &path[..=i]))?;
            value = value.and_then(|v| step.lookup(v));
        }

        Ok(node)
    }

    fn step_into(&self, node: &'r SchemaNode, step: &PathStep) -> Option<&'r SchemaNode> {
        if let (Some(discriminator), PathStep::Key(tag)) = (&node.discriminator, step) {
            if let Some(variant) = self.registry.variant(discriminator, tag) {
                return Some(variant);
            }
        }

        match (&node.body, step) {
            (NodeBody::Object { properties }, PathStep::Key(key)) => properties.get(key),
            // Numeric property names such as HTTP status codes
            (NodeBody::Object { properties }, PathStep::Index(i)) => properties.get(&i.to_string()),
            (NodeBody::Array { items, .. }, PathStep::Index(_)) => Some(items.as_ref()),
            (NodeBody::Array { items, .. }, PathStep::Key(key)) => {
                key.parse::<usize>().ok().map(|_| items.as_ref())
            }
            (NodeBody::Map { values }, _) => Some(values.as_ref()),
            (
                NodeBody::String { .. }
                | NodeBody::Number { .. }
                | NodeBody::Boolean { .. }
                | NodeBody::Unspecified { .. },
                _,
            ) => None,
        }
    }

    /// Representative JSON value for a node.
    ///
    /// Objects materialize their children, arrays repeat the element
    /// template `minItems` times (at most [`MAX_MATERIALIZED_ITEMS`]),
    /// primitives use their literal or a zero value. A discriminated node
    /// materializes as an object keyed by tag, one entry per variant. Only
    /// the schema is consulted, never a document.
    pub fn materialize(&self, node: &SchemaNode) -> Value {
        let mut stack = Vec::new();
        self.materialize_inner(node, &mut stack)
    }

    fn materialize_inner(&self, node: &SchemaNode, stack: &mut Vec<String>) -> Value {
        let Some(discriminator) = &node.discriminator else {
            return self.materialize_body(node, stack);
        };

        let mut variants = Map::new();
        for (tag, target) in discriminator.targets() {
            let Some(variant) = self.registry.variant(discriminator, tag) else {
                continue;
            };
            // A variant already being materialized stops the recursion.
            let value = if stack.iter().any(|seen| seen == target) {
                Value::Object(Map::new())
            } else {
                stack.push(target.to_string());
                let value = self.materialize_body(variant, stack);
                stack.pop();
                value
            };
            variants.insert(tag.to_string(), value);
        }
        Value::Object(variants)
    }

    fn materialize_body(&self, node: &SchemaNode, stack: &mut Vec<String>) -> Value {
        match &node.body {
            NodeBody::Object { properties } => Value::Object(
                properties
                    .iter()
                    .map(|(key, child)| (key.clone(), self.materialize_inner(child, stack)))
                    .collect(),
            ),
            NodeBody::Array {
                items, min_items, ..
            } => {
                let wanted = min_items.filter(|m| *m > 0).unwrap_or(0);
                if wanted > MAX_MATERIALIZED_ITEMS as i64 {
                    tracing::warn!(min_items = wanted, cap = MAX_MATERIALIZED_ITEMS, "Capping materialized array length");
                }
                let count = wanted.min(MAX_MATERIALIZED_ITEMS as i64) as usize;
                if count == 0 {
                    return Value::Array(Vec::new());
                }
                let sample = self.materialize_inner(items, stack);
                Value::Array(vec![sample; count])
            }
            NodeBody::Map { .. } => Value::Object(Map::new()),
            NodeBody::String { literal, .. } => {
                Value::String(literal.clone().unwrap_or_default())
            }
            NodeBody::Number { literal, .. } => literal
                .clone()
                .map(Value::Number)
                .unwrap_or_else(|| Value::from(0)),
            NodeBody::Boolean { literal } => Value::Bool(literal.unwrap_or(false)),
            NodeBody::Unspecified { literal } => literal.clone().unwrap_or(Value::Null),
        }
    }
}
