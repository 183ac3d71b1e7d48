//! Edit Advisor
//!
//! Computes what may be inserted under a document position, so that an
//! editor's insert menu only ever offers schema-consistent choices.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::node::{NodeBody, SchemaNode};
use crate::path::{existing_keys, value_at, PathStep};
use crate::registry::NodeRegistry;
use crate::resolver::{NavigationError, Resolver};

/// Default suffix of the synthetic array/map element key
pub const DEFAULT_SAMPLE_SUFFIX: &str = "sample";

/// One insertable entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertCandidate {
    /// Menu key: a field name, `{field}-{tag}`, a tag, or `{key}-sample`
    pub key: String,
    /// Field the inserted value lands under
    pub field: String,
    pub description: String,
    /// Template value to insert
    pub value: Value,
    /// Element templates stay available however many entries exist
    #[serde(skip)]
    pub repeatable: bool,
}

/// Computes insert candidates and value suggestions
pub struct EditAdvisor<'r> {
    registry: &'r NodeRegistry,
    resolver: Resolver<'r>,
    sample_suffix: String,
}

impl<'r> EditAdvisor<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self {
            registry,
            resolver: Resolver::new(registry),
            sample_suffix: DEFAULT_SAMPLE_SUFFIX.to_string(),
        }
    }

    pub fn with_sample_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.sample_suffix = suffix.into();
        self
    }

    /// Keys legal to insert under `parent_path`, with their descriptions
    pub fn valid_insert_keys(
        &self,
        group: &str,
        parent_path: &[PathStep],
        document: &Value,
    ) -> Result<IndexMap<String, String>, NavigationError> {
        Ok(self
            .insert_candidates(group, parent_path, document)?
            .into_iter()
            .map(|candidate| (candidate.key, candidate.description))
            .collect())
    }

    /// Full insert templates for `parent_path`.
    ///
    /// Candidates whose field already exists in the document at
    /// `parent_path` are dropped, except repeatable element templates.
    pub fn insert_candidates(
        &self,
        group: &str,
        parent_path: &[PathStep],
        document: &Value,
    ) -> Result<Vec<InsertCandidate>, NavigationError> {
        let node = self.resolver.node_at(group, parent_path, Some(document))?;
        let current = value_at(document, parent_path);
        let parent_key = parent_path
            .last()
            .map(PathStep::as_key)
            .unwrap_or_else(|| group.to_string());

        let candidates = match &node.discriminator {
            Some(_) => match self.registry.select_variant(node, current) {
                Some(variant) => self.node_candidates(variant, &parent_key),
                None => self.variant_candidates(node, &parent_key, &parent_key, true),
            },
            None => self.node_candidates(node, &parent_key),
        };

        let existing = existing_keys(current);
        let mut accepted: Vec<InsertCandidate> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let taken = existing.contains(&candidate.field);
            if (candidate.repeatable || !taken) && !accepted.iter().any(|c| c.key == candidate.key) {
                accepted.push(candidate);
            }
        }
        Ok(accepted)
    }

    fn node_candidates(&self, node: &SchemaNode, parent_key: &str) -> Vec<InsertCandidate> {
        match &node.body {
            NodeBody::Array { items: sample, .. } | NodeBody::Map { values: sample } => {
                if sample.discriminator.is_some() {
                    // One level of unwrapping: the element's variants.
                    return self.variant_candidates(sample, parent_key, parent_key, true);
                }
                vec![InsertCandidate {
                    key: format!("{}-{}", parent_key, self.sample_suffix),
                    field: format!("{}-{}", parent_key, self.sample_suffix),
                    description: sample_description(parent_key),
                    value: self.resolver.materialize(sample),
                    repeatable: true,
                }]
            }
            NodeBody::Object { properties } => {
                let mut candidates = Vec::with_capacity(properties.len());
                for (field, child) in properties {
                    if node.is_read_only(field) {
                        continue;
                    }
                    if child.discriminator.is_some() {
                        candidates.extend(self.variant_candidates(child, field, field, false));
                    } else {
                        candidates.push(InsertCandidate {
                            key: field.clone(),
                            field: field.clone(),
                            description: child.description.clone().unwrap_or_default(),
                            value: self.resolver.materialize(child),
                            repeatable: false,
                        });
                    }
                }
                candidates
            }
            NodeBody::String { .. }
            | NodeBody::Number { .. }
            | NodeBody::Boolean { .. }
            | NodeBody::Unspecified { .. } => Vec::new(),
        }
    }

    /// One candidate per tag of a discriminated node.
    ///
    /// Element variants (`repeatable`) are keyed by the bare tag; field
    /// variants by `{field}-{tag}`.
    fn variant_candidates(
        &self,
        node: &SchemaNode,
        field: &str,
        label: &str,
        repeatable: bool,
    ) -> Vec<InsertCandidate> {
        let Some(discriminator) = &node.discriminator else {
            return Vec::new();
        };
        self.registry
            .expand(discriminator)
            .into_iter()
            .map(|(tag, variant)| InsertCandidate {
                key: if repeatable {
                    tag.clone()
                } else {
                    format!("{}-{}", field, tag)
                },
                field: field.to_string(),
                description: sample_description(label),
                value: self.resolver.materialize(variant),
                repeatable,
            })
            .collect()
    }

    /// Enumerated values offered for the string at `path`
    pub fn suggest_values(
        &self,
        group: &str,
        path: &[PathStep],
        document: Option<&Value>,
    ) -> Result<Vec<String>, NavigationError> {
        let node = self.resolver.node_at(group, path, document)?;
        Ok(node.possible_values().to_vec())
    }
}

fn sample_description(key: &str) -> String {
    format!("Add sample item to {}", key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Discriminator;
    use crate::path::parse_path;
    use serde_json::json;

    fn registry() -> NodeRegistry {
        let mut defs = IndexMap::new();
        defs.insert(
            "Cron".to_string(),
            SchemaNode::object([("expression", SchemaNode::string().describe("Cron expression"))]),
        );
        defs.insert(
            "Event".to_string(),
            SchemaNode::object([("topic", SchemaNode::string().describe("Topic name"))]),
        );
        let trigger = || {
            SchemaNode::object(Vec::<(String, SchemaNode)>::new())
                .with_discriminator(Discriminator::new("type", [("cron", "Cron"), ("event", "Event")]))
        };
        defs.insert(
            "Root".to_string(),
            SchemaNode::object([
                ("x", SchemaNode::string().describe("An x")),
                ("level", SchemaNode::string().with_possible_values(["low", "high"])),
                ("trigger", trigger()),
                ("hosts", SchemaNode::array(SchemaNode::string())),
                ("labels", SchemaNode::map(SchemaNode::string())),
                ("triggers", SchemaNode::array(trigger())),
            ]),
        );
        NodeRegistry::build(defs)
    }

    fn keys(map: &IndexMap<String, String>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_object_children_with_discriminator_expanded() {
        let registry = registry();
        let advisor = EditAdvisor::new(&registry);
        let result = advisor.valid_insert_keys("Root", &[], &json!({})).unwrap();
        assert_eq!(
            keys(&result),
            vec!["x", "level", "trigger-cron", "trigger-event", "hosts", "labels", "triggers"]
        );
        assert_eq!(result["x"], "An x");
        assert_eq!(result["trigger-cron"], "Add sample item to trigger");
    }

    #[test]
    fn test_existing_fields_are_filtered() {
        let registry = registry();
        let advisor = EditAdvisor::new(&registry);
        let result = advisor
            .valid_insert_keys("Root", &[], &json!({ "x": "1", "trigger": { "type": "cron" } }))
            .unwrap();
        assert!(!result.contains_key("x"));
        assert!(!result.contains_key("trigger-cron"));
        assert!(!result.contains_key("trigger-event"));
        assert!(result.contains_key("hosts"));
    }

    #[test]
    fn test_map_sample_always_offered() {
        let registry = registry();
        let advisor = EditAdvisor::new(&registry);
        let doc = json!({ "labels": { "labels-sample": "a", "b": "c" } });
        let result = advisor.valid_insert_keys("Root", &parse_path("labels"), &doc).unwrap();
        assert_eq!(keys(&result), vec!["labels-sample"]);
        assert_eq!(result["labels-sample"], "Add sample item to labels");
    }

    #[test]
    fn test_array_sample_and_custom_suffix() {
        let registry = registry();
        let advisor = EditAdvisor::new(&registry).with_sample_suffix("item");
        let doc = json!({ "hosts": ["a"] });
        let candidates = advisor.insert_candidates("Root", &parse_path("hosts"), &doc).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].key, "hosts-item");
        assert_eq!(candidates[0].value, json!(""));
    }

    #[test]
    fn test_array_of_discriminated_elements_offers_variants() {
        let registry = registry();
        let advisor = EditAdvisor::new(&registry);
        let doc = json!({ "triggers": [{ "type": "cron" }] });
        let candidates = advisor.insert_candidates("Root", &parse_path("triggers"), &doc).unwrap();
        let keys: Vec<_> = candidates.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["cron", "event"]);
        assert_eq!(candidates[1].value, json!({ "topic": "", "type": "event" }));
    }

    #[test]
    fn test_tagged_parent_offers_variant_children() {
        let registry = registry();
        let advisor = EditAdvisor::new(&registry);
        let doc = json!({ "trigger": { "type": "event" } });
        let result = advisor.valid_insert_keys("Root", &parse_path("trigger"), &doc).unwrap();
        assert_eq!(keys(&result), vec!["topic"]);

        let untagged = json!({ "trigger": {} });
        let result = advisor.valid_insert_keys("Root", &parse_path("trigger"), &untagged).unwrap();
        assert_eq!(keys(&result), vec!["cron", "event"]);
    }

    #[test]
    fn test_invalid_parent_path() {
        let registry = registry();
        let advisor = EditAdvisor::new(&registry);
        let err = advisor
            .valid_insert_keys("Root", &parse_path("nope"), &json!({}))
            .unwrap_err();
        assert_eq!(err.kind, crate::validator::ErrorKind::InvalidPath);
    }

    #[test]
    fn test_suggest_values() {
        let registry = registry();
        let advisor = EditAdvisor::new(&registry);
        assert_eq!(
            advisor.suggest_values("Root", &parse_path("level"), None).unwrap(),
            vec!["low", "high"]
        );
        assert!(advisor.suggest_values("Root", &parse_path("x"), None).unwrap().is_empty());
    }
}
