//! Node Registry
//!
//! Owns every compiled definition, indexed by name. Discriminators refer
//! to their variants by name, so mutually and forward referencing
//! definitions never need direct links.
//!
//! All discriminator expansion happens once, while the registry is
//! built: every `(target, property, tag)` triple reachable from any
//! definition gets a tagged variant node, and each target definition has
//! the discriminator property added to its read-only fields. After
//! [`NodeRegistry::build`] returns nothing is mutated, so a registry can
//! be shared across threads and [`NodeRegistry::expand`] is a pure lookup.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::collections::HashMap;

use crate::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::error::{Result, SchemaError};
use crate::node::{Discriminator, NodeBody, SchemaNode};

/// Options controlling registry construction
#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
    /// Fail the build on a discriminator pointing at an unknown definition
    /// instead of recording a diagnostic and skipping the entry
    pub strict: bool,
}

/// Identity of one tagged variant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VariantKey {
    target: String,
    property: String,
    tag: String,
}

/// A discriminator entry whose target is missing
#[derive(Debug, Clone)]
struct Unresolved {
    owner: String,
    tag: String,
    target: String,
}

/// Everything learned from one pass over the definitions
#[derive(Default)]
struct Survey {
    variant_keys: IndexSet<VariantKey>,
    unresolved: Vec<Unresolved>,
    diagnostics: Diagnostics,
}

/// Process-wide table of compiled schema definitions
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    definitions: IndexMap<String, SchemaNode>,
    variants: HashMap<VariantKey, SchemaNode>,
    diagnostics: Diagnostics,
}

impl NodeRegistry {
    /// Build a registry, recording schema defects as diagnostics
    pub fn build(definitions: IndexMap<String, SchemaNode>) -> Self {
        let survey = survey(&definitions);
        Self::assemble(definitions, survey)
    }

    /// Build a registry with explicit options
    pub fn build_with(
        definitions: IndexMap<String, SchemaNode>,
        options: &RegistryOptions,
    ) -> Result<Self> {
        let survey = survey(&definitions);
        if options.strict {
            if let Some(missing) = survey.unresolved.first() {
                return Err(SchemaError::UnresolvedReference {
                    owner: missing.owner.clone(),
                    tag: missing.tag.clone(),
                    target: missing.target.clone(),
                });
            }
        }
        Ok(Self::assemble(definitions, survey))
    }

    fn assemble(mut definitions: IndexMap<String, SchemaNode>, survey: Survey) -> Self {
        let Survey {
            variant_keys,
            mut diagnostics,
            ..
        } = survey;

        // Mark every target first so each variant copy sees the full set.
        for key in &variant_keys {
            if let Some(target) = definitions.get_mut(&key.target) {
                target.mark_read_only(&key.property);
            }
        }

        let mut variants = HashMap::with_capacity(variant_keys.len());
        for key in variant_keys {
            let Some(base) = definitions.get(&key.target) else {
                continue;
            };
            let mut variant = base.clone();
            if !variant.inject_tag(&key.property, &key.tag) {
                diagnostics.push(DiagnosticItem::new(
                    key.target.as_str(),
                    "<root>",
                    DiagnosticCode::UntaggableTarget,
                    format!(
                        "{} node cannot carry discriminator property '{}'",
                        variant.kind(),
                        key.property
                    ),
                ));
            }
            variants.insert(key, variant);
        }

        tracing::info!(
            definitions = definitions.len(),
            variants = variants.len(),
            defects = diagnostics.len(),
            "Node registry built"
        );

        Self {
            definitions,
            variants,
            diagnostics,
        }
    }

    /// Look up a definition by name
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.definitions.get(name)
    }

    /// Look up a definition, failing with [`SchemaError::NotFound`]
    pub fn require(&self, name: &str) -> Result<&SchemaNode> {
        self.get(name).ok_or_else(|| SchemaError::NotFound {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Definition names in load order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn definitions(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.definitions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Schema defects found while building
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The tagged variant a discriminator selects for `tag`
    pub fn variant(&self, discriminator: &Discriminator, tag: &str) -> Option<&SchemaNode> {
        let target = discriminator.target_of(tag)?;
        self.variants.get(&VariantKey {
            target: target.to_string(),
            property: discriminator.property_name.clone(),
            tag: tag.to_string(),
        })
    }

    /// Effective children of a discriminator: tag value -> tagged variant.
    ///
    /// Entries whose target was missing at build time are absent.
    pub fn expand(&self, discriminator: &Discriminator) -> IndexMap<String, &SchemaNode> {
        discriminator
            .mapping
            .keys()
            .filter_map(|tag| self.variant(discriminator, tag).map(|node| (tag.clone(), node)))
            .collect()
    }

    /// Variant chosen by the tag the document carries at this node.
    ///
    /// `None` when the node has no discriminator, the tag is missing, or
    /// it is not a known tag.
    pub fn select_variant(&self, node: &SchemaNode, value: Option<&Value>) -> Option<&SchemaNode> {
        let discriminator = node.discriminator.as_ref()?;
        let tag = tag_value(value?, &discriminator.property_name)?;
        self.variant(discriminator, &tag)
    }
}

impl FromIterator<(String, SchemaNode)> for NodeRegistry {
    fn from_iter<T: IntoIterator<Item = (String, SchemaNode)>>(iter: T) -> Self {
        Self::build(iter.into_iter().collect())
    }
}

/// Discriminator tag carried by a document value.
///
/// A missing or falsy property is no tag. Non-string scalars are read in
/// their JSON text form.
pub fn tag_value(value: &Value, property_name: &str) -> Option<String> {
    let raw = value.get(property_name)?;
    if !crate::path::is_truthy(raw) {
        return None;
    }
    match raw {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// Build-time survey
// =============================================================================

fn survey(definitions: &IndexMap<String, SchemaNode>) -> Survey {
    let mut survey = Survey::default();
    for (name, node) in definitions {
        walk(name, "", node, definitions, &mut survey);
    }
    survey
}

fn walk(
    definition: &str,
    location: &str,
    node: &SchemaNode,
    definitions: &IndexMap<String, SchemaNode>,
    survey: &mut Survey,
) {
    let shown = if location.is_empty() { "<root>" } else { location };

    if let Some(discriminator) = &node.discriminator {
        if discriminator.mapping.is_empty() {
            survey.diagnostics.push(DiagnosticItem::new(
                definition,
                shown,
                DiagnosticCode::EmptyDiscriminatorMapping,
                format!(
                    "discriminator on '{}' has no mapping entries",
                    discriminator.property_name
                ),
            ));
        }
        for (tag, target) in discriminator.targets() {
            if definitions.contains_key(target) {
                survey.variant_keys.insert(VariantKey {
                    target: target.to_string(),
                    property: discriminator.property_name.clone(),
                    tag: tag.to_string(),
                });
            } else {
                survey.diagnostics.unresolved_target(definition, shown, tag, target);
                survey.unresolved.push(Unresolved {
                    owner: format!("{}{}", definition, location),
                    tag: tag.to_string(),
                    target: target.to_string(),
                });
            }
        }
    }

    match &node.body {
        NodeBody::Object { properties } => {
            for (key, child) in properties {
                walk(definition, &format!("{}.{}", location, key), child, definitions, survey);
            }
        }
        NodeBody::Array {
            items,
            min_items,
            max_items,
        } => {
            if let Some(min) = min_items.filter(|m| *m < 0) {
                survey
                    .diagnostics
                    .negative_bound(definition, shown, DiagnosticCode::NegativeMinItems, min);
            }
            if let Some(max) = max_items.filter(|m| *m < 0) {
                survey
                    .diagnostics
                    .negative_bound(definition, shown, DiagnosticCode::NegativeMaxItems, max);
            }
            walk(definition, &format!("{}[]", location), items, definitions, survey);
        }
        NodeBody::Map { values } => {
            walk(definition, &format!("{}[*]", location), values, definitions, survey);
        }
        NodeBody::String { .. }
        | NodeBody::Number { .. }
        | NodeBody::Boolean { .. }
        | NodeBody::Unspecified { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shapes() -> IndexMap<String, SchemaNode> {
        let mut defs = IndexMap::new();
        defs.insert(
            "Circle".to_string(),
            SchemaNode::object([("radius", SchemaNode::number().required())]),
        );
        defs.insert(
            "Square".to_string(),
            SchemaNode::object([("side", SchemaNode::number().required())]),
        );
        defs.insert(
            "Root".to_string(),
            SchemaNode::object([(
                "shape",
                SchemaNode::object(Vec::<(String, SchemaNode)>::new()).with_discriminator(
                    Discriminator::new(
                        "kind",
                        [("circle", "#/components/schemas/Circle"), ("square", "Square")],
                    ),
                ),
            )]),
        );
        defs
    }

    fn shape_discriminator(registry: &NodeRegistry) -> Discriminator {
        registry.get("Root").unwrap().properties().unwrap()["shape"]
            .discriminator
            .clone()
            .unwrap()
    }

    #[test]
    fn test_targets_are_marked_read_only() {
        let registry = NodeRegistry::build(shapes());
        assert!(registry.get("Circle").unwrap().is_read_only("kind"));
        assert!(registry.get("Square").unwrap().is_read_only("kind"));
        assert!(!registry.get("Root").unwrap().is_read_only("kind"));
        assert!(registry.diagnostics().is_empty());
    }

    #[test]
    fn test_expand_yields_tagged_variants() {
        let registry = NodeRegistry::build(shapes());
        let variants = registry.expand(&shape_discriminator(&registry));

        assert_eq!(variants.keys().collect::<Vec<_>>(), vec!["circle", "square"]);
        let circle = variants["circle"];
        let tag = &circle.properties().unwrap()["kind"];
        assert!(matches!(&tag.body, NodeBody::String { literal: Some(t), .. } if t == "circle"));
        assert!(circle.properties().unwrap().contains_key("radius"));
    }

    #[test]
    fn test_expand_is_idempotent() {
        let registry = NodeRegistry::build(shapes());
        let disc = shape_discriminator(&registry);

        let first = registry.expand(&disc);
        let second = registry.expand(&disc);
        assert_eq!(first, second);
        assert_eq!(first["square"].read_only_fields.len(), 1);
        assert_eq!(registry.get("Square").unwrap().read_only_fields.len(), 1);
    }

    #[test]
    fn test_shared_target_with_different_tags_does_not_conflict() {
        let mut defs = shapes();
        defs.insert(
            "Other".to_string(),
            SchemaNode::object(Vec::<(String, SchemaNode)>::new())
                .with_discriminator(Discriminator::new("kind", [("round", "Circle")])),
        );
        let registry = NodeRegistry::build(defs);

        let other = registry.get("Other").unwrap().discriminator.clone().unwrap();
        let round = registry.variant(&other, "round").unwrap();
        let circle = registry.variant(&shape_discriminator(&registry), "circle").unwrap();

        let literal = |node: &SchemaNode| match &node.properties().unwrap()["kind"].body {
            NodeBody::String { literal, .. } => literal.clone(),
            _ => None,
        };
        assert_eq!(literal(round), Some("round".to_string()));
        assert_eq!(literal(circle), Some("circle".to_string()));
        assert_eq!(registry.get("Circle").unwrap().read_only_fields.len(), 1);
    }

    #[test]
    fn test_unresolved_target_is_a_diagnostic() {
        let mut defs = shapes();
        defs.insert(
            "Broken".to_string(),
            SchemaNode::object(Vec::<(String, SchemaNode)>::new())
                .with_discriminator(Discriminator::new("kind", [("ghost", "Missing")])),
        );
        let registry = NodeRegistry::build(defs.clone());
        assert_eq!(
            registry
                .diagnostics()
                .with_code(DiagnosticCode::UnresolvedDiscriminatorTarget)
                .count(),
            1
        );
        let broken = registry.get("Broken").unwrap().discriminator.clone().unwrap();
        assert!(registry.expand(&broken).is_empty());

        let strict = NodeRegistry::build_with(defs, &RegistryOptions { strict: true });
        assert!(matches!(
            strict,
            Err(SchemaError::UnresolvedReference { ref target, .. }) if target == "Missing"
        ));
    }

    #[test]
    fn test_negative_bounds_are_diagnostics() {
        let mut defs = IndexMap::new();
        defs.insert(
            "Root".to_string(),
            SchemaNode::object([(
                "list",
                SchemaNode::array(SchemaNode::string()).with_item_bounds(Some(-1), Some(-3)),
            )]),
        );
        let registry = NodeRegistry::build(defs);
        let diags = registry.diagnostics();
        assert_eq!(diags.with_code(DiagnosticCode::NegativeMinItems).count(), 1);
        assert_eq!(diags.with_code(DiagnosticCode::NegativeMaxItems).count(), 1);
        assert_eq!(diags.all()[0].location, ".list");
    }

    #[test]
    fn test_untaggable_target_warns() {
        let mut defs = IndexMap::new();
        defs.insert("Scalar".to_string(), SchemaNode::string());
        defs.insert(
            "Root".to_string(),
            SchemaNode::object(Vec::<(String, SchemaNode)>::new())
                .with_discriminator(Discriminator::new("kind", [("s", "Scalar")])),
        );
        let registry = NodeRegistry::build(defs);
        assert_eq!(registry.diagnostics().warnings().count(), 1);
        assert!(registry.get("Scalar").unwrap().is_read_only("kind"));
    }

    #[test]
    fn test_select_variant_reads_document_tag() {
        let registry = NodeRegistry::build(shapes());
        let shape = &registry.get("Root").unwrap().properties().unwrap()["shape"];

        let chosen = registry.select_variant(shape, Some(&json!({ "kind": "square" })));
        assert!(chosen.unwrap().properties().unwrap().contains_key("side"));
        assert!(registry.select_variant(shape, Some(&json!({ "kind": "hexagon" }))).is_none());
        assert!(registry.select_variant(shape, Some(&json!({ "kind": "" }))).is_none());
        assert!(registry.select_variant(shape, None).is_none());
    }

    #[test]
    fn test_tag_value_forms() {
        assert_eq!(tag_value(&json!({ "t": "a" }), "t"), Some("a".to_string()));
        assert_eq!(tag_value(&json!({ "t": 2 }), "t"), Some("2".to_string()));
        assert_eq!(tag_value(&json!({ "t": null }), "t"), None);
        assert_eq!(tag_value(&json!("scalar"), "t"), None);
    }
}
