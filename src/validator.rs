//! Document validation
//!
//! Walks a JSON document alongside a schema node and collects every
//! problem in one pass. Nothing here fails: each problem becomes a
//! path-tagged [`ValidationError`] and the walk continues.
//!
//! Per node, the checks run in this order:
//! 1. a discriminator dispatches to the variant named by the document's tag
//! 2. objects check declared children, then unknown keys, then report
//!    all missing required fields as one error for the level
//! 3. arrays check their length bounds, then every element
//! 4. maps check every value
//! 5. primitives check emptiness, enumerated values, then their kind

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::node::{Discriminator, NodeBody, SchemaNode};
use crate::path::{format_path, is_truthy, JsonPath, PathStep};
use crate::registry::{tag_value, NodeRegistry};

/// Discriminator dispatch chains longer than this are cut off
const MAX_DISCRIMINATOR_HOPS: usize = 8;

// =============================================================================
// Error taxonomy
// =============================================================================

/// Category of a validation or navigation problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidPath,
    RequiredField,
    UnknownKey,
    ArrayTooLong,
    ArrayTooShort,
    DiscriminatorMissing,
    DiscriminatorInvalidType,
    ValueRequired,
    NotAPossibleValue,
    NotANumber,
    NumberBelowMinimum,
    NumberAboveMaximum,
    NotABoolean,
    NotAString,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPath => "InvalidPath",
            Self::RequiredField => "RequiredField",
            Self::UnknownKey => "UnknownKey",
            Self::ArrayTooLong => "ArrayTooLong",
            Self::ArrayTooShort => "ArrayTooShort",
            Self::DiscriminatorMissing => "DiscriminatorMissing",
            Self::DiscriminatorInvalidType => "DiscriminatorInvalidType",
            Self::ValueRequired => "ValueRequired",
            Self::NotAPossibleValue => "NotAPossibleValue",
            Self::NotANumber => "NotANumber",
            Self::NumberBelowMinimum => "NumberBelowMinimum",
            Self::NumberAboveMaximum => "NumberAboveMaximum",
            Self::NotABoolean => "NotABoolean",
            Self::NotAString => "NotAString",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem found in a document; Display is the user message
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("{}", missing_fields_message(.0))]
    MissingFields(Vec<String>),

    #[error("'{0}' is not a valid key")]
    UnknownKey(String),

    #[error("Array cannot contain more than {0} elements")]
    TooManyElements(i64),

    #[error("Array must contain at least {0} elements")]
    TooFewElements(i64),

    #[error("'{tag}' is not a valid type for discriminator '{property}'")]
    InvalidDiscriminator { property: String, tag: String },

    #[error("Value cannot be empty")]
    EmptyValue,

    #[error("Value must be one of: {}", .0.join(", "))]
    NotPossibleValue(Vec<String>),

    #[error("Value is not a number")]
    NotNumber,

    #[error("Value cannot be less than {0}")]
    BelowMinimum(f64),

    #[error("Value cannot be greater than {0}")]
    AboveMaximum(f64),

    #[error("Value is not a boolean")]
    NotBoolean,

    #[error("Value is not a string")]
    NotString,
}

fn missing_fields_message(fields: &[String]) -> String {
    match fields {
        [single] => format!("Required field '{}' is not available", single),
        many => format!("Required fields {} are not available", many.join(",")),
    }
}

impl Violation {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingFields(_) => ErrorKind::RequiredField,
            Self::UnknownKey(_) => ErrorKind::UnknownKey,
            Self::TooManyElements(_) => ErrorKind::ArrayTooLong,
            Self::TooFewElements(_) => ErrorKind::ArrayTooShort,
            Self::InvalidDiscriminator { .. } => ErrorKind::DiscriminatorInvalidType,
            Self::EmptyValue => ErrorKind::ValueRequired,
            Self::NotPossibleValue(_) => ErrorKind::NotAPossibleValue,
            Self::NotNumber => ErrorKind::NotANumber,
            Self::BelowMinimum(_) => ErrorKind::NumberBelowMinimum,
            Self::AboveMaximum(_) => ErrorKind::NumberAboveMaximum,
            Self::NotBoolean => ErrorKind::NotABoolean,
            Self::NotString => ErrorKind::NotAString,
        }
    }
}

/// A violation and the document path it was detected at
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub path: JsonPath,
    pub violation: Violation,
}

impl ValidationError {
    pub fn new(path: JsonPath, violation: Violation) -> Self {
        Self { path, violation }
    }

    pub fn kind(&self) -> ErrorKind {
        self.violation.kind()
    }

    pub fn message(&self) -> String {
        self.violation.to_string()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", format_path(&self.path), self.violation)
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 3)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Recursive document validator
pub struct Validator<'r> {
    registry: &'r NodeRegistry,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self { registry }
    }

    /// Validate `document` against `root`, returning every problem found
    pub fn validate(&self, document: &Value, root: &SchemaNode) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut path = JsonPath::new();
        self.validate_node(document, root, &mut path, &mut errors, 0);
        tracing::debug!(errors = errors.len(), "Validation pass complete");
        errors
    }

    fn validate_node(
        &self,
        value: &Value,
        node: &SchemaNode,
        path: &mut JsonPath,
        errors: &mut Vec<ValidationError>,
        hops: usize,
    ) {
        match &node.discriminator {
            Some(discriminator) if hops < MAX_DISCRIMINATOR_HOPS => {
                self.validate_discriminated(value, discriminator, path, errors, hops)
            }
            Some(_) => {
                tracing::warn!(path = %format_path(path), "Discriminator chain too deep, validating node body");
                self.validate_body(value, node, path, errors)
            }
            None => self.validate_body(value, node, path, errors),
        }
    }

    fn validate_discriminated(
        &self,
        value: &Value,
        discriminator: &Discriminator,
        path: &mut JsonPath,
        errors: &mut Vec<ValidationError>,
        hops: usize,
    ) {
        let property = &discriminator.property_name;
        let Some(tag) = tag_value(value, property) else {
            errors.push(ValidationError::new(
                path.clone(),
                Violation::MissingFields(vec![property.clone()]),
            ));
            return;
        };

        match self.registry.variant(discriminator, &tag) {
            Some(variant) => self.validate_node(value, variant, path, errors, hops + 1),
            None => errors.push(ValidationError::new(
                path.clone(),
                Violation::InvalidDiscriminator {
                    property: property.clone(),
                    tag,
                },
            )),
        }
    }

    fn validate_body(
        &self,
        value: &Value,
        node: &SchemaNode,
        path: &mut JsonPath,
        errors: &mut Vec<ValidationError>,
    ) {
        match &node.body {
            NodeBody::Object { properties } => {
                // A non-object value reads as an object with no keys
                let document = value.as_object();
                let mut missing = Vec::new();
                let mut validated = HashSet::new();

                for (key, child) in properties {
                    match document.and_then(|map| map.get(key)) {
                        None => {
                            if child.is_required {
                                missing.push(key.clone());
                            }
                        }
                        Some(child_value) => {
                            validated.insert(key.as_str());
                            path.push(PathStep::Key(key.clone()));
                            self.validate_node(child_value, child, path, errors, 0);
                            path.pop();
                        }
                    }
                }

                if let Some(map) = document {
                    for key in map.keys().filter(|k| !validated.contains(k.as_str())) {
                        let mut key_path = path.clone();
                        key_path.push(PathStep::Key(key.clone()));
                        errors.push(ValidationError::new(key_path, Violation::UnknownKey(key.clone())));
                    }
                }

                if !missing.is_empty() {
                    errors.push(ValidationError::new(path.clone(), Violation::MissingFields(missing)));
                }
            }
            NodeBody::Array {
                items,
                min_items,
                max_items,
            } => {
                let elements = value.as_array().map(Vec::as_slice).unwrap_or(&[]);
                check_array_shape(elements.len(), *min_items, *max_items, path, errors);
                for (i, element) in elements.iter().enumerate() {
                    path.push(PathStep::Index(i));
                    self.validate_node(element, items, path, errors, 0);
                    path.pop();
                }
            }
            NodeBody::Map { values } => {
                if let Some(map) = value.as_object() {
                    for (key, entry) in map {
                        path.push(PathStep::Key(key.clone()));
                        self.validate_node(entry, values, path, errors, 0);
                        path.pop();
                    }
                }
            }
            NodeBody::String { .. }
            | NodeBody::Number { .. }
            | NodeBody::Boolean { .. }
            | NodeBody::Unspecified { .. } => check_value(value, node, path, errors),
        }
    }
}

/// Length bounds of an array. A negative bound is a schema defect: it is
/// logged and the check skipped.
fn check_array_shape(
    len: usize,
    min_items: Option<i64>,
    max_items: Option<i64>,
    path: &JsonPath,
    errors: &mut Vec<ValidationError>,
) {
    let len = len as i64;
    if let Some(max) = max_items {
        if max < 0 {
            tracing::warn!(path = %format_path(path), max, "Invalid maxItems configuration, check skipped");
        } else if len > max {
            errors.push(ValidationError::new(path.clone(), Violation::TooManyElements(max)));
        }
    }
    if let Some(min) = min_items {
        if min < 0 {
            tracing::warn!(path = %format_path(path), min, "Invalid minItems configuration, check skipped");
        } else if len < min {
            errors.push(ValidationError::new(path.clone(), Violation::TooFewElements(min)));
        }
    }
}

/// Numeric reading of a value: numbers, and strings that parse as one
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn check_value(value: &Value, node: &SchemaNode, path: &JsonPath, errors: &mut Vec<ValidationError>) {
    // Zero is a value, not an absence.
    let empty = !matches!(value, Value::Number(_)) && !is_truthy(value);
    if empty {
        if node.is_required {
            errors.push(ValidationError::new(path.clone(), Violation::EmptyValue));
        }
        return;
    }

    let possible = node.possible_values();
    if !possible.is_empty() && !possible.iter().any(|p| value.as_str() == Some(p.as_str())) {
        errors.push(ValidationError::new(
            path.clone(),
            Violation::NotPossibleValue(possible.to_vec()),
        ));
    }

    match &node.body {
        NodeBody::Number {
            minimum, maximum, ..
        } => match numeric(value) {
            None => errors.push(ValidationError::new(path.clone(), Violation::NotNumber)),
            Some(n) => {
                // Unset and zero bounds are both "no bound".
                if let Some(min) = minimum.filter(|m| *m != 0.0) {
                    if n < min {
                        errors.push(ValidationError::new(path.clone(), Violation::BelowMinimum(min)));
                    }
                }
                if let Some(max) = maximum.filter(|m| *m != 0.0) {
                    if n > max {
                        errors.push(ValidationError::new(path.clone(), Violation::AboveMaximum(max)));
                    }
                }
            }
        },
        NodeBody::Boolean { .. } => {
            if !value.is_boolean() {
                errors.push(ValidationError::new(path.clone(), Violation::NotBoolean));
            }
        }
        NodeBody::String { .. } => {
            if !value.is_string() {
                errors.push(ValidationError::new(path.clone(), Violation::NotString));
            }
        }
        NodeBody::Unspecified { .. }
        | NodeBody::Object { .. }
        | NodeBody::Array { .. }
        | NodeBody::Map { .. } => {}
    }
}
