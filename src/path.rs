//! Document paths
//!
//! A path is an ordered list of steps locating a value inside a JSON
//! document or a schema tree. Steps serialize as bare JSON strings and
//! numbers, so `["items", 3, "name"]` round-trips with editor paths.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single step in a [`JsonPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathStep {
    /// An array index
    Index(usize),
    /// An object field or map key
    Key(String),
}

impl PathStep {
    /// Look up this step in a document value.
    ///
    /// Index steps also address objects by their decimal key, and key
    /// steps address arrays when the key is a decimal index.
    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match (self, value) {
            (Self::Key(key), Value::Object(map)) => map.get(key),
            (Self::Index(i), Value::Array(items)) => items.get(*i),
            (Self::Index(i), Value::Object(map)) => map.get(&i.to_string()),
            (Self::Key(key), Value::Array(items)) => {
                key.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            _ => None,
        }
    }

    /// The step rendered as a plain key (indices as decimal strings)
    pub fn as_key(&self) -> String {
        match self {
            Self::Index(i) => i.to_string(),
            Self::Key(key) => key.clone(),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, ".{}", key),
            Self::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathStep {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathStep {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Full path from a document root to a value
pub type JsonPath = Vec<PathStep>;

/// Format a path as a string, `<root>` for the empty path
pub fn format_path(path: &[PathStep]) -> String {
    if path.is_empty() {
        return String::from("<root>");
    }
    path.iter().map(|s| s.to_string()).collect::<String>()
}

/// Parse a dotted path such as `items.3.name` or `items[3].name`.
///
/// Purely numeric segments become index steps. An empty string (or `.`)
/// is the root path.
pub fn parse_path(input: &str) -> JsonPath {
    input
        .replace('[', ".")
        .replace(']', "")
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.parse::<usize>() {
            Ok(i) => PathStep::Index(i),
            Err(_) => PathStep::Key(segment.to_string()),
        })
        .collect()
}

/// Walk `path` from `root`, returning the value it addresses
pub fn value_at<'a>(root: &'a Value, path: &[PathStep]) -> Option<&'a Value> {
    path.iter().try_fold(root, |value, step| step.lookup(value))
}

/// JSON truthiness as the editor sees it: `null`, `false`, `""` and
/// numeric zero are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Keys present at a document position (array indices as strings)
pub(crate) fn existing_keys(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        Some(Value::Array(items)) => (0..items.len()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}
