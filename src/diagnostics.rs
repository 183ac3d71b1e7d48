//! Diagnostics
//!
//! Configuration defects found in a compiled schema. These are kept
//! apart from document validation errors: a defect means the schema was
//! compiled incorrectly, and the affected check is skipped instead of
//! being reported against the document.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing schema defects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Discriminator mapping names a definition absent from the registry
    UnresolvedDiscriminatorTarget,
    /// Array node with a negative `minItems`
    NegativeMinItems,
    /// Array node with a negative `maxItems`
    NegativeMaxItems,
    /// Discriminator target is not an object, so the tag cannot be pinned
    UntaggableTarget,
    /// Discriminator with an empty mapping
    EmptyDiscriminatorMapping,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedDiscriminatorTarget => "E001",
            Self::NegativeMinItems => "E002",
            Self::NegativeMaxItems => "E003",
            Self::UntaggableTarget => "W001",
            Self::EmptyDiscriminatorMapping => "W002",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedDiscriminatorTarget
            | Self::NegativeMinItems
            | Self::NegativeMaxItems => Severity::Error,

            Self::UntaggableTarget | Self::EmptyDiscriminatorMapping => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Definition the defect was found in
    pub definition: String,
    /// Node path inside the definition, `<root>` for the definition itself
    pub location: String,
    pub code: DiagnosticCode,
    pub message: String,
}

impl DiagnosticItem {
    pub fn new(
        definition: impl Into<String>,
        location: impl Into<String>,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            definition: definition.into(),
            location: location.into(),
            code,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({} at {})",
            self.code,
            self.code.severity(),
            self.message,
            self.definition,
            self.location
        )
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of schema defects gathered while building a registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item; identical items are recorded once
    pub fn push(&mut self, item: DiagnosticItem) {
        if !self.items.contains(&item) {
            tracing::warn!(code = %item.code, definition = %item.definition, "{}", item.message);
            self.items.push(item);
        }
    }

    pub fn unresolved_target(&mut self, definition: &str, location: &str, tag: &str, target: &str) {
        self.push(DiagnosticItem::new(
            definition,
            location,
            DiagnosticCode::UnresolvedDiscriminatorTarget,
            format!("discriminator tag '{}' maps to unknown definition '{}'", tag, target),
        ));
    }

    pub fn negative_bound(&mut self, definition: &str, location: &str, code: DiagnosticCode, bound: i64) {
        let name = match code {
            DiagnosticCode::NegativeMaxItems => "maxItems",
            _ => "minItems",
        };
        self.push(DiagnosticItem::new(
            definition,
            location,
            code,
            format!("invalid {} configuration: {}", name, bound),
        ));
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Items carrying a specific code
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_are_recorded_once() {
        let mut diags = Diagnostics::new();
        diags.unresolved_target("Root", ".trigger", "a", "Missing");
        diags.unresolved_target("Root", ".trigger", "a", "Missing");
        assert_eq!(diags.len(), 1);
        assert!(diags.has_errors());
    }

    #[test]
    fn test_severity_split() {
        let mut diags = Diagnostics::new();
        diags.negative_bound("Root", ".list", DiagnosticCode::NegativeMinItems, -1);
        diags.push(DiagnosticItem::new(
            "Root",
            "<root>",
            DiagnosticCode::EmptyDiscriminatorMapping,
            "empty mapping",
        ));
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(diags.warnings().count(), 1);
        assert_eq!(diags.with_code(DiagnosticCode::NegativeMinItems).count(), 1);
    }

    #[test]
    fn test_display_includes_code_and_location() {
        let item = DiagnosticItem::new(
            "Root",
            ".list",
            DiagnosticCode::NegativeMaxItems,
            "invalid maxItems configuration: -2",
        );
        assert_eq!(
            item.to_string(),
            "[E003] error: invalid maxItems configuration: -2 (Root at .list)"
        );
    }
}
