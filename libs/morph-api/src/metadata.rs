use std::collections::HashMap;

use crate::config::ConfigValues;

/// Conversion metadata a record module attaches to one field.
///
/// Absence of a tag means the field uses the mapper's built-in primitive
/// handling — only tagged fields pass through this layer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldTag {
    /// Converter kind identifier ("json", "text", ...).
    pub kind: String,
    /// Concrete type tag overriding the field's declared type.
    ///
    /// Fields declared as an abstract tag the codec cannot reconstruct into
    /// fix their concrete form here, once, at registration.
    #[serde(default)]
    pub target: Option<String>,
    /// Kind-specific parameters, validated against the factory declarations.
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

impl FieldTag {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            params: HashMap::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

/// Identifies one convertible field.
///
/// Immutable; created once per (record, field) pair and kept for the life
/// of the process.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldDescriptor {
    /// Owning record type name.
    pub record: String,
    /// Field name within the record.
    pub field: String,
    /// Type tag of the field as declared on the record.
    pub declared: String,
    pub tag: FieldTag,
}

impl FieldDescriptor {
    pub fn new(
        record: impl Into<String>,
        field: impl Into<String>,
        declared: impl Into<String>,
        tag: FieldTag,
    ) -> Self {
        Self {
            record: record.into(),
            field: field.into(),
            declared: declared.into(),
            tag,
        }
    }
}

/// Resolved configuration for one field.
///
/// Derived deterministically from a `FieldDescriptor`: the same descriptor
/// always resolves to an equal spec, which is what makes caching safe.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterSpec {
    pub kind: String,
    /// Target type tag the converter is bound to (override wins over declared).
    pub target: String,
    pub config: ConfigValues,
}
