use std::collections::HashMap;

use serde::Deserialize;

use morph_api::error::ConfigError;
use morph_api::metadata::{FieldDescriptor, FieldTag};

use crate::error::EngineError;

/// Root mapping document — parsed from TOML.
///
/// Declares which record fields carry custom conversion and how, as a
/// side-table next to the record definitions:
///
/// ```toml
/// [[records]]
/// name = "Order"
///
/// [[records.fields]]
/// name = "price"
/// type = "currency"
/// converter = "json"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub records: Vec<RecordConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordConfig {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// Declared type tag of the field.
    #[serde(rename = "type")]
    pub declared: String,
    /// Converter kind governing the field.
    pub converter: String,
    /// Concrete target override (for abstract declared tags).
    #[serde(default)]
    pub target: Option<String>,
    /// Kind-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

impl FieldConfig {
    /// Build the descriptor this entry declares for `record`.
    pub fn descriptor(&self, record: &str) -> FieldDescriptor {
        let mut tag = FieldTag::new(&self.converter);
        tag.target = self.target.clone();
        tag.params = self.params.clone();
        FieldDescriptor::new(record, &self.name, &self.declared, tag)
    }
}

impl MappingConfig {
    /// Load a mapping document from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(ConfigError::new(format!("{path}: {e}"))))?;
        Self::parse(&content)
    }

    /// Parse a mapping document from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(ConfigError::new(e.to_string())))
    }
}
