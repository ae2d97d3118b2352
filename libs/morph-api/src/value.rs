use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Primitive representation a schemaless key-value item store accepts.
///
/// Strategy by variant:
/// - `Text`: UTF-8 text (JSON documents, rendered scalars)
/// - `Number`: decimal kept as text — the store compares and indexes it
///   without float loss
/// - `Bytes`: opaque binary payloads
/// - `Bool`, `Null`: passed through as-is
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageValue {
    Text(String),
    Number(String),
    Bytes(Vec<u8>),
    Bool(bool),
    Null,
}

impl StorageValue {
    /// Variant name for diagnostics.
    pub fn variant(&self) -> &'static str {
        match self {
            StorageValue::Text(_) => "text",
            StorageValue::Number(_) => "number",
            StorageValue::Bytes(_) => "bytes",
            StorageValue::Bool(_) => "bool",
            StorageValue::Null => "null",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StorageValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&str> {
        match self {
            StorageValue::Number(s) => Some(s),
            _ => None,
        }
    }
}

/// One record's converted fields, keyed by field name.
pub type Item = HashMap<String, StorageValue>;

/// Strongly typed in-memory field value, carried type-erased through the
/// conversion layer.
///
/// The owning mapper knows the concrete type; converters recover it through
/// the codec entry points captured at type registration.
pub struct DomainValue {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl DomainValue {
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Rust type name of the contained value (diagnostics only).
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Recover the typed value. On mismatch the value is returned unchanged.
    pub fn downcast<T: 'static>(self) -> Result<T, DomainValue> {
        match self.value.downcast::<T>() {
            Ok(v) => Ok(*v),
            Err(value) => Err(DomainValue {
                value,
                type_name: self.type_name,
            }),
        }
    }
}

impl fmt::Debug for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DomainValue").field(&self.type_name).finish()
    }
}
