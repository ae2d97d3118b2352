use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::codec::TypeSupport;
use crate::config::{ConfigParam, ConfigValues};
use crate::error::{ConfigError, ConvertError};
use crate::value::{DomainValue, StorageValue};

/// Field-level bidirectional converter.
///
/// One instance per (record, field), bound to a single target type at
/// construction. Implementations are stateless and shared via `Arc` across
/// every value of that field — `convert` never mutates its input, and no
/// per-value state survives a call.
pub trait FieldConverter: Send + Sync {
    /// Registered tag of the concrete type `unconvert` reconstructs into.
    fn target_type(&self) -> &str;

    /// Domain value → storage representation.
    ///
    /// Fails only when the codec cannot represent the value; the codec
    /// failure is attached as the error source.
    fn convert(&self, value: &dyn Any) -> Result<StorageValue, ConvertError>;

    /// Storage representation → domain value.
    ///
    /// Fails on a wrong storage variant or an unparseable payload. Never
    /// returns a partially populated value.
    fn unconvert(&self, stored: &StorageValue) -> Result<DomainValue, ConvertError>;
}

/// Factory for one converter kind ("json", "text", ...).
///
/// The engine doesn't enumerate concrete kinds — whatever is registered
/// under a kind name at startup serves every field tagged with that name.
pub trait ConverterFactory: Send + Sync {
    /// Kind identifier referenced by field metadata.
    fn kind(&self) -> &'static str;

    /// Parameters this kind accepts in field metadata.
    fn params(&self) -> Vec<ConfigParam>;

    /// Build a converter bound to `target`, configured by validated values.
    ///
    /// Fails when `target` lacks the codec capability this kind delegates
    /// to — an opaque declared type with no concrete override ends up here.
    fn create(
        &self,
        target: &TypeSupport,
        config: &ConfigValues,
    ) -> Result<Arc<dyn FieldConverter>, ConfigError>;
}

/// Typed view over an erased converter.
pub struct TypedConverter<T> {
    inner: Arc<dyn FieldConverter>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedConverter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> TypedConverter<T> {
    pub fn new(inner: Arc<dyn FieldConverter>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    pub fn target_type(&self) -> &str {
        self.inner.target_type()
    }

    pub fn convert(&self, value: &T) -> Result<StorageValue, ConvertError> {
        self.inner.convert(value)
    }

    pub fn unconvert(&self, stored: &StorageValue) -> Result<T, ConvertError> {
        let value = self.inner.unconvert(stored)?;
        let found = value.type_name();
        value.downcast::<T>().map_err(|_| {
            ConvertError::new(format!(
                "converter produced {found}, caller expected {}",
                std::any::type_name::<T>()
            ))
        })
    }
}
