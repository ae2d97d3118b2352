use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use morph_api::codec::TypeSupport;
use morph_api::converter::{ConverterFactory, FieldConverter, TypedConverter};
use morph_api::error::ConfigError;
use morph_api::metadata::FieldDescriptor;
use morph_api::value::{DomainValue, Item};

use crate::config::MappingConfig;
use crate::error::EngineError;
use crate::registry::{KindRegistry, TypeRegistry};
use crate::resolver;

/// Registered field metadata, keyed by record then field name.
///
/// Interior mutability so record modules can register at load, from any
/// thread, after the dispatcher is shared.
#[derive(Default)]
struct RecordCatalog {
    records: RwLock<HashMap<String, HashMap<String, FieldDescriptor>>>,
}

impl RecordCatalog {
    fn insert(&self, desc: FieldDescriptor) {
        let mut guard = match self.records.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("record catalog write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard
            .entry(desc.record.clone())
            .or_default()
            .insert(desc.field.clone(), desc);
    }

    fn lookup(&self, record: &str, field: &str) -> Result<FieldDescriptor, EngineError> {
        let guard = match self.records.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("record catalog read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let fields = guard
            .get(record)
            .ok_or_else(|| EngineError::UnknownRecord(record.to_string()))?;
        fields.get(field).cloned().ok_or_else(|| EngineError::UnknownField {
            record: record.to_string(),
            field: field.to_string(),
        })
    }
}

/// Process-wide lookup from (record, field) to a resolved converter.
///
/// Kinds and types are registered first, at startup (`&mut`); record
/// metadata may arrive later, from module init code (`&self`). Converters
/// are built lazily on first lookup and cached for the life of the process —
/// the cache is bounded by the number of distinct convertible fields, not
/// by request volume. No eviction.
#[derive(Default)]
pub struct Dispatcher {
    kinds: KindRegistry,
    types: TypeRegistry,
    catalog: RecordCatalog,
    cache: RwLock<HashMap<String, HashMap<String, Arc<dyn FieldConverter>>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_kind(&mut self, factory: Arc<dyn ConverterFactory>) {
        self.kinds.register(factory);
    }

    pub fn register_type(&mut self, support: TypeSupport) {
        self.types.register(support);
    }

    /// Register one convertible field.
    ///
    /// The descriptor is validated eagerly — a structurally bad tag fails
    /// here, not on first use. Any cached converter for the key is dropped
    /// so a stale converter cannot outlive its metadata.
    pub fn register_field(&self, desc: FieldDescriptor) -> Result<(), EngineError> {
        resolver::resolve_spec(&desc, &self.kinds, &self.types)?;

        {
            let mut cache = match self.cache.write() {
                Ok(g) => g,
                Err(poisoned) => {
                    tracing::warn!("converter cache write lock was poisoned, recovering");
                    poisoned.into_inner()
                }
            };
            if let Some(fields) = cache.get_mut(&desc.record) {
                fields.remove(&desc.field);
            }
        }

        tracing::info!(
            record = %desc.record,
            field = %desc.field,
            kind = %desc.tag.kind,
            "registered convertible field"
        );
        self.catalog.insert(desc);
        Ok(())
    }

    /// Register every field of a parsed mapping document.
    pub fn register_mapping(&self, config: &MappingConfig) -> Result<(), EngineError> {
        for record in &config.records {
            for field in &record.fields {
                self.register_field(field.descriptor(&record.name))
                    .map_err(|e| e.with_context("mapping document"))?;
            }
        }
        Ok(())
    }

    /// Cached converter lookup.
    ///
    /// On a miss the converter is resolved and built outside any lock; the
    /// first insert wins. Concurrent first lookups may build throwaway
    /// duplicates, but every caller observes the one canonical instance
    /// thereafter — converters are stateless, so the duplicates behave
    /// identically while they live.
    pub fn converter(
        &self,
        record: &str,
        field: &str,
    ) -> Result<Arc<dyn FieldConverter>, EngineError> {
        {
            let cache = match self.cache.read() {
                Ok(g) => g,
                Err(poisoned) => {
                    tracing::warn!("converter cache read lock was poisoned, recovering");
                    poisoned.into_inner()
                }
            };
            if let Some(conv) = cache.get(record).and_then(|fields| fields.get(field)) {
                return Ok(conv.clone());
            }
        }

        let desc = self.catalog.lookup(record, field)?;
        let spec = resolver::resolve_spec(&desc, &self.kinds, &self.types)?;
        let factory = self
            .kinds
            .get(&spec.kind)
            .ok_or_else(|| ConfigError::new(format!("unknown converter kind '{}'", spec.kind)))?;
        let target = self
            .types
            .get(&spec.target)
            .ok_or_else(|| ConfigError::new(format!("unknown type tag '{}'", spec.target)))?;
        let converter = factory
            .create(target, &spec.config)
            .map_err(|e| e.with_context(format!("field '{record}.{field}'")))?;

        tracing::debug!(
            record,
            field,
            kind = %spec.kind,
            target = %spec.target,
            "built field converter"
        );

        let mut cache = match self.cache.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("converter cache write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let entry = cache
            .entry(record.to_string())
            .or_default()
            .entry(field.to_string())
            .or_insert(converter);
        Ok(entry.clone())
    }

    /// Typed view over `converter`.
    pub fn typed<T: 'static>(
        &self,
        record: &str,
        field: &str,
    ) -> Result<TypedConverter<T>, EngineError> {
        Ok(TypedConverter::new(self.converter(record, field)?))
    }

    /// Convert the supplied fields of one record into a storage item.
    ///
    /// All-or-nothing: the first failing field aborts the whole record, so
    /// a partially converted item never reaches the store.
    pub fn marshal(&self, record: &str, fields: &[(&str, &dyn Any)]) -> Result<Item, EngineError> {
        let mut item = Item::with_capacity(fields.len());
        for (field, value) in fields {
            let converter = self.converter(record, field)?;
            let stored = converter
                .convert(*value)
                .map_err(|e| e.with_context(format!("field '{record}.{field}'")))?;
            item.insert((*field).to_string(), stored);
        }
        Ok(item)
    }

    /// Reconstruct domain values from a stored item.
    ///
    /// Every key in the item must be a registered convertible field of the
    /// record. All-or-nothing, like `marshal`.
    pub fn unmarshal(
        &self,
        record: &str,
        item: &Item,
    ) -> Result<HashMap<String, DomainValue>, EngineError> {
        let mut values = HashMap::with_capacity(item.len());
        for (field, stored) in item {
            let converter = self.converter(record, field)?;
            let value = converter
                .unconvert(stored)
                .map_err(|e| e.with_context(format!("field '{record}.{field}'")))?;
            values.insert(field.clone(), value);
        }
        Ok(values)
    }
}
