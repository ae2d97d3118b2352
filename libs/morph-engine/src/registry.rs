use std::collections::HashMap;
use std::sync::Arc;

use morph_api::codec::TypeSupport;
use morph_api::converter::ConverterFactory;

/// Converter kinds known to the dispatcher.
///
/// Populated once at startup, read-only during marshalling. The engine does
/// not enumerate concrete kinds — whatever was registered serves every
/// field tagged with that kind name.
#[derive(Default)]
pub struct KindRegistry {
    kinds: HashMap<&'static str, Arc<dyn ConverterFactory>>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind. Re-registering a name replaces the previous factory.
    pub fn register(&mut self, factory: Arc<dyn ConverterFactory>) {
        let kind = factory.kind();
        if self.kinds.insert(kind, factory).is_some() {
            tracing::warn!(kind, "converter kind replaced");
        } else {
            tracing::info!(kind, "registered converter kind");
        }
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn ConverterFactory>> {
        self.kinds.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }
}

/// Convertible types known to the dispatcher, keyed by registered tag.
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<&'static str, TypeSupport>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type. Re-registering a tag replaces the previous entry.
    pub fn register(&mut self, support: TypeSupport) {
        let tag = support.name();
        if self.types.insert(tag, support).is_some() {
            tracing::warn!(tag, "type support replaced");
        } else {
            tracing::info!(tag, "registered type support");
        }
    }

    pub fn get(&self, tag: &str) -> Option<&TypeSupport> {
        self.types.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }
}
