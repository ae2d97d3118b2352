use std::any::Any;
use std::sync::Arc;

use morph_api::codec::{TextCodec, TypeSupport};
use morph_api::config::{ConfigParam, ConfigValues, ParamType, ParamValue};
use morph_api::converter::{ConverterFactory, FieldConverter};
use morph_api::error::{ConfigError, ConvertError};
use morph_api::value::{DomainValue, StorageValue};

/// Storage variant the `text` kind writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextStorage {
    Text,
    /// Digit renderings (epoch seconds, counters) kept as store numbers so
    /// range scans and ordering work on them.
    Number,
}

impl TextStorage {
    fn label(self) -> &'static str {
        match self {
            TextStorage::Text => "text",
            TextStorage::Number => "number",
        }
    }
}

/// `Display`/`FromStr`-backed field converter for scalar-like types.
pub struct TextConverter {
    target: &'static str,
    codec: TextCodec,
    storage: TextStorage,
}

impl FieldConverter for TextConverter {
    fn target_type(&self) -> &str {
        self.target
    }

    fn convert(&self, value: &dyn Any) -> Result<StorageValue, ConvertError> {
        let text = (self.codec.render)(value)?;
        Ok(match self.storage {
            TextStorage::Text => StorageValue::Text(text),
            TextStorage::Number => StorageValue::Number(text),
        })
    }

    fn unconvert(&self, stored: &StorageValue) -> Result<DomainValue, ConvertError> {
        let text = match (self.storage, stored) {
            (TextStorage::Text, StorageValue::Text(s)) => s,
            (TextStorage::Number, StorageValue::Number(s)) => s,
            (expected, other) => {
                return Err(ConvertError::new(format!(
                    "expected {} storage for this field, got {}",
                    expected.label(),
                    other.variant()
                )));
            }
        };
        (self.codec.parse)(text)
    }
}

/// Factory for the `text` kind.
pub struct TextConverterFactory;

impl ConverterFactory for TextConverterFactory {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn params(&self) -> Vec<ConfigParam> {
        vec![ConfigParam {
            name: "storage".into(),
            param_type: ParamType::Str,
            required: false,
            default: Some(ParamValue::Str("text".into())),
            description: "Storage variant to write: 'text' or 'number'".into(),
        }]
    }

    fn create(
        &self,
        target: &TypeSupport,
        config: &ConfigValues,
    ) -> Result<Arc<dyn FieldConverter>, ConfigError> {
        let codec = *target.text_codec().ok_or_else(|| {
            ConfigError::new(format!(
                "type '{}' has no text codec support; declare a concrete target override",
                target.name()
            ))
        })?;

        let storage = match config.get_str("storage").unwrap_or("text") {
            "text" => TextStorage::Text,
            "number" => TextStorage::Number,
            other => {
                return Err(ConfigError::new(format!(
                    "invalid storage variant '{other}' (expected 'text' or 'number')"
                )));
            }
        };

        Ok(Arc::new(TextConverter {
            target: target.name(),
            codec,
            storage,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::net::IpAddr;

    use super::*;

    fn converter(support: TypeSupport, storage: &str) -> Arc<dyn FieldConverter> {
        let mut config = ConfigValues::new();
        config.set("storage", ParamValue::Str(storage.into()));
        TextConverterFactory.create(&support, &config).unwrap()
    }

    #[test]
    fn epoch_seconds_round_trip_as_number() {
        let conv = converter(TypeSupport::text::<u64>("epoch_seconds"), "number");

        let stored = conv.convert(&1_700_000_000u64).unwrap();
        assert_eq!(stored.as_number(), Some("1700000000"));

        let back = conv.unconvert(&stored).unwrap().downcast::<u64>().unwrap();
        assert_eq!(back, 1_700_000_000);
    }

    #[test]
    fn address_round_trip_as_text() {
        let conv = converter(TypeSupport::text::<IpAddr>("ip_addr"), "text");
        let addr: IpAddr = "10.0.0.1".parse().unwrap();

        let stored = conv.convert(&addr).unwrap();
        assert_eq!(stored, StorageValue::Text("10.0.0.1".into()));

        let back = conv.unconvert(&stored).unwrap().downcast::<IpAddr>().unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn unparseable_text_is_an_error_with_cause() {
        let conv = converter(TypeSupport::text::<u64>("epoch_seconds"), "number");
        let err = conv
            .unconvert(&StorageValue::Number("soon".into()))
            .unwrap_err();
        assert!(err.source().is_some());
    }

    #[test]
    fn storage_variant_mismatch_is_an_error() {
        let conv = converter(TypeSupport::text::<u64>("epoch_seconds"), "number");
        let err = conv
            .unconvert(&StorageValue::Text("1700000000".into()))
            .unwrap_err();
        assert!(err.to_string().contains("expected number storage"));
    }

    #[test]
    fn invalid_storage_param_is_rejected_at_create() {
        let support = TypeSupport::text::<u64>("epoch_seconds");
        let mut config = ConfigValues::new();
        config.set("storage", ParamValue::Str("binary".into()));
        let err = TextConverterFactory.create(&support, &config).err().unwrap();
        assert!(err.to_string().contains("invalid storage variant 'binary'"));
    }

    #[test]
    fn opaque_target_is_rejected_at_create() {
        let err = TextConverterFactory
            .create(&TypeSupport::opaque("money"), &ConfigValues::new())
            .err()
            .unwrap();
        assert!(err.to_string().contains("no text codec support"));
    }
}
