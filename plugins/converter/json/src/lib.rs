use std::any::Any;
use std::sync::Arc;

use morph_api::codec::{JsonCodec, TypeSupport};
use morph_api::config::{ConfigParam, ConfigValues, ParamType, ParamValue};
use morph_api::converter::{ConverterFactory, FieldConverter};
use morph_api::error::{ConfigError, ConvertError};
use morph_api::value::{DomainValue, StorageValue};

/// JSON-backed field converter.
///
/// Stores the field as a `Text` value holding a JSON document whose
/// structure mirrors the domain value's public fields, e.g. a
/// `Currency { amount: 79.99, unit: "USD" }` field becomes
/// `{"amount":79.99,"unit":"USD"}`. The document stays readable by the
/// same codec configuration across versions.
pub struct JsonConverter {
    target: &'static str,
    codec: JsonCodec,
    pretty: bool,
}

impl FieldConverter for JsonConverter {
    fn target_type(&self) -> &str {
        self.target
    }

    fn convert(&self, value: &dyn Any) -> Result<StorageValue, ConvertError> {
        let text = if self.pretty {
            (self.codec.serialize_pretty)(value)?
        } else {
            (self.codec.serialize)(value)?
        };
        Ok(StorageValue::Text(text))
    }

    fn unconvert(&self, stored: &StorageValue) -> Result<DomainValue, ConvertError> {
        match stored {
            StorageValue::Text(text) => (self.codec.deserialize)(text),
            other => Err(ConvertError::new(format!(
                "expected text storage for a JSON field, got {}",
                other.variant()
            ))),
        }
    }
}

/// Factory for the `json` kind.
pub struct JsonConverterFactory;

impl ConverterFactory for JsonConverterFactory {
    fn kind(&self) -> &'static str {
        "json"
    }

    fn params(&self) -> Vec<ConfigParam> {
        vec![ConfigParam {
            name: "pretty".into(),
            param_type: ParamType::Bool,
            required: false,
            default: Some(ParamValue::Bool(false)),
            description: "Emit indented JSON instead of the compact form".into(),
        }]
    }

    fn create(
        &self,
        target: &TypeSupport,
        config: &ConfigValues,
    ) -> Result<Arc<dyn FieldConverter>, ConfigError> {
        let codec = *target.json_codec().ok_or_else(|| {
            ConfigError::new(format!(
                "type '{}' has no JSON codec support; declare a concrete target override",
                target.name()
            ))
        })?;

        Ok(Arc::new(JsonConverter {
            target: target.name(),
            codec,
            pretty: config.get_bool("pretty").unwrap_or(false),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Currency {
        amount: f64,
        unit: String,
    }

    fn currency_converter(pretty: bool) -> Arc<dyn FieldConverter> {
        let support = TypeSupport::json::<Currency>("currency");
        let mut config = ConfigValues::new();
        config.set("pretty", ParamValue::Bool(pretty));
        JsonConverterFactory.create(&support, &config).unwrap()
    }

    #[test]
    fn currency_round_trip() {
        let conv = currency_converter(false);
        let value = Currency {
            amount: 79.99,
            unit: "USD".into(),
        };

        let stored = conv.convert(&value).unwrap();
        assert_eq!(
            stored,
            StorageValue::Text(r#"{"amount":79.99,"unit":"USD"}"#.into())
        );

        let back = conv.unconvert(&stored).unwrap().downcast::<Currency>().unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn pretty_output_still_round_trips() {
        let conv = currency_converter(true);
        let value = Currency {
            amount: 1.5,
            unit: "EUR".into(),
        };

        let stored = conv.convert(&value).unwrap();
        assert!(stored.as_text().unwrap().contains('\n'));

        let back = conv.unconvert(&stored).unwrap().downcast::<Currency>().unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn malformed_field_value_is_an_error() {
        let conv = currency_converter(false);
        let stored = StorageValue::Text(r#"{"amount":"not-a-number"}"#.into());
        let err = conv.unconvert(&stored).unwrap_err();
        assert!(err.source().is_some());
    }

    #[test]
    fn wrong_storage_variant_is_an_error() {
        let conv = currency_converter(false);
        let err = conv.unconvert(&StorageValue::Bool(true)).unwrap_err();
        assert!(err.to_string().contains("expected text storage"));
    }

    #[test]
    fn wrong_runtime_type_is_an_error() {
        let conv = currency_converter(false);
        let err = conv.convert(&42u32).unwrap_err();
        assert!(err.to_string().contains("is not a"));
    }

    #[test]
    fn opaque_target_is_rejected_at_create() {
        let err = JsonConverterFactory
            .create(&TypeSupport::opaque("money"), &ConfigValues::new())
            .err()
            .unwrap();
        assert!(err.to_string().contains("no JSON codec support"));
    }

    #[test]
    fn untraversable_value_fails_at_convert_with_cause() {
        struct Untraversable;

        impl serde::Serialize for Untraversable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("cannot traverse value"))
            }
        }

        impl<'de> serde::Deserialize<'de> for Untraversable {
            fn deserialize<D: serde::Deserializer<'de>>(_: D) -> Result<Self, D::Error> {
                Err(serde::de::Error::custom("cannot reconstruct value"))
            }
        }

        let support = TypeSupport::json::<Untraversable>("untraversable");
        let conv = JsonConverterFactory
            .create(&support, &ConfigValues::new())
            .unwrap();

        let err = conv.convert(&Untraversable).unwrap_err();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("failed to serialize"));
    }
}
