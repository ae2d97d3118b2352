use std::any::Any;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ConvertError;
use crate::value::DomainValue;

/// JSON entry points of one registered type.
#[derive(Clone, Copy)]
pub struct JsonCodec {
    pub serialize: fn(&dyn Any) -> Result<String, ConvertError>,
    pub serialize_pretty: fn(&dyn Any) -> Result<String, ConvertError>,
    pub deserialize: fn(&str) -> Result<DomainValue, ConvertError>,
}

/// Text entry points of one registered type (`Display` / `FromStr`).
#[derive(Clone, Copy)]
pub struct TextCodec {
    pub render: fn(&dyn Any) -> Result<String, ConvertError>,
    pub parse: fn(&str) -> Result<DomainValue, ConvertError>,
}

/// Codec capabilities of one convertible type, registered under a stable tag.
///
/// Entry points are captured monomorphically at registration — the layer
/// never re-implements serialization, it only picks which entry point
/// governs a field and delegates.
///
/// - `json` / `text` / `json_text`: concrete types with codec support.
/// - `opaque`: an abstract tag a field may be declared with. It has no entry
///   points, so a field declared with it must carry a concrete target
///   override.
#[derive(Clone)]
pub struct TypeSupport {
    name: &'static str,
    json: Option<JsonCodec>,
    text: Option<TextCodec>,
}

impl TypeSupport {
    pub fn json<T>(name: &'static str) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            name,
            json: Some(json_codec::<T>()),
            text: None,
        }
    }

    pub fn text<T>(name: &'static str) -> Self
    where
        T: Display + FromStr + Send + Sync + 'static,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        Self {
            name,
            json: None,
            text: Some(text_codec::<T>()),
        }
    }

    pub fn json_text<T>(name: &'static str) -> Self
    where
        T: Serialize + DeserializeOwned + Display + FromStr + Send + Sync + 'static,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        Self {
            name,
            json: Some(json_codec::<T>()),
            text: Some(text_codec::<T>()),
        }
    }

    pub fn opaque(name: &'static str) -> Self {
        Self {
            name,
            json: None,
            text: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn json_codec(&self) -> Option<&JsonCodec> {
        self.json.as_ref()
    }

    pub fn text_codec(&self) -> Option<&TextCodec> {
        self.text.as_ref()
    }
}

impl fmt::Debug for TypeSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSupport")
            .field("name", &self.name)
            .field("json", &self.json.is_some())
            .field("text", &self.text.is_some())
            .finish()
    }
}

fn json_codec<T>() -> JsonCodec
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    JsonCodec {
        serialize: serialize_json::<T>,
        serialize_pretty: serialize_json_pretty::<T>,
        deserialize: deserialize_json::<T>,
    }
}

fn text_codec<T>() -> TextCodec
where
    T: Display + FromStr + Send + Sync + 'static,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    TextCodec {
        render: render_text::<T>,
        parse: parse_text::<T>,
    }
}

fn expect_ref<T: 'static>(value: &dyn Any) -> Result<&T, ConvertError> {
    value.downcast_ref::<T>().ok_or_else(|| {
        ConvertError::new(format!("value is not a {}", std::any::type_name::<T>()))
    })
}

fn serialize_json<T: Serialize + 'static>(value: &dyn Any) -> Result<String, ConvertError> {
    let value = expect_ref::<T>(value)?;
    serde_json::to_string(value).map_err(|e| {
        ConvertError::with_source(
            format!("failed to serialize {} to JSON", std::any::type_name::<T>()),
            e,
        )
    })
}

fn serialize_json_pretty<T: Serialize + 'static>(value: &dyn Any) -> Result<String, ConvertError> {
    let value = expect_ref::<T>(value)?;
    serde_json::to_string_pretty(value).map_err(|e| {
        ConvertError::with_source(
            format!("failed to serialize {} to JSON", std::any::type_name::<T>()),
            e,
        )
    })
}

fn deserialize_json<T>(text: &str) -> Result<DomainValue, ConvertError>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let value: T = serde_json::from_str(text).map_err(|e| {
        ConvertError::with_source(
            format!("failed to parse JSON as {}", std::any::type_name::<T>()),
            e,
        )
    })?;
    Ok(DomainValue::new(value))
}

fn render_text<T: Display + 'static>(value: &dyn Any) -> Result<String, ConvertError> {
    Ok(expect_ref::<T>(value)?.to_string())
}

fn parse_text<T>(text: &str) -> Result<DomainValue, ConvertError>
where
    T: FromStr + Send + Sync + 'static,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value: T = text.parse().map_err(|e| {
        ConvertError::with_source(
            format!("failed to parse text as {}", std::any::type_name::<T>()),
            e,
        )
    })?;
    Ok(DomainValue::new(value))
}
