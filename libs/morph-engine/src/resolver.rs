use std::collections::{HashMap, HashSet};

use morph_api::config::{ConfigParam, ConfigValues, ParamType, ParamValue};
use morph_api::error::ConfigError;
use morph_api::metadata::{ConverterSpec, FieldDescriptor};

use crate::registry::{KindRegistry, TypeRegistry};

/// Resolve raw field metadata into a `ConverterSpec`.
///
/// Pure function of (descriptor, registries): repeated calls yield equal
/// specs, which is what lets the dispatcher cache the result.
///
/// Fails fast — structurally invalid metadata is rejected here, at
/// registration time, never deferred to the first converted value.
pub fn resolve_spec(
    desc: &FieldDescriptor,
    kinds: &KindRegistry,
    types: &TypeRegistry,
) -> Result<ConverterSpec, ConfigError> {
    let field_ctx = format!("field '{}.{}'", desc.record, desc.field);

    let factory = kinds.get(&desc.tag.kind).ok_or_else(|| {
        ConfigError::new(format!("unknown converter kind '{}'", desc.tag.kind))
            .with_context(&field_ctx)
    })?;

    // Override wins over the declared type: fields declared as an abstract
    // tag fix their concrete form here, once, not per value.
    let target = desc.tag.target.as_deref().unwrap_or(&desc.declared);
    if !types.contains(target) {
        return Err(
            ConfigError::new(format!("unknown type tag '{target}'")).with_context(&field_ctx)
        );
    }

    let params = factory.params();
    let parsed = parse_tag_params(&desc.tag.params, &params).map_err(|e| e.with_context(&field_ctx))?;
    let config = validate_and_build(&parsed, &params).map_err(|e| e.with_context(&field_ctx))?;

    Ok(ConverterSpec {
        kind: desc.tag.kind.clone(),
        target: target.to_string(),
        config,
    })
}

/// Parse a field tag's raw params into typed key-value pairs.
///
/// - Rejects unknown keys (not declared by the factory).
/// - Converts `serde_json::Value` → `ParamValue` based on the declared type.
///
/// Returns only the keys present in the tag. Defaults and required-checks
/// are handled by `validate_and_build`.
pub fn parse_tag_params(
    raw: &HashMap<String, serde_json::Value>,
    params: &[ConfigParam],
) -> Result<HashMap<String, ParamValue>, ConfigError> {
    let known: HashSet<&str> = params.iter().map(|p| p.name.as_str()).collect();
    for key in raw.keys() {
        if !known.contains(key.as_str()) {
            return Err(ConfigError::new(format!("unknown parameter '{key}'")));
        }
    }

    let mut result = HashMap::new();
    for param in params {
        if let Some(v) = raw.get(&param.name) {
            let pv = value_to_param_value(v, param)?;
            result.insert(param.name.clone(), pv);
        }
    }

    Ok(result)
}

/// Build `ConfigValues` from parsed key-value pairs.
///
/// For each declared param:
/// - If present in `parsed`: use the value.
/// - If absent with default: use the default value.
/// - If absent and required: return an error.
pub fn validate_and_build(
    parsed: &HashMap<String, ParamValue>,
    params: &[ConfigParam],
) -> Result<ConfigValues, ConfigError> {
    let mut values = ConfigValues::new();

    for param in params {
        match parsed.get(&param.name) {
            Some(v) => {
                values.set(&param.name, v.clone());
            }
            None => {
                if let Some(ref default) = param.default {
                    values.set(&param.name, default.clone());
                } else if param.required {
                    return Err(ConfigError::new(format!(
                        "missing required parameter '{}'",
                        param.name
                    )));
                }
            }
        }
    }

    Ok(values)
}

/// Convert a single raw value to a `ParamValue` according to the declared type.
fn value_to_param_value(
    val: &serde_json::Value,
    param: &ConfigParam,
) -> Result<ParamValue, ConfigError> {
    match param.param_type {
        ParamType::Bool => {
            let b = val.as_bool().ok_or_else(|| {
                ConfigError::new(format!("parameter '{}': expected bool", param.name))
            })?;
            Ok(ParamValue::Bool(b))
        }
        ParamType::I64 => {
            let i = val.as_i64().ok_or_else(|| {
                ConfigError::new(format!("parameter '{}': expected integer", param.name))
            })?;
            Ok(ParamValue::I64(i))
        }
        ParamType::U64 => {
            // Try u64 first (covers positive integers from any source).
            if let Some(u) = val.as_u64() {
                return Ok(ParamValue::U64(u));
            }
            // Fall back to i64 for metadata sources that only have signed integers.
            let i = val.as_i64().ok_or_else(|| {
                ConfigError::new(format!("parameter '{}': expected integer", param.name))
            })?;
            if i < 0 {
                return Err(ConfigError::new(format!(
                    "parameter '{}': expected non-negative integer, got {i}",
                    param.name
                )));
            }
            Ok(ParamValue::U64(i as u64))
        }
        ParamType::F64 => {
            let f = val.as_f64().ok_or_else(|| {
                ConfigError::new(format!("parameter '{}': expected float", param.name))
            })?;
            Ok(ParamValue::F64(f))
        }
        ParamType::Str => {
            let s = val.as_str().ok_or_else(|| {
                ConfigError::new(format!("parameter '{}': expected string", param.name))
            })?;
            Ok(ParamValue::Str(s.to_string()))
        }
    }
}
