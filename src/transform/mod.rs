//! Record transformation
//!
//! Raw API records are shaped against the catalog before emission: fields
//! that are not selected (or not in the schema) are removed and values are
//! coerced to the declared JSON types.

use crate::catalog::Metadata;
use crate::error::{Error, Result};
use crate::schema::{JsonSchema, JsonType, SchemaProperty};
use crate::types::{JsonObject, JsonValue};
use std::collections::BTreeMap;

/// Shapes raw records to their catalog schema
#[derive(Debug, Clone, Copy, Default)]
pub struct Transformer;

impl Transformer {
    /// Create a transformer
    pub fn new() -> Self {
        Self
    }

    /// Transform one record.
    ///
    /// Keys missing from the schema and deselected fields are dropped. A value
    /// that cannot be coerced to any declared type fails the record.
    pub fn transform(
        &self,
        record: &JsonObject,
        schema: &JsonSchema,
        metadata: &Metadata,
    ) -> Result<JsonObject> {
        let mut out = JsonObject::new();
        for (key, value) in record {
            let Some(property) = schema.get_property(key) else {
                continue;
            };
            if !metadata.is_field_selected(key) {
                continue;
            }
            out.insert(key.clone(), coerce(value, property, key)?);
        }
        Ok(out)
    }
}

fn coerce(value: &JsonValue, property: &SchemaProperty, path: &str) -> Result<JsonValue> {
    if value.is_null() {
        return if property.is_nullable() {
            Ok(JsonValue::Null)
        } else {
            Err(Error::transform(path, "null is not allowed"))
        };
    }

    for json_type in property.json_type.non_null() {
        if let Some(coerced) = coerce_to(value, json_type, property, path)? {
            return Ok(coerced);
        }
    }

    Err(Error::transform(
        path,
        format!("cannot coerce {value} to {:?}", property.json_type),
    ))
}

/// Try one target type; `Ok(None)` means the value does not fit it
fn coerce_to(
    value: &JsonValue,
    json_type: JsonType,
    property: &SchemaProperty,
    path: &str,
) -> Result<Option<JsonValue>> {
    let coerced = match (json_type, value) {
        (JsonType::String, JsonValue::String(_)) => Some(value.clone()),
        (JsonType::String, JsonValue::Number(n)) => Some(JsonValue::String(n.to_string())),
        (JsonType::String, JsonValue::Bool(b)) => Some(JsonValue::String(b.to_string())),

        (JsonType::Integer, JsonValue::Number(n)) => integer_from_number(n),
        (JsonType::Integer, JsonValue::String(s)) => s
            .trim()
            .parse::<i64>()
            .ok()
            .map(JsonValue::from)
            .or_else(|| {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .and_then(|n| integer_from_number(&n))
            }),

        (JsonType::Number, JsonValue::Number(_)) => Some(value.clone()),
        (JsonType::Number, JsonValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number),

        (JsonType::Boolean, JsonValue::Bool(_)) => Some(value.clone()),
        (JsonType::Boolean, JsonValue::String(s)) => match s.trim().to_ascii_lowercase().as_str()
        {
            "true" => Some(JsonValue::Bool(true)),
            "false" => Some(JsonValue::Bool(false)),
            _ => None,
        },
        (JsonType::Boolean, JsonValue::Number(n)) => {
            n.as_f64().map(|f| JsonValue::Bool(f != 0.0))
        }

        (JsonType::Object, JsonValue::Object(obj)) => {
            Some(JsonValue::Object(coerce_object(obj, property, path)?))
        }

        (JsonType::Array, JsonValue::Array(items)) => {
            Some(JsonValue::Array(coerce_array(items, property, path)?))
        }

        _ => None,
    };
    Ok(coerced)
}

fn integer_from_number(n: &serde_json::Number) -> Option<JsonValue> {
    if n.is_i64() || n.is_u64() {
        return Some(JsonValue::Number(n.clone()));
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| JsonValue::from(f as i64))
}

fn coerce_object(obj: &JsonObject, property: &SchemaProperty, path: &str) -> Result<JsonObject> {
    let Some(properties) = &property.properties else {
        return Ok(obj.clone());
    };
    coerce_properties(obj, properties, property.additional_properties == Some(true), path)
}

fn coerce_properties(
    obj: &JsonObject,
    properties: &BTreeMap<String, SchemaProperty>,
    keep_unknown: bool,
    path: &str,
) -> Result<JsonObject> {
    let mut out = JsonObject::new();
    for (key, value) in obj {
        match properties.get(key) {
            Some(nested) => {
                let nested_path = format!("{path}.{key}");
                out.insert(key.clone(), coerce(value, nested, &nested_path)?);
            }
            None if keep_unknown => {
                out.insert(key.clone(), value.clone());
            }
            None => {}
        }
    }
    Ok(out)
}

fn coerce_array(
    items: &[JsonValue],
    property: &SchemaProperty,
    path: &str,
) -> Result<Vec<JsonValue>> {
    let Some(item_schema) = &property.items else {
        return Ok(items.to_vec());
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| coerce(item, item_schema, &format!("{path}[{i}]")))
        .collect()
}
