//! Schemas compiled into the binary
//!
//! Each built-in stream ships a JSON schema under `schemas/`. Fragments shared
//! between streams live in `schemas/shared/` and are pulled in with `$ref`.

use super::types::JsonSchema;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::collections::BTreeMap;

/// Nested `$ref` chains deeper than this are treated as cycles
const MAX_REF_DEPTH: usize = 16;

const SHARED_SCHEMAS: &[(&str, &str)] = &[
    (
        "shared/named_reference.json",
        include_str!("../../schemas/shared/named_reference.json"),
    ),
    (
        "shared/user_reference.json",
        include_str!("../../schemas/shared/user_reference.json"),
    ),
];

const STREAM_SCHEMAS: &[(&str, &str)] = &[
    ("currencies", include_str!("../../schemas/currencies.json")),
    ("organization", include_str!("../../schemas/organization.json")),
    ("profiles", include_str!("../../schemas/profiles.json")),
    ("roles", include_str!("../../schemas/roles.json")),
    ("territories", include_str!("../../schemas/territories.json")),
    ("users", include_str!("../../schemas/users.json")),
];

/// Raw schema document for a built-in stream
pub fn raw_schema(stream: &str) -> Option<&'static str> {
    STREAM_SCHEMAS
        .iter()
        .find(|(name, _)| *name == stream)
        .map(|(_, raw)| *raw)
}

/// Parsed shared fragments keyed by their `$ref` path
pub fn load_schema_references() -> Result<BTreeMap<String, JsonValue>> {
    SHARED_SCHEMAS
        .iter()
        .map(|(name, raw)| {
            let value = serde_json::from_str(raw)
                .map_err(|e| Error::schema(*name, format!("invalid shared schema: {e}")))?;
            Ok(((*name).to_string(), value))
        })
        .collect()
}

/// Replace every `{"$ref": "file[#/pointer]"}` node with the referenced fragment
pub fn resolve_schema_references(
    schema: &mut JsonValue,
    refs: &BTreeMap<String, JsonValue>,
) -> Result<()> {
    resolve_node(schema, refs, 0)
}

fn resolve_node(node: &mut JsonValue, refs: &BTreeMap<String, JsonValue>, depth: usize) -> Result<()> {
    if let Some(reference) = node
        .get("$ref")
        .and_then(JsonValue::as_str)
        .map(str::to_owned)
    {
        if depth >= MAX_REF_DEPTH {
            return Err(Error::SchemaReference { reference });
        }
        let mut target = lookup_reference(&reference, refs)?;
        resolve_node(&mut target, refs, depth + 1)?;
        *node = target;
        return Ok(());
    }

    match node {
        JsonValue::Object(map) => {
            for value in map.values_mut() {
                resolve_node(value, refs, depth)?;
            }
        }
        JsonValue::Array(items) => {
            for value in items {
                resolve_node(value, refs, depth)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn lookup_reference(reference: &str, refs: &BTreeMap<String, JsonValue>) -> Result<JsonValue> {
    let (file, pointer) = match reference.split_once('#') {
        Some((file, pointer)) => (file, Some(pointer)),
        None => (reference, None),
    };

    let document = refs
        .get(file)
        .or_else(|| refs.get(&format!("shared/{file}")))
        .ok_or_else(|| Error::SchemaReference {
            reference: reference.to_string(),
        })?;

    match pointer.filter(|p| !p.is_empty()) {
        Some(pointer) => document
            .pointer(pointer)
            .cloned()
            .ok_or_else(|| Error::SchemaReference {
                reference: reference.to_string(),
            }),
        None => Ok(document.clone()),
    }
}

/// Load, resolve and type-check the bundled schema of a built-in stream
pub fn load_static_schema(
    stream: &str,
    refs: &BTreeMap<String, JsonValue>,
) -> Result<JsonSchema> {
    let raw = raw_schema(stream)
        .ok_or_else(|| Error::schema(stream, "no bundled schema for stream"))?;
    let mut value: JsonValue = serde_json::from_str(raw)
        .map_err(|e| Error::schema(stream, format!("invalid schema document: {e}")))?;
    resolve_schema_references(&mut value, refs)?;
    serde_json::from_value(value)
        .map_err(|e| Error::schema(stream, format!("unsupported schema shape: {e}")))
}
