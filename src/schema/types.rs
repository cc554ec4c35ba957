//! Schema types
//!
//! A small typed subset of JSON Schema: the parts catalogs and the
//! transformer actually read (`type`, `format`, `properties`, `items`,
//! `additionalProperties`).

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` keyword: one type, or a list such as `["null", "string"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTypeOrArray {
    Single(JsonType),
    Multiple(Vec<JsonType>),
}

impl JsonTypeOrArray {
    pub fn single(t: JsonType) -> Self {
        Self::Single(t)
    }

    /// `["null", t]`, or plain `"null"` when `t` is already null
    pub fn nullable(t: JsonType) -> Self {
        match t {
            JsonType::Null => Self::Single(JsonType::Null),
            other => Self::Multiple(vec![JsonType::Null, other]),
        }
    }

    fn types(&self) -> &[JsonType] {
        match self {
            Self::Single(t) => std::slice::from_ref(t),
            Self::Multiple(types) => types,
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.allows(JsonType::Null)
    }

    pub fn allows(&self, t: JsonType) -> bool {
        self.types().contains(&t)
    }

    /// Declared types other than null, in declaration order
    pub fn non_null(&self) -> Vec<JsonType> {
        self.types()
            .iter()
            .copied()
            .filter(|t| *t != JsonType::Null)
            .collect()
    }
}

/// Schema of a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    #[serde(rename = "type")]
    pub json_type: JsonTypeOrArray,

    /// `date-time` for dates and timestamps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Known keys of an object field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaProperty>>,

    /// Whether an object field keeps keys not listed in `properties`
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,

    /// Element schema of an array field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,
}

impl SchemaProperty {
    /// Non-nullable field of one type
    pub fn new(json_type: JsonType) -> Self {
        Self {
            json_type: JsonTypeOrArray::single(json_type),
            format: None,
            properties: None,
            additional_properties: None,
            items: None,
        }
    }

    pub fn nullable(json_type: JsonType) -> Self {
        Self {
            json_type: JsonTypeOrArray::nullable(json_type),
            ..Self::new(json_type)
        }
    }

    /// Nullable object accepting any keys
    pub fn free_object() -> Self {
        Self {
            additional_properties: Some(true),
            ..Self::nullable(JsonType::Object)
        }
    }

    /// Nullable array of `items`
    pub fn array_of(items: SchemaProperty) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::nullable(JsonType::Array)
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.json_type.is_nullable()
    }

    pub fn is_date_time(&self) -> bool {
        self.format.as_deref() == Some("date-time")
    }
}

/// Record schema of one stream: an object with named fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "type")]
    pub json_type: JsonTypeOrArray,

    /// Fields by name, kept sorted so catalogs diff cleanly
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,

    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,
}

impl Default for JsonSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSchema {
    /// Object schema without fields
    pub fn new() -> Self {
        Self {
            json_type: JsonTypeOrArray::single(JsonType::Object),
            properties: BTreeMap::new(),
            additional_properties: None,
        }
    }

    /// Insert or replace a field
    pub fn add_property(&mut self, name: &str, property: SchemaProperty) {
        self.properties.insert(name.to_string(), property);
    }

    pub fn get_property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.get(name)
    }

    /// Field names in sorted order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Schema document as written into catalogs and SCHEMA messages
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_default()
    }
}
