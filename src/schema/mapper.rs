//! Remote field metadata to schema mapping
//!
//! Pure functions over the descriptors returned by `settings/fields`.

use super::types::{JsonType, SchemaProperty};
use crate::types::{is_truthy, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Replication key candidates, in priority order
pub const REPLICATION_KEY_CANDIDATES: &[&str] = &["Modified_Time", "CreatedDate"];

/// `display_type` value of fields hidden from every layout
pub const DISPLAY_TYPE_HIDDEN: i64 = 3;

/// One field descriptor as returned by the fields metadata endpoint.
///
/// Kept as the raw object so unexpected shapes in unrelated keys never break
/// discovery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldDescriptor(pub JsonObject);

impl FieldDescriptor {
    fn str_value(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(JsonValue::as_str)
    }

    /// API name, if present and non-empty
    pub fn api_name(&self) -> Option<&str> {
        self.str_value("api_name").filter(|s| !s.is_empty())
    }

    /// Remote data type
    pub fn data_type(&self) -> Option<&str> {
        self.str_value("data_type")
    }

    /// Remote JSON representation
    pub fn json_type(&self) -> Option<&str> {
        self.str_value("json_type")
    }

    fn flag(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(is_truthy)
    }

    fn view_flag(&self) -> bool {
        self.0
            .get("view_type")
            .and_then(|v| v.get("view"))
            .is_some_and(is_truthy)
    }

    fn display_type(&self) -> Option<i64> {
        self.0.get("display_type").and_then(JsonValue::as_i64)
    }
}

impl From<JsonValue> for FieldDescriptor {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

/// Per-module key overrides
#[derive(Debug, Clone, Default)]
pub struct KeyOverrides {
    /// Module name to primary key field
    pub primary_keys: BTreeMap<String, String>,
    /// Modules replicated full-table even when a replication key exists
    pub forced_full_table: BTreeSet<String>,
}

/// Map a field descriptor to a property schema; first matching rule wins.
pub fn field_to_property_schema(field: &FieldDescriptor) -> SchemaProperty {
    let data_type = field.data_type().unwrap_or_default();
    let json_type = field.json_type().unwrap_or_default();

    match (data_type, json_type) {
        ("multiselectpicklist", _) | ("text", "jsonarray") => {
            SchemaProperty::array_of(SchemaProperty::nullable(JsonType::String))
        }
        ("multireminder" | "subform", _) | (_, "jsonarray") => {
            SchemaProperty::array_of(SchemaProperty::free_object())
        }
        ("lookup" | "ownerlookup" | "userlookup" | "profilelookup", "jsonobject") => {
            SchemaProperty::free_object()
        }
        ("lookup" | "ownerlookup" | "userlookup" | "profilelookup", _) => {
            SchemaProperty::nullable(JsonType::String)
        }
        ("attachment", _) => SchemaProperty::array_of(SchemaProperty::free_object()),
        ("currency", "jsonobject") => SchemaProperty::free_object(),
        ("currency", _) => SchemaProperty::nullable(JsonType::Number),
        ("boolean", _) => SchemaProperty::nullable(JsonType::Boolean),
        ("datetime" | "date", _) => {
            SchemaProperty::nullable(JsonType::String).with_format("date-time")
        }
        ("integer" | "long" | "bigint", _) => SchemaProperty::nullable(JsonType::Integer),
        ("double" | "decimal", _) => SchemaProperty::nullable(JsonType::Number),
        _ => SchemaProperty::nullable(JsonType::String),
    }
}

/// Whether a field belongs in the generated schema.
///
/// The primary key is always kept. Other fields must be named, visible,
/// viewable, non-virtual, and not hidden.
pub fn should_include_field(field: &FieldDescriptor, expected_pk_field: &str) -> bool {
    let Some(api_name) = field.api_name() else {
        return false;
    };

    if api_name == expected_pk_field {
        return true;
    }

    field.flag("visible")
        && field.view_flag()
        && !field.flag("virtual_field")
        && field.display_type() != Some(DISPLAY_TYPE_HIDDEN)
}

/// Pick the replication key and primary key for a module.
///
/// Matching is case-insensitive; the returned names keep the remote casing.
pub fn get_replication_and_primary_key(
    module: &str,
    fields: &[FieldDescriptor],
    overrides: &KeyOverrides,
) -> (Option<String>, Option<String>) {
    let mut lookup: BTreeMap<String, &str> = BTreeMap::new();
    for api_name in fields.iter().filter_map(FieldDescriptor::api_name) {
        let key = api_name.to_lowercase();
        match lookup.get(&key) {
            Some(existing) => warn!(
                "Duplicate api_name detected when lowercased: '{}' (collides with '{}') in module '{}'",
                api_name, existing, module
            ),
            None => {
                lookup.insert(key, api_name);
            }
        }
    }

    let replication_key = if overrides.forced_full_table.contains(module) {
        None
    } else {
        REPLICATION_KEY_CANDIDATES
            .iter()
            .find_map(|candidate| lookup.get(&candidate.to_lowercase()))
            .map(|name| (*name).to_string())
    };

    let primary_key = overrides.primary_keys.get(module).cloned().or_else(|| {
        if lookup.contains_key("id") {
            Some("id".to_string())
        } else {
            lookup
                .get("sequence_number")
                .map(|name| (*name).to_string())
        }
    });

    (replication_key, primary_key)
}
