//! Breadcrumb metadata
//!
//! Catalog metadata is a list of `{breadcrumb, metadata}` entries. The empty
//! breadcrumb addresses the stream, `["properties", name]` addresses a field.

use crate::schema::JsonSchema;
use crate::types::{Inclusion, JsonObject, JsonValue, ReplicationMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Path to the node a metadata entry describes
pub type Breadcrumb = Vec<String>;

/// Well-known metadata keys
pub mod keys {
    pub const SELECTED: &str = "selected";
    pub const SELECTED_BY_DEFAULT: &str = "selected-by-default";
    pub const INCLUSION: &str = "inclusion";
    pub const TABLE_KEY_PROPERTIES: &str = "table-key-properties";
    pub const FORCED_REPLICATION_METHOD: &str = "forced-replication-method";
    pub const REPLICATION_METHOD: &str = "replication-method";
    pub const VALID_REPLICATION_KEYS: &str = "valid-replication-keys";
    pub const REPLICATION_KEY: &str = "replication-key";
    pub const PARENT_TAP_STREAM_ID: &str = "parent-tap-stream-id";
    pub const MODULE_PATH: &str = "module-path";
}

/// One serialized metadata entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub breadcrumb: Breadcrumb,
    pub metadata: JsonObject,
}

/// Metadata keyed by breadcrumb
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<MetadataEntry>", into = "Vec<MetadataEntry>")]
pub struct Metadata {
    entries: BTreeMap<Breadcrumb, JsonObject>,
}

/// Breadcrumb of a top-level field
pub fn property_breadcrumb(field: &str) -> Breadcrumb {
    vec!["properties".to_string(), field.to_string()]
}

impl Metadata {
    /// Empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one key
    pub fn get(&self, breadcrumb: &[String], key: &str) -> Option<&JsonValue> {
        self.entries.get(breadcrumb).and_then(|m| m.get(key))
    }

    /// Write one key, creating the entry when needed
    pub fn write(&mut self, breadcrumb: Breadcrumb, key: &str, value: impl Into<JsonValue>) {
        self.entries
            .entry(breadcrumb)
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Read a stream-level key
    pub fn root(&self, key: &str) -> Option<&JsonValue> {
        self.get(&[], key)
    }

    /// Write a stream-level key
    pub fn write_root(&mut self, key: &str, value: impl Into<JsonValue>) {
        self.write(Vec::new(), key, value);
    }

    /// Read a field-level key
    pub fn field(&self, field: &str, key: &str) -> Option<&JsonValue> {
        self.get(&property_breadcrumb(field), key)
    }

    /// Write a field-level key
    pub fn write_field(&mut self, field: &str, key: &str, value: impl Into<JsonValue>) {
        self.write(property_breadcrumb(field), key, value);
    }

    /// Names of fields that have a metadata entry
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().filter_map(|crumb| match crumb.as_slice() {
            [properties, name] if properties == "properties" => Some(name.as_str()),
            _ => None,
        })
    }

    /// Whether a field should survive selection filtering
    pub fn is_field_selected(&self, field: &str) -> bool {
        if self.field(field, keys::INCLUSION).and_then(JsonValue::as_str)
            == Some(Inclusion::Automatic.as_str())
        {
            return true;
        }
        if self.field(field, keys::INCLUSION).and_then(JsonValue::as_str)
            == Some(Inclusion::Unsupported.as_str())
        {
            return false;
        }
        self.field(field, keys::SELECTED).and_then(JsonValue::as_bool) != Some(false)
    }

    /// Flatten back to the serialized list form
    pub fn to_list(&self) -> Vec<MetadataEntry> {
        self.entries
            .iter()
            .map(|(breadcrumb, metadata)| MetadataEntry {
                breadcrumb: breadcrumb.clone(),
                metadata: metadata.clone(),
            })
            .collect()
    }
}

impl From<Vec<MetadataEntry>> for Metadata {
    fn from(list: Vec<MetadataEntry>) -> Self {
        let mut metadata = Metadata::new();
        for entry in list {
            metadata
                .entries
                .entry(entry.breadcrumb)
                .or_default()
                .extend(entry.metadata);
        }
        metadata
    }
}

impl From<Metadata> for Vec<MetadataEntry> {
    fn from(metadata: Metadata) -> Self {
        metadata.to_list()
    }
}

/// Standard metadata for a stream.
///
/// Key properties and valid replication keys are `automatic`; every other
/// field is `available`.
pub fn get_standard_metadata(
    schema: &JsonSchema,
    key_properties: &[String],
    valid_replication_keys: &[String],
    replication_method: Option<ReplicationMethod>,
) -> Metadata {
    let mut mdata = Metadata::new();

    mdata.write_root(keys::TABLE_KEY_PROPERTIES, key_properties.to_vec());
    if let Some(method) = replication_method {
        mdata.write_root(keys::FORCED_REPLICATION_METHOD, method.as_str());
    }
    if !valid_replication_keys.is_empty() {
        mdata.write_root(keys::VALID_REPLICATION_KEYS, valid_replication_keys.to_vec());
    }
    mdata.write_root(keys::INCLUSION, Inclusion::Available.as_str());
    mdata.write_root(keys::SELECTED_BY_DEFAULT, false);

    for field in schema.field_names() {
        let automatic = key_properties.iter().any(|k| k == field)
            || valid_replication_keys.iter().any(|k| k == field);
        let inclusion = if automatic {
            Inclusion::Automatic
        } else {
            Inclusion::Available
        };
        mdata.write_field(field, keys::INCLUSION, inclusion.as_str());
        mdata.write_field(field, keys::SELECTED_BY_DEFAULT, true);
    }

    mdata
}
