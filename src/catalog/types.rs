//! Catalog document types

use super::metadata::{keys, Metadata};
use crate::error::{Error, Result};
use crate::schema::JsonSchema;
use crate::types::{JsonValue, ReplicationMethod};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One selectable stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream name (lower-case)
    pub stream: String,
    /// Stream identifier, equal to `stream`
    pub tap_stream_id: String,
    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,
    /// Record schema
    pub schema: JsonSchema,
    /// Stream and field annotations
    #[serde(default)]
    pub metadata: Metadata,
}

impl CatalogEntry {
    /// Whether the stream is selected for sync
    pub fn is_selected(&self) -> bool {
        self.metadata
            .root(keys::SELECTED)
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Replication method from stream-level metadata
    pub fn replication_method(&self) -> ReplicationMethod {
        self.metadata
            .root(keys::FORCED_REPLICATION_METHOD)
            .or_else(|| self.metadata.root(keys::REPLICATION_METHOD))
            .and_then(JsonValue::as_str)
            .and_then(ReplicationMethod::parse)
            .unwrap_or_default()
    }

    /// Replication keys from stream-level metadata
    pub fn replication_keys(&self) -> Vec<String> {
        if let Some(values) = self
            .metadata
            .root(keys::VALID_REPLICATION_KEYS)
            .and_then(JsonValue::as_array)
        {
            return values
                .iter()
                .filter_map(JsonValue::as_str)
                .map(String::from)
                .collect();
        }
        self.metadata
            .root(keys::REPLICATION_KEY)
            .and_then(JsonValue::as_str)
            .map(|k| vec![k.to_string()])
            .unwrap_or_default()
    }

    /// Parent stream declared in metadata
    pub fn parent_tap_stream_id(&self) -> Option<&str> {
        self.metadata
            .root(keys::PARENT_TAP_STREAM_ID)
            .and_then(JsonValue::as_str)
            .filter(|p| !p.is_empty())
    }

    /// Remote module name recorded by dynamic discovery
    pub fn module_path(&self) -> Option<&str> {
        self.metadata
            .root(keys::MODULE_PATH)
            .and_then(JsonValue::as_str)
            .filter(|p| !p.is_empty())
    }

    /// Mark every field without an explicit selection as deselected.
    ///
    /// Returns the names of the fields that were changed.
    pub fn deselect_unselected_fields(&mut self) -> Vec<String> {
        let mut names: Vec<String> = self
            .schema
            .field_names()
            .map(String::from)
            .chain(self.metadata.field_names().map(String::from))
            .collect();
        names.sort();
        names.dedup();

        let mut changed = Vec::new();
        for name in names {
            if self.metadata.field(&name, keys::SELECTED).is_none() {
                self.metadata.write_field(&name, keys::SELECTED, false);
                changed.push(name);
            }
        }
        changed
    }
}

/// The full catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Parse a catalog from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid catalog: {e}")))
    }

    /// Load a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::config(format!("Failed to read catalog file: {e}")))?;
        Self::from_json(&content)
    }

    /// Pretty JSON document, as printed by discovery
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find a stream by id
    pub fn get_stream(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|s| s.tap_stream_id == tap_stream_id)
    }

    /// Find a stream by id, mutably
    pub fn get_stream_mut(&mut self, tap_stream_id: &str) -> Option<&mut CatalogEntry> {
        self.streams
            .iter_mut()
            .find(|s| s.tap_stream_id == tap_stream_id)
    }

    /// Selected stream ids in catalog order.
    ///
    /// When a sync was interrupted, the list is rotated so the stream named by
    /// `currently_syncing` comes first.
    pub fn selected_streams(&self, currently_syncing: Option<&str>) -> Vec<String> {
        let start = currently_syncing
            .and_then(|current| {
                self.streams
                    .iter()
                    .position(|s| s.tap_stream_id == current)
            })
            .unwrap_or(0);

        self.streams[start..]
            .iter()
            .chain(self.streams[..start].iter())
            .filter(|s| s.is_selected())
            .map(|s| s.tap_stream_id.clone())
            .collect()
    }
}
