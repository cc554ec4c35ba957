//! State document
//!
//! Serialized as `{"currently_syncing": ..., "bookmarks": {stream: {key: value}}}`.
//! Unknown top-level keys are carried through untouched.

use crate::error::{Error, Result};
use crate::types::{scalar_to_string, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state for a sync run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Stream that was being synced when the last checkpoint was taken
    #[serde(default)]
    pub currently_syncing: Option<String>,

    /// Per-stream bookmark slots
    #[serde(default)]
    pub bookmarks: BTreeMap<String, JsonObject>,

    /// Keys this tap does not interpret
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bookmark value for a stream slot
    pub fn get_bookmark(&self, stream: &str, key: &str) -> Option<&JsonValue> {
        self.bookmarks.get(stream)?.get(key)
    }

    /// Bookmark value rendered as a string; null and non-scalar values are ignored
    pub fn bookmark_string(&self, stream: &str, key: &str) -> Option<String> {
        self.get_bookmark(stream, key).and_then(scalar_to_string)
    }

    /// Overwrite a bookmark slot
    pub fn set_bookmark(&mut self, stream: &str, key: &str, value: JsonValue) {
        self.bookmarks
            .entry(stream.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Set or clear the in-progress marker
    pub fn set_currently_syncing(&mut self, stream: Option<&str>) {
        self.currently_syncing = stream.map(ToString::to_string);
    }

    /// State as a JSON document
    pub fn to_value(&self) -> Result<JsonValue> {
        serde_json::to_value(self)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }
}
