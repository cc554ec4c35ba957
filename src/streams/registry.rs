//! Stream registry
//!
//! Built-in streams are compiled in. Streams discovered from module metadata
//! get a definition synthesized from their catalog entry at sync time.

use super::definition::StreamDefinition;
use crate::catalog::CatalogEntry;
use crate::types::ReplicationMethod;

/// Response key holding records for every dynamic module
pub const DYNAMIC_DATA_KEY: &str = "data";

/// Lookup of stream definitions by name
#[derive(Debug, Clone, Default)]
pub struct StreamRegistry {
    definitions: Vec<StreamDefinition>,
}

impl StreamRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the streams bundled with the tap
    pub fn builtin() -> Self {
        Self::new()
            .with(StreamDefinition::incremental(
                "currencies",
                "org/currencies",
                "currencies",
                "modified_time",
            ))
            .with(StreamDefinition::full_table("organization", "org", "org"))
            .with(StreamDefinition::full_table(
                "profiles",
                "settings/profiles",
                "profiles",
            ))
            .with(
                StreamDefinition::full_table("roles", "settings/roles", "roles")
                    .without_pagination(),
            )
            .with(StreamDefinition::incremental(
                "territories",
                "settings/territories",
                "territories",
                "modified_time",
            ))
            .with(StreamDefinition::incremental(
                "users",
                "users",
                "users",
                "Modified_Time",
            ))
    }

    /// Add or replace a definition
    #[must_use]
    pub fn with(mut self, definition: StreamDefinition) -> Self {
        self.register(definition);
        self
    }

    /// Add or replace a definition
    pub fn register(&mut self, definition: StreamDefinition) {
        match self
            .definitions
            .iter_mut()
            .find(|d| d.tap_stream_id == definition.tap_stream_id)
        {
            Some(existing) => *existing = definition,
            None => self.definitions.push(definition),
        }
    }

    /// Definition by stream name
    pub fn get(&self, tap_stream_id: &str) -> Option<&StreamDefinition> {
        self.definitions
            .iter()
            .find(|d| d.tap_stream_id == tap_stream_id)
    }

    /// Whether a stream is compiled in
    pub fn contains(&self, tap_stream_id: &str) -> bool {
        self.get(tap_stream_id).is_some()
    }

    /// All definitions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &StreamDefinition> {
        self.definitions.iter()
    }

    /// Definition to sync a catalog entry with.
    ///
    /// Entries produced by module discovery, or unknown to the registry, get a
    /// dynamic definition.
    pub fn resolve(&self, entry: &CatalogEntry) -> StreamDefinition {
        match self.get(&entry.tap_stream_id) {
            Some(definition) if entry.module_path().is_none() => definition.clone(),
            _ => build_dynamic_definition(entry),
        }
    }
}

/// Synthesize a definition from a catalog entry's metadata
pub fn build_dynamic_definition(entry: &CatalogEntry) -> StreamDefinition {
    let path = entry
        .module_path()
        .unwrap_or(&entry.tap_stream_id)
        .to_string();
    let replication_method = entry.replication_method();
    let replication_keys = match replication_method {
        ReplicationMethod::Incremental => entry.replication_keys(),
        ReplicationMethod::FullTable => Vec::new(),
    };

    StreamDefinition {
        key_properties: entry.key_properties.clone(),
        replication_method,
        replication_keys,
        is_dynamic: true,
        ..StreamDefinition::full_table(entry.tap_stream_id.clone(), path, DYNAMIC_DATA_KEY)
    }
}
