//! Schema discovery
//!
//! Builds the catalog from two sources:
//! - the bundled schema of every built-in stream
//! - the modules and field metadata the remote API describes
//!
//! Both are keyed by lower-cased stream name; a module described by the API
//! replaces a built-in stream of the same name.

use crate::catalog::{get_standard_metadata, keys, Catalog, CatalogEntry};
use crate::error::Result;
use crate::http::{ApiRequest, RequestExecutor};
use crate::schema::{
    field_to_property_schema, get_replication_and_primary_key, load_schema_references,
    load_static_schema, should_include_field, FieldDescriptor, JsonSchema, JsonType,
    KeyOverrides, SchemaProperty,
};
use crate::streams::{StreamDefinition, StreamRegistry};
use crate::types::{is_truthy, Inclusion, JsonValue, ReplicationMethod};
use std::collections::BTreeMap;
use tracing::{error, info};

/// Endpoint listing every module
pub const MODULES_PATH: &str = "settings/modules";

/// Endpoint describing a module's fields
pub const FIELDS_PATH: &str = "settings/fields";

/// Discovers the catalog
#[derive(Debug, Clone)]
pub struct SchemaDiscoverer {
    registry: StreamRegistry,
    overrides: KeyOverrides,
    metadata_only_modules: Vec<String>,
}

impl Default for SchemaDiscoverer {
    fn default() -> Self {
        Self::new(StreamRegistry::builtin())
    }
}

impl SchemaDiscoverer {
    /// Discoverer over a stream registry
    pub fn new(registry: StreamRegistry) -> Self {
        Self {
            registry,
            overrides: KeyOverrides::default(),
            metadata_only_modules: Vec::new(),
        }
    }

    /// Per-module key overrides
    #[must_use]
    pub fn with_overrides(mut self, overrides: KeyOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Modules missing from the module list that still describe their fields
    #[must_use]
    pub fn with_metadata_only_modules(mut self, modules: Vec<String>) -> Self {
        self.metadata_only_modules = modules;
        self
    }

    /// Run both phases and merge them
    pub async fn discover(&self, client: &dyn RequestExecutor) -> Result<Catalog> {
        let mut streams = self.discover_static()?;
        let dynamic = self.discover_dynamic(client).await?;

        for entry in dynamic {
            match streams
                .iter_mut()
                .find(|s| s.tap_stream_id == entry.tap_stream_id)
            {
                Some(existing) => *existing = entry,
                None => streams.push(entry),
            }
        }

        info!(streams = streams.len(), "Discovery complete");
        Ok(Catalog { streams })
    }

    /// Catalog entries for the built-in streams
    pub fn discover_static(&self) -> Result<Vec<CatalogEntry>> {
        let refs = load_schema_references()?;
        self.registry
            .iter()
            .map(|definition| {
                static_entry(definition, &refs).map_err(|e| {
                    error!(
                        stream = %definition.tap_stream_id,
                        payload = "bundled schema document",
                        "Failed to build catalog entry: {e}"
                    );
                    e
                })
            })
            .collect()
    }

    /// Catalog entries for the modules the API describes.
    ///
    /// Modules without field metadata or without a usable primary key are
    /// skipped.
    pub async fn discover_dynamic(&self, client: &dyn RequestExecutor) -> Result<Vec<CatalogEntry>> {
        info!("Fetching dynamic schema");
        let listing = client.execute(ApiRequest::get(MODULES_PATH)).await?;

        let mut modules: Vec<String> = listing
            .get("modules")
            .and_then(JsonValue::as_array)
            .map(|modules| {
                modules
                    .iter()
                    .filter(|m| {
                        m.get("viewable").is_some_and(is_truthy)
                            && m.get("api_supported").is_some_and(is_truthy)
                    })
                    .filter_map(|m| m.get("api_name").and_then(JsonValue::as_str))
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        modules.extend(self.metadata_only_modules.iter().cloned());

        let mut entries = Vec::new();
        for module in modules {
            let response = client
                .execute(ApiRequest::get(FIELDS_PATH).param("module", module.as_str()))
                .await?;
            let fields: Vec<FieldDescriptor> = response
                .get("fields")
                .and_then(JsonValue::as_array)
                .map(|fields| fields.iter().cloned().map(FieldDescriptor::from).collect())
                .unwrap_or_default();

            if let Some(entry) = self.module_entry(&module, &fields) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Catalog entry for one module, or `None` when it cannot be replicated
    pub fn module_entry(&self, module: &str, fields: &[FieldDescriptor]) -> Option<CatalogEntry> {
        if fields.is_empty() {
            info!("Skipping module {module}: No field metadata available.");
            return None;
        }

        let (replication_key, primary_key) =
            get_replication_and_primary_key(module, fields, &self.overrides);
        let Some(mut primary_key) = primary_key else {
            info!("Skipping module {module}: No primary key field found.");
            return None;
        };

        let mut schema = JsonSchema::new();
        for field in fields {
            if !should_include_field(field, &primary_key) {
                continue;
            }
            if let Some(name) = field.api_name() {
                schema.add_property(name, field_to_property_schema(field));
            }
        }
        if schema.get_property("id").is_none() {
            schema.add_property("id", SchemaProperty::nullable(JsonType::String));
            primary_key = "id".to_string();
        }

        let key_properties = vec![primary_key];
        let replication_keys: Vec<String> = replication_key.iter().cloned().collect();
        let method = if replication_key.is_some() {
            ReplicationMethod::Incremental
        } else {
            ReplicationMethod::FullTable
        };

        let mut metadata =
            get_standard_metadata(&schema, &key_properties, &replication_keys, Some(method));
        if let Some(key) = &replication_key {
            metadata.write_field(key, keys::INCLUSION, Inclusion::Automatic.as_str());
        }
        metadata.write_root(keys::MODULE_PATH, module);

        let name = module.to_lowercase();
        Some(CatalogEntry {
            stream: name.clone(),
            tap_stream_id: name,
            key_properties,
            schema,
            metadata,
        })
    }
}

fn static_entry(
    definition: &StreamDefinition,
    refs: &BTreeMap<String, JsonValue>,
) -> Result<CatalogEntry> {
    let schema = load_static_schema(&definition.tap_stream_id, refs)?;
    let mut metadata = get_standard_metadata(
        &schema,
        &definition.key_properties,
        &definition.replication_keys,
        Some(definition.replication_method),
    );

    for key in &definition.replication_keys {
        if schema.get_property(key).is_some() {
            metadata.write_field(key, keys::INCLUSION, Inclusion::Automatic.as_str());
        }
    }
    if let Some(parent) = &definition.parent {
        metadata.write_root(keys::PARENT_TAP_STREAM_ID, parent.as_str());
    }

    let name = definition.tap_stream_id.to_lowercase();
    Ok(CatalogEntry {
        stream: name.clone(),
        tap_stream_id: name,
        key_properties: definition.key_properties.clone(),
        schema,
        metadata,
    })
}

#[cfg(test)]
mod tests;
