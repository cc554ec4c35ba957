//! Tests for the sync orchestrator

use super::*;
use crate::catalog::{get_standard_metadata, keys, CatalogEntry};
use crate::config::TapConfig;
use crate::discover::SchemaDiscoverer;
use crate::output::{Message, MemoryWriter};
use crate::schema::{FieldDescriptor, JsonSchema, JsonType, SchemaProperty};
use crate::state::StateManager;
use crate::streams::{parent_bookmark_key, StreamDefinition, FIELDS_PARAM, UPDATED_SINCE_PARAM};
use crate::testing::ScriptedExecutor;
use crate::types::JsonValue;
use pretty_assertions::assert_eq;
use serde_json::json;

// ============================================================================
// Helpers
// ============================================================================

fn config(select_fields_by_default: bool) -> TapConfig {
    TapConfig::from_value(json!({
        "client_id": "id",
        "client_secret": "secret",
        "refresh_token": "token",
        "start_date": "2019-01-01T00:00:00Z",
        "api_version": "v8",
        "select_fields_by_default": select_fields_by_default
    }))
    .unwrap()
}

/// Catalog of the built-in streams with `selected` streams turned on
fn builtin_catalog(selected: &[&str]) -> Catalog {
    let mut streams = SchemaDiscoverer::default().discover_static().unwrap();
    for entry in &mut streams {
        if selected.contains(&entry.tap_stream_id.as_str()) {
            entry.metadata.write_root(keys::SELECTED, true);
        }
    }
    Catalog { streams }
}

fn message_kinds(writer: &MemoryWriter) -> Vec<String> {
    writer
        .messages
        .iter()
        .map(|m| match m {
            Message::Schema { stream, .. } => format!("SCHEMA {stream}"),
            Message::Record { stream, .. } => format!("RECORD {stream}"),
            Message::State { .. } => "STATE".to_string(),
        })
        .collect()
}

fn synced_streams(summary: &SyncSummary) -> Vec<&str> {
    summary.streams.iter().map(|(name, _)| name.as_str()).collect()
}

// ============================================================================
// Orchestration Tests
// ============================================================================

#[tokio::test]
async fn test_sync_single_incremental_stream() {
    let executor = ScriptedExecutor::new().fixed(
        "org/currencies",
        json!({
            "currencies": [
                {"id": "1", "name": "US Dollar", "modified_time": "2020-06-01T00:00:00Z"},
                {"id": "2", "name": "Euro", "modified_time": "2018-06-01T00:00:00Z"}
            ],
            "info": {"more_records": false}
        }),
    );
    let config = config(true);
    let state = StateManager::in_memory();
    let mut writer = MemoryWriter::new();

    let summary = {
        let mut ctx = SyncContext::new(&executor, &config, &state, &mut writer);
        SyncOrchestrator::default()
            .run(&mut ctx, builtin_catalog(&["currencies"]))
            .await
            .unwrap()
    };

    assert_eq!(summary.streams, vec![("currencies".to_string(), 1)]);
    assert_eq!(summary.total_records(), 1);
    assert_eq!(
        message_kinds(&writer),
        vec![
            "SCHEMA currencies",
            "STATE",
            "RECORD currencies",
            "STATE",
            "STATE",
        ]
    );

    let states = writer.states();
    assert_eq!(states[0]["currently_syncing"], json!("currencies"));
    assert_eq!(
        states[1]["bookmarks"]["currencies"]["modified_time"],
        json!("2020-06-01T00:00:00Z")
    );
    assert_eq!(states[2]["currently_syncing"], JsonValue::Null);
    assert_eq!(state.currently_syncing().await, None);
}

#[tokio::test]
async fn test_sync_resumes_at_currently_syncing() {
    let executor = ScriptedExecutor::new()
        .fixed("settings/profiles", json!({"profiles": [{"id": "p1"}]}))
        .fixed("settings/roles", json!({"roles": [{"id": "r1"}]}))
        .fixed(
            "users",
            json!({"users": [{"id": "u1", "Modified_Time": "2020-01-01T00:00:00Z"}]}),
        );
    let config = config(true);
    let state = StateManager::from_json(r#"{"currently_syncing": "roles"}"#).unwrap();
    let mut writer = MemoryWriter::new();

    let summary = {
        let mut ctx = SyncContext::new(&executor, &config, &state, &mut writer);
        SyncOrchestrator::default()
            .run(&mut ctx, builtin_catalog(&["profiles", "roles", "users"]))
            .await
            .unwrap()
    };

    assert_eq!(synced_streams(&summary), vec!["roles", "users", "profiles"]);
    assert_eq!(summary.total_records(), 3);
    assert_eq!(writer.schema_streams(), vec!["roles", "users", "profiles"]);
    assert_eq!(state.currently_syncing().await, None);
}

#[tokio::test]
async fn test_unselected_streams_are_not_requested() {
    let executor = ScriptedExecutor::new().fixed("settings/roles", json!({"roles": []}));
    let config = config(true);
    let state = StateManager::in_memory();
    let mut writer = MemoryWriter::new();

    let summary = {
        let mut ctx = SyncContext::new(&executor, &config, &state, &mut writer);
        SyncOrchestrator::default()
            .run(&mut ctx, builtin_catalog(&["roles"]))
            .await
            .unwrap()
    };

    assert_eq!(summary.streams, vec![("roles".to_string(), 0)]);
    let targets: Vec<String> = executor
        .requests()
        .iter()
        .map(|r| r.target().to_string())
        .collect();
    assert_eq!(targets, vec!["settings/roles"]);
}

#[tokio::test]
async fn test_select_fields_by_default_false_deselects_fields() {
    let executor = ScriptedExecutor::new().fixed(
        "users",
        json!({"users": [{
            "id": "u1",
            "email": "ann@example.com",
            "first_name": "Ann",
            "Modified_Time": "2020-01-01T00:00:00Z"
        }]}),
    );
    let config = config(false);
    let state = StateManager::in_memory();
    let mut writer = MemoryWriter::new();

    let mut catalog = builtin_catalog(&["users"]);
    catalog
        .get_stream_mut("users")
        .unwrap()
        .metadata
        .write_field("email", keys::SELECTED, true);

    {
        let mut ctx = SyncContext::new(&executor, &config, &state, &mut writer);
        SyncOrchestrator::default().run(&mut ctx, catalog).await.unwrap();
    }

    let records = writer.records("users");
    assert_eq!(records.len(), 1);
    let mut fields: Vec<&str> = records[0].keys().map(String::as_str).collect();
    fields.sort_unstable();
    assert_eq!(fields, vec!["Modified_Time", "email", "id"]);
}

#[tokio::test]
async fn test_select_fields_by_default_true_keeps_fields() {
    let executor = ScriptedExecutor::new().fixed(
        "users",
        json!({"users": [{"id": "u1", "first_name": "Ann", "Modified_Time": "2020-01-01T00:00:00Z"}]}),
    );
    let config = config(true);
    let state = StateManager::in_memory();
    let mut writer = MemoryWriter::new();

    {
        let mut ctx = SyncContext::new(&executor, &config, &state, &mut writer);
        SyncOrchestrator::default()
            .run(&mut ctx, builtin_catalog(&["users"]))
            .await
            .unwrap();
    }

    assert_eq!(writer.records("users")[0]["first_name"], json!("Ann"));
}

#[tokio::test]
async fn test_missing_catalog_entry_is_an_error() {
    let executor = ScriptedExecutor::new();
    let config = config(true);
    let state = StateManager::in_memory();
    let mut writer = MemoryWriter::new();

    let registry = StreamRegistry::new()
        .with(
            StreamDefinition::full_table("accounts", "Accounts", "data").with_children(&["notes"]),
        );
    let schema = string_schema(&["id"]);
    let definition = registry.get("accounts").cloned().unwrap();
    let catalog = Catalog {
        streams: vec![entry_for(&definition, schema, true)],
    };

    let mut ctx = SyncContext::new(&executor, &config, &state, &mut writer);
    let err = SyncOrchestrator::new(registry)
        .run(&mut ctx, catalog)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StreamNotFound { ref stream } if stream == "notes"));
}

// ============================================================================
// Parent / Child Tests
// ============================================================================

fn string_schema(fields: &[&str]) -> JsonSchema {
    let mut schema = JsonSchema::new();
    for field in fields {
        schema.add_property(field, SchemaProperty::nullable(JsonType::String));
    }
    schema
}

fn entry_for(definition: &StreamDefinition, schema: JsonSchema, selected: bool) -> CatalogEntry {
    let mut metadata = get_standard_metadata(
        &schema,
        &definition.key_properties,
        &definition.replication_keys,
        Some(definition.replication_method),
    );
    metadata.write_root(keys::SELECTED, selected);
    CatalogEntry {
        stream: definition.tap_stream_id.clone(),
        tap_stream_id: definition.tap_stream_id.clone(),
        key_properties: definition.key_properties.clone(),
        schema,
        metadata,
    }
}

fn family_registry() -> StreamRegistry {
    StreamRegistry::new()
        .with(
            StreamDefinition::incremental("accounts", "Accounts", "data", "Modified_Time")
                .with_children(&["notes"]),
        )
        .with(
            StreamDefinition::incremental(
                "notes",
                "Accounts/{parent_id}/Notes",
                "data",
                "Modified_Time",
            )
            .with_parent("accounts"),
        )
}

fn family_catalog(registry: &StreamRegistry, parent_selected: bool) -> Catalog {
    let schema = string_schema(&["id", "Modified_Time", "Note_Title"]);
    Catalog {
        streams: vec![
            entry_for(registry.get("notes").unwrap(), schema.clone(), true),
            entry_for(registry.get("accounts").unwrap(), schema, parent_selected),
        ],
    }
}

fn family_executor() -> ScriptedExecutor {
    ScriptedExecutor::new()
        .fixed(
            "Accounts",
            json!({"data": [
                {"id": "1", "Modified_Time": "2021-03-01T00:00:00Z"},
                {"id": "2", "Modified_Time": "2021-05-01T00:00:00Z"}
            ]}),
        )
        .fixed(
            "Accounts/1/Notes",
            json!({"data": [{"id": "n1", "Modified_Time": "2021-02-01T00:00:00Z"}]}),
        )
        .fixed(
            "Accounts/2/Notes",
            json!({"data": [{"id": "n2", "Modified_Time": "2021-04-01T00:00:00Z"}]}),
        )
}

#[tokio::test]
async fn test_selected_child_syncs_through_unselected_parent() {
    let registry = family_registry();
    let catalog = family_catalog(&registry, false);
    let executor = family_executor();
    let config = config(true);
    let state = StateManager::in_memory();
    let mut writer = MemoryWriter::new();

    let summary = {
        let mut ctx = SyncContext::new(&executor, &config, &state, &mut writer);
        SyncOrchestrator::new(registry).run(&mut ctx, catalog).await.unwrap()
    };

    assert_eq!(summary.streams, vec![("accounts".to_string(), 0)]);
    assert_eq!(writer.schema_streams(), vec!["notes"]);
    assert!(writer.records("accounts").is_empty());
    assert_eq!(writer.records("notes").len(), 2);

    assert_eq!(
        executor.requests_to("Accounts")[0].params[UPDATED_SINCE_PARAM],
        config.start_date
    );

    let snapshot = state.snapshot().await;
    let slot = parent_bookmark_key("accounts", "Modified_Time");
    assert_eq!(
        snapshot.bookmark_string("notes", &slot).as_deref(),
        Some("2021-05-01T00:00:00Z")
    );
    assert_eq!(snapshot.bookmark_string("accounts", "Modified_Time"), None);
    assert_eq!(
        snapshot.bookmark_string("notes", "Modified_Time").as_deref(),
        Some("2021-04-01T00:00:00Z")
    );
}

#[tokio::test]
async fn test_parent_and_child_both_selected() {
    let registry = family_registry();
    let catalog = family_catalog(&registry, true);
    let executor = family_executor();
    let config = config(true);
    let state = StateManager::in_memory();
    let mut writer = MemoryWriter::new();

    let summary = {
        let mut ctx = SyncContext::new(&executor, &config, &state, &mut writer);
        SyncOrchestrator::new(registry).run(&mut ctx, catalog).await.unwrap()
    };

    // The child is deferred to its parent and never synced on its own
    assert_eq!(synced_streams(&summary), vec!["accounts"]);
    assert_eq!(writer.schema_streams(), vec!["accounts", "notes"]);
    assert_eq!(writer.records("accounts").len(), 2);
    assert_eq!(writer.records("notes").len(), 2);
    assert_eq!(executor.requests_to("Accounts").len(), 1);
}

// ============================================================================
// Dynamic Stream Tests
// ============================================================================

#[tokio::test]
async fn test_sync_discovered_module() {
    let fields: Vec<FieldDescriptor> = ["id", "Last_Name", "Modified_Time"]
        .iter()
        .map(|name| {
            let data_type = if *name == "Modified_Time" { "datetime" } else { "text" };
            FieldDescriptor::from(json!({
                "api_name": name,
                "data_type": data_type,
                "json_type": "string",
                "visible": true,
                "view_type": {"view": true},
                "virtual_field": false,
                "display_type": 1
            }))
        })
        .collect();
    let mut entry = SchemaDiscoverer::default()
        .module_entry("Leads", &fields)
        .unwrap();
    entry.metadata.write_root(keys::SELECTED, true);

    let executor = ScriptedExecutor::new().fixed(
        "Leads",
        json!({
            "data": [
                {"id": "l1", "Last_Name": "Smith", "Modified_Time": "2022-01-01T00:00:00Z"}
            ],
            "info": {"more_records": false}
        }),
    );
    let config = config(true);
    let state = StateManager::in_memory();
    let mut writer = MemoryWriter::new();

    let summary = {
        let mut ctx = SyncContext::new(&executor, &config, &state, &mut writer);
        SyncOrchestrator::default()
            .run(&mut ctx, Catalog { streams: vec![entry] })
            .await
            .unwrap()
    };

    assert_eq!(summary.streams, vec![("leads".to_string(), 1)]);
    assert_eq!(writer.records("leads")[0]["Last_Name"], json!("Smith"));

    let request = &executor.requests_to("Leads")[0];
    assert!(request.params[FIELDS_PARAM].starts_with("id,"));
    assert_eq!(
        state.get_bookmark("leads", "Modified_Time").await.as_deref(),
        Some("2022-01-01T00:00:00Z")
    );
}
