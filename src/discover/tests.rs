//! Tests for discovery

use super::*;
use crate::error::Error;
use crate::testing::ScriptedExecutor;
use pretty_assertions::assert_eq;
use serde_json::json;

fn field(name: &str, data_type: &str) -> JsonValue {
    json!({
        "api_name": name,
        "data_type": data_type,
        "json_type": "string",
        "visible": true,
        "view_type": {"view": true, "edit": true},
        "virtual_field": false,
        "display_type": 1
    })
}

fn descriptors(fields: Vec<JsonValue>) -> Vec<FieldDescriptor> {
    fields.into_iter().map(FieldDescriptor::from).collect()
}

fn executor() -> ScriptedExecutor {
    ScriptedExecutor::new()
        .fixed(
            MODULES_PATH,
            json!({"modules": [
                {"api_name": "Leads", "viewable": true, "api_supported": true},
                {"api_name": "Users", "viewable": true, "api_supported": true},
                {"api_name": "Empty_Module", "viewable": true, "api_supported": true},
                {"api_name": "Hidden", "viewable": false, "api_supported": true},
                {"api_name": "Internal", "viewable": true, "api_supported": false}
            ]}),
        )
        .route(FIELDS_PATH, |req| {
            let module = req.params.get("module").map(String::as_str);
            Ok(match module {
                Some("Leads") => {
                    let mut secret = field("Secret", "text");
                    secret["visible"] = json!(false);
                    let mut computed = field("Computed", "formula");
                    computed["virtual_field"] = json!(true);
                    json!({"fields": [
                        field("id", "bigint"),
                        field("Last_Name", "text"),
                        field("Modified_Time", "datetime"),
                        field("Annual_Revenue", "currency"),
                        secret,
                        computed
                    ]})
                }
                Some("Users") => json!({"fields": [
                    field("id", "bigint"),
                    field("Email", "email"),
                    field("Modified_Time", "datetime")
                ]}),
                Some("Linking_Module") => json!({"fields": [
                    field("id", "bigint"),
                    field("Name", "text")
                ]}),
                _ => json!({}),
            })
        })
}

#[tokio::test]
async fn test_discover_merges_static_and_dynamic() {
    let executor = executor();
    let catalog = SchemaDiscoverer::default().discover(&executor).await.unwrap();

    let names: Vec<&str> = catalog
        .streams
        .iter()
        .map(|s| s.tap_stream_id.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["currencies", "organization", "profiles", "roles", "territories", "users", "leads"]
    );

    // The API-described Users module replaces the bundled one
    let users = catalog.get_stream("users").unwrap();
    assert_eq!(users.module_path(), Some("Users"));
    assert!(users.schema.get_property("Email").is_some());

    let requested: Vec<String> = executor
        .requests_to(FIELDS_PATH)
        .iter()
        .map(|r| r.params["module"].clone())
        .collect();
    assert_eq!(requested, vec!["Leads", "Users", "Empty_Module"]);
}

#[tokio::test]
async fn test_dynamic_module_entry() {
    let executor = executor();
    let entries = SchemaDiscoverer::default()
        .discover_dynamic(&executor)
        .await
        .unwrap();
    let leads = entries.iter().find(|e| e.stream == "leads").unwrap();

    assert_eq!(leads.tap_stream_id, "leads");
    assert_eq!(leads.key_properties, vec!["id"]);
    assert_eq!(
        leads.schema.field_names().collect::<Vec<_>>(),
        vec!["Annual_Revenue", "Last_Name", "Modified_Time", "id"]
    );
    assert_eq!(leads.replication_method(), ReplicationMethod::Incremental);
    assert_eq!(leads.replication_keys(), vec!["Modified_Time"]);
    assert_eq!(
        leads.metadata.field("Modified_Time", keys::INCLUSION),
        Some(&json!("automatic"))
    );
    assert_eq!(
        leads.metadata.field("Last_Name", keys::INCLUSION),
        Some(&json!("available"))
    );
    assert_eq!(leads.module_path(), Some("Leads"));
    assert_eq!(
        leads.schema.get_property("Modified_Time").unwrap().format.as_deref(),
        Some("date-time")
    );
}

#[tokio::test]
async fn test_metadata_only_modules_are_described() {
    let executor = executor();
    let entries = SchemaDiscoverer::default()
        .with_metadata_only_modules(vec!["Linking_Module".to_string()])
        .discover_dynamic(&executor)
        .await
        .unwrap();

    let linking = entries.iter().find(|e| e.stream == "linking_module").unwrap();
    assert_eq!(linking.replication_method(), ReplicationMethod::FullTable);
    assert!(linking.replication_keys().is_empty());
}

#[test]
fn test_module_without_fields_is_skipped() {
    assert!(SchemaDiscoverer::default()
        .module_entry("Empty", &[])
        .is_none());
}

#[test]
fn test_module_without_primary_key_is_skipped() {
    let fields = descriptors(vec![field("Name", "text"), field("Modified_Time", "datetime")]);
    assert!(SchemaDiscoverer::default()
        .module_entry("Keyless", &fields)
        .is_none());
}

#[test]
fn test_missing_id_is_synthesized() {
    let mut sequence = field("Sequence_Number", "bigint");
    sequence["visible"] = json!(false);
    let fields = descriptors(vec![sequence, field("Subject", "text")]);

    let entry = SchemaDiscoverer::default()
        .module_entry("Activities_Log", &fields)
        .unwrap();

    assert_eq!(entry.stream, "activities_log");
    assert_eq!(entry.key_properties, vec!["id"]);
    // The declared primary key survives even when hidden
    assert!(entry.schema.get_property("Sequence_Number").is_some());
    assert_eq!(
        entry.schema.get_property("id"),
        Some(&SchemaProperty::nullable(JsonType::String))
    );
    assert_eq!(
        entry.metadata.field("id", keys::INCLUSION),
        Some(&json!("automatic"))
    );
}

#[test]
fn test_forced_full_table_override() {
    let mut overrides = KeyOverrides::default();
    overrides.forced_full_table.insert("Leads".to_string());
    let fields = descriptors(vec![field("id", "bigint"), field("Modified_Time", "datetime")]);

    let entry = SchemaDiscoverer::default()
        .with_overrides(overrides)
        .module_entry("Leads", &fields)
        .unwrap();
    assert_eq!(entry.replication_method(), ReplicationMethod::FullTable);
}

#[test]
fn test_static_entries() {
    let entries = SchemaDiscoverer::default().discover_static().unwrap();
    assert_eq!(entries.len(), 6);

    let users = entries.iter().find(|e| e.stream == "users").unwrap();
    assert_eq!(users.replication_method(), ReplicationMethod::Incremental);
    assert_eq!(
        users.metadata.field("Modified_Time", keys::INCLUSION),
        Some(&json!("automatic"))
    );
    assert!(users.module_path().is_none());

    let organization = entries.iter().find(|e| e.stream == "organization").unwrap();
    assert_eq!(organization.replication_method(), ReplicationMethod::FullTable);
    assert!(organization
        .metadata
        .root(keys::VALID_REPLICATION_KEYS)
        .is_none());
}

#[test]
fn test_static_parent_is_recorded() {
    let registry = StreamRegistry::new()
        .with(StreamDefinition::full_table("roles", "settings/roles", "roles"))
        .with(
            StreamDefinition::incremental("users", "users", "users", "Modified_Time")
                .with_parent("roles"),
        );
    let entries = SchemaDiscoverer::new(registry).discover_static().unwrap();

    assert_eq!(entries[1].parent_tap_stream_id(), Some("roles"));
    assert_eq!(entries[0].parent_tap_stream_id(), None);
}

#[test]
fn test_static_failure_aborts_discovery() {
    let registry = StreamRegistry::new().with(StreamDefinition::full_table(
        "not_bundled",
        "nowhere",
        "data",
    ));
    let err = SchemaDiscoverer::new(registry)
        .discover_static()
        .unwrap_err();
    assert!(matches!(err, Error::Schema { ref stream, .. } if stream == "not_bundled"));
}

#[tokio::test]
async fn test_module_listing_error_propagates() {
    let executor = ScriptedExecutor::new()
        .route(MODULES_PATH, |_| Err(Error::api(401, None, None)));
    let err = SchemaDiscoverer::default()
        .discover(&executor)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}
