//! Schema module
//!
//! Builds stream schemas from two sources: documents bundled with the tap,
//! and field metadata described by the remote API at discovery time.
//!
//! # Features
//!
//! - **Type Mapping**: remote `data_type` / `json_type` pairs to nullable JSON types
//! - **Field Filtering**: hidden, virtual and non-viewable fields are dropped
//! - **Key Inference**: replication and primary keys picked from the field list
//! - **Bundled Schemas**: static documents with shared `$ref` fragments

mod bundled;
mod mapper;
mod types;

pub use bundled::{
    load_schema_references, load_static_schema, raw_schema, resolve_schema_references,
};
pub use mapper::{
    field_to_property_schema, get_replication_and_primary_key, should_include_field,
    FieldDescriptor, KeyOverrides, DISPLAY_TYPE_HIDDEN, REPLICATION_KEY_CANDIDATES,
};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
