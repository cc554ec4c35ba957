//! Catalog module
//!
//! The catalog declares every stream the tap can replicate: its schema, its
//! keys, and the selection / inclusion metadata a sync honours.

mod metadata;
mod types;

pub use metadata::{
    get_standard_metadata, keys, property_breadcrumb, Breadcrumb, Metadata, MetadataEntry,
};
pub use types::{Catalog, CatalogEntry};
