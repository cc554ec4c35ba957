//! Streams module
//!
//! A stream pairs a [`StreamDefinition`] with its catalog entry and one of two
//! replication behaviors:
//! - [`FullTableStream`] re-reads every record on every run
//! - [`IncrementalStream`] reads records updated since a bookmark and
//!   advances it, with parent/child bookmark handling
//!
//! Records come from a [`RecordFetcher`], which pages through the endpoint
//! and, for dynamic modules, batches the requested fields.

mod base;
mod definition;
mod fetcher;
mod full_table;
mod incremental;
mod registry;

pub use base::{build_stream, Stream, SyncContext};
pub use definition::{StreamDefinition, DEFAULT_PAGE_SIZE, PARENT_ID_PLACEHOLDER};
pub use fetcher::{field_batches, RecordFetcher, FIELDS_PARAM, FIELD_BATCH_SIZE};
pub use full_table::FullTableStream;
pub use incremental::{parent_bookmark_key, IncrementalStream, UPDATED_SINCE_PARAM};
pub use registry::{build_dynamic_definition, StreamRegistry, DYNAMIC_DATA_KEY};
