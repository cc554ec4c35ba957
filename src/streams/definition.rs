//! Stream behavior descriptors

use crate::pagination::{InfoPaginator, NoPaginator, Paginator};
use crate::types::ReplicationMethod;

/// Records requested per page unless a stream says otherwise
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Placeholder in a child path template replaced by the parent record's id
pub const PARENT_ID_PLACEHOLDER: &str = "{parent_id}";

/// Immutable description of how one stream is fetched and replicated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDefinition {
    /// Stream identifier
    pub tap_stream_id: String,
    /// Primary key fields
    pub key_properties: Vec<String>,
    /// Full table or incremental
    pub replication_method: ReplicationMethod,
    /// Replication keys; empty for full table
    pub replication_keys: Vec<String>,
    /// Response key holding the record array
    pub data_key: String,
    /// Path relative to the API base URL; may contain `{parent_id}`
    pub path: String,
    /// Records per page
    pub page_size: u32,
    /// Whether the endpoint pages at all
    pub pagination_supported: bool,
    /// Streams synced once per record of this one
    pub children: Vec<String>,
    /// Stream this one is synced under
    pub parent: Option<String>,
    /// Whether fields are requested in batches and merged by id
    pub is_dynamic: bool,
}

impl StreamDefinition {
    /// Full-table stream keyed by `id`
    pub fn full_table(
        tap_stream_id: impl Into<String>,
        path: impl Into<String>,
        data_key: impl Into<String>,
    ) -> Self {
        Self {
            tap_stream_id: tap_stream_id.into(),
            key_properties: vec!["id".to_string()],
            replication_method: ReplicationMethod::FullTable,
            replication_keys: Vec::new(),
            data_key: data_key.into(),
            path: path.into(),
            page_size: DEFAULT_PAGE_SIZE,
            pagination_supported: true,
            children: Vec::new(),
            parent: None,
            is_dynamic: false,
        }
    }

    /// Incremental stream keyed by `id`, bookmarked on `replication_key`
    pub fn incremental(
        tap_stream_id: impl Into<String>,
        path: impl Into<String>,
        data_key: impl Into<String>,
        replication_key: impl Into<String>,
    ) -> Self {
        Self {
            replication_method: ReplicationMethod::Incremental,
            replication_keys: vec![replication_key.into()],
            ..Self::full_table(tap_stream_id, path, data_key)
        }
    }

    /// Mark the endpoint as returning a single page
    #[must_use]
    pub fn without_pagination(mut self) -> Self {
        self.pagination_supported = false;
        self
    }

    /// Declare child streams
    #[must_use]
    pub fn with_children(mut self, children: &[&str]) -> Self {
        self.children = children.iter().map(ToString::to_string).collect();
        self
    }

    /// Declare the parent stream
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Primary replication key
    pub fn replication_key(&self) -> Option<&str> {
        self.replication_keys.first().map(String::as_str)
    }

    /// Request path for one parent record
    pub fn resolve_path(&self, parent_id: Option<&str>) -> String {
        match parent_id {
            Some(id) => self.path.replace(PARENT_ID_PLACEHOLDER, id),
            None => self.path.clone(),
        }
    }

    /// Paginator matching the endpoint's capabilities
    pub fn paginator(&self) -> Box<dyn Paginator> {
        if self.pagination_supported {
            Box::new(InfoPaginator::new(self.page_size))
        } else {
            Box::new(NoPaginator::with_page_size(self.page_size))
        }
    }
}
