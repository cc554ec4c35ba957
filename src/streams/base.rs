//! Stream capability and shared plumbing

use super::definition::StreamDefinition;
use super::fetcher::RecordFetcher;
use super::full_table::FullTableStream;
use super::incremental::IncrementalStream;
use crate::catalog::CatalogEntry;
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::http::RequestExecutor;
use crate::output::{Message, MessageWriter};
use crate::state::StateManager;
use crate::transform::Transformer;
use crate::types::{scalar_to_string, JsonObject, JsonValue, QueryParams, ReplicationMethod};
use async_trait::async_trait;

/// Collaborators threaded through a sync run
pub struct SyncContext<'a> {
    /// Request executor for every API call
    pub client: &'a dyn RequestExecutor,
    /// Tap configuration
    pub config: &'a TapConfig,
    /// State document and its persistence
    pub state: &'a StateManager,
    /// Destination for schema, record and state messages
    pub writer: &'a mut dyn MessageWriter,
    /// Shapes records to their schema
    pub transformer: Transformer,
}

impl<'a> SyncContext<'a> {
    /// Create a context
    pub fn new(
        client: &'a dyn RequestExecutor,
        config: &'a TapConfig,
        state: &'a StateManager,
        writer: &'a mut dyn MessageWriter,
    ) -> Self {
        Self {
            client,
            config,
            state,
            writer,
            transformer: Transformer::new(),
        }
    }

    /// Persist and emit the current state
    pub async fn checkpoint(&mut self) -> Result<()> {
        self.state.checkpoint(&mut *self.writer).await
    }
}

/// One syncable stream
#[async_trait]
pub trait Stream: Send + Sync {
    /// Stream identifier
    fn tap_stream_id(&self) -> &str;

    /// Behavior descriptor
    fn definition(&self) -> &StreamDefinition;

    /// Whether the catalog selects this stream
    fn is_selected(&self) -> bool;

    /// Emit the stream's SCHEMA message
    fn write_schema(&self, writer: &mut dyn MessageWriter) -> Result<()>;

    /// Register a child synced once per record of this stream
    fn add_child(&mut self, child: Box<dyn Stream>);

    /// Registered children
    fn children(&self) -> &[Box<dyn Stream>];

    /// Sync the stream, under `parent` when it is a child stream.
    ///
    /// Returns the number of records written.
    async fn sync(&mut self, ctx: &mut SyncContext<'_>, parent: Option<&JsonObject>)
        -> Result<u64>;
}

/// Build the stream implementation matching a definition's replication method
pub fn build_stream(definition: StreamDefinition, entry: CatalogEntry) -> Box<dyn Stream> {
    let core = StreamCore::new(definition, entry);
    match core.definition.replication_method {
        ReplicationMethod::Incremental => Box::new(IncrementalStream::new(core)),
        ReplicationMethod::FullTable => Box::new(FullTableStream::new(core)),
    }
}

/// State shared by every stream implementation
pub struct StreamCore {
    pub(crate) definition: StreamDefinition,
    pub(crate) entry: CatalogEntry,
    pub(crate) children: Vec<Box<dyn Stream>>,
}

impl StreamCore {
    pub(crate) fn new(definition: StreamDefinition, entry: CatalogEntry) -> Self {
        Self {
            definition,
            entry,
            children: Vec::new(),
        }
    }

    pub(crate) fn tap_stream_id(&self) -> &str {
        &self.definition.tap_stream_id
    }

    pub(crate) fn is_selected(&self) -> bool {
        self.entry.is_selected()
    }

    pub(crate) fn write_schema(&self, writer: &mut dyn MessageWriter) -> Result<()> {
        writer.write_message(&Message::schema(
            self.tap_stream_id(),
            self.entry.schema.to_json(),
            self.definition.key_properties.clone(),
            self.definition.replication_keys.clone(),
        ))
    }

    /// Fetcher for this stream, scoped to the parent record when given
    pub(crate) fn fetcher<'c>(
        &self,
        client: &'c dyn RequestExecutor,
        parent: Option<&JsonObject>,
        extra_params: QueryParams,
    ) -> Result<RecordFetcher<'c>> {
        let parent_id = match parent {
            Some(record) => Some(
                record
                    .get("id")
                    .and_then(scalar_to_string)
                    .ok_or_else(|| {
                        Error::stream(self.tap_stream_id(), "parent record has no id")
                    })?,
            ),
            None => None,
        };
        Ok(RecordFetcher::new(
            client,
            &self.definition,
            &self.entry.schema,
            parent_id.as_deref(),
            extra_params,
        ))
    }

    /// Shape a raw record to the catalog schema
    pub(crate) fn transform(&self, ctx: &SyncContext<'_>, record: &JsonObject) -> Result<JsonObject> {
        ctx.transformer
            .transform(record, &self.entry.schema, &self.entry.metadata)
    }

    /// Write one RECORD message; every key property must be present
    pub(crate) fn emit(&self, ctx: &mut SyncContext<'_>, record: JsonObject) -> Result<()> {
        if let Some(missing) = self
            .definition
            .key_properties
            .iter()
            .find(|key| record.get(*key).map_or(true, JsonValue::is_null))
        {
            return Err(Error::stream(
                self.tap_stream_id(),
                format!("record is missing key property '{missing}'"),
            ));
        }
        ctx.writer
            .write_message(&Message::record(self.tap_stream_id(), record))
    }
}
