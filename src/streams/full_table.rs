//! Full-table replication

use super::base::{Stream, StreamCore, SyncContext};
use super::definition::StreamDefinition;
use crate::error::Result;
use crate::output::MessageWriter;
use crate::types::{JsonObject, QueryParams};
use async_trait::async_trait;
use futures::TryStreamExt;

/// Re-reads every record on every sync; never touches bookmarks
pub struct FullTableStream {
    core: StreamCore,
}

impl FullTableStream {
    pub(crate) fn new(core: StreamCore) -> Self {
        Self { core }
    }
}

#[async_trait]
impl Stream for FullTableStream {
    fn tap_stream_id(&self) -> &str {
        self.core.tap_stream_id()
    }

    fn definition(&self) -> &StreamDefinition {
        &self.core.definition
    }

    fn is_selected(&self) -> bool {
        self.core.is_selected()
    }

    fn write_schema(&self, writer: &mut dyn MessageWriter) -> Result<()> {
        self.core.write_schema(writer)
    }

    fn add_child(&mut self, child: Box<dyn Stream>) {
        self.core.children.push(child);
    }

    fn children(&self) -> &[Box<dyn Stream>] {
        &self.core.children
    }

    async fn sync(
        &mut self,
        ctx: &mut SyncContext<'_>,
        parent: Option<&JsonObject>,
    ) -> Result<u64> {
        let client = ctx.client;
        let selected = self.core.is_selected();
        let mut records = Box::pin(
            self.core
                .fetcher(client, parent, QueryParams::new())?
                .into_records(),
        );

        let mut count = 0;
        while let Some(record) = records.try_next().await? {
            let transformed = self.core.transform(ctx, &record)?;
            if selected {
                self.core.emit(ctx, transformed)?;
                count += 1;
            }
            for child in &mut self.core.children {
                child.sync(ctx, Some(&record)).await?;
            }
        }
        Ok(count)
    }
}
