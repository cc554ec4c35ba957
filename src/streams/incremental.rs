//! Incremental replication
//!
//! A stream reads its bookmark, asks for records updated since then, emits
//! those at or after the bookmark and stores the highest value seen.
//!
//! Where the bookmark lives depends on the stream's place in a parent/child
//! tree:
//! - a standalone stream uses its own slot
//! - a parent with registered children takes the minimum of its own slot and
//!   the `<parent>_<key>` slot in each child's bookmarks, and writes all of them
//! - a child reads its own slot once and reuses that value for every parent
//!   record

use super::base::{Stream, StreamCore, SyncContext};
use super::definition::StreamDefinition;
use crate::error::Result;
use crate::output::MessageWriter;
use crate::state::{compare_bookmarks, min_bookmark, StateManager};
use crate::types::{scalar_to_string, JsonObject, QueryParams};
use async_trait::async_trait;
use futures::TryStreamExt;
use std::cmp::Ordering;
use tracing::debug;

/// Query parameter carrying the bookmark
pub const UPDATED_SINCE_PARAM: &str = "updated_since";

/// Slot a child keeps for its parent's bookmark
pub fn parent_bookmark_key(parent: &str, replication_key: &str) -> String {
    format!("{parent}_{replication_key}")
}

/// Bookmark-bearing stream
pub struct IncrementalStream {
    core: StreamCore,
    /// Child bookmark read on the first parent record
    cached_bookmark: Option<String>,
}

impl IncrementalStream {
    pub(crate) fn new(core: StreamCore) -> Self {
        Self {
            core,
            cached_bookmark: None,
        }
    }

    fn is_child(&self) -> bool {
        self.core.definition.parent.is_some()
    }

    /// Effective starting bookmark
    pub async fn get_bookmark(&mut self, state: &StateManager, start_date: &str) -> String {
        let start_date = start_date.to_string();
        let Some(key) = self.core.definition.replication_key().map(String::from) else {
            return start_date;
        };
        let stream = self.core.tap_stream_id().to_string();

        if self.is_child() {
            if let Some(cached) = &self.cached_bookmark {
                return cached.clone();
            }
            let value = state
                .get_bookmark(&stream, &key)
                .await
                .unwrap_or(start_date);
            self.cached_bookmark = Some(value.clone());
            return value;
        }

        if self.core.children.is_empty() {
            return state
                .get_bookmark(&stream, &key)
                .await
                .unwrap_or(start_date);
        }

        let mut minimum = if self.core.is_selected() {
            Some(
                state
                    .get_bookmark(&stream, &key)
                    .await
                    .unwrap_or_else(|| start_date.clone()),
            )
        } else {
            None
        };
        let slot = parent_bookmark_key(&stream, &key);
        for child in &self.core.children {
            let child_bookmark = state
                .get_bookmark(child.tap_stream_id(), &slot)
                .await
                .unwrap_or_else(|| start_date.clone());
            minimum = Some(match minimum {
                Some(current) => min_bookmark(&current, &child_bookmark).to_string(),
                None => child_bookmark,
            });
        }
        minimum.unwrap_or(start_date)
    }

    /// Store the new bookmark and checkpoint
    pub async fn write_bookmark(&self, ctx: &mut SyncContext<'_>, value: &str) -> Result<()> {
        let Some(key) = self.core.definition.replication_key() else {
            return Ok(());
        };
        let stream = self.core.tap_stream_id();

        if self.core.children.is_empty() || self.core.is_selected() {
            ctx.state.write_bookmark(stream, key, value).await;
        }
        let slot = parent_bookmark_key(stream, key);
        for child in &self.core.children {
            ctx.state
                .write_bookmark(child.tap_stream_id(), &slot, value)
                .await;
        }
        ctx.checkpoint().await
    }
}

#[async_trait]
impl Stream for IncrementalStream {
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
        let bookmark = self
            .get_bookmark(ctx.state, &ctx.config.start_date)
            .await;
        let mut max_bookmark = bookmark.clone();
        let replication_key = self.core.definition.replication_key().map(String::from);
        let selected = self.core.is_selected();
        debug!(stream = %self.core.tap_stream_id(), %bookmark, "Starting from bookmark");

        let mut params = QueryParams::new();
        params.insert(UPDATED_SINCE_PARAM.to_string(), bookmark.clone());
        let client = ctx.client;
        let mut records = Box::pin(self.core.fetcher(client, parent, params)?.into_records());

        let mut count = 0;
        while let Some(record) = records.try_next().await? {
            let transformed = self.core.transform(ctx, &record)?;
            let record_bookmark = replication_key
                .as_deref()
                .and_then(|key| transformed.get(key).or_else(|| record.get(key)))
                .and_then(scalar_to_string)
                .unwrap_or_else(|| bookmark.clone());

            if compare_bookmarks(&record_bookmark, &bookmark) == Ordering::Less {
                continue;
            }

            if selected {
                self.core.emit(ctx, transformed)?;
                count += 1;
            }
            if compare_bookmarks(&record_bookmark, &max_bookmark) == Ordering::Greater {
                max_bookmark = record_bookmark;
            }
            for child in &mut self.core.children {
                child.sync(ctx, Some(&record)).await?;
            }
        }

        self.write_bookmark(ctx, &max_bookmark).await?;
        Ok(count)
    }
}
