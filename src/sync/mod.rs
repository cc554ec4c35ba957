//! Sync orchestration
//!
//! Drives the selected streams one at a time. A stream with a parent is never
//! synced directly: its parent is scheduled instead and syncs it once per
//! parent record. Each stream start and finish is checkpointed through the
//! `currently_syncing` marker so an interrupted run resumes at that stream.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::streams::{build_stream, Stream, StreamRegistry, SyncContext};
use tracing::info;

/// Records written per directly synced stream, in sync order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub streams: Vec<(String, u64)>,
}

impl SyncSummary {
    /// Total records written
    pub fn total_records(&self) -> u64 {
        self.streams.iter().map(|(_, count)| count).sum()
    }
}

/// Runs a sync over a catalog
#[derive(Debug, Clone)]
pub struct SyncOrchestrator {
    registry: StreamRegistry,
}

impl Default for SyncOrchestrator {
    fn default() -> Self {
        Self::new(StreamRegistry::builtin())
    }
}

impl SyncOrchestrator {
    /// Orchestrator resolving streams through `registry`
    pub fn new(registry: StreamRegistry) -> Self {
        Self { registry }
    }

    /// Sync every selected stream in the catalog
    pub async fn run(&self, ctx: &mut SyncContext<'_>, mut catalog: Catalog) -> Result<SyncSummary> {
        let last_stream = ctx.state.currently_syncing().await;
        let mut streams_to_sync = catalog.selected_streams(last_stream.as_deref());

        if !ctx.config.select_fields_by_default {
            for name in &streams_to_sync {
                if let Some(entry) = catalog.get_stream_mut(name) {
                    info!("Deselecting unselected fields");
                    for field in entry.deselect_unselected_fields() {
                        info!("Deselecting field: {field}");
                    }
                }
            }
        }

        info!("selected_streams: {:?}", streams_to_sync);
        info!("last/currently syncing stream: {:?}", last_stream);

        let mut summary = SyncSummary::default();
        let mut index = 0;
        while index < streams_to_sync.len() {
            let name = streams_to_sync[index].clone();
            index += 1;

            let entry = catalog
                .get_stream(&name)
                .ok_or_else(|| Error::StreamNotFound {
                    stream: name.clone(),
                })?;
            let definition = self.registry.resolve(entry);

            if let Some(parent) = &definition.parent {
                if !streams_to_sync.contains(parent) {
                    streams_to_sync.push(parent.clone());
                }
                continue;
            }

            let mut stream = build_stream(definition, entry.clone());
            self.write_schema(stream.as_mut(), &streams_to_sync, &catalog, ctx)?;

            info!("START Syncing: {name}");
            ctx.state.set_currently_syncing(Some(name.as_str())).await;
            ctx.checkpoint().await?;

            let total_records = stream.sync(ctx, None).await?;

            ctx.state.set_currently_syncing(None).await;
            ctx.checkpoint().await?;
            info!("FINISHED Syncing: {name}, total_records: {total_records}");

            summary.streams.push((name, total_records));
        }

        ctx.writer.flush()?;
        Ok(summary)
    }

    /// Write the schema of a stream and of its children, registering the
    /// children that are scheduled for sync
    fn write_schema(
        &self,
        stream: &mut dyn Stream,
        streams_to_sync: &[String],
        catalog: &Catalog,
        ctx: &mut SyncContext<'_>,
    ) -> Result<()> {
        if stream.is_selected() {
            stream.write_schema(&mut *ctx.writer)?;
        }

        for child_name in stream.definition().children.clone() {
            let entry = catalog
                .get_stream(&child_name)
                .ok_or_else(|| Error::StreamNotFound {
                    stream: child_name.clone(),
                })?;
            let mut child = build_stream(self.registry.resolve(entry), entry.clone());
            self.write_schema(child.as_mut(), streams_to_sync, catalog, ctx)?;

            if streams_to_sync.contains(&child_name) {
                stream.add_child(child);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
