//! State manager implementation
//!
//! Owns the state document for a run. Every checkpoint emits a STATE message
//! and, when a path is configured, persists the document with atomic writes.

use super::bookmark::compare_bookmarks;
use super::types::State;
use crate::error::{Error, Result};
use crate::output::{Message, MessageWriter};
use crate::types::JsonValue;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State manager for loading, updating and persisting state
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file; empty in memory-only mode
    path: PathBuf,
    /// Current state
    state: Arc<RwLock<State>>,
}

impl StateManager {
    /// Create a manager persisting to `path`, starting from empty state
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_state(path.as_ref().to_path_buf(), State::new())
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::with_state(PathBuf::new(), State::new())
    }

    /// Wrap an existing state document without persistence
    pub fn from_state(state: State) -> Self {
        Self::with_state(PathBuf::new(), state)
    }

    fn with_state(path: PathBuf, state: State) -> Self {
        Self {
            path,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Load state from a file, starting empty if the file does not exist.
    ///
    /// Checkpoints are written back to the same path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse_state(&contents)?
        } else {
            State::new()
        };
        Ok(Self::with_state(path, state))
    }

    /// Create a state manager from inline JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::from_state(parse_state(json)?))
    }

    /// Save current state to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)
                .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?
        };

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }

    /// Emit the current state and persist it
    pub async fn checkpoint(&self, writer: &mut dyn MessageWriter) -> Result<()> {
        let value = self.to_value().await?;
        writer.write_message(&Message::state(value))?;
        self.save().await
    }

    /// Snapshot of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Current state as a JSON document
    pub async fn to_value(&self) -> Result<JsonValue> {
        self.state.read().await.to_value()
    }

    /// Stream recorded as in progress by a previous run
    pub async fn currently_syncing(&self) -> Option<String> {
        self.state.read().await.currently_syncing.clone()
    }

    /// Set or clear the in-progress marker
    pub async fn set_currently_syncing(&self, stream: Option<&str>) {
        self.state.write().await.set_currently_syncing(stream);
    }

    /// Bookmark value for a stream slot
    pub async fn get_bookmark(&self, stream: &str, key: &str) -> Option<String> {
        self.state.read().await.bookmark_string(stream, key)
    }

    /// Advance a bookmark slot; returns the value now stored.
    ///
    /// A value earlier than the stored one leaves the slot unchanged.
    pub async fn write_bookmark(&self, stream: &str, key: &str, value: &str) -> String {
        let mut state = self.state.write().await;
        if let Some(existing) = state.bookmark_string(stream, key) {
            if compare_bookmarks(value, &existing) == Ordering::Less {
                return existing;
            }
        }
        state.set_bookmark(stream, key, JsonValue::String(value.to_string()));
        value.to_string()
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

fn parse_state(json: &str) -> Result<State> {
    if json.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(json).map_err(|e| Error::state(format!("Failed to parse state: {e}")))
}
