//! State management module
//!
//! Tracks per-stream bookmarks and the `currently_syncing` marker. State is
//! checkpointed after every bookmark write and every stream transition so an
//! interrupted sync resumes from the last durable point.

mod bookmark;
mod manager;
mod types;

pub use bookmark::{compare_bookmarks, min_bookmark, parse_bookmark};
pub use manager::StateManager;
pub use types::State;
