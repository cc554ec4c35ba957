//! Output module
//!
//! Sync progress leaves the process as one JSON message per line on stdout:
//! `SCHEMA` before a stream's records, `RECORD` per emitted row, and `STATE`
//! after every checkpoint.

mod messages;
mod writer;

pub use messages::Message;
pub use writer::{JsonLinesWriter, MemoryWriter, MessageWriter, StdoutWriter};
