//! Message sinks

use super::messages::Message;
use crate::error::Result;
use crate::types::{JsonObject, JsonValue};
use std::io::{BufWriter, Stdout, Write};

/// Destination for sync messages
pub trait MessageWriter: Send {
    /// Write one message
    fn write_message(&mut self, message: &Message) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes one compact JSON document per line
pub struct JsonLinesWriter<W: Write + Send> {
    out: BufWriter<W>,
}

impl<W: Write + Send> JsonLinesWriter<W> {
    /// Wrap a writer
    pub fn new(out: W) -> Self {
        Self {
            out: BufWriter::new(out),
        }
    }

    /// Flush and return the inner writer
    pub fn into_inner(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

impl<W: Write + Send> MessageWriter for JsonLinesWriter<W> {
    fn write_message(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.out, message)?;
        self.out.write_all(b"\n")?;
        // State lines mark durable progress; push them out immediately
        if matches!(message, Message::State { .. }) {
            self.out.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Standard output sink
pub type StdoutWriter = JsonLinesWriter<Stdout>;

impl StdoutWriter {
    /// Writer over the process stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MemoryWriter {
    pub messages: Vec<Message>,
}

impl MemoryWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written for a stream, in order
    pub fn records(&self, stream: &str) -> Vec<&JsonObject> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record {
                    stream: s, record, ..
                } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Streams that received a schema message, in order
    pub fn schema_streams(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Schema { stream, .. } => Some(stream.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every state value written, in order
    pub fn states(&self) -> Vec<&JsonValue> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::State { value } => Some(value),
                _ => None,
            })
            .collect()
    }

    /// The most recent state value
    pub fn last_state(&self) -> Option<&JsonValue> {
        self.states().last().copied()
    }
}

impl MessageWriter for MemoryWriter {
    fn write_message(&mut self, message: &Message) -> Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}
