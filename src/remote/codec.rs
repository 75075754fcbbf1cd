//! Server-sent events wire codec
//!
//! The event stream is a sequence of frames separated by blank lines:
//! ```text
//! event: update\n
//! data: {"id": "42"}\n
//! \n
//! ```
//! Lines starting with `:` are comments. Multiple `data:` lines in one
//! frame are joined with `\n`. Both LF and CRLF line endings are accepted.

use serde_json::Value;

use super::types::Event;

/// Incremental decoder fed with arbitrary chunks of the byte stream
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event completed by it
    ///
    /// Partial lines are kept until the rest of the line arrives.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Event> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');

            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<Event> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id and retry only matter for reconnection
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<Event> {
        let name = self.event.take();
        if self.data.is_empty() {
            return None;
        }

        let raw = self.data.join("\n");
        self.data.clear();
        let data = serde_json::from_str(&raw).unwrap_or(Value::String(raw));

        Some(Event { name, data })
    }
}
