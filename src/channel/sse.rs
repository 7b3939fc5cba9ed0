//! Incremental decoder for `text/event-stream` bodies

use tracing::warn;

/// Longest unterminated line kept while waiting for its end
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    /// Event type; `message` when the server sent none
    pub event: String,
    pub data: String,
}

impl SseMessage {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }
}

/// Accumulates raw body chunks and yields complete events.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; only complete
/// lines are interpreted. Lines end at CRLF, LF or a lone CR.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    seen_field: bool,
    // previous line ended at CR; a leading LF belongs to it
    after_cr: bool,
    // rest of an oversized line still to be thrown away
    skip_line: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every event it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
        self.pending.extend_from_slice(chunk);

        let mut messages = Vec::new();
        let mut start = 0;
        while start < self.pending.len() {
            if self.after_cr {
                self.after_cr = false;
                if self.pending[start] == b'\n' {
                    start += 1;
                }
                continue;
            }

            let Some(offset) = self.pending[start..]
                .iter()
                .position(|b| *b == b'\n' || *b == b'\r')
            else {
                break;
            };
            let end = start + offset;
            self.after_cr = self.pending[end] == b'\r';
            let line = String::from_utf8_lossy(&self.pending[start..end]).into_owned();
            start = end + 1;

            if self.skip_line {
                self.skip_line = false;
                continue;
            }
            if let Some(message) = self.process_line(&line) {
                messages.push(message);
            }
        }
        self.pending.drain(..start);

        if self.pending.len() > MAX_LINE_BYTES {
            warn!("Discarding event with a line over {} bytes", MAX_LINE_BYTES);
            self.pending.clear();
            self.skip_line = true;
            self.event = None;
            self.data.clear();
            self.seen_field = false;
        }
        messages
    }

    fn process_line(&mut self, line: &str) -> Option<SseMessage> {
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
            "event" => {
                self.event = Some(value.to_string());
                self.seen_field = true;
            }
            "data" => {
                self.data.push(value.to_string());
                self.seen_field = true;
            }
            // id and retry have no meaning for progress channels
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseMessage> {
        if !self.seen_field {
            return None;
        }
        self.seen_field = false;

        let event = self
            .event
            .take()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "message".to_string());
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseMessage { event, data })
    }
}
