//! Server-Sent Events frame parser
//!
//! Bytes arrive in arbitrary chunks; frames end at a blank line (`\n\n` or
//! `\r\n\r\n`). Only complete frames are decoded, so a multi-byte character
//! split across chunks is never mangled.

use std::borrow::Cow;

use tracing::warn;

/// A decoded SSE frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

/// Incremental SSE parser
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
    /// Bytes of `buf` already searched for a separator
    scanned: usize,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        // a separator may straddle the previous chunk boundary
        let mut from = self.scanned.saturating_sub(3);
        while let Some((end, separator_len)) = find_frame_end(&self.buf, from) {
            let text = String::from_utf8_lossy(&self.buf[..end]);
            if let Cow::Owned(_) = text {
                warn!("SSE frame is not valid UTF-8, decoding lossily");
            }
            if let Some(event) = parse_frame(&text) {
                events.push(event);
            }
            self.buf.drain(..end + separator_len);
            from = 0;
        }
        self.scanned = self.buf.len();
        events
    }

    /// Bytes of an incomplete trailing frame
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Position and length of the first frame separator at or after `from`
fn find_frame_end(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    for i in from..buf.len() {
        if buf[i..].starts_with(b"\r\n\r\n") {
            return Some((i, 4));
        }
        if buf[i..].starts_with(b"\n\n") {
            return Some((i, 2));
        }
    }
    None
}

/// Parse one frame; `None` when it carries no data (comments, keep-alives)
fn parse_frame(text: &str) -> Option<SseEvent> {
    let mut event = SseEvent::default();
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => data_lines.push(value),
            "event" => event.event = Some(value.to_string()),
            "id" => event.id = Some(value.to_string()),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return None;
    }
    event.data = data_lines.join("\n");
    Some(event)
}
