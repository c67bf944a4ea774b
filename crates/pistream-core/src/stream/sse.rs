//! SSE (Server-Sent Events) stream processing
//!
//! Turns raw body chunks into complete event data strings. Chunks may split
//! lines and events at arbitrary byte offsets.

use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, info, trace};

/// Incremental SSE processor that handles partial lines and buffering
#[derive(Debug)]
pub struct SseStreamProcessor {
    /// Bytes of an incomplete line carried over from the previous chunk
    partial_line: Vec<u8>,
    /// Data lines of the event being assembled
    data_buffer: Option<String>,
    /// When the stream started
    stream_start: Instant,
    /// Event counter for logging
    event_count: usize,
    /// Bytes received counter
    bytes_received: usize,
}

impl Default for SseStreamProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SseStreamProcessor {
    pub fn new() -> Self {
        Self {
            partial_line: Vec::new(),
            data_buffer: None,
            stream_start: Instant::now(),
            event_count: 0,
            bytes_received: 0,
        }
    }

    /// Feed a chunk and return the data of every event it completed
    pub fn process_chunk(&mut self, bytes: &Bytes) -> Vec<String> {
        self.bytes_received += bytes.len();
        debug!(
            "SSE chunk received: {} bytes (total: {} bytes)",
            bytes.len(),
            self.bytes_received
        );

        self.partial_line.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.partial_line.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.partial_line.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            let line = String::from_utf8_lossy(&line);
            if let Some(data) = self.process_line(&line) {
                events.push(data);
            }
        }

        events
    }

    /// Number of events dispatched so far
    pub fn event_count(&self) -> usize {
        self.event_count
    }

    /// Log a summary once the body has ended
    pub fn finish(&self) {
        info!(
            "SSE stream ended: {:?} elapsed, {} events, {} bytes total",
            self.stream_start.elapsed(),
            self.event_count,
            self.bytes_received
        );
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        // Blank line dispatches the pending event
        if line.is_empty() {
            return self.dispatch();
        }

        // Comment (keepalive)
        if line.starts_with(':') {
            trace!("SSE keepalive/comment");
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                let buffer = self.data_buffer.get_or_insert_with(String::new);
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(value);
            }
            "event" | "id" | "retry" => {
                trace!("SSE {} field ignored: {}", field, value);
            }
            _ => {
                trace!("SSE unknown field: {}", field);
            }
        }

        None
    }

    fn dispatch(&mut self) -> Option<String> {
        let data = self.data_buffer.take()?;
        self.event_count += 1;
        debug!(
            "SSE event #{} at {:?}: {} chars",
            self.event_count,
            self.stream_start.elapsed(),
            data.len()
        );
        Some(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(processor: &mut SseStreamProcessor, input: &'static [u8]) -> Vec<String> {
        processor.process_chunk(&Bytes::from_static(input))
    }

    #[test]
    fn test_single_event() {
        let mut p = SseStreamProcessor::new();
        let events = feed(&mut p, b"data: {\"pi\":\"3.1\"}\n\n");
        assert_eq!(events, vec![r#"{"pi":"3.1"}"#]);
        assert_eq!(p.event_count(), 1);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut p = SseStreamProcessor::new();
        let events = feed(&mut p, b"data: a\n\ndata: b\n\n");
        assert_eq!(events, vec!["a", "b"]);
    }

    #[test]
    fn test_split_across_chunks() {
        let mut p = SseStreamProcessor::new();
        assert!(feed(&mut p, b"data: {\"pi\":").is_empty());
        assert!(feed(&mut p, b"\"3.14\"}\n").is_empty());
        assert_eq!(feed(&mut p, b"\n"), vec![r#"{"pi":"3.14"}"#]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut p = SseStreamProcessor::new();
        assert_eq!(feed(&mut p, b"data: x\r\n\r\n"), vec!["x"]);
    }

    #[test]
    fn test_comments_and_fields_ignored() {
        let mut p = SseStreamProcessor::new();
        let events = feed(&mut p, b": keepalive\nevent: update\nid: 7\nretry: 100\ndata: y\n\n");
        assert_eq!(events, vec!["y"]);
    }

    #[test]
    fn test_multiline_data_joined() {
        let mut p = SseStreamProcessor::new();
        assert_eq!(feed(&mut p, b"data: one\ndata: two\n\n"), vec!["one\ntwo"]);
    }

    #[test]
    fn test_no_space_after_colon() {
        let mut p = SseStreamProcessor::new();
        assert_eq!(feed(&mut p, b"data:z\n\n"), vec!["z"]);
    }

    #[test]
    fn test_blank_lines_without_data_dispatch_nothing() {
        let mut p = SseStreamProcessor::new();
        assert!(feed(&mut p, b"\n\n: ping\n\n").is_empty());
        assert_eq!(p.event_count(), 0);
    }

    #[test]
    fn test_utf8_split_inside_codepoint() {
        let mut p = SseStreamProcessor::new();
        // "π" is 0xCF 0x80
        assert!(feed(&mut p, b"data: \xCF").is_empty());
        assert_eq!(feed(&mut p, b"\x80\n\n"), vec!["π"]);
    }
}
