// Server-sent events decoding for `GET /api/logs/stream`.
//
// The backend writes `data: <json>\n\n` frames plus the occasional
// comment line used as a keepalive. Only `data` fields are surfaced;
// `event`, `id` and `retry` are accepted and ignored.

use std::pin::Pin;

use futures_core::Stream;
use futures_util::StreamExt;
use tracing::trace;

use crate::error::Error;

/// Upper bound on a single line and on one event's accumulated data.
pub const MAX_EVENT_BYTES: usize = 1024 * 1024;

/// Stream of raw `data:` payloads, one item per dispatched event.
///
/// The stream ends when the backend closes the response body.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// Incremental SSE line decoder.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence,
/// so undecoded input is buffered until a full line is available. A line
/// or event larger than [`MAX_EVENT_BYTES`] fails the stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
    data_len: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, Error> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches('\n').trim_end_matches('\r');
            if let Some(event) = self.process_line(line)? {
                events.push(event);
            }
        }
        if self.pending.len() > MAX_EVENT_BYTES {
            self.pending.clear();
            return Err(Error::Stream(format!(
                "SSE line exceeds {MAX_EVENT_BYTES} bytes"
            )));
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Result<Option<String>, Error> {
        if line.is_empty() {
            if self.data.is_empty() {
                return Ok(None);
            }
            let payload = self.data.join("\n");
            self.data.clear();
            self.data_len = 0;
            return Ok(Some(payload));
        }
        if line.starts_with(':') {
            return Ok(None);
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data_len += value.len() + 1;
            if self.data_len > MAX_EVENT_BYTES {
                self.data.clear();
                self.data_len = 0;
                return Err(Error::Stream(format!(
                    "SSE event exceeds {MAX_EVENT_BYTES} bytes"
                )));
            }
            self.data.push(value.to_owned());
        } else {
            trace!(field, "ignoring SSE field");
        }
        Ok(None)
    }
}

/// Turn a streaming response body into an [`EventStream`].
pub(crate) fn events(response: reqwest::Response) -> EventStream {
    let mut body = response.bytes_stream();
    Box::pin(async_stream::try_stream! {
        let mut decoder = SseDecoder::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| Error::Stream(e.to_string()))?;
            for event in decoder.push(&chunk)? {
                yield event;
            }
        }
    })
}
