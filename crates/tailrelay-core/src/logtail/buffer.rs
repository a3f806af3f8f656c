// ── Log buffer ──
//
// Append-only in arrival order. The initial snapshot and `clear` are the
// only operations that replace contents. No de-duplication: an entry
// seen in the snapshot may show up again from the stream.

use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

use tailrelay_api::LogEntry;

/// One accepted entry plus when it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub received_at: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: LogEntry,
}

impl LogLine {
    /// `HH:MM:SS [LEVEL] [source] message` in local time.
    pub fn render(&self) -> String {
        self.render_in(&Local)
    }

    /// As [`render`](Self::render), in an explicit zone.
    pub fn render_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let at = self.entry.timestamp.unwrap_or(self.received_at);
        let time = at.with_timezone(tz).format("%H:%M:%S");
        match &self.entry.source {
            Some(source) => format!(
                "{time} [{}] [{source}] {}",
                self.entry.level, self.entry.message
            ),
            None => format!("{time} [{}] {}", self.entry.level, self.entry.message),
        }
    }
}

/// Change published to log presenters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// Contents replaced (initial load or clear).
    Reset(Arc<[LogLine]>),
    Appended(LogLine),
}

#[derive(Debug, Default)]
pub(crate) struct LogBuffer {
    lines: Vec<LogLine>,
}

impl LogBuffer {
    /// Entries without a message are not kept.
    fn accept(entry: LogEntry, now: DateTime<Utc>) -> Option<LogLine> {
        (!entry.message.is_empty()).then_some(LogLine {
            received_at: now,
            entry,
        })
    }

    pub(crate) fn replace(&mut self, entries: Vec<LogEntry>, now: DateTime<Utc>) -> Arc<[LogLine]> {
        self.lines = entries
            .into_iter()
            .filter_map(|e| Self::accept(e, now))
            .collect();
        Arc::from(self.lines.as_slice())
    }

    pub(crate) fn push(&mut self, entry: LogEntry, now: DateTime<Utc>) -> Option<LogLine> {
        let line = Self::accept(entry, now)?;
        self.lines.push(line.clone());
        Some(line)
    }

    pub(crate) fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// Rendered text, one line per entry, each newline-terminated.
    pub(crate) fn text(&self) -> String {
        self.lines.iter().fold(String::new(), |mut out, line| {
            out.push_str(&line.render());
            out.push('\n');
            out
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(message: &str, source: Option<&str>) -> LogEntry {
        LogEntry {
            timestamp: Some("2026-03-04T05:06:07Z".parse().unwrap()),
            level: "WARN".into(),
            source: source.map(str::to_owned),
            message: message.into(),
        }
    }

    #[test]
    fn render_with_and_without_source() {
        let now = Utc::now();
        let line = LogBuffer::accept(entry("boom", Some("socat")), now).unwrap();
        assert_eq!(line.render_in(&Utc), "05:06:07 [WARN] [socat] boom");
        let line = LogBuffer::accept(entry("boom", None), now).unwrap();
        assert_eq!(line.render_in(&Utc), "05:06:07 [WARN] boom");
    }

    #[test]
    fn missing_timestamp_uses_receipt_time() {
        let now: DateTime<Utc> = "2026-01-01T23:59:58Z".parse().unwrap();
        let mut e = entry("late", None);
        e.timestamp = None;
        let line = LogBuffer::accept(e, now).unwrap();
        assert_eq!(line.render_in(&Utc), "23:59:58 [WARN] late");
    }

    #[test]
    fn empty_messages_are_skipped_everywhere() {
        let mut buffer = LogBuffer::default();
        let now = Utc::now();
        let reset = buffer.replace(vec![entry("a", None), entry("", None)], now);
        assert_eq!(reset.len(), 1);
        assert!(buffer.push(entry("", None), now).is_none());
        assert!(buffer.push(entry("b", None), now).is_some());
        let messages: Vec<&str> = buffer.lines().iter().map(|l| l.entry.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b"]);
        assert_eq!(buffer.text().lines().count(), 2);
        assert!(buffer.text().ends_with("b\n"));
    }
}
