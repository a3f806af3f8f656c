// ── Stick-to-bottom viewport ──
//
// Scroll model for a log view, in abstract units (pixels for graphical
// hosts, rows for terminals). Appending follows the bottom only if the
// view was already there, within `tolerance`.

use super::buffer::LogEvent;

/// Default at-bottom slack, in units.
pub const DEFAULT_SCROLL_TOLERANCE: u32 = 8;

/// Scroll state for hosts that own a scrollable log pane (a graphical
/// view, a full-screen terminal). Line-oriented output such as the CLI's
/// `watch` leaves scrolling to the terminal and does not use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogViewport {
    scroll_top: u32,
    viewport_height: u32,
    content_height: u32,
    tolerance: u32,
}

impl LogViewport {
    pub fn new(viewport_height: u32) -> Self {
        Self {
            scroll_top: 0,
            viewport_height,
            content_height: 0,
            tolerance: DEFAULT_SCROLL_TOLERANCE,
        }
    }

    pub fn with_tolerance(self, tolerance: u32) -> Self {
        Self { tolerance, ..self }
    }

    pub fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    pub fn content_height(&self) -> u32 {
        self.content_height
    }

    pub fn max_scroll_top(&self) -> u32 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll_top
            .saturating_add(self.viewport_height)
            .saturating_add(self.tolerance)
            >= self.content_height
    }

    /// Grow the content. Follows the bottom only if it was at the bottom
    /// before the append; otherwise `scroll_top` is left alone.
    pub fn append(&mut self, added_height: u32) {
        let was_at_bottom = self.is_at_bottom();
        self.content_height = self.content_height.saturating_add(added_height);
        if was_at_bottom {
            self.scroll_top = self.max_scroll_top();
        }
    }

    pub fn scroll_to(&mut self, top: u32) {
        self.scroll_top = top.min(self.max_scroll_top());
    }

    pub fn scroll_up(&mut self, by: u32) {
        self.scroll_top = self.scroll_top.saturating_sub(by);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_top = self.max_scroll_top();
    }

    pub fn resize(&mut self, viewport_height: u32) {
        let was_at_bottom = self.is_at_bottom();
        self.viewport_height = viewport_height;
        if was_at_bottom {
            self.scroll_to_bottom();
        } else {
            self.scroll_top = self.scroll_top.min(self.max_scroll_top());
        }
    }

    /// Empty content, as after a clear or a fresh snapshot.
    pub fn reset(&mut self) {
        self.content_height = 0;
        self.scroll_top = 0;
    }

    /// Track a [`LogEvent`] from [`LogTail::subscribe`](super::LogTail::subscribe),
    /// each line taking `line_height` units.
    pub fn observe(&mut self, event: &LogEvent, line_height: u32) {
        match event {
            LogEvent::Reset(lines) => {
                self.reset();
                let count = u32::try_from(lines.len()).unwrap_or(u32::MAX);
                self.append(count.saturating_mul(line_height));
            }
            LogEvent::Appended(_) => self.append(line_height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logtail::LogLine;
    use tailrelay_api::LogEntry;

    fn filled(lines: u32) -> LogViewport {
        let mut v = LogViewport::new(20);
        for _ in 0..lines {
            v.append(1);
        }
        v
    }

    #[test]
    fn at_bottom_stays_at_bottom() {
        let mut v = filled(50);
        assert!(v.is_at_bottom());
        assert_eq!(v.scroll_top(), 30);
        for _ in 0..25 {
            v.append(1);
            assert_eq!(v.scroll_top(), v.max_scroll_top());
        }
        assert_eq!(v.scroll_top(), 55);
    }

    #[test]
    fn scrolled_up_keeps_offset() {
        let mut v = filled(100);
        v.scroll_up(40);
        assert!(!v.is_at_bottom());
        let held = v.scroll_top();
        for _ in 0..10 {
            v.append(3);
        }
        assert_eq!(v.scroll_top(), held);
        assert_eq!(v.content_height(), 130);
    }

    #[test]
    fn within_tolerance_counts_as_bottom() {
        let mut v = filled(100);
        v.scroll_up(DEFAULT_SCROLL_TOLERANCE);
        assert!(v.is_at_bottom());
        v.append(1);
        assert_eq!(v.scroll_top(), v.max_scroll_top());

        let mut strict = filled(100).with_tolerance(0);
        strict.scroll_up(1);
        let held = strict.scroll_top();
        strict.append(1);
        assert_eq!(strict.scroll_top(), held);
    }

    #[test]
    fn short_content_never_scrolls() {
        let mut v = filled(5);
        assert_eq!(v.scroll_top(), 0);
        v.scroll_to(10);
        assert_eq!(v.scroll_top(), 0);
        v.reset();
        assert_eq!(v.content_height(), 0);
    }

    #[test]
    fn observes_log_events() {
        let line = LogLine {
            received_at: chrono::Utc::now(),
            entry: LogEntry {
                timestamp: None,
                level: "INFO".into(),
                source: None,
                message: "relay r1 started".into(),
            },
        };
        let mut v = LogViewport::new(20).with_tolerance(0);
        v.observe(&LogEvent::Reset(vec![line.clone(); 50].into()), 1);
        assert_eq!(v.scroll_top(), 30);

        v.scroll_up(5);
        v.observe(&LogEvent::Appended(line), 1);
        assert_eq!(v.scroll_top(), 25);

        v.observe(&LogEvent::Reset(Vec::new().into()), 1);
        assert_eq!(v.content_height(), 0);
        assert!(v.is_at_bottom());
    }

    #[test]
    fn resize_keeps_bottom_pinned() {
        let mut v = filled(100);
        v.resize(10);
        assert_eq!(v.scroll_top(), 90);
    }
}
