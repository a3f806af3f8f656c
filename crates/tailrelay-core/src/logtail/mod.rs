// ── Live log tail ──
//
// Snapshot-then-stream view of the backend log: a pure connection state
// machine, the driver that performs its effects, the append-only buffer
// and a stick-to-bottom viewport model for presenters.

mod buffer;
mod controller;
mod state;
mod viewport;

pub use buffer::{LogEvent, LogLine};
pub use controller::LogTail;
pub use state::{DISCONNECT_MESSAGE, TailEffect, TailEvent, TailPhase, TailState, transition};
pub use viewport::{DEFAULT_SCROLL_TOLERANCE, LogViewport};
