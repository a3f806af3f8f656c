// ── Log stream state machine ──
//
// Pure transitions: (state, event) -> (state, effects). The driver in
// `controller.rs` owns the connection and performs the effects; nothing
// here does I/O, so every edge is testable without a server.

use serde::Serialize;
use strum::Display;

use tailrelay_api::{LogEntry, StreamMessage};

use crate::model::Notification;

/// Shown once per disconnect.
pub const DISCONNECT_MESSAGE: &str = "Log stream disconnected. Retrying...";

/// Lifecycle phase of the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TailPhase {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Disconnected,
}

/// Phase plus whether the current outage was already announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TailState {
    phase: TailPhase,
    outage_announced: bool,
}

impl TailState {
    pub fn phase(self) -> TailPhase {
        self.phase
    }

    fn enter(phase: TailPhase, outage_announced: bool) -> Self {
        Self {
            phase,
            outage_announced,
        }
    }
}

/// Inputs to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailEvent {
    /// Start, or restart over an existing connection.
    Start,
    /// One `data:` payload arrived.
    Frame(String),
    /// Connecting failed or the open stream errored.
    Failed(String),
    /// The backend ended the stream.
    Closed,
    /// Reconnect timer fired.
    Retry,
    Stop,
}

/// Work for the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailEffect {
    /// Open a new push connection.
    Open,
    /// Drop the current connection, if any.
    Close,
    Append(LogEntry),
    /// A frame was ignored; carries the reason for trace logging.
    Discard(String),
    Notify(Notification),
    /// Schedule a `Retry` after the configured delay.
    Reconnect,
}

/// Advance the machine by one event.
pub fn transition(state: TailState, event: TailEvent) -> (TailState, Vec<TailEffect>) {
    use TailPhase::{Connecting, Disconnected, Idle, Streaming};

    match (state.phase, event) {
        (Idle, TailEvent::Start) => (TailState::enter(Connecting, false), vec![TailEffect::Open]),
        (_, TailEvent::Start) => (
            TailState::enter(Connecting, false),
            vec![TailEffect::Close, TailEffect::Open],
        ),

        (phase, TailEvent::Stop) if phase != Idle => {
            (TailState::default(), vec![TailEffect::Close])
        }

        (Connecting | Streaming, TailEvent::Frame(payload)) => (
            TailState::enter(Streaming, false),
            handle_frame(&payload).into_iter().collect(),
        ),

        (Connecting | Streaming, TailEvent::Failed(_) | TailEvent::Closed) => {
            let mut effects = vec![TailEffect::Close];
            if !state.outage_announced {
                effects.push(TailEffect::Notify(Notification::warning(DISCONNECT_MESSAGE)));
            }
            effects.push(TailEffect::Reconnect);
            (TailState::enter(Disconnected, true), effects)
        }

        (Disconnected, TailEvent::Retry) => (
            TailState::enter(Connecting, state.outage_announced),
            vec![TailEffect::Open],
        ),

        // Stale input for the current phase (late frames after a drop,
        // a retry after stop, ...).
        (_, _) => (state, Vec::new()),
    }
}

/// Decide what one payload means. Greetings and unusable frames never
/// reach the buffer.
fn handle_frame(payload: &str) -> Option<TailEffect> {
    match StreamMessage::parse(payload) {
        Ok(StreamMessage::Connected) => None,
        Ok(StreamMessage::Entry(entry)) if entry.message.is_empty() => {
            Some(TailEffect::Discard("entry without message".into()))
        }
        Ok(StreamMessage::Entry(entry)) => Some(TailEffect::Append(entry)),
        Err(e) => Some(TailEffect::Discard(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GREETING: &str = r#"{"connected":true}"#;

    fn run(events: Vec<TailEvent>) -> (TailState, Vec<TailEffect>) {
        let mut state = TailState::default();
        let mut all = Vec::new();
        for event in events {
            let (next, effects) = transition(state, event);
            state = next;
            all.extend(effects);
        }
        (state, all)
    }

    fn notifications(effects: &[TailEffect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, TailEffect::Notify(_)))
            .count()
    }

    #[test]
    fn start_opens_and_first_frame_streams() {
        let (state, effects) = run(vec![
            TailEvent::Start,
            TailEvent::Frame(GREETING.into()),
        ]);
        assert_eq!(state.phase(), TailPhase::Streaming);
        assert_eq!(effects, vec![TailEffect::Open]);
    }

    #[test]
    fn entries_are_appended_in_order() {
        let (_, effects) = run(vec![
            TailEvent::Start,
            TailEvent::Frame(r#"{"level":"INFO","message":"one"}"#.into()),
            TailEvent::Frame(r#"{"level":"INFO","message":"two"}"#.into()),
        ]);
        let messages: Vec<&str> = effects
            .iter()
            .filter_map(|e| match e {
                TailEffect::Append(entry) => Some(entry.message.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[test]
    fn malformed_and_empty_frames_are_discarded() {
        let (state, effects) = run(vec![
            TailEvent::Start,
            TailEvent::Frame("not json".into()),
            TailEvent::Frame(r#"{"level":"INFO"}"#.into()),
        ]);
        assert_eq!(state.phase(), TailPhase::Streaming);
        assert!(effects[1..].iter().all(|e| matches!(e, TailEffect::Discard(_))));
        assert_eq!(effects.len(), 3);
    }

    #[test]
    fn drop_notifies_once_and_reconnects() {
        let (state, effects) = run(vec![
            TailEvent::Start,
            TailEvent::Frame(GREETING.into()),
            TailEvent::Closed,
        ]);
        assert_eq!(state.phase(), TailPhase::Disconnected);
        assert_eq!(
            effects[1..].to_vec(),
            vec![
                TailEffect::Close,
                TailEffect::Notify(Notification::warning(DISCONNECT_MESSAGE)),
                TailEffect::Reconnect,
            ]
        );

        let (state, effects) = transition(state, TailEvent::Retry);
        assert_eq!(state.phase(), TailPhase::Connecting);
        assert_eq!(effects, vec![TailEffect::Open]);
    }

    #[test]
    fn repeated_connect_failures_announce_one_outage() {
        let (state, effects) = run(vec![
            TailEvent::Start,
            TailEvent::Failed("refused".into()),
            TailEvent::Retry,
            TailEvent::Failed("refused".into()),
            TailEvent::Retry,
            TailEvent::Failed("refused".into()),
        ]);
        assert_eq!(state.phase(), TailPhase::Disconnected);
        assert_eq!(notifications(&effects), 1);

        // Once streaming again, the next drop is a new outage.
        let (state, _) = transition(state, TailEvent::Retry);
        let (state, _) = transition(state, TailEvent::Frame(GREETING.into()));
        let (_, effects) = transition(state, TailEvent::Failed("reset".into()));
        assert_eq!(notifications(&effects), 1);
    }

    #[test]
    fn restart_closes_before_opening() {
        let (state, _) = run(vec![TailEvent::Start, TailEvent::Frame(GREETING.into())]);
        let (state, effects) = transition(state, TailEvent::Start);
        assert_eq!(state.phase(), TailPhase::Connecting);
        assert_eq!(effects, vec![TailEffect::Close, TailEffect::Open]);
    }

    #[test]
    fn stale_events_are_ignored() {
        let (state, effects) = transition(TailState::default(), TailEvent::Frame(GREETING.into()));
        assert_eq!(state, TailState::default());
        assert!(effects.is_empty());

        let (stopped, effects) = run(vec![TailEvent::Start, TailEvent::Stop]);
        assert_eq!(stopped.phase(), TailPhase::Idle);
        assert_eq!(effects, vec![TailEffect::Open, TailEffect::Close]);
        assert!(transition(stopped, TailEvent::Retry).1.is_empty());
    }
}
