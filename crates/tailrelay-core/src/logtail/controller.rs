// ── Log tail controller ──
//
// Owns the push connection and drives the machine in `state.rs`. There
// is one driver task per `start`; a restart stops and joins the previous
// driver (dropping its connection) before the replacement opens, so at
// most one connection is ever live.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use tailrelay_api::{ApiClient, EventStream, LogEntry, LogLevel};

use super::buffer::{LogBuffer, LogEvent, LogLine};
use super::state::{TailEffect, TailEvent, TailPhase, TailState, transition};
use crate::error::CoreError;
use crate::model::Notification;

const LOG_EVENT_CHANNEL_SIZE: usize = 1024;

/// Live tail of the backend log.
///
/// Cheaply cloneable; all clones share one buffer and one driver.
#[derive(Clone)]
pub struct LogTail {
    inner: Arc<LogTailInner>,
}

struct LogTailInner {
    client: ApiClient,
    reconnect_delay: Duration,
    buffer: Mutex<LogBuffer>,
    events: broadcast::Sender<LogEvent>,
    phase: watch::Sender<TailPhase>,
    level: watch::Sender<LogLevel>,
    notifications: broadcast::Sender<Notification>,
    live: Arc<AtomicUsize>,
    driver: tokio::sync::Mutex<Option<Driver>>,
}

struct Driver {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Driver {
    async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

impl LogTail {
    pub(crate) fn new(
        client: ApiClient,
        reconnect_delay: Duration,
        notifications: broadcast::Sender<Notification>,
    ) -> Self {
        let (events, _) = broadcast::channel(LOG_EVENT_CHANNEL_SIZE);
        let (phase, _) = watch::channel(TailPhase::Idle);
        let (level, _) = watch::channel(LogLevel::default());
        Self {
            inner: Arc::new(LogTailInner {
                client,
                reconnect_delay,
                buffer: Mutex::new(LogBuffer::default()),
                events,
                phase,
                level,
                notifications,
                live: Arc::new(AtomicUsize::new(0)),
                driver: tokio::sync::Mutex::new(None),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load the buffered lines and current level, then open the stream.
    ///
    /// Calling this while a stream is running restarts it: the old
    /// connection is closed before the new one is opened. A failed
    /// snapshot is reported but does not prevent the stream from starting.
    pub async fn start(&self) {
        let mut driver = self.inner.driver.lock().await;
        if let Some(previous) = driver.take() {
            debug!("restarting log stream");
            previous.stop().await;
        }

        let _ = self.load_snapshot().await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(drive(self.clone(), cancel.clone()));
        *driver = Some(Driver { cancel, handle });
    }

    /// Close the stream and wait for the driver to exit.
    pub async fn stop(&self) {
        if let Some(driver) = self.inner.driver.lock().await.take() {
            driver.stop().await;
        }
    }

    /// Replace the buffer with the backend's retained lines.
    ///
    /// On failure the buffer is left untouched and a warning is
    /// published.
    pub async fn load_snapshot(&self) -> Result<(), CoreError> {
        let snapshot = match self.inner.client.log_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let err = CoreError::from(e);
                warn!(error = %err, "log snapshot fetch failed");
                self.notify(Notification::warning(err.to_string()));
                return Err(err);
            }
        };

        let level = parse_level(snapshot.level.as_deref()).unwrap_or_default();
        self.inner.level.send_replace(level);

        let lines = self.buffer().replace(snapshot.logs, Utc::now());
        debug!(lines = lines.len(), %level, "log snapshot loaded");
        let _ = self.inner.events.send(LogEvent::Reset(lines));
        Ok(())
    }

    // ── Level ────────────────────────────────────────────────────────

    /// Change the backend's minimum log level. The level the backend
    /// reports back wins; on failure the previous level is kept.
    pub async fn set_level(&self, level: LogLevel) -> Result<LogLevel, CoreError> {
        match self.inner.client.set_log_level(level).await {
            Ok(resp) => {
                let applied = parse_level(resp.level.as_deref()).unwrap_or(level);
                self.inner.level.send_replace(applied);
                info!(level = %applied, "log level changed");
                Ok(applied)
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(error = %err, %level, "set log level failed");
                self.notify(Notification::warning(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn level(&self) -> LogLevel {
        *self.inner.level.borrow()
    }

    pub fn level_watch(&self) -> watch::Receiver<LogLevel> {
        self.inner.level.subscribe()
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn phase(&self) -> TailPhase {
        *self.inner.phase.borrow()
    }

    pub fn phase_watch(&self) -> watch::Receiver<TailPhase> {
        self.inner.phase.subscribe()
    }

    /// Buffer changes. A lagging receiver should call [`lines`](Self::lines)
    /// to resynchronise.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.inner.events.subscribe()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.buffer().lines().to_vec()
    }

    /// The buffer as rendered text, for copying or export.
    pub fn text(&self) -> String {
        self.buffer().text()
    }

    /// Empty the local buffer. The backend is not touched.
    pub fn clear(&self) {
        let lines = self.buffer().replace(Vec::new(), Utc::now());
        let _ = self.inner.events.send(LogEvent::Reset(lines));
    }

    /// Number of push connections currently open.
    pub fn live_connections(&self) -> usize {
        self.inner.live.load(Ordering::SeqCst)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn buffer(&self) -> MutexGuard<'_, LogBuffer> {
        self.inner
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, entry: LogEntry) {
        let line = self.buffer().push(entry, Utc::now());
        if let Some(line) = line {
            let _ = self.inner.events.send(LogEvent::Appended(line));
        }
    }

    fn notify(&self, notification: Notification) {
        let _ = self.inner.notifications.send(notification);
    }

    fn publish_phase(&self, phase: TailPhase) {
        self.inner.phase.send_if_modified(|current| {
            if *current == phase {
                return false;
            }
            *current = phase;
            true
        });
    }
}

fn parse_level(raw: Option<&str>) -> Option<LogLevel> {
    raw.and_then(|level| level.parse().ok())
}

// ── Connection accounting ────────────────────────────────────────────

/// An open push stream, counted in `live` for as long as it exists.
struct Connection {
    stream: EventStream,
    live: Arc<AtomicUsize>,
}

impl Connection {
    fn new(stream: EventStream, live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            stream,
            live: Arc::clone(live),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

// ── Driver ───────────────────────────────────────────────────────────

/// Feed events through `transition` and perform the effects until
/// cancelled.
async fn drive(tail: LogTail, cancel: CancellationToken) {
    let inner = Arc::clone(&tail.inner);
    let mut state = TailState::default();
    let mut pending = VecDeque::from([TailEvent::Start]);
    let mut connection: Option<Connection> = None;

    'run: loop {
        while let Some(event) = pending.pop_front() {
            let (next, effects) = transition(state, event);
            state = next;
            tail.publish_phase(state.phase());

            for effect in effects {
                match effect {
                    TailEffect::Open => {
                        connection = None;
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break 'run,
                            opened = inner.client.open_log_stream() => match opened {
                                Ok(stream) => {
                                    info!("log stream connected");
                                    connection = Some(Connection::new(stream, &inner.live));
                                }
                                Err(e) => {
                                    warn!(error = %e, "log stream connect failed");
                                    pending.push_back(TailEvent::Failed(e.to_string()));
                                }
                            },
                        }
                    }
                    TailEffect::Close => connection = None,
                    TailEffect::Append(entry) => tail.append(entry),
                    TailEffect::Discard(reason) => trace!(%reason, "dropping log frame"),
                    TailEffect::Notify(notification) => tail.notify(notification),
                    TailEffect::Reconnect => {
                        if inner.reconnect_delay.is_zero() {
                            tokio::task::yield_now().await;
                        } else {
                            tokio::select! {
                                biased;
                                () = cancel.cancelled() => break 'run,
                                () = tokio::time::sleep(inner.reconnect_delay) => {}
                            }
                        }
                        if cancel.is_cancelled() {
                            break 'run;
                        }
                        pending.push_back(TailEvent::Retry);
                    }
                }
            }
        }

        let Some(open) = connection.as_mut() else {
            break;
        };
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            frame = open.stream.next() => match frame {
                Some(Ok(payload)) => pending.push_back(TailEvent::Frame(payload)),
                Some(Err(e)) => {
                    warn!(error = %e, "log stream errored");
                    pending.push_back(TailEvent::Failed(e.to_string()));
                }
                None => {
                    warn!("log stream closed by backend");
                    pending.push_back(TailEvent::Closed);
                }
            },
        }
    }

    let (state, _) = transition(state, TailEvent::Stop);
    drop(connection);
    tail.publish_phase(state.phase());
    debug!("log stream stopped");
}
