//! Client-side runtime between `tailrelay-api` and dashboard presenters.
//!
//! This crate keeps an in-memory view of a tailrelay backend consistent
//! with the backend itself:
//!
//! - **[`Dashboard`]**: facade owning the lifecycle.
//!   [`start()`](Dashboard::start) reconciles once, then spawns the periodic
//!   refresh and the log tail. [`Dashboard::oneshot()`](Dashboard::oneshot)
//!   runs a single command against a fresh snapshot.
//!
//! - **[`ViewStore`]**: immutable [`ViewModel`] snapshots published over a
//!   `tokio::sync::watch` channel. Reconciliation replaces everything;
//!   optimistic patches are values that carry their own undo.
//!
//! - **[`Mutation`]**: typed user actions. [`Dashboard::dispatch`]
//!   validates, claims an [`InFlightSet`] slot, sends one request and
//!   settles (keep and refresh, or revert and notify).
//!
//! - **[`LogTail`]**: snapshot-then-stream view of the backend log, driven
//!   by the pure [`transition`](logtail::transition) state machine.
//!
//! - **[`RefreshScheduler`]**: non-reentrant gate for reconciliation
//!   cycles, with trailing follow-ups for post-mutation refreshes.

pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod inflight;
pub mod logtail;
pub mod model;
pub mod mutation;
pub mod scheduler;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_REFRESH_INTERVAL, DashboardConfig, TlsVerification};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use inflight::{InFlightGuard, InFlightKey, InFlightSet, InFlightSnapshot};
pub use logtail::{LogEvent, LogLine, LogTail, LogViewport, TailPhase};
pub use mutation::{
    CertificateFile, MAX_CERTIFICATE_BYTES, Mutation, MutationAction, ProxyDraft,
    RESERVED_PROXY_PORTS, RelayDraft,
};
pub use scheduler::{RefreshScheduler, TickOutcome};
pub use store::{BackendSnapshot, FieldPatch, PatchField, ViewStore};
pub use stream::ViewStream;

pub use model::{
    Notification, ProxyRecord, RecordId, RelayRecord, ResourceKind, Severity, TailnetIdentity,
    ViewItem, ViewModel, Visibility,
};

// Wire types presenters commonly need alongside the domain model.
pub use tailrelay_api::{LogEntry, LogLevel};
