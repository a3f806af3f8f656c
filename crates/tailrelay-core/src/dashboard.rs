// ── Dashboard abstraction ──
//
// Lifecycle and single write path for one tailrelay backend. Owns the
// view store, the in-flight set, the refresh scheduler and the log
// tail; presenters read snapshots and send `Mutation`s through here.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tailrelay_api::{ApiClient, Proxy, Relay};

use crate::config::DashboardConfig;
use crate::convert::{proxy_body, relay_body};
use crate::error::CoreError;
use crate::inflight::{InFlightKey, InFlightSet, InFlightSnapshot};
use crate::logtail::LogTail;
use crate::model::{
    Notification, ProxyRecord, RecordId, RelayRecord, ResourceKind, ViewItem, ViewModel,
};
use crate::mutation::{Mutation, MutationAction};
use crate::scheduler::{RefreshScheduler, TickOutcome, refresh_task};
use crate::store::{BackendSnapshot, FieldPatch, PatchField, ViewStore};
use crate::stream::ViewStream;

const NOTIFICATION_CHANNEL_SIZE: usize = 64;

/// The main entry point for presenters.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Reads are synchronous
/// snapshot accessors; every write goes through [`refresh`](Self::refresh),
/// [`dispatch`](Self::dispatch) or [`set_visibility`](Self::set_visibility).
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    client: ApiClient,
    store: ViewStore,
    in_flight: Arc<InFlightSet>,
    scheduler: RefreshScheduler,
    logs: LogTail,
    notifications: broadcast::Sender<Notification>,
    /// Replaced on every `start` so the dashboard can be restarted.
    cancel: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Dashboard {
    /// Build a dashboard and its HTTP client from `config`. Nothing is
    /// fetched until [`start`](Self::start).
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let client = ApiClient::new(config.url.clone(), &config.transport())?;
        Ok(Self::with_client(config, client))
    }

    /// Build a dashboard around an existing client.
    pub fn with_client(config: DashboardConfig, client: ApiClient) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        let logs = LogTail::new(client.clone(), config.reconnect_delay, notifications.clone());
        Self {
            inner: Arc::new(DashboardInner {
                config,
                client,
                store: ViewStore::new(),
                in_flight: InFlightSet::new(),
                scheduler: RefreshScheduler::new(),
                logs,
                notifications,
                cancel: Mutex::new(CancellationToken::new()),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &ViewStore {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run the first reconciliation, then start the periodic refresh and
    /// (if enabled) the log tail.
    ///
    /// Background work starts even when the first refresh fails; its
    /// error is returned so one-shot callers can bail out.
    pub async fn start(&self) -> Result<(), CoreError> {
        let initial = self.refresh().await;

        let cancel = CancellationToken::new();
        let previous = std::mem::replace(&mut *self.inner.cancel.lock().await, cancel.clone());
        previous.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        let period = self.inner.config.refresh_interval;
        if !period.is_zero() {
            handles.push(tokio::spawn(refresh_task(self.clone(), period, cancel)));
        }
        drop(handles);

        if self.inner.config.log_stream_enabled {
            self.inner.logs.start().await;
        }

        info!(url = %self.inner.config.url, "dashboard started");
        initial.map(drop)
    }

    /// Stop the refresh timer and the log tail and wait for both.
    pub async fn shutdown(&self) {
        self.inner.cancel.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        self.inner.logs.stop().await;
        debug!("dashboard stopped");
    }

    /// One-shot: start, run `f`, shut down.
    ///
    /// Disables the refresh timer and the log tail since a single
    /// request-response cycle is all a command needs.
    pub async fn oneshot<F, Fut, T>(config: DashboardConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Dashboard) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval = Duration::ZERO;
        cfg.log_stream_enabled = false;

        let dashboard = Dashboard::new(cfg)?;
        if let Err(e) = dashboard.start().await {
            dashboard.shutdown().await;
            return Err(e);
        }
        let result = f(dashboard.clone()).await;
        dashboard.shutdown().await;
        result
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Fetch and merge backend truth, unless a cycle is already running.
    pub async fn refresh(&self) -> Result<TickOutcome, CoreError> {
        self.inner.scheduler.tick(|| self.reconcile_cycle()).await
    }

    /// One fetch-and-merge. A failure leaves the previous snapshot in
    /// place and is announced once.
    async fn reconcile_cycle(&self) -> Result<(), CoreError> {
        match BackendSnapshot::fetch(&self.inner.client).await {
            Ok(snapshot) => {
                self.inner.store.reconcile(snapshot);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "refresh failed; keeping previous view");
                self.notify(Notification::danger(e.to_string()));
                Err(e)
            }
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Validate, send and settle one user action.
    ///
    /// Validation failures and backend errors are announced and returned.
    /// A duplicate of an action already awaiting the backend is rejected
    /// silently with [`CoreError::AlreadyInFlight`]. On success a refresh
    /// follows; its outcome does not affect the result.
    pub async fn dispatch(&self, mutation: Mutation) -> Result<(), CoreError> {
        let view = self.inner.store.snapshot();
        if let Err(err) = mutation.validate(view.identity()) {
            debug!(error = %err, "mutation rejected before sending");
            self.notify(Notification::danger(err.to_string()));
            return Err(err);
        }

        let key = mutation.key();
        let Some(guard) = self.inner.in_flight.try_acquire(key.clone()) else {
            debug!(%key, "mutation already in flight");
            return Err(CoreError::AlreadyInFlight {
                kind: key.kind,
                id: key.id.map_or_else(|| "new".to_owned(), |id| id.to_string()),
                action: key.action,
            });
        };

        debug!(key = %guard.key(), "dispatching mutation");
        let sent = self.execute(&mutation, &view).await;
        drop(guard);

        match sent {
            Ok(()) => {
                if let Some(message) = mutation.success_message() {
                    self.notify(Notification::success(message));
                }
                if let Err(e) = self
                    .inner
                    .scheduler
                    .request_followup(|| self.reconcile_cycle())
                    .await
                {
                    debug!(error = %e, "post-mutation refresh failed");
                }
                Ok(())
            }
            Err(err) => {
                warn!(%key, error = %err, "mutation failed");
                self.notify(Notification::danger(err.to_string()));
                Err(err)
            }
        }
    }

    async fn execute(&self, mutation: &Mutation, view: &ViewModel) -> Result<(), CoreError> {
        let client = &self.inner.client;
        match mutation {
            Mutation::ToggleRun { kind, id } => {
                let item = self.lookup(*kind, id)?;
                let patch = match &item {
                    ViewItem::Relay(r) => tentative(&item, PatchField::Running, !r.running),
                    ViewItem::Proxy(p) => tentative(&item, PatchField::Enabled, !p.enabled),
                };
                let undo = self.inner.store.apply_tentative(&patch);
                let sent = match &item {
                    ViewItem::Relay(r) if r.running => client.stop_relay(r.id.as_str()).await,
                    ViewItem::Relay(r) => client.start_relay(r.id.as_str()).await,
                    ViewItem::Proxy(p) => client.toggle_proxy(p.id.as_str(), !p.enabled).await,
                };
                self.settle(sent, undo)
            }
            Mutation::SetAutostart {
                kind,
                id,
                autostart,
            } => {
                let item = self.lookup(*kind, id)?;
                let undo = self
                    .inner
                    .store
                    .apply_tentative(&tentative(&item, PatchField::Autostart, *autostart));
                let sent = match &item {
                    ViewItem::Relay(r) => {
                        let body = Relay {
                            autostart: *autostart,
                            ..relay_body(r)
                        };
                        client.update_relay(&body).await
                    }
                    ViewItem::Proxy(p) => {
                        let body = Proxy {
                            autostart: *autostart,
                            ..proxy_body(p)
                        };
                        client.replace_proxy(&body).await
                    }
                };
                self.settle(sent, undo)
            }
            Mutation::CreateRelay(draft) => client.create_relay(&draft.to_body(None)).await,
            Mutation::UpdateRelay { id, draft } => {
                client.update_relay(&draft.to_body(Some(id))).await
            }
            Mutation::CreateProxy(draft) => {
                client.create_proxy(draft.to_form(None, view.identity())).await
            }
            Mutation::UpdateProxy { id, draft } => {
                client
                    .update_proxy(draft.to_form(Some(id), view.identity()))
                    .await
            }
            Mutation::Delete {
                kind: ResourceKind::Relay,
                id,
            } => client.delete_relay(id.as_str()).await,
            Mutation::Delete {
                kind: ResourceKind::Proxy,
                id,
            } => client.delete_proxy(id.as_str()).await,
        }
        .map_err(CoreError::from)
    }

    /// The record an optimistic mutation targets, from the current view.
    fn lookup(&self, kind: ResourceKind, id: &RecordId) -> Result<ViewItem, CoreError> {
        self.inner
            .store
            .snapshot()
            .find(kind, id)
            .ok_or_else(|| CoreError::NotFound {
                kind,
                id: id.clone(),
            })
    }

    /// Keep the tentative value on success, put the prior one back on
    /// failure.
    fn settle(
        &self,
        sent: Result<(), tailrelay_api::Error>,
        undo: Option<FieldPatch>,
    ) -> Result<(), tailrelay_api::Error> {
        if let (Err(_), Some(undo)) = (&sent, &undo) {
            self.inner.store.revert(undo);
        }
        sent
    }

    // ── Presenter-side state ─────────────────────────────────────────

    /// Show or hide relays or proxies. Local only.
    pub fn set_visibility(&self, kind: ResourceKind, visible: bool) {
        self.inner.store.set_visibility(kind, visible);
    }

    pub fn snapshot(&self) -> Arc<ViewModel> {
        self.inner.store.snapshot()
    }

    pub fn view(&self) -> ViewStream {
        self.inner.store.subscribe()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_updated()
    }

    /// Record for an edit form, from the last reconciled view.
    pub fn relay(&self, id: &RecordId) -> Option<Arc<RelayRecord>> {
        self.snapshot().relay(id).cloned()
    }

    pub fn proxy(&self, id: &RecordId) -> Option<Arc<ProxyRecord>> {
        self.snapshot().proxy(id).cloned()
    }

    /// Subscribe to user-facing notifications.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    /// Whether this action on this record is awaiting the backend.
    pub fn is_in_flight(
        &self,
        kind: ResourceKind,
        id: Option<&RecordId>,
        action: MutationAction,
    ) -> bool {
        self.inner.in_flight.contains(&InFlightKey {
            kind,
            id: id.cloned(),
            action,
        })
    }

    /// Watch the in-flight set; control disablement derives from it.
    pub fn in_flight(&self) -> watch::Receiver<InFlightSnapshot> {
        self.inner.in_flight.subscribe()
    }

    pub fn logs(&self) -> &LogTail {
        &self.inner.logs
    }

    fn notify(&self, notification: Notification) {
        let _ = self.inner.notifications.send(notification);
    }
}

fn tentative(item: &ViewItem, field: PatchField, value: bool) -> FieldPatch {
    FieldPatch {
        kind: item.kind(),
        id: item.id().clone(),
        field,
        value,
    }
}
