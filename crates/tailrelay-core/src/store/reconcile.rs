// ── Full reconciliation ──
//
// Replaces both record collections and the tailnet identity with one
// cycle's fetch results. No field-level diffing; whatever the backend
// said last wins, optimistic values included.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use tailrelay_api::{ApiClient, Proxy, RelayStatus, TailscaleStatus};

use super::ViewStore;
use crate::error::CoreError;
use crate::model::{ProxyRecord, RelayRecord, TailnetIdentity, ViewModel};

/// The three resources fetched during a single refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct BackendSnapshot {
    pub relays: Vec<RelayStatus>,
    pub proxies: Vec<Proxy>,
    pub tailscale: TailscaleStatus,
}

impl BackendSnapshot {
    /// Fetch all three resources concurrently. Any failure fails the
    /// whole snapshot so the caller never merges a partial cycle.
    pub async fn fetch(client: &ApiClient) -> Result<Self, CoreError> {
        let (relays, proxies, tailscale) = tokio::try_join!(
            client.list_relays(),
            client.list_proxies(),
            client.tailscale_status(),
        )?;
        Ok(Self {
            relays,
            proxies,
            tailscale,
        })
    }
}

impl ViewStore {
    /// Merge a freshly fetched snapshot, keeping only the visibility flags
    /// from the previous view. Identical input yields an identical view.
    pub fn reconcile(&self, snapshot: BackendSnapshot) -> Arc<ViewModel> {
        let relays: Vec<Arc<RelayRecord>> = snapshot
            .relays
            .into_iter()
            .map(|r| Arc::new(RelayRecord::from(r)))
            .collect();
        let proxies: Vec<Arc<ProxyRecord>> = snapshot
            .proxies
            .into_iter()
            .map(|p| Arc::new(ProxyRecord::from(p)))
            .collect();
        let identity = TailnetIdentity::from(snapshot.tailscale);

        debug!(
            relays = relays.len(),
            proxies = proxies.len(),
            identity = identity.fqdn(),
            "reconciling view"
        );

        self.view.send_if_modified(|view| {
            let next = ViewModel::new(relays, proxies, identity, view.visibility());
            if next == **view {
                return false;
            }
            *view = Arc::new(next);
            true
        });
        self.last_updated.send_replace(Some(Utc::now()));

        self.snapshot()
    }
}
