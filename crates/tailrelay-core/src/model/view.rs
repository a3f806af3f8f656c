// ── Reconciled view model ──
//
// Everything here is derived from the three last-fetched resources plus
// the visibility flags. Nothing is stored that a full refresh could not
// rebuild.

use std::sync::Arc;

use serde::Serialize;

use super::{ProxyRecord, RecordId, RelayRecord, ResourceKind, TailnetIdentity};

/// Which collections the presenter wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub show_relays: bool,
    pub show_proxies: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            show_relays: true,
            show_proxies: true,
        }
    }
}

impl Visibility {
    pub fn shows(self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Relay => self.show_relays,
            ResourceKind::Proxy => self.show_proxies,
        }
    }

    pub fn with(self, kind: ResourceKind, visible: bool) -> Self {
        match kind {
            ResourceKind::Relay => Self {
                show_relays: visible,
                ..self
            },
            ResourceKind::Proxy => Self {
                show_proxies: visible,
                ..self
            },
        }
    }

    /// Placeholder text for an empty list under these flags.
    pub fn empty_message(self) -> &'static str {
        match (self.show_relays, self.show_proxies) {
            (false, false) => "Enable TCP relays or HTTPS proxies to view items.",
            (true, false) => "No TCP relays configured. Get started by adding one.",
            (false, true) => "No HTTPS proxies configured. Get started by adding one.",
            (true, true) => "No relays or proxies configured. Get started by adding one.",
        }
    }
}

/// One row of the rendered list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "lowercase")]
pub enum ViewItem {
    Relay(Arc<RelayRecord>),
    Proxy(Arc<ProxyRecord>),
}

impl ViewItem {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Relay(_) => ResourceKind::Relay,
            Self::Proxy(_) => ResourceKind::Proxy,
        }
    }

    pub fn id(&self) -> &RecordId {
        match self {
            Self::Relay(r) => &r.id,
            Self::Proxy(p) => &p.id,
        }
    }

    pub fn running(&self) -> bool {
        match self {
            Self::Relay(r) => r.running,
            Self::Proxy(p) => p.running,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            Self::Relay(r) => r.enabled.unwrap_or_default(),
            Self::Proxy(p) => p.enabled,
        }
    }

    pub fn autostart(&self) -> bool {
        match self {
            Self::Relay(r) => r.autostart,
            Self::Proxy(p) => p.autostart,
        }
    }

    /// Externally reachable address. Relays use the tailnet name, or
    /// `unknown` while it is unresolved.
    pub fn title(&self, identity: &TailnetIdentity) -> String {
        match self {
            Self::Relay(r) => {
                let host = if identity.is_resolved() {
                    identity.hostname()
                } else {
                    "unknown"
                };
                format!("tcp://{host}:{}", r.listen_port)
            }
            Self::Proxy(p) => p.url(),
        }
    }

    pub fn target_label(&self) -> String {
        match self {
            Self::Relay(r) => r.target_label(),
            Self::Proxy(p) => p.target_label(),
        }
    }
}

/// The reconciled union of relays, proxies and tailnet identity.
///
/// Immutable: the store publishes a fresh `Arc<ViewModel>` for every
/// change, so a snapshot a presenter holds never shifts underneath it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewModel {
    relays: Vec<Arc<RelayRecord>>,
    proxies: Vec<Arc<ProxyRecord>>,
    identity: TailnetIdentity,
    visibility: Visibility,
}

impl ViewModel {
    pub(crate) fn new(
        relays: Vec<Arc<RelayRecord>>,
        proxies: Vec<Arc<ProxyRecord>>,
        identity: TailnetIdentity,
        visibility: Visibility,
    ) -> Self {
        Self {
            relays,
            proxies,
            identity,
            visibility,
        }
    }

    // ── Raw collections (unfiltered) ────────────────────────────────

    pub fn relays(&self) -> &[Arc<RelayRecord>] {
        &self.relays
    }

    pub fn proxies(&self) -> &[Arc<ProxyRecord>] {
        &self.proxies
    }

    pub fn identity(&self) -> &TailnetIdentity {
        &self.identity
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn relay(&self, id: &RecordId) -> Option<&Arc<RelayRecord>> {
        self.relays.iter().find(|r| &r.id == id)
    }

    pub fn proxy(&self, id: &RecordId) -> Option<&Arc<ProxyRecord>> {
        self.proxies.iter().find(|p| &p.id == id)
    }

    /// Look up a record regardless of visibility.
    pub fn find(&self, kind: ResourceKind, id: &RecordId) -> Option<ViewItem> {
        match kind {
            ResourceKind::Relay => self.relay(id).cloned().map(ViewItem::Relay),
            ResourceKind::Proxy => self.proxy(id).cloned().map(ViewItem::Proxy),
        }
    }

    // ── Rendered view (filtered) ────────────────────────────────────

    /// Visible items: relays in backend order, then proxies.
    pub fn items(&self) -> Vec<ViewItem> {
        let relays = self
            .relays
            .iter()
            .filter(|_| self.visibility.show_relays)
            .cloned()
            .map(ViewItem::Relay);
        let proxies = self
            .proxies
            .iter()
            .filter(|_| self.visibility.show_proxies)
            .cloned()
            .map(ViewItem::Proxy);
        relays.chain(proxies).collect()
    }

    pub fn len(&self) -> usize {
        let relays = if self.visibility.show_relays { self.relays.len() } else { 0 };
        let proxies = if self.visibility.show_proxies { self.proxies.len() } else { 0 };
        relays + proxies
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `1 item` / `N items`
    pub fn count_label(&self) -> String {
        match self.len() {
            1 => "1 item".to_owned(),
            n => format!("{n} items"),
        }
    }

    /// Placeholder text when nothing is visible.
    pub fn empty_message(&self) -> Option<&'static str> {
        self.is_empty().then(|| self.visibility.empty_message())
    }

    // ── Derivations used by the store ───────────────────────────────

    pub(crate) fn with_visibility(&self, visibility: Visibility) -> Self {
        Self {
            visibility,
            ..self.clone()
        }
    }

    pub(crate) fn with_relays(&self, relays: Vec<Arc<RelayRecord>>) -> Self {
        Self {
            relays,
            ..self.clone()
        }
    }

    pub(crate) fn with_proxies(&self, proxies: Vec<Arc<ProxyRecord>>) -> Self {
        Self {
            proxies,
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn relay(id: &str, port: u16) -> Arc<RelayRecord> {
        Arc::new(RelayRecord {
            id: id.into(),
            listen_port: port,
            target_host: "h".into(),
            target_port: 80,
            autostart: false,
            enabled: Some(true),
            running: false,
            extra: serde_json::Map::new(),
        })
    }

    fn proxy(id: &str) -> Arc<ProxyRecord> {
        Arc::new(ProxyRecord {
            id: id.into(),
            hostname: "box.tailnet.ts.net".into(),
            port: None,
            target: "http://localhost:3000".into(),
            trusted_proxies: false,
            autostart: false,
            enabled: true,
            tls_cert_file: None,
            running: false,
            extra: serde_json::Map::new(),
        })
    }

    fn model(visibility: Visibility) -> ViewModel {
        ViewModel::new(
            vec![relay("r1", 9000), relay("r2", 9001)],
            vec![proxy("p1")],
            TailnetIdentity::new("box.tailnet.ts.net."),
            visibility,
        )
    }

    #[test]
    fn items_are_relays_then_proxies() {
        let ids: Vec<String> = model(Visibility::default())
            .items()
            .iter()
            .map(|i| i.id().to_string())
            .collect();
        assert_eq!(ids, vec!["r1", "r2", "p1"]);
    }

    #[test]
    fn visibility_filters_items_and_count() {
        let only_proxies = model(Visibility::default().with(ResourceKind::Relay, false));
        assert_eq!(only_proxies.len(), 1);
        assert_eq!(only_proxies.count_label(), "1 item");
        assert_eq!(only_proxies.items()[0].kind(), ResourceKind::Proxy);

        let both = model(Visibility::default());
        assert_eq!(both.count_label(), "3 items");
        assert_eq!(both.empty_message(), None);
    }

    #[test]
    fn empty_message_follows_flags() {
        let empty = ViewModel::default();
        assert_eq!(
            empty.empty_message(),
            Some("No relays or proxies configured. Get started by adding one.")
        );
        let hidden = empty.with_visibility(Visibility {
            show_relays: false,
            show_proxies: false,
        });
        assert_eq!(
            hidden.empty_message(),
            Some("Enable TCP relays or HTTPS proxies to view items.")
        );
        assert_eq!(
            Visibility::default()
                .with(ResourceKind::Proxy, false)
                .empty_message(),
            "No TCP relays configured. Get started by adding one."
        );
        assert_eq!(hidden.count_label(), "0 items");
    }

    #[test]
    fn relay_title_uses_tailnet_name() {
        let m = model(Visibility::default());
        let item = m.find(ResourceKind::Relay, &"r2".into()).unwrap();
        assert_eq!(item.title(m.identity()), "tcp://box.tailnet.ts.net:9001");
        assert_eq!(item.title(&TailnetIdentity::default()), "tcp://unknown:9001");
        assert_eq!(item.target_label(), "\u{2192} h:80");
    }

    #[test]
    fn find_ignores_visibility() {
        let hidden = model(Visibility {
            show_relays: false,
            show_proxies: false,
        });
        assert!(hidden.find(ResourceKind::Proxy, &"p1".into()).is_some());
        assert!(hidden.find(ResourceKind::Proxy, &"nope".into()).is_none());
    }
}
