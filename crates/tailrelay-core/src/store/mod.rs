// ── View-model store ──
//
// Holds the last reconciled `ViewModel` behind a `watch` channel. All
// writes go through `reconcile`, `set_visibility` or the tentative
// patch pair; every write publishes a new immutable snapshot.

mod patch;
mod reconcile;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{ResourceKind, ViewModel};
use crate::stream::ViewStream;

pub use patch::{FieldPatch, PatchField};
pub use reconcile::BackendSnapshot;

/// Reactive store for the dashboard view model.
pub struct ViewStore {
    view: watch::Sender<Arc<ViewModel>>,
    last_updated: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStore {
    pub fn new() -> Self {
        let (view, _) = watch::channel(Arc::new(ViewModel::default()));
        let (last_updated, _) = watch::channel(None);
        Self { view, last_updated }
    }

    /// The current filtered, ordered view. Cheap `Arc` clone, no side effects.
    pub fn snapshot(&self) -> Arc<ViewModel> {
        self.view.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> ViewStream {
        ViewStream::new(self.view.subscribe())
    }

    /// When the current records were last reconciled. `None` before the
    /// first successful cycle.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        *self.last_updated.borrow()
    }

    /// Show or hide one collection. Synchronous; never touches the network.
    pub fn set_visibility(&self, kind: ResourceKind, visible: bool) {
        self.view.send_if_modified(|view| {
            let next = view.visibility().with(kind, visible);
            if next == view.visibility() {
                return false;
            }
            *view = Arc::new(view.with_visibility(next));
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_visibility_only_publishes_changes() {
        let store = ViewStore::new();
        let mut rx = store.subscribe();

        store.set_visibility(ResourceKind::Relay, true);
        assert!(!rx.has_changed());

        store.set_visibility(ResourceKind::Relay, false);
        assert!(rx.has_changed());
        assert!(!store.snapshot().visibility().show_relays);
        assert!(store.snapshot().visibility().show_proxies);
    }
}
