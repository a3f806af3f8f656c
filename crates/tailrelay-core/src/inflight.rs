// ── In-flight mutation set ──
//
// Single source of truth for "may this mutation start now". Entries
// are inserted atomically before the remote call and removed when the
// returned guard drops, on success and failure alike. Presenters
// disable controls by watching the set.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{RecordId, ResourceKind};
use crate::mutation::MutationAction;

/// (kind, id, action) of a running mutation. Creates have no id yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InFlightKey {
    pub kind: ResourceKind,
    pub id: Option<RecordId>,
    pub action: MutationAction,
}

impl fmt::Display for InFlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}/{id}/{}", self.kind, self.action),
            None => write!(f, "{}/new/{}", self.kind, self.action),
        }
    }
}

pub type InFlightSnapshot = Arc<HashSet<InFlightKey>>;

/// Set of mutations currently awaiting the backend.
pub struct InFlightSet {
    keys: watch::Sender<InFlightSnapshot>,
}

impl Default for InFlightSet {
    fn default() -> Self {
        let (keys, _) = watch::channel(Arc::new(HashSet::new()));
        Self { keys }
    }
}

impl InFlightSet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim `key`, or `None` if it is already in flight.
    pub fn try_acquire(self: &Arc<Self>, key: InFlightKey) -> Option<InFlightGuard> {
        let inserted = self.keys.send_if_modified(|keys| {
            if keys.contains(&key) {
                return false;
            }
            let mut next = HashSet::clone(keys);
            next.insert(key.clone());
            *keys = Arc::new(next);
            true
        });
        inserted.then(|| InFlightGuard {
            set: Arc::clone(self),
            key,
        })
    }

    pub fn contains(&self, key: &InFlightKey) -> bool {
        self.keys.borrow().contains(key)
    }

    pub fn snapshot(&self) -> InFlightSnapshot {
        self.keys.borrow().clone()
    }

    /// Watch the set; control disablement is a projection of this.
    pub fn subscribe(&self) -> watch::Receiver<InFlightSnapshot> {
        self.keys.subscribe()
    }

    fn release(&self, key: &InFlightKey) {
        self.keys.send_if_modified(|keys| {
            if !keys.contains(key) {
                return false;
            }
            let mut next = HashSet::clone(keys);
            next.remove(key);
            *keys = Arc::new(next);
            true
        });
    }
}

/// Scoped membership in an [`InFlightSet`]. Dropping it releases the key.
#[must_use = "the key is released as soon as the guard is dropped"]
pub struct InFlightGuard {
    set: Arc<InFlightSet>,
    key: InFlightKey,
}

impl InFlightGuard {
    pub fn key(&self) -> &InFlightKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.release(&self.key);
    }
}
