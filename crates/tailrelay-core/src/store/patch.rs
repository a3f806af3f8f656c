// ── Tentative field patches ──
//
// Optimistic changes are values, not closures: applying a patch
// returns the patch that restores the prior value, and reverting is
// applying that patch. Both build new record vectors; untouched
// records keep their `Arc`.

use std::sync::Arc;

use tracing::debug;

use super::ViewStore;
use crate::model::{ProxyRecord, RecordId, RelayRecord, ResourceKind, ViewModel};

/// A boolean field the dispatcher may flip ahead of confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchField {
    Running,
    Enabled,
    Autostart,
}

/// Set `field` of record (`kind`, `id`) to `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPatch {
    pub kind: ResourceKind,
    pub id: RecordId,
    pub field: PatchField,
    pub value: bool,
}

trait Patchable: Clone {
    fn id(&self) -> &RecordId;
    /// `None` when the record does not carry that field.
    fn field_mut(&mut self, field: PatchField) -> Option<&mut bool>;
}

impl Patchable for RelayRecord {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn field_mut(&mut self, field: PatchField) -> Option<&mut bool> {
        match field {
            PatchField::Running => Some(&mut self.running),
            PatchField::Enabled => self.enabled.as_mut(),
            PatchField::Autostart => Some(&mut self.autostart),
        }
    }
}

impl Patchable for ProxyRecord {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn field_mut(&mut self, field: PatchField) -> Option<&mut bool> {
        Some(match field {
            PatchField::Running => &mut self.running,
            PatchField::Enabled => &mut self.enabled,
            PatchField::Autostart => &mut self.autostart,
        })
    }
}

/// New vector with the matching record's field replaced, plus the value
/// it held before. `None` when no record has that id or the field.
fn patch_records<T: Patchable>(
    records: &[Arc<T>],
    id: &RecordId,
    field: PatchField,
    value: bool,
) -> Option<(Vec<Arc<T>>, bool)> {
    let mut prior = None;
    let patched = records
        .iter()
        .map(|record| {
            if prior.is_none() && record.id() == id {
                let mut next = T::clone(record);
                if let Some(slot) = next.field_mut(field) {
                    prior = Some(*slot);
                    *slot = value;
                    return Arc::new(next);
                }
            }
            Arc::clone(record)
        })
        .collect();
    prior.map(|p| (patched, p))
}

impl FieldPatch {
    /// Pure form of [`ViewStore::apply_tentative`].
    pub(crate) fn apply_to(&self, view: &ViewModel) -> Option<(ViewModel, FieldPatch)> {
        let (next, prior) = match self.kind {
            ResourceKind::Relay => {
                let (relays, prior) =
                    patch_records(view.relays(), &self.id, self.field, self.value)?;
                (view.with_relays(relays), prior)
            }
            ResourceKind::Proxy => {
                let (proxies, prior) =
                    patch_records(view.proxies(), &self.id, self.field, self.value)?;
                (view.with_proxies(proxies), prior)
            }
        };
        let undo = FieldPatch {
            value: prior,
            ..self.clone()
        };
        Some((next, undo))
    }
}

impl ViewStore {
    /// Apply an optimistic change and return the patch that undoes it.
    ///
    /// Returns `None` (and publishes nothing) if the record is absent.
    pub fn apply_tentative(&self, patch: &FieldPatch) -> Option<FieldPatch> {
        let mut undo = None;
        self.view.send_if_modified(|view| match patch.apply_to(view) {
            Some((next, prior)) => {
                undo = Some(prior);
                *view = Arc::new(next);
                true
            }
            None => false,
        });
        undo
    }

    /// Put back a prior value recorded by [`apply_tentative`](Self::apply_tentative).
    ///
    /// Only that one field of the *current* record is replaced. If a
    /// reconciliation removed the record in the meantime this is a no-op.
    pub fn revert(&self, undo: &FieldPatch) {
        if self.apply_tentative(undo).is_none() {
            debug!(kind = %undo.kind, id = %undo.id, "revert target gone; nothing to undo");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::BackendSnapshot;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn seeded() -> ViewStore {
        let store = ViewStore::new();
        store.reconcile(BackendSnapshot {
            relays: serde_json::from_value(json!([
                {"relay": {"id": "r1", "listen_port": 9000, "target_host": "h", "target_port": 80}, "running": false},
                {"relay": {"id": "r2", "listen_port": 9001, "target_host": "h", "target_port": 81}, "running": true}
            ]))
            .unwrap(),
            proxies: serde_json::from_value(json!([
                {"id": "p1", "hostname": "box", "target": "http://localhost:1", "enabled": true}
            ]))
            .unwrap(),
            ..BackendSnapshot::default()
        });
        store
    }

    #[test]
    fn apply_then_revert_restores_view() {
        let store = seeded();
        let before = store.snapshot();

        let undo = store
            .apply_tentative(&FieldPatch {
                kind: ResourceKind::Relay,
                id: "r1".into(),
                field: PatchField::Autostart,
                value: true,
            })
            .unwrap();
        assert!(store.snapshot().relay(&"r1".into()).unwrap().autostart);
        assert!(!undo.value);

        store.revert(&undo);
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn untouched_records_share_their_arc() {
        let store = seeded();
        let before = store.snapshot();
        store.apply_tentative(&FieldPatch {
            kind: ResourceKind::Proxy,
            id: "p1".into(),
            field: PatchField::Enabled,
            value: false,
        });
        let after = store.snapshot();
        assert!(Arc::ptr_eq(&before.relays()[0], &after.relays()[0]));
        assert!(!Arc::ptr_eq(&before.proxies()[0], &after.proxies()[0]));
        assert!(before.proxies()[0].enabled);
    }

    #[test]
    fn missing_record_yields_no_undo() {
        let store = seeded();
        let mut rx = store.subscribe();
        let undo = store.apply_tentative(&FieldPatch {
            kind: ResourceKind::Relay,
            id: "gone".into(),
            field: PatchField::Running,
            value: true,
        });
        assert!(undo.is_none());
        assert!(!rx.has_changed());
    }
}
