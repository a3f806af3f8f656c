// ── Reactive view subscription ──
//
// Subscription handle for consuming view-model changes from the store.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::ViewModel;

/// A subscription to the reconciled view.
///
/// Provides point-in-time access plus change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct ViewStream {
    current: Arc<ViewModel>,
    receiver: watch::Receiver<Arc<ViewModel>>,
}

impl ViewStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<ViewModel>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot seen most recently through this handle.
    pub fn current(&self) -> &Arc<ViewModel> {
        &self.current
    }

    /// The store's latest snapshot (may be newer than `current`).
    pub fn latest(&self) -> Arc<ViewModel> {
        self.receiver.borrow().clone()
    }

    /// Whether the store published since this handle last looked.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next change. `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Arc<ViewModel>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> ViewWatchStream {
        ViewWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding each published view, starting with the
/// current one.
pub struct ViewWatchStream {
    inner: WatchStream<Arc<ViewModel>>,
}

impl Stream for ViewWatchStream {
    type Item = Arc<ViewModel>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_pending, assert_ready, task};

    use super::*;
    use crate::model::ResourceKind;
    use crate::store::ViewStore;

    #[test]
    fn changed_wakes_on_publish() {
        let store = ViewStore::new();
        let mut view = store.subscribe();
        let mut changed = task::spawn(view.changed());
        assert_pending!(changed.poll());

        store.set_visibility(ResourceKind::Relay, false);
        assert!(changed.is_woken());
        let next = assert_ready!(changed.poll());
        assert_eq!(next.map(|v| v.visibility().show_relays), Some(false));
    }

    #[test]
    fn stream_yields_current_view_first() {
        let store = ViewStore::new();
        let mut stream = task::spawn(store.subscribe().into_stream());
        assert!(assert_ready!(stream.poll_next()).is_some());
        assert_pending!(stream.poll_next());
    }
}
