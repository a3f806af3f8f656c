// ── Refresh scheduler ──
//
// At most one reconciliation cycle runs at a time. A timer tick or
// manual refresh that lands while a cycle is running is dropped. A
// post-mutation follow-up is not dropped: it marks a trailing cycle
// that the running cycle's owner executes before releasing.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dashboard::Dashboard;
use crate::error::CoreError;

/// What a refresh request amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// This call ran at least one cycle to completion.
    Reconciled,
    /// Another cycle was already running; nothing was started.
    Coalesced,
}

/// Non-reentrant cycle gate.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    busy: AtomicBool,
    trailing: AtomicBool,
}

/// Clears `busy` when dropped, so a cancelled cycle never wedges the gate.
struct Busy<'a>(&'a AtomicBool);

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a cycle is currently running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Run `cycle` unless one is already running.
    pub async fn tick<F, Fut>(&self, cycle: F) -> Result<TickOutcome, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        match self.try_begin() {
            Some(busy) => self.run_cycles(busy, cycle).await,
            None => {
                debug!("refresh already running; tick coalesced");
                Ok(TickOutcome::Coalesced)
            }
        }
    }

    /// Like [`tick`](Self::tick), but if a cycle is running, one more
    /// cycle is guaranteed to start after it finishes.
    pub async fn request_followup<F, Fut>(&self, cycle: F) -> Result<TickOutcome, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        self.trailing.store(true, Ordering::SeqCst);
        match self.try_begin() {
            Some(busy) => self.run_cycles(busy, cycle).await,
            None => {
                debug!("refresh already running; trailing cycle queued");
                Ok(TickOutcome::Coalesced)
            }
        }
    }

    fn try_begin(&self) -> Option<Busy<'_>> {
        (!self.busy.swap(true, Ordering::SeqCst)).then_some(Busy(&self.busy))
    }

    /// Run cycles until no follow-up is pending. Returns the last result.
    async fn run_cycles<F, Fut>(&self, busy: Busy<'_>, mut cycle: F) -> Result<TickOutcome, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        let mut busy = Some(busy);
        let mut result;
        loop {
            loop {
                self.trailing.store(false, Ordering::SeqCst);
                result = cycle().await;
                if !self.trailing.load(Ordering::SeqCst) {
                    break;
                }
            }
            drop(busy.take());

            // A follow-up that arrived between the check above and the
            // release saw the gate closed; pick it up here.
            if !self.trailing.load(Ordering::SeqCst) {
                break;
            }
            match self.try_begin() {
                Some(next) => busy = Some(next),
                None => break,
            }
        }
        result.map(|()| TickOutcome::Reconciled)
    }
}

/// Periodic refresh until `cancel` fires. The first tick is skipped; the
/// caller has just refreshed.
pub(crate) async fn refresh_task(dashboard: Dashboard, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = dashboard.refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::Notify;

    use super::*;

    #[tokio::test]
    async fn overlapping_tick_is_coalesced() {
        let scheduler = RefreshScheduler::new();
        let runs = &AtomicUsize::new(0);
        let gate = &Notify::new();

        let first = scheduler.tick(move || async move {
            runs.fetch_add(1, Ordering::SeqCst);
            gate.notified().await;
            Ok(())
        });
        let second = async {
            tokio::task::yield_now().await;
            let outcome = scheduler
                .tick(move || async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await;
            gate.notify_one();
            outcome
        };

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.ok(), Some(TickOutcome::Reconciled));
        assert_eq!(second.ok(), Some(TickOutcome::Coalesced));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_busy());
    }

    #[tokio::test]
    async fn followup_during_cycle_runs_trailing_cycle() {
        let scheduler = RefreshScheduler::new();
        let runs = &AtomicUsize::new(0);
        let gate = &Notify::new();

        let first = scheduler.tick(move || async move {
            if runs.fetch_add(1, Ordering::SeqCst) == 0 {
                gate.notified().await;
            }
            Ok(())
        });
        let followup = async {
            tokio::task::yield_now().await;
            let outcome = scheduler
                .request_followup(move || async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await;
            gate.notify_one();
            outcome
        };

        let (first, followup) = tokio::join!(first, followup);
        assert_eq!(first.ok(), Some(TickOutcome::Reconciled));
        assert_eq!(followup.ok(), Some(TickOutcome::Coalesced));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_cycle_releases_gate() {
        let scheduler = RefreshScheduler::new();
        let failed = scheduler
            .tick(|| async {
                Err(CoreError::Transport {
                    message: "Request failed: 502".into(),
                    status: Some(502),
                })
            })
            .await;
        assert_eq!(failed.err().and_then(|e| e.status()), Some(502));
        assert!(!scheduler.is_busy());

        let next = scheduler.tick(|| async { Ok(()) }).await;
        assert_eq!(next.ok(), Some(TickOutcome::Reconciled));
    }
}
