//! Forced-logout watchdog: polls a single entity's suspension flag and
//! fires a callback exactly once when the flag flips on.

use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::Error;
use crate::poller::{Reconcile, ReconcilingPoller};

pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(5);

/// Snapshot of the watched entity's suspension state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suspension {
    pub entity_id: String,
    pub suspended: bool,
}

struct SuspensionReconcile;

impl Reconcile for SuspensionReconcile {
    type Item = Suspension;

    fn identity(item: &Suspension) -> String {
        item.entity_id.clone()
    }

    fn order(_: &Suspension, _: &Suspension) -> CmpOrdering {
        CmpOrdering::Equal
    }

    fn changed(previous: &Suspension, current: &Suspension) -> bool {
        previous.suspended != current.suspended
    }
}

/// Watches one entity for suspension. Single-use per session: once the
/// callback has fired, the watchdog stops itself and stays quiet even if
/// restarted.
pub struct SessionWatchdog {
    poller: Arc<ReconcilingPoller<SuspensionReconcile>>,
}

impl SessionWatchdog {
    /// `probe` fetches the watched entity's current suspension state;
    /// `on_suspended` runs exactly once, after which the watchdog stops
    /// itself. Stop the watchdog on sign-out too, so a dangling timer never
    /// polls a dead session's id.
    pub fn new<F, Fut, G>(interval: Duration, probe: F, on_suspended: G) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Suspension, Error>> + Send + 'static,
        G: Fn() + Send + Sync + 'static,
    {
        let poller = Arc::new(ReconcilingPoller::<SuspensionReconcile>::new(
            interval,
            move || {
                let fetch = probe();
                async move { fetch.await.map(|suspension| vec![suspension]) }
            },
        ));

        let fired = AtomicBool::new(false);
        let weak = Arc::downgrade(&poller);
        poller.subscribe(move |snapshot| {
            let tripped = snapshot.iter().any(|s| s.suspended);
            if tripped && !fired.swap(true, Ordering::SeqCst) {
                if let Some(poller) = weak.upgrade() {
                    poller.stop();
                }
                on_suspended();
            }
        });

        Self { poller }
    }

    pub fn start(&self) {
        self.poller.start();
    }

    pub fn stop(&self) {
        self.poller.stop();
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn flagged_after<const N: usize>(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn() -> std::future::Ready<Result<Suspension, Error>> + Send + Sync {
        move || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(Suspension {
                entity_id: "user-1".to_string(),
                suspended: call >= N,
            }))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_exactly_once_then_stops() {
        let calls = Arc::new(AtomicUsize::new(0));
        let logouts = Arc::new(AtomicUsize::new(0));

        let watchdog = {
            let logouts = Arc::clone(&logouts);
            SessionWatchdog::new(
                Duration::from_secs(5),
                flagged_after::<2>(Arc::clone(&calls)),
                move || {
                    logouts.fetch_add(1, Ordering::SeqCst);
                },
            )
        };

        watchdog.start();
        // Plenty of intervals: ticks after the trip must not re-fire.
        tokio::time::sleep(Duration::from_secs(40)).await;

        assert_eq!(logouts.load(Ordering::SeqCst), 1);
        assert!(!watchdog.is_running());
        // The poll loop halted at the trip instead of running all 8 ticks.
        assert!(calls.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn never_fires_while_unsuspended() {
        let calls = Arc::new(AtomicUsize::new(0));
        let logouts = Arc::new(AtomicUsize::new(0));

        let watchdog = {
            let logouts = Arc::clone(&logouts);
            SessionWatchdog::new(
                Duration::from_secs(5),
                flagged_after::<1000>(Arc::clone(&calls)),
                move || {
                    logouts.fetch_add(1, Ordering::SeqCst);
                },
            )
        };

        watchdog.start();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(logouts.load(Ordering::SeqCst), 0);
        assert!(watchdog.is_running());

        watchdog.stop();
        let polled = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(calls.load(Ordering::SeqCst), polled);
        assert_eq!(logouts.load(Ordering::SeqCst), 0);
    }
}
