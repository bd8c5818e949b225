//! A timed fetch loop that publishes to subscribers only when the fetched
//! data differs from what was last published.
//!
//! The loop is deliberately boring about failure: a failed fetch keeps the
//! last published snapshot (no flicker to empty) and is retried on the next
//! tick. The interesting guarantees are around lifecycle — `start` always
//! supersedes any prior run, and `stop` wins against a fetch that is
//! already in flight.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Error;
use crate::listeners::{ListenerKey, Listeners};

/// How many consecutive failed ticks before health subscribers are told the
/// data is going stale.
pub const FAILURE_NOTICE_THRESHOLD: u32 = 3;

/// How a poller identifies, orders and compares the items it fetches.
pub trait Reconcile: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    /// Stable identity of an item within the collection.
    fn identity(item: &Self::Item) -> String;

    /// Deterministic presentation order. Ties are broken by identity so the
    /// published sequence is stable across fetches.
    fn order(a: &Self::Item, b: &Self::Item) -> CmpOrdering;

    /// Whether an item counts as changed even though its identity did not.
    /// Override for items with a mutable field worth republishing, such as
    /// a read flag.
    fn changed(_previous: &Self::Item, _current: &Self::Item) -> bool {
        false
    }
}

/// Availability signal derived from consecutive fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Available,
    /// Fetches have failed for [`FAILURE_NOTICE_THRESHOLD`] consecutive
    /// ticks; the last published snapshot may be stale.
    Unavailable,
}

type Fetch<T> = Box<dyn Fn() -> BoxFuture<'static, Result<Vec<T>, Error>> + Send + Sync>;

struct State<T> {
    last_published: Option<im::Vector<T>>,
    consecutive_failures: u32,
    notice_posted: bool,
}

struct Inner<R: Reconcile> {
    interval: Duration,
    fetch: Fetch<R::Item>,
    listeners: Listeners<im::Vector<R::Item>>,
    health_listeners: Listeners<Health>,
    state: Mutex<State<R::Item>>,
    // Bumped on every stop. A tick loop only acts while its generation is
    // current, so a superseded or stopped run can never publish.
    generation: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
}

pub struct ReconcilingPoller<R: Reconcile> {
    inner: Arc<Inner<R>>,
}

impl<R: Reconcile> ReconcilingPoller<R> {
    pub fn new<F, Fut>(interval: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<R::Item>, Error>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                interval,
                fetch: Box::new(move || fetch().boxed()),
                listeners: Listeners::new(),
                health_listeners: Listeners::new(),
                state: Mutex::new(State {
                    last_published: None,
                    consecutive_failures: 0,
                    notice_posted: false,
                }),
                generation: AtomicU64::new(0),
                task: Mutex::new(None),
            }),
        }
    }

    /// Begin polling. Any previous run is stopped first, so calling this
    /// twice never leaves two tick loops behind. The first fetch happens
    /// immediately rather than after the first interval.
    pub fn start(&self) {
        self.stop();

        let my_generation = self.inner.generation.load(Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.interval);
            // A slow fetch must not cause a burst of catch-up ticks.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if inner.generation.load(Ordering::SeqCst) != my_generation {
                    return;
                }

                let fetched = (inner.fetch)().await;

                // Stopped while the fetch was in flight: discard the result.
                if inner.generation.load(Ordering::SeqCst) != my_generation {
                    return;
                }

                inner.reconcile(fetched);
            }
        });

        *self.inner.task.lock().unwrap() = Some(handle);
    }

    /// Stop polling. Deterministic: once this returns, no further publish
    /// can happen, even from a fetch that was already dispatched.
    pub fn stop(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.inner.task.lock().unwrap().take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .task
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&im::Vector<R::Item>) + Send + Sync + 'static,
    ) -> ListenerKey {
        self.inner.listeners.register(callback)
    }

    pub fn unsubscribe(&self, key: ListenerKey) {
        self.inner.listeners.unregister(key);
    }

    pub fn subscribe_health(
        &self,
        callback: impl Fn(&Health) + Send + Sync + 'static,
    ) -> ListenerKey {
        self.inner.health_listeners.register(callback)
    }

    pub fn unsubscribe_health(&self, key: ListenerKey) {
        self.inner.health_listeners.unregister(key);
    }

    /// The last published snapshot, if any tick has published yet.
    pub fn latest(&self) -> Option<im::Vector<R::Item>> {
        self.inner.state.lock().unwrap().last_published.clone()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.state.lock().unwrap().consecutive_failures
    }
}

impl<R: Reconcile> Drop for ReconcilingPoller<R> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<R: Reconcile> Inner<R> {
    fn reconcile(&self, fetched: Result<Vec<R::Item>, Error>) {
        match fetched {
            Err(error) => {
                let mut state = self.state.lock().unwrap();
                state.consecutive_failures += 1;
                log::warn!(
                    "poll fetch failed ({} consecutive), keeping last snapshot: {error}",
                    state.consecutive_failures
                );
                let crossed = state.consecutive_failures == FAILURE_NOTICE_THRESHOLD
                    && !state.notice_posted;
                if crossed {
                    state.notice_posted = true;
                }
                drop(state);

                if crossed {
                    self.health_listeners.notify(&Health::Unavailable);
                }
            }
            Ok(mut items) => {
                items.sort_by(|a, b| {
                    R::order(a, b).then_with(|| R::identity(a).cmp(&R::identity(b)))
                });
                let next: im::Vector<R::Item> = items.into_iter().collect();

                let mut state = self.state.lock().unwrap();
                let recovered = state.notice_posted;
                state.consecutive_failures = 0;
                state.notice_posted = false;

                let changed = match &state.last_published {
                    None => true,
                    Some(previous) => Self::differs(previous, &next),
                };
                if changed {
                    state.last_published = Some(next.clone());
                }
                drop(state);

                if recovered {
                    self.health_listeners.notify(&Health::Available);
                }
                if changed {
                    self.listeners.notify(&next);
                }
            }
        }
    }

    fn differs(previous: &im::Vector<R::Item>, next: &im::Vector<R::Item>) -> bool {
        if previous.len() != next.len() {
            return true;
        }
        previous.iter().zip(next.iter()).any(|(old, new)| {
            R::identity(old) != R::identity(new) || R::changed(old, new)
        })
    }
}
