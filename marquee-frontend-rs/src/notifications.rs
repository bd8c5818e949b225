//! The signed-in user's notification feed.
//!
//! A reconciling poller keeps the feed current: newest first, ties broken
//! by id, republished only when an entry appears, disappears, or flips its
//! read flag. Failed ticks keep the visible feed as-is; after three
//! misses in a row health subscribers are told the feed is unavailable so
//! the UI can say so instead of silently showing stale data.

use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;
use std::time::Duration;

use movie_utils::notifications::Notification;
use tether::poller::Reconcile;
use tether::{Error, Health, ListenerKey, ReconcilingPoller};

use crate::store::NotificationDirectory;

pub const DEFAULT_FEED_INTERVAL: Duration = Duration::from_secs(15);

struct FeedReconcile;

impl Reconcile for FeedReconcile {
    type Item = Notification;

    fn identity(item: &Notification) -> String {
        item.id.clone()
    }

    fn order(a: &Notification, b: &Notification) -> CmpOrdering {
        b.date.cmp(&a.date)
    }

    fn changed(previous: &Notification, current: &Notification) -> bool {
        previous.read != current.read
    }
}

pub struct NotificationFeed {
    poller: ReconcilingPoller<FeedReconcile>,
}

impl NotificationFeed {
    pub fn new<D>(directory: Arc<D>, user_id: String, interval: Duration) -> Self
    where
        D: NotificationDirectory + 'static,
    {
        let poller = ReconcilingPoller::new(interval, move || {
            let directory = Arc::clone(&directory);
            let user_id = user_id.clone();
            async move { directory.notifications_for(&user_id).await }
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

    pub fn subscribe(
        &self,
        callback: impl Fn(&im::Vector<Notification>) + Send + Sync + 'static,
    ) -> ListenerKey {
        self.poller.subscribe(callback)
    }

    pub fn unsubscribe(&self, key: ListenerKey) {
        self.poller.unsubscribe(key);
    }

    pub fn subscribe_health(
        &self,
        callback: impl Fn(&Health) + Send + Sync + 'static,
    ) -> ListenerKey {
        self.poller.subscribe_health(callback)
    }

    pub fn unsubscribe_health(&self, key: ListenerKey) {
        self.poller.unsubscribe_health(key);
    }

    pub fn latest(&self) -> Option<im::Vector<Notification>> {
        self.poller.latest()
    }

    pub fn unread_count(&self) -> usize {
        self.poller
            .latest()
            .map(|feed| feed.iter().filter(|notification| !notification.read).count())
            .unwrap_or(0)
    }
}

/// Mark one notification read. The feed itself reconciles on its next
/// tick; the updated document is returned for immediate display.
pub async fn mark_read<D: NotificationDirectory>(
    directory: &D,
    id: &str,
) -> Result<Notification, Error> {
    directory.mark_notification_read(id).await
}
