//! Client core for Marquee, a movie cataloguing and social app backed by
//! a flat-file REST resource store.
//!
//! The store is dumb on purpose — generic CRUD over named collections —
//! so everything that makes the app feel live sits on this side: the
//! session projection of the signed-in user, idempotent list mutations,
//! the follow graph, a reconciling notification feed, and a watchdog that
//! ends the session the moment an account is suspended. [`Marquee`] wires
//! those pieces together; each one also stands alone for UIs that want
//! finer control.
//!
//! All state flows one way: a feature calls its coordinator, the
//! coordinator writes to the store and merges the server's answer into
//! [`session::SessionState`], and the UI hears about it through its
//! subscription. No feature writes to the session directly.

pub mod admin;
pub mod auth;
pub mod config;
pub mod follows;
pub mod lists;
pub mod notifications;
pub mod profile;
pub mod requests;
pub mod reviews;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::{Arc, Mutex};

use tether::{Error, ResourceClient, SessionWatchdog, Suspension};

use crate::admin::AdminPanel;
use crate::auth::{Authenticator, NewAccount};
use crate::config::ClientConfig;
use crate::follows::FollowCoordinator;
use crate::lists::ListCoordinator;
use crate::notifications::NotificationFeed;
use crate::profile::ProfileEditor;
use crate::requests::RequestCoordinator;
use crate::reviews::ReviewBoard;
use crate::session::{SessionState, SessionUser};
use crate::store::{
    NotificationDirectory, RequestDirectory, RestDirectory, ReviewDirectory, UserDirectory,
};

pub use crate::lists::ListKind;

/// Background work tied to the signed-in user. Replaced wholesale on every
/// sign-in, stopped on sign-out and on forced logout.
struct Background {
    feed: Mutex<Option<Arc<NotificationFeed>>>,
    watchdog: Mutex<Option<SessionWatchdog>>,
}

impl Background {
    fn new() -> Self {
        Self {
            feed: Mutex::new(None),
            watchdog: Mutex::new(None),
        }
    }

    fn halt(&self) {
        if let Some(feed) = self.feed.lock().unwrap().take() {
            feed.stop();
        }
        if let Some(watchdog) = self.watchdog.lock().unwrap().take() {
            watchdog.stop();
        }
    }
}

/// The assembled client: one directory, one session, one coordinator per
/// feature. Generic over the directory so the whole assembly can run
/// against an in-memory store double.
pub struct Marquee<D = RestDirectory> {
    config: ClientConfig,
    directory: Arc<D>,
    session: Arc<SessionState>,
    auth: Authenticator<D>,
    lists: ListCoordinator<D>,
    follows: FollowCoordinator<D>,
    requests: RequestCoordinator<D>,
    reviews: ReviewBoard<D>,
    admin: AdminPanel<D>,
    profile: ProfileEditor<D>,
    background: Arc<Background>,
}

impl Marquee<RestDirectory> {
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = Arc::new(ResourceClient::new(&config.store)?);
        Ok(Self::with_directory(
            Arc::new(RestDirectory::new(client)),
            config,
        ))
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::new(ClientConfig::from_env())
    }
}

impl<D> Marquee<D>
where
    D: UserDirectory + NotificationDirectory + RequestDirectory + ReviewDirectory + 'static,
{
    pub fn with_directory(directory: Arc<D>, config: ClientConfig) -> Self {
        let session = Arc::new(SessionState::new());
        Self {
            config,
            auth: Authenticator::new(Arc::clone(&directory), Arc::clone(&session)),
            lists: ListCoordinator::new(Arc::clone(&directory), Arc::clone(&session)),
            follows: FollowCoordinator::new(Arc::clone(&directory), Arc::clone(&session)),
            requests: RequestCoordinator::new(Arc::clone(&directory), Arc::clone(&session)),
            reviews: ReviewBoard::new(Arc::clone(&directory), Arc::clone(&session)),
            admin: AdminPanel::new(Arc::clone(&directory), Arc::clone(&session)),
            profile: ProfileEditor::new(Arc::clone(&directory), Arc::clone(&session)),
            background: Arc::new(Background::new()),
            directory,
            session,
        }
    }

    pub async fn register(&self, account: NewAccount) -> Result<SessionUser, Error> {
        let user = self.auth.register(account).await?;
        self.watch(user.id.clone());
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, Error> {
        let user = self.auth.sign_in(email, password).await?;
        self.watch(user.id.clone());
        Ok(user)
    }

    pub async fn restore(&self, user_id: &str) -> Result<SessionUser, Error> {
        let user = self.auth.restore(user_id).await?;
        self.watch(user.id.clone());
        Ok(user)
    }

    pub fn sign_out(&self) {
        self.background.halt();
        self.auth.sign_out();
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn lists(&self) -> &ListCoordinator<D> {
        &self.lists
    }

    pub fn follows(&self) -> &FollowCoordinator<D> {
        &self.follows
    }

    pub fn requests(&self) -> &RequestCoordinator<D> {
        &self.requests
    }

    pub fn reviews(&self) -> &ReviewBoard<D> {
        &self.reviews
    }

    pub fn admin(&self) -> &AdminPanel<D> {
        &self.admin
    }

    pub fn profile(&self) -> &ProfileEditor<D> {
        &self.profile
    }

    /// The live notification feed, present while signed in.
    pub fn notifications(&self) -> Option<Arc<NotificationFeed>> {
        self.background.feed.lock().unwrap().clone()
    }

    pub async fn mark_notification_read(
        &self,
        id: &str,
    ) -> Result<movie_utils::notifications::Notification, Error> {
        notifications::mark_read(self.directory.as_ref(), id).await
    }

    /// Start the per-session background work: the notification feed and
    /// the suspension watchdog. Any previous session's work is superseded.
    fn watch(&self, user_id: String) {
        self.background.halt();

        let feed = Arc::new(NotificationFeed::new(
            Arc::clone(&self.directory),
            user_id.clone(),
            self.config.notification_interval,
        ));
        feed.start();
        *self.background.feed.lock().unwrap() = Some(feed);

        let directory = Arc::clone(&self.directory);
        let probe_id = user_id;
        let session = Arc::clone(&self.session);
        let background = Arc::clone(&self.background);
        let watchdog = SessionWatchdog::new(
            self.config.watchdog_interval,
            move || {
                let directory = Arc::clone(&directory);
                let id = probe_id.clone();
                async move {
                    let user = directory.fetch_user(&id).await?;
                    let suspended = user.is_suspended();
                    Ok(Suspension {
                        entity_id: user.id,
                        suspended,
                    })
                }
            },
            move || {
                log::warn!("account suspended, ending the session");
                if let Some(feed) = background.feed.lock().unwrap().take() {
                    feed.stop();
                }
                // Subscribers see the session empty out; the UI reacts by
                // returning to sign-in.
                session.clear();
            },
        );
        watchdog.start();
        *self.background.watchdog.lock().unwrap() = Some(watchdog);
    }
}
