//! The single in-memory projection of the authenticated user.
//!
//! Every feature reads from here and none writes directly: mutations go
//! through their coordinator, which patches the store and then merges the
//! *server's* returned document back in, field by field. Readers always get
//! a complete snapshot — the projection is built from `im` structures, so a
//! snapshot is a handful of pointer copies, taken under one lock.

use std::sync::Mutex;

use im::{OrdSet, Vector};

use movie_utils::{MovieReference, Privilege, User};
use tether::{ListenerKey, Listeners};

use crate::lists::ListKind;

/// Cheap-to-clone projection of the signed-in user.
#[derive(Clone, Debug)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub favorites: Vector<MovieReference>,
    pub watchlist: Vector<MovieReference>,
    pub watched_list: Vector<MovieReference>,
    pub following: OrdSet<String>,
    pub followers: OrdSet<String>,
    pub privilege: Option<Privilege>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
            favorites: user.favorites.iter().cloned().collect(),
            watchlist: user.watchlist.iter().cloned().collect(),
            watched_list: user.watched_list.iter().cloned().collect(),
            following: user.following.iter().cloned().collect(),
            followers: user.followers.iter().cloned().collect(),
            privilege: user.privilege,
        }
    }
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.privilege.is_some()
    }
}

/// Lifecycle: populated on sign-in or restore, emptied on sign-out or
/// forced logout. Subscribers observe every committed change, including the
/// final `None`.
pub struct SessionState {
    current: Mutex<Option<SessionUser>>,
    listeners: Listeners<Option<SessionUser>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            listeners: Listeners::new(),
        }
    }

    pub fn snapshot(&self) -> Option<SessionUser> {
        self.current.lock().unwrap().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.current.lock().unwrap().as_ref().map(|user| user.id.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(SessionUser::is_admin)
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&Option<SessionUser>) + Send + Sync + 'static,
    ) -> ListenerKey {
        self.listeners.register(callback)
    }

    pub fn unsubscribe(&self, key: ListenerKey) {
        self.listeners.unregister(key);
    }

    pub(crate) fn begin(&self, user: &User) {
        let snapshot = Some(SessionUser::from(user));
        *self.current.lock().unwrap() = snapshot.clone();
        self.listeners.notify(&snapshot);
    }

    pub(crate) fn clear(&self) {
        let mut current = self.current.lock().unwrap();
        if current.is_none() {
            return;
        }
        *current = None;
        drop(current);
        self.listeners.notify(&None);
    }

    /// Merge one list field from the server's returned document. Other
    /// fields are left untouched, so an unrelated in-flight mutation can't
    /// be clobbered by this one's result.
    pub(crate) fn apply_list(&self, kind: ListKind, server: &User) {
        self.merge(server, |user| match kind {
            ListKind::Favorites => user.favorites = server.favorites.iter().cloned().collect(),
            ListKind::Watchlist => user.watchlist = server.watchlist.iter().cloned().collect(),
            ListKind::Watched => {
                user.watched_list = server.watched_list.iter().cloned().collect()
            }
        });
    }

    /// Merge the follow-edge fields from the server's returned document.
    pub(crate) fn apply_follow_edges(&self, server: &User) {
        self.merge(server, |user| {
            user.following = server.following.iter().cloned().collect();
            user.followers = server.followers.iter().cloned().collect();
        });
    }

    /// Merge the profile fields from the server's returned document.
    pub(crate) fn apply_profile(&self, server: &User) {
        self.merge(server, |user| {
            user.name = server.name.clone();
            user.email = server.email.clone();
            user.image = server.image.clone();
        });
    }

    fn merge(&self, server: &User, apply: impl FnOnce(&mut SessionUser)) {
        let mut current = self.current.lock().unwrap();
        let Some(user) = current.as_mut() else {
            return;
        };
        // A result for some other user's document never touches the cache.
        if user.id != server.id {
            return;
        }
        apply(user);
        let snapshot = current.clone();
        drop(current);
        self.listeners.notify(&snapshot);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
