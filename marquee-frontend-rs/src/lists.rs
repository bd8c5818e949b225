//! The read-check-write protocol for a user's movie lists.
//!
//! Adding is idempotent on the `(id, media_type)` pair: if the entry is
//! already present there is nothing to write and the current list comes
//! back unchanged. All mutations for one `(user, list)` pair run through a
//! turnstile gate, so two rapid calls can't both read the pre-mutation
//! list and have the second PATCH silently swallow the first.

use std::sync::Arc;

use movie_utils::{MediaType, MovieReference, User};
use tether::Error;
use turnstile::Turnstile;

use crate::session::SessionState;
use crate::store::{UserDirectory, UserPatch};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListKind {
    Favorites,
    Watchlist,
    Watched,
}

impl ListKind {
    pub fn field(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::Watchlist => "watchlist",
            Self::Watched => "watchedList",
        }
    }

    pub fn of(self, user: &User) -> &[MovieReference] {
        match self {
            Self::Favorites => &user.favorites,
            Self::Watchlist => &user.watchlist,
            Self::Watched => &user.watched_list,
        }
    }

    fn patch(self, references: Vec<MovieReference>) -> UserPatch {
        let mut patch = UserPatch::default();
        match self {
            Self::Favorites => patch.favorites = Some(references),
            Self::Watchlist => patch.watchlist = Some(references),
            Self::Watched => patch.watched_list = Some(references),
        }
        patch
    }
}

pub struct ListCoordinator<D> {
    directory: Arc<D>,
    session: Arc<SessionState>,
    gates: Turnstile<(String, ListKind)>,
}

impl<D: UserDirectory> ListCoordinator<D> {
    pub fn new(directory: Arc<D>, session: Arc<SessionState>) -> Self {
        Self {
            directory,
            session,
            gates: Turnstile::new(),
        }
    }

    /// Add `reference` to one of `user_id`'s lists. Returns the resulting
    /// list; if the item was already present this is the current list and
    /// no write happens. On failure nothing is applied anywhere.
    pub async fn add(
        &self,
        user_id: &str,
        kind: ListKind,
        reference: MovieReference,
    ) -> Result<Vec<MovieReference>, Error> {
        let user_id = user_id.to_string();
        let key = (user_id.clone(), kind);

        self.gates
            .through(key, async move {
                let current = self.current_list(&user_id, kind).await?;

                let Some(next) = movie_utils::upserted(&current, &reference) else {
                    return Ok(current);
                };

                let server = self
                    .directory
                    .patch_user(&user_id, &kind.patch(next))
                    .await?;
                // The cache takes the server's word, not our local append.
                self.session.apply_list(kind, &server);
                Ok(kind.of(&server).to_vec())
            })
            .await
    }

    /// Remove the `(id, media_type)` entry from one of `user_id`'s lists.
    /// Removing a non-member succeeds and leaves the list as it was.
    pub async fn remove(
        &self,
        user_id: &str,
        kind: ListKind,
        id: u64,
        media_type: MediaType,
    ) -> Result<Vec<MovieReference>, Error> {
        let user_id = user_id.to_string();
        let key = (user_id.clone(), kind);

        self.gates
            .through(key, async move {
                let current = self.current_list(&user_id, kind).await?;
                let next = movie_utils::without(&current, id, media_type);

                let server = self
                    .directory
                    .patch_user(&user_id, &kind.patch(next))
                    .await?;
                self.session.apply_list(kind, &server);
                Ok(kind.of(&server).to_vec())
            })
            .await
    }

    /// The session cache is the read source when mutating the signed-in
    /// user's own document; anything else costs a fetch.
    async fn current_list(
        &self,
        user_id: &str,
        kind: ListKind,
    ) -> Result<Vec<MovieReference>, Error> {
        if let Some(session_user) = self.session.snapshot() {
            if session_user.id == user_id {
                let list = match kind {
                    ListKind::Favorites => &session_user.favorites,
                    ListKind::Watchlist => &session_user.watchlist,
                    ListKind::Watched => &session_user.watched_list,
                };
                return Ok(list.iter().cloned().collect());
            }
        }

        let user = self.directory.fetch_user(user_id).await?;
        Ok(kind.of(&user).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDirectory, bare_user};
    use std::sync::atomic::Ordering;

    fn movie(id: u64, title: &str) -> MovieReference {
        MovieReference {
            id,
            media_type: MediaType::Movie,
            title: title.to_string(),
        }
    }

    fn coordinator() -> (Arc<FakeDirectory>, Arc<SessionState>, ListCoordinator<FakeDirectory>) {
        let directory = Arc::new(FakeDirectory::new());
        let session = Arc::new(SessionState::new());
        let coordinator = ListCoordinator::new(Arc::clone(&directory), Arc::clone(&session));
        (directory, session, coordinator)
    }

    #[tokio::test]
    async fn adding_twice_is_the_same_as_adding_once() {
        let (directory, _, coordinator) = coordinator();
        directory.insert_user(bare_user("1", "a@example.com"));

        let first = coordinator
            .add("1", ListKind::Favorites, movie(42, "X"))
            .await
            .unwrap();
        assert_eq!(first.len(), 1);

        let second = coordinator
            .add("1", ListKind::Favorites, movie(42, "X"))
            .await
            .unwrap();
        assert_eq!(second.len(), 1);

        // The duplicate add never reached the store.
        assert_eq!(directory.patch_user_calls.load(Ordering::SeqCst), 1);
        assert_eq!(directory.user("1").favorites.len(), 1);
    }

    #[tokio::test]
    async fn own_mutation_prefers_the_cache_and_updates_it() {
        let (directory, session, coordinator) = coordinator();
        let user = bare_user("1", "a@example.com");
        directory.insert_user(user.clone());
        session.begin(&user);

        coordinator
            .add("1", ListKind::Watchlist, movie(7, "Stalker"))
            .await
            .unwrap();

        // Read came from the session, not the store.
        assert_eq!(directory.fetch_user_calls.load(Ordering::SeqCst), 0);
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.watchlist.len(), 1);
        // Unrelated fields stayed as they were.
        assert!(snapshot.favorites.is_empty());
    }

    #[tokio::test]
    async fn removing_a_non_member_is_a_quiet_success() {
        let (directory, _, coordinator) = coordinator();
        let mut user = bare_user("1", "a@example.com");
        user.favorites = vec![movie(1, "A")];
        directory.insert_user(user);

        let result = coordinator
            .remove("1", ListKind::Favorites, 99, MediaType::Movie)
            .await
            .unwrap();

        assert_eq!(result, vec![movie(1, "A")]);
        // The write still went out, carrying the unchanged array.
        assert_eq!(directory.patch_user_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn removal_only_matches_the_full_pair() {
        let (directory, _, coordinator) = coordinator();
        let mut user = bare_user("1", "a@example.com");
        user.watched_list = vec![
            movie(1, "A"),
            MovieReference {
                id: 1,
                media_type: MediaType::Tv,
                title: "A (series)".to_string(),
            },
        ];
        directory.insert_user(user);

        let result = coordinator
            .remove("1", ListKind::Watched, 1, MediaType::Tv)
            .await
            .unwrap();

        assert_eq!(result, vec![movie(1, "A")]);
    }

    #[tokio::test]
    async fn failed_patch_leaves_cache_and_store_alone() {
        let (directory, session, coordinator) = coordinator();
        let user = bare_user("1", "a@example.com");
        directory.insert_user(user.clone());
        session.begin(&user);
        directory.fail_user_patches_for("1");

        let result = coordinator
            .add("1", ListKind::Favorites, movie(42, "X"))
            .await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert!(session.snapshot().unwrap().favorites.is_empty());
        assert!(directory.user("1").favorites.is_empty());
    }

    #[tokio::test]
    async fn concurrent_identical_adds_write_once() {
        let (directory, _, coordinator) = coordinator();
        directory.insert_user(bare_user("1", "a@example.com"));
        let coordinator = Arc::new(coordinator);

        let a = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(
                async move { coordinator.add("1", ListKind::Favorites, movie(42, "X")).await },
            )
        };
        let b = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(
                async move { coordinator.add("1", ListKind::Favorites, movie(42, "X")).await },
            )
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(directory.patch_user_calls.load(Ordering::SeqCst), 1);
        assert_eq!(directory.user("1").favorites.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_distinct_adds_both_land() {
        let (directory, _, coordinator) = coordinator();
        directory.insert_user(bare_user("1", "a@example.com"));
        let coordinator = Arc::new(coordinator);

        let a = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(
                async move { coordinator.add("1", ListKind::Favorites, movie(1, "A")).await },
            )
        };
        let b = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(
                async move { coordinator.add("1", ListKind::Favorites, movie(2, "B")).await },
            )
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Neither write swallowed the other.
        assert_eq!(directory.user("1").favorites.len(), 2);
    }
}
