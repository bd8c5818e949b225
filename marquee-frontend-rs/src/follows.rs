//! Follow and unfollow: a two-document update with no transaction under
//! it.
//!
//! Both sides are computed as sets, so repeating an operation is harmless.
//! The two PATCHes are issued one after the other; if the second fails the
//! first is *not* rolled back — the store offers no way to do that
//! atomically. The edge is then one-sided until the next full re-fetch, so
//! on a partial failure the session is re-synced from the server before
//! the error surfaces, and the caller should re-sync again before
//! retrying.

use std::sync::Arc;

use movie_utils::notifications::NewNotification;
use tether::Error;
use turnstile::Turnstile;

use crate::session::SessionState;
use crate::store::{NotificationDirectory, UserDirectory, UserPatch};

pub struct FollowCoordinator<D> {
    directory: Arc<D>,
    session: Arc<SessionState>,
    // One follow mutation in flight per acting user.
    gates: Turnstile<String>,
}

impl<D: UserDirectory + NotificationDirectory> FollowCoordinator<D> {
    pub fn new(directory: Arc<D>, session: Arc<SessionState>) -> Self {
        Self {
            directory,
            session,
            gates: Turnstile::new(),
        }
    }

    pub async fn follow(&self, current_id: &str, target_id: &str) -> Result<(), Error> {
        if current_id == target_id {
            return Err(Error::InvalidOperation(
                "cannot follow your own account".to_string(),
            ));
        }

        let current_id = current_id.to_string();
        let target_id = target_id.to_string();

        self.gates
            .through(current_id.clone(), async move {
                let current = self.directory.fetch_user(&current_id).await?;
                let target = self.directory.fetch_user(&target_id).await?;

                let following = with_member(&current.following, &target_id);
                let followers = with_member(&target.followers, &current_id);

                let server_current = self
                    .directory
                    .patch_user(
                        &current_id,
                        &UserPatch {
                            following: Some(following),
                            ..Default::default()
                        },
                    )
                    .await?;
                self.session.apply_follow_edges(&server_current);

                if let Err(error) = self
                    .directory
                    .patch_user(
                        &target_id,
                        &UserPatch {
                            followers: Some(followers),
                            ..Default::default()
                        },
                    )
                    .await
                {
                    self.resync(&current_id).await;
                    return Err(one_sided(error));
                }

                // Best-effort: the edge itself has committed either way.
                let note = NewNotification::new_follower(&server_current, target_id.clone());
                if let Err(error) = self.directory.create_notification(&note).await {
                    log::warn!("failed to notify {target_id} of a new follower: {error}");
                }

                Ok(())
            })
            .await
    }

    pub async fn unfollow(&self, current_id: &str, target_id: &str) -> Result<(), Error> {
        if current_id == target_id {
            return Err(Error::InvalidOperation(
                "cannot unfollow your own account".to_string(),
            ));
        }

        let current_id = current_id.to_string();
        let target_id = target_id.to_string();

        self.gates
            .through(current_id.clone(), async move {
                let current = self.directory.fetch_user(&current_id).await?;
                let target = self.directory.fetch_user(&target_id).await?;

                let following = without_member(&current.following, &target_id);
                let followers = without_member(&target.followers, &current_id);

                let server_current = self
                    .directory
                    .patch_user(
                        &current_id,
                        &UserPatch {
                            following: Some(following),
                            ..Default::default()
                        },
                    )
                    .await?;
                self.session.apply_follow_edges(&server_current);

                if let Err(error) = self
                    .directory
                    .patch_user(
                        &target_id,
                        &UserPatch {
                            followers: Some(followers),
                            ..Default::default()
                        },
                    )
                    .await
                {
                    self.resync(&current_id).await;
                    return Err(one_sided(error));
                }

                Ok(())
            })
            .await
    }

    async fn resync(&self, user_id: &str) {
        match self.directory.fetch_user(user_id).await {
            Ok(user) => self.session.apply_follow_edges(&user),
            Err(error) => log::warn!("re-sync after one-sided follow update failed: {error}"),
        }
    }
}

fn with_member(set: &[String], member: &str) -> Vec<String> {
    let mut next = set.to_vec();
    if !next.iter().any(|existing| existing == member) {
        next.push(member.to_string());
    }
    next
}

fn without_member(set: &[String], member: &str) -> Vec<String> {
    set.iter()
        .filter(|existing| existing.as_str() != member)
        .cloned()
        .collect()
}

/// Keep the failure kind, mark the consequence: one side of the edge
/// committed and the other did not.
fn one_sided(error: Error) -> Error {
    let tag = "follow edge applied one-sided, re-sync before retrying";
    match error {
        Error::Network(m) => Error::Network(format!("{tag}: {m}")),
        Error::NotFound(m) => Error::NotFound(format!("{tag}: {m}")),
        Error::Conflict(m) => Error::Conflict(format!("{tag}: {m}")),
        Error::InvalidOperation(m) => Error::InvalidOperation(format!("{tag}: {m}")),
        Error::Validation(m) => Error::Validation(format!("{tag}: {m}")),
        Error::Unknown(m) => Error::Unknown(format!("{tag}: {m}")),
    }
}
