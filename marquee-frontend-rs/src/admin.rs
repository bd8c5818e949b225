//! Privilege-gated account moderation.

use std::sync::Arc;

use movie_utils::User;
use tether::Error;

use crate::session::SessionState;
use crate::store::{UserDirectory, UserPatch};

pub struct AdminPanel<D> {
    directory: Arc<D>,
    session: Arc<SessionState>,
}

impl<D: UserDirectory> AdminPanel<D> {
    pub fn new(directory: Arc<D>, session: Arc<SessionState>) -> Self {
        Self { directory, session }
    }

    /// Suspend an account. The target's own watchdog picks the flag up on
    /// its next poll and ends that session.
    pub async fn suspend(&self, user_id: &str) -> Result<User, Error> {
        self.set_suspended(user_id, true).await
    }

    pub async fn unsuspend(&self, user_id: &str) -> Result<User, Error> {
        self.set_suspended(user_id, false).await
    }

    async fn set_suspended(&self, user_id: &str, suspended: bool) -> Result<User, Error> {
        let Some(acting) = self.session.snapshot() else {
            return Err(Error::InvalidOperation("sign in first".to_string()));
        };
        if !acting.is_admin() {
            return Err(Error::InvalidOperation(
                "admin privilege required".to_string(),
            ));
        }
        if acting.id == user_id {
            return Err(Error::InvalidOperation(
                "cannot suspend your own account".to_string(),
            ));
        }

        self.directory
            .patch_user(
                user_id,
                &UserPatch {
                    suspended: Some(suspended),
                    ..Default::default()
                },
            )
            .await
    }
}
