//! Edits to the signed-in user's own profile.
//!
//! Like every other mutation, the session cache is updated from the
//! server's returned document, scoped to the profile fields — an avatar
//! upload landing mid-way through a favorites mutation can't disturb it.

use std::sync::Arc;

use tether::Error;

use crate::session::{SessionState, SessionUser};
use crate::store::{UserDirectory, UserPatch};

pub struct ProfileEditor<D> {
    directory: Arc<D>,
    session: Arc<SessionState>,
}

impl<D: UserDirectory> ProfileEditor<D> {
    pub fn new(directory: Arc<D>, session: Arc<SessionState>) -> Self {
        Self { directory, session }
    }

    /// Change display name and/or email. Passing `None` leaves a field
    /// untouched — it never reaches the wire.
    pub async fn update_details(
        &self,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<SessionUser, Error> {
        let user = self.require_session()?;

        if let Some(name) = &name {
            if name.trim().is_empty() {
                return Err(Error::Validation("a display name is required".to_string()));
            }
        }
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(Error::Validation(
                    "a valid email address is required".to_string(),
                ));
            }
            // Email doubles as a key elsewhere (reviews, sign-in); keep it
            // unique the same way registration does.
            if let Some(existing) = self.directory.find_by_email(email).await? {
                if existing.id != user.id {
                    return Err(Error::Conflict(
                        "an account with this email already exists".to_string(),
                    ));
                }
            }
        }

        let server = self
            .directory
            .patch_user(
                &user.id,
                &UserPatch {
                    name,
                    email,
                    ..Default::default()
                },
            )
            .await?;
        self.session.apply_profile(&server);
        Ok(SessionUser::from(&server))
    }

    /// Upload a new avatar and point the user document at the stored path.
    pub async fn update_avatar(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<SessionUser, Error> {
        let user = self.require_session()?;
        if bytes.is_empty() {
            return Err(Error::Validation("image file is empty".to_string()));
        }

        let path = self.directory.upload_image(file_name, bytes).await?;
        let server = self
            .directory
            .patch_user(
                &user.id,
                &UserPatch {
                    image: Some(path),
                    ..Default::default()
                },
            )
            .await?;
        self.session.apply_profile(&server);
        Ok(SessionUser::from(&server))
    }

    fn require_session(&self) -> Result<SessionUser, Error> {
        self.session
            .snapshot()
            .ok_or_else(|| Error::InvalidOperation("sign in first".to_string()))
    }
}
