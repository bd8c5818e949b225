//! Account registration and session establishment.
//!
//! There is no token protocol here: a "session" is the in-process
//! [`SessionState`], created after the credential check passes and torn
//! down on sign-out. Passwords are stored as bcrypt hashes and verified
//! against the hash — never compared in the clear.

use std::sync::Arc;

use tether::Error;

use crate::session::{SessionState, SessionUser};
use crate::store::{NewUser, UserDirectory};

#[derive(Clone, Debug)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct Authenticator<D> {
    directory: Arc<D>,
    session: Arc<SessionState>,
}

impl<D: UserDirectory> Authenticator<D> {
    pub fn new(directory: Arc<D>, session: Arc<SessionState>) -> Self {
        Self { directory, session }
    }

    /// Create an account. The email must not already be registered — the
    /// store doesn't enforce uniqueness, so the check happens here.
    pub async fn register(&self, account: NewAccount) -> Result<SessionUser, Error> {
        let email = account.email.trim().to_string();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::Validation(
                "a valid email address is required".to_string(),
            ));
        }
        if account.name.trim().is_empty() {
            return Err(Error::Validation("a display name is required".to_string()));
        }
        if account.password.len() < 8 {
            return Err(Error::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }

        if self.directory.find_by_email(&email).await?.is_some() {
            return Err(Error::Conflict(
                "an account with this email already exists".to_string(),
            ));
        }

        let hash = bcrypt::hash(&account.password, bcrypt::DEFAULT_COST)
            .map_err(|e| Error::Unknown(format!("password hashing failed: {e}")))?;

        let user = self
            .directory
            .create_user(&NewUser::new(account.name.trim(), email, hash))
            .await?;

        self.session.begin(&user);
        Ok(SessionUser::from(&user))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, Error> {
        // Unknown email and wrong password fail identically.
        let Some(user) = self.directory.find_by_email(email.trim()).await? else {
            return Err(Error::Validation("invalid credentials".to_string()));
        };

        let verified = bcrypt::verify(password, &user.password)
            .map_err(|e| Error::Unknown(format!("password verification failed: {e}")))?;
        if !verified {
            return Err(Error::Validation("invalid credentials".to_string()));
        }

        if user.is_suspended() {
            return Err(Error::InvalidOperation(
                "this account is suspended".to_string(),
            ));
        }

        self.session.begin(&user);
        Ok(SessionUser::from(&user))
    }

    /// Re-establish a remembered session from a stored user id.
    pub async fn restore(&self, user_id: &str) -> Result<SessionUser, Error> {
        let user = self.directory.fetch_user(user_id).await?;

        if user.is_suspended() {
            return Err(Error::InvalidOperation(
                "this account is suspended".to_string(),
            ));
        }

        self.session.begin(&user);
        Ok(SessionUser::from(&user))
    }

    pub fn sign_out(&self) {
        self.session.clear();
    }
}
