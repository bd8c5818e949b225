//! Viewer requests for missing titles, and the admin workflow that
//! resolves them.
//!
//! A request is born `pending` and moves exactly once, to `approved` or
//! `declined`; the sender is notified of the outcome either way.

use std::sync::Arc;

use chrono::Utc;

use movie_utils::MediaType;
use movie_utils::notifications::NewNotification;
use movie_utils::requests::{MovieRequest, NewMovieRequest, RequestStatus};
use tether::Error;

use crate::session::SessionState;
use crate::store::{NotificationDirectory, RequestDirectory, RequestPatch};

pub struct RequestCoordinator<D> {
    directory: Arc<D>,
    session: Arc<SessionState>,
}

impl<D: RequestDirectory + NotificationDirectory> RequestCoordinator<D> {
    pub fn new(directory: Arc<D>, session: Arc<SessionState>) -> Self {
        Self { directory, session }
    }

    pub async fn submit(
        &self,
        movie_title: &str,
        media_type: MediaType,
        year: Option<i32>,
    ) -> Result<MovieRequest, Error> {
        let Some(user) = self.session.snapshot() else {
            return Err(Error::InvalidOperation(
                "sign in to request a title".to_string(),
            ));
        };
        if movie_title.trim().is_empty() {
            return Err(Error::Validation("a title is required".to_string()));
        }

        self.directory
            .create_request(&NewMovieRequest::pending(
                movie_title.trim(),
                media_type,
                year,
                user.id,
            ))
            .await
    }

    /// Requests awaiting a decision, for the admin queue.
    pub async fn pending(&self) -> Result<Vec<MovieRequest>, Error> {
        self.require_admin()?;
        self.directory.pending_requests().await
    }

    pub async fn approve(&self, request_id: &str) -> Result<MovieRequest, Error> {
        self.resolve(request_id, RequestStatus::Approved, None).await
    }

    pub async fn decline(&self, request_id: &str, reason: &str) -> Result<MovieRequest, Error> {
        self.resolve(request_id, RequestStatus::Declined, Some(reason))
            .await
    }

    async fn resolve(
        &self,
        request_id: &str,
        next: RequestStatus,
        reason: Option<&str>,
    ) -> Result<MovieRequest, Error> {
        let admin = self.require_admin()?;

        let request = self.directory.fetch_request(request_id).await?;
        if !request.status.accepts(next) {
            return Err(Error::InvalidOperation(format!(
                "request is already {}",
                request.status
            )));
        }

        let updated = self
            .directory
            .patch_request(
                request_id,
                &RequestPatch {
                    status: Some(next),
                    reason: reason.map(str::to_string),
                    updated_at: Some(Utc::now()),
                },
            )
            .await?;

        let note = if next == RequestStatus::Approved {
            NewNotification::request_approved(&updated, &admin)
        } else {
            NewNotification::request_declined(&updated, &admin, reason.unwrap_or("no reason given"))
        };
        // Best-effort: the decision itself has committed.
        if let Err(error) = self.directory.create_notification(&note).await {
            log::warn!(
                "failed to notify {} about request {request_id}: {error}",
                updated.sender_id
            );
        }

        Ok(updated)
    }

    fn require_admin(&self) -> Result<String, Error> {
        match self.session.snapshot() {
            Some(user) if user.is_admin() => Ok(user.id),
            Some(_) => Err(Error::InvalidOperation(
                "admin privilege required".to_string(),
            )),
            None => Err(Error::InvalidOperation("sign in first".to_string())),
        }
    }
}
