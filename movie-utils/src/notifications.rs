use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::User;
use crate::requests::MovieRequest;

/// An in-app notification. Mutated only by the recipient marking it read;
/// never deleted in normal flow.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    /// Recipient user id.
    pub to: String,
    /// Sender user id.
    pub from: String,
    pub message: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// Body for creating a notification; the store assigns the id.
#[derive(Clone, Debug, Serialize)]
pub struct NewNotification {
    pub to: String,
    pub from: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub read: bool,
}

impl NewNotification {
    pub fn now(
        to: impl Into<String>,
        from: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            message: message.into(),
            date: Utc::now(),
            read: false,
        }
    }

    pub fn new_follower(follower: &User, to: impl Into<String>) -> Self {
        Self::now(
            to,
            follower.id.clone(),
            format!("{} started following you", follower.name),
        )
    }

    pub fn request_approved(request: &MovieRequest, admin_id: impl Into<String>) -> Self {
        Self::now(
            request.sender_id.clone(),
            admin_id,
            format!("Your request for \"{}\" was approved", request.movie_title),
        )
    }

    pub fn request_declined(
        request: &MovieRequest,
        admin_id: impl Into<String>,
        reason: &str,
    ) -> Self {
        Self::now(
            request.sender_id.clone(),
            admin_id,
            format!(
                "Your request for \"{}\" was declined: {reason}",
                request.movie_title
            ),
        )
    }
}
