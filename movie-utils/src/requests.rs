use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::MediaType;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Declined => "declined",
        })
    }
}

impl RequestStatus {
    /// Approved and declined are terminal: no operation moves a request
    /// back out of them.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn accepts(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved) | (Self::Pending, Self::Declined)
        )
    }
}

/// A viewer's request that a missing title be added to the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MovieRequest {
    pub id: String,
    #[serde(rename = "movieTitle")]
    pub movie_title: String,
    #[serde(rename = "mediaType")]
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(rename = "senderId")]
    pub sender_id: String,
    pub status: RequestStatus,
    /// Set when the request is declined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Body for submitting a request; the store assigns the id.
#[derive(Clone, Debug, Serialize)]
pub struct NewMovieRequest {
    #[serde(rename = "movieTitle")]
    pub movie_title: String,
    #[serde(rename = "mediaType")]
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(rename = "senderId")]
    pub sender_id: String,
    pub status: RequestStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl NewMovieRequest {
    pub fn pending(
        movie_title: impl Into<String>,
        media_type: MediaType,
        year: Option<i32>,
        sender_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            movie_title: movie_title.into(),
            media_type,
            year,
            sender_id: sender_id.into(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
