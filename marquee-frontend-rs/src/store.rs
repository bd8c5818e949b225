//! The seam between the client core and the REST store.
//!
//! Each feature area gets a small directory trait so its coordinator can be
//! exercised against an in-memory double; [`RestDirectory`] is the one
//! production implementation, a thin layer over [`tether::ResourceClient`].
//! Patch bodies here serialize only the fields they carry — the store
//! merges shallowly, so a mutation touches exactly the fields it names and
//! list fields always travel as full replacement arrays.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use movie_utils::notifications::{NewNotification, Notification};
use movie_utils::requests::{MovieRequest, NewMovieRequest, RequestStatus};
use movie_utils::reviews::{NewReview, Reply, Review};
use movie_utils::{MediaType, MovieReference, User};
use tether::{Error, Query, ResourceClient, SortOrder};

pub const USERS: &str = "users";
pub const NOTIFICATIONS: &str = "notifications";
pub const MOVIE_REQUESTS: &str = "movieRequests";
pub const REVIEWS: &str = "reviews";

/// Body for registration; the store assigns the id. Lists are created
/// empty and explicitly, so every user document carries every field.
#[derive(Clone, Debug, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// Already hashed by the caller.
    pub password: String,
    pub favorites: Vec<MovieReference>,
    pub watchlist: Vec<MovieReference>,
    #[serde(rename = "watchedList")]
    pub watched_list: Vec<MovieReference>,
    pub following: Vec<String>,
    pub followers: Vec<String>,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password_hash.into(),
            favorites: Vec::new(),
            watchlist: Vec::new(),
            watched_list: Vec::new(),
            following: Vec::new(),
            followers: Vec::new(),
        }
    }
}

/// Partial user document. Only `Some` fields reach the wire.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorites: Option<Vec<MovieReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watchlist: Option<Vec<MovieReference>>,
    #[serde(rename = "watchedList", skip_serializing_if = "Option::is_none")]
    pub watched_list: Option<Vec<MovieReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub following: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct NotificationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RequestPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ReviewPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<Reply>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged: Option<bool>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

pub trait UserDirectory: Send + Sync {
    fn fetch_user(&self, id: &str) -> impl Future<Output = Result<User, Error>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, Error>> + Send;

    fn create_user(&self, new_user: &NewUser)
    -> impl Future<Output = Result<User, Error>> + Send;

    fn patch_user(
        &self,
        id: &str,
        patch: &UserPatch,
    ) -> impl Future<Output = Result<User, Error>> + Send;

    /// Multipart upload of an avatar image; returns the stored path.
    fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<String, Error>> + Send;
}

pub trait NotificationDirectory: Send + Sync {
    /// All notifications addressed to `user_id`, most recent first.
    fn notifications_for(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<Notification>, Error>> + Send;

    fn create_notification(
        &self,
        new: &NewNotification,
    ) -> impl Future<Output = Result<Notification, Error>> + Send;

    fn mark_notification_read(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Notification, Error>> + Send;
}

pub trait RequestDirectory: Send + Sync {
    fn fetch_request(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<MovieRequest, Error>> + Send;

    fn pending_requests(&self)
    -> impl Future<Output = Result<Vec<MovieRequest>, Error>> + Send;

    fn create_request(
        &self,
        new: &NewMovieRequest,
    ) -> impl Future<Output = Result<MovieRequest, Error>> + Send;

    fn patch_request(
        &self,
        id: &str,
        patch: &RequestPatch,
    ) -> impl Future<Output = Result<MovieRequest, Error>> + Send;
}

pub trait ReviewDirectory: Send + Sync {
    fn reviews_for(
        &self,
        movie_id: u64,
        media_type: MediaType,
    ) -> impl Future<Output = Result<Vec<Review>, Error>> + Send;

    fn fetch_review(&self, id: &str) -> impl Future<Output = Result<Review, Error>> + Send;

    fn create_review(
        &self,
        new: &NewReview,
    ) -> impl Future<Output = Result<Review, Error>> + Send;

    fn patch_review(
        &self,
        id: &str,
        patch: &ReviewPatch,
    ) -> impl Future<Output = Result<Review, Error>> + Send;
}

/// The production directory: every method is one request against the
/// resource store.
pub struct RestDirectory {
    client: Arc<ResourceClient>,
}

impl RestDirectory {
    pub fn new(client: Arc<ResourceClient>) -> Self {
        Self { client }
    }
}

impl UserDirectory for RestDirectory {
    async fn fetch_user(&self, id: &str) -> Result<User, Error> {
        self.client.get_one(USERS, id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let users: Vec<User> = self
            .client
            .list(USERS, &Query::new().filter("email", email))
            .await?;
        Ok(users.into_iter().next())
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, Error> {
        self.client.create(USERS, new_user).await
    }

    async fn patch_user(&self, id: &str, patch: &UserPatch) -> Result<User, Error> {
        self.client.update(USERS, id, patch).await
    }

    async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, Error> {
        self.client.upload("image", file_name, bytes).await
    }
}

impl NotificationDirectory for RestDirectory {
    async fn notifications_for(&self, user_id: &str) -> Result<Vec<Notification>, Error> {
        self.client
            .list(
                NOTIFICATIONS,
                &Query::new()
                    .filter("to", user_id)
                    .sort_by("date", SortOrder::Desc),
            )
            .await
    }

    async fn create_notification(&self, new: &NewNotification) -> Result<Notification, Error> {
        self.client.create(NOTIFICATIONS, new).await
    }

    async fn mark_notification_read(&self, id: &str) -> Result<Notification, Error> {
        self.client
            .update(NOTIFICATIONS, id, &NotificationPatch { read: Some(true) })
            .await
    }
}

impl RequestDirectory for RestDirectory {
    async fn fetch_request(&self, id: &str) -> Result<MovieRequest, Error> {
        self.client.get_one(MOVIE_REQUESTS, id).await
    }

    async fn pending_requests(&self) -> Result<Vec<MovieRequest>, Error> {
        self.client
            .list(
                MOVIE_REQUESTS,
                &Query::new()
                    .filter("status", "pending")
                    .sort_by("createdAt", SortOrder::Asc),
            )
            .await
    }

    async fn create_request(&self, new: &NewMovieRequest) -> Result<MovieRequest, Error> {
        self.client.create(MOVIE_REQUESTS, new).await
    }

    async fn patch_request(&self, id: &str, patch: &RequestPatch) -> Result<MovieRequest, Error> {
        self.client.update(MOVIE_REQUESTS, id, patch).await
    }
}

impl ReviewDirectory for RestDirectory {
    async fn reviews_for(
        &self,
        movie_id: u64,
        media_type: MediaType,
    ) -> Result<Vec<Review>, Error> {
        // media_type serializes lowercase, matching the stored field.
        let media_type = match media_type {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        };
        self.client
            .list(
                REVIEWS,
                &Query::new()
                    .filter("movieId", movie_id)
                    .filter("movieMediaType", media_type),
            )
            .await
    }

    async fn fetch_review(&self, id: &str) -> Result<Review, Error> {
        self.client.get_one(REVIEWS, id).await
    }

    async fn create_review(&self, new: &NewReview) -> Result<Review, Error> {
        self.client.create(REVIEWS, new).await
    }

    async fn patch_review(&self, id: &str, patch: &ReviewPatch) -> Result<Review, Error> {
        self.client.update(REVIEWS, id, patch).await
    }
}
