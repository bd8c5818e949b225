//! In-memory directory double shared by the coordinator tests.
//!
//! Every method yields once before touching state, so concurrent callers
//! genuinely interleave at the same points a real network round trip would
//! allow — the races the coordinators exist to fence show up here too.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use movie_utils::notifications::{NewNotification, Notification};
use movie_utils::requests::{MovieRequest, NewMovieRequest};
use movie_utils::reviews::{NewReview, Review};
use movie_utils::{MediaType, User};
use tether::Error;

use crate::store::{
    NewUser, NotificationDirectory, RequestDirectory, RequestPatch, ReviewDirectory,
    ReviewPatch, UserDirectory, UserPatch,
};

#[derive(Default)]
pub(crate) struct FakeDirectory {
    pub users: Mutex<HashMap<String, User>>,
    pub notifications: Mutex<Vec<Notification>>,
    pub requests: Mutex<HashMap<String, MovieRequest>>,
    pub reviews: Mutex<HashMap<String, Review>>,

    pub fetch_user_calls: AtomicUsize,
    pub patch_user_calls: AtomicUsize,
    pub create_user_calls: AtomicUsize,
    pub create_notification_calls: AtomicUsize,
    pub create_review_calls: AtomicUsize,
    pub patch_request_calls: AtomicUsize,

    /// User ids whose PATCH fails with a network error.
    pub failing_user_patches: Mutex<HashSet<String>>,

    next_id: AtomicUsize,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    pub fn user(&self, id: &str) -> User {
        self.users.lock().unwrap().get(id).cloned().unwrap()
    }

    pub fn insert_request(&self, request: MovieRequest) {
        self.requests
            .lock()
            .unwrap()
            .insert(request.id.clone(), request);
    }

    pub fn insert_review(&self, review: Review) {
        self.reviews
            .lock()
            .unwrap()
            .insert(review.id.clone(), review);
    }

    pub fn fail_user_patches_for(&self, id: &str) {
        self.failing_user_patches
            .lock()
            .unwrap()
            .insert(id.to_string());
    }

    fn assign_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

pub(crate) fn bare_user(id: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        name: format!("user {id}"),
        email: email.to_string(),
        password: "$2b$unused".to_string(),
        image: None,
        favorites: Vec::new(),
        watchlist: Vec::new(),
        watched_list: Vec::new(),
        following: Vec::new(),
        followers: Vec::new(),
        suspended: None,
        privilege: None,
    }
}

impl UserDirectory for FakeDirectory {
    async fn fetch_user(&self, id: &str) -> Result<User, Error> {
        self.fetch_user_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.users
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("users/{id}")))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        tokio::task::yield_now().await;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, Error> {
        self.create_user_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let user = User {
            id: self.assign_id("user"),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password: new_user.password.clone(),
            image: None,
            favorites: new_user.favorites.clone(),
            watchlist: new_user.watchlist.clone(),
            watched_list: new_user.watched_list.clone(),
            following: new_user.following.clone(),
            followers: new_user.followers.clone(),
            suspended: None,
            privilege: None,
        };
        self.insert_user(user.clone());
        Ok(user)
    }

    async fn patch_user(&self, id: &str, patch: &UserPatch) -> Result<User, Error> {
        self.patch_user_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.failing_user_patches.lock().unwrap().contains(id) {
            return Err(Error::Network(format!("users/{id}: connection reset")));
        }

        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("users/{id}")))?;

        if let Some(name) = &patch.name {
            user.name = name.clone();
        }
        if let Some(email) = &patch.email {
            user.email = email.clone();
        }
        if let Some(image) = &patch.image {
            user.image = Some(image.clone());
        }
        if let Some(favorites) = &patch.favorites {
            user.favorites = favorites.clone();
        }
        if let Some(watchlist) = &patch.watchlist {
            user.watchlist = watchlist.clone();
        }
        if let Some(watched_list) = &patch.watched_list {
            user.watched_list = watched_list.clone();
        }
        if let Some(following) = &patch.following {
            user.following = following.clone();
        }
        if let Some(followers) = &patch.followers {
            user.followers = followers.clone();
        }
        if let Some(suspended) = patch.suspended {
            user.suspended = Some(suspended);
        }

        Ok(user.clone())
    }

    async fn upload_image(&self, file_name: &str, _bytes: Vec<u8>) -> Result<String, Error> {
        tokio::task::yield_now().await;
        Ok(format!("/uploads/{file_name}"))
    }
}

impl NotificationDirectory for FakeDirectory {
    async fn notifications_for(&self, user_id: &str) -> Result<Vec<Notification>, Error> {
        tokio::task::yield_now().await;
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|notification| notification.to == user_id)
            .cloned()
            .collect())
    }

    async fn create_notification(&self, new: &NewNotification) -> Result<Notification, Error> {
        self.create_notification_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let notification = Notification {
            id: self.assign_id("note"),
            to: new.to.clone(),
            from: new.from.clone(),
            message: new.message.clone(),
            date: new.date,
            read: new.read,
        };
        self.notifications
            .lock()
            .unwrap()
            .push(notification.clone());
        Ok(notification)
    }

    async fn mark_notification_read(&self, id: &str) -> Result<Notification, Error> {
        tokio::task::yield_now().await;
        let mut notifications = self.notifications.lock().unwrap();
        let notification = notifications
            .iter_mut()
            .find(|notification| notification.id == id)
            .ok_or_else(|| Error::NotFound(format!("notifications/{id}")))?;
        notification.read = true;
        Ok(notification.clone())
    }
}

impl RequestDirectory for FakeDirectory {
    async fn fetch_request(&self, id: &str) -> Result<MovieRequest, Error> {
        tokio::task::yield_now().await;
        self.requests
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("movieRequests/{id}")))
    }

    async fn pending_requests(&self) -> Result<Vec<MovieRequest>, Error> {
        tokio::task::yield_now().await;
        Ok(self
            .requests
            .lock()
            .unwrap()
            .values()
            .filter(|request| !request.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn create_request(&self, new: &NewMovieRequest) -> Result<MovieRequest, Error> {
        tokio::task::yield_now().await;
        let request = MovieRequest {
            id: self.assign_id("request"),
            movie_title: new.movie_title.clone(),
            media_type: new.media_type,
            year: new.year,
            sender_id: new.sender_id.clone(),
            status: new.status,
            reason: None,
            created_at: new.created_at,
            updated_at: new.updated_at,
        };
        self.insert_request(request.clone());
        Ok(request)
    }

    async fn patch_request(&self, id: &str, patch: &RequestPatch) -> Result<MovieRequest, Error> {
        self.patch_request_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("movieRequests/{id}")))?;

        if let Some(status) = patch.status {
            request.status = status;
        }
        if let Some(reason) = &patch.reason {
            request.reason = Some(reason.clone());
        }
        if let Some(updated_at) = patch.updated_at {
            request.updated_at = updated_at;
        }

        Ok(request.clone())
    }
}

impl ReviewDirectory for FakeDirectory {
    async fn reviews_for(
        &self,
        movie_id: u64,
        media_type: MediaType,
    ) -> Result<Vec<Review>, Error> {
        tokio::task::yield_now().await;
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .values()
            .filter(|review| {
                review.movie_id == movie_id && review.movie_media_type == media_type
            })
            .cloned()
            .collect())
    }

    async fn fetch_review(&self, id: &str) -> Result<Review, Error> {
        tokio::task::yield_now().await;
        self.reviews
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("reviews/{id}")))
    }

    async fn create_review(&self, new: &NewReview) -> Result<Review, Error> {
        self.create_review_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let review = Review {
            id: self.assign_id("review"),
            movie_id: new.movie_id,
            movie_media_type: new.movie_media_type,
            user: new.user.clone(),
            text: new.text.clone(),
            rating: new.rating,
            replies: new.replies.clone(),
            flagged: new.flagged,
            created_at: new.created_at,
            updated_at: new.updated_at,
        };
        self.insert_review(review.clone());
        Ok(review)
    }

    async fn patch_review(&self, id: &str, patch: &ReviewPatch) -> Result<Review, Error> {
        tokio::task::yield_now().await;
        let mut reviews = self.reviews.lock().unwrap();
        let review = reviews
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("reviews/{id}")))?;

        if let Some(replies) = &patch.replies {
            review.replies = replies.clone();
        }
        if let Some(flagged) = patch.flagged {
            review.flagged = flagged;
        }
        if let Some(updated_at) = patch.updated_at {
            review.updated_at = updated_at;
        }

        Ok(review.clone())
    }
}
