//! Reviews and their embedded replies.
//!
//! One review per viewer per title, one reply per viewer per review — both
//! checked here before the write, since the store enforces neither.
//! Replies live inside the parent review document, so every reply change
//! travels as a full replacement of the `replies` array.

use std::sync::Arc;

use chrono::Utc;

use movie_utils::MediaType;
use movie_utils::reviews::{
    NewReview, Reply, Review, ReviewAuthor, has_reply_by, has_review_by, reply_token,
};
use tether::Error;

use crate::session::{SessionState, SessionUser};
use crate::store::{ReviewDirectory, ReviewPatch};

pub struct ReviewBoard<D> {
    directory: Arc<D>,
    session: Arc<SessionState>,
}

impl<D: ReviewDirectory> ReviewBoard<D> {
    pub fn new(directory: Arc<D>, session: Arc<SessionState>) -> Self {
        Self { directory, session }
    }

    pub async fn post_review(
        &self,
        movie_id: u64,
        media_type: MediaType,
        text: &str,
        rating: u8,
    ) -> Result<Review, Error> {
        let user = self.require_session()?;
        if text.trim().is_empty() {
            return Err(Error::Validation("review text is required".to_string()));
        }
        if !(1..=10).contains(&rating) {
            return Err(Error::Validation(
                "rating must be between 1 and 10".to_string(),
            ));
        }

        let existing = self.directory.reviews_for(movie_id, media_type).await?;
        if has_review_by(&existing, &user.email) {
            return Err(Error::Conflict(
                "you have already reviewed this title".to_string(),
            ));
        }

        self.directory
            .create_review(&NewReview::new(
                movie_id,
                media_type,
                author(&user),
                text.trim(),
                rating,
            ))
            .await
    }

    pub async fn post_reply(&self, review_id: &str, text: &str) -> Result<Review, Error> {
        let user = self.require_session()?;
        if text.trim().is_empty() {
            return Err(Error::Validation("reply text is required".to_string()));
        }

        let review = self.directory.fetch_review(review_id).await?;
        if has_reply_by(&review, &user.email) {
            return Err(Error::Conflict(
                "you have already replied to this review".to_string(),
            ));
        }

        let now = Utc::now();
        let mut replies = review.replies;
        replies.push(Reply {
            reply_id: reply_token(now),
            reply_text: text.trim().to_string(),
            reply_user: author(&user),
            reply_date: now,
            flagged: false,
        });

        self.directory
            .patch_review(
                review_id,
                &ReviewPatch {
                    replies: Some(replies),
                    updated_at: Some(now),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn flag_review(&self, review_id: &str) -> Result<Review, Error> {
        self.require_session()?;
        self.directory
            .patch_review(
                review_id,
                &ReviewPatch {
                    flagged: Some(true),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn flag_reply(&self, review_id: &str, reply_id: &str) -> Result<Review, Error> {
        self.require_session()?;

        let review = self.directory.fetch_review(review_id).await?;
        let mut replies = review.replies;
        let Some(reply) = replies.iter_mut().find(|reply| reply.reply_id == reply_id) else {
            return Err(Error::NotFound(format!(
                "reviews/{review_id}/replies/{reply_id}"
            )));
        };
        reply.flagged = true;

        self.directory
            .patch_review(
                review_id,
                &ReviewPatch {
                    replies: Some(replies),
                    ..Default::default()
                },
            )
            .await
    }

    fn require_session(&self) -> Result<SessionUser, Error> {
        self.session
            .snapshot()
            .ok_or_else(|| Error::InvalidOperation("sign in first".to_string()))
    }
}

fn author(user: &SessionUser) -> ReviewAuthor {
    ReviewAuthor {
        name: user.name.clone(),
        email: user.email.clone(),
    }
}
