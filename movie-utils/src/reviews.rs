use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::MediaType;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewAuthor {
    pub name: String,
    pub email: String,
}

/// A review of a catalog item. Replies are owned by the review document
/// (composition, not reference): the store only sees the review, so any
/// reply change is a full-array PATCH of `replies`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    #[serde(rename = "movieId")]
    pub movie_id: u64,
    #[serde(rename = "movieMediaType")]
    pub movie_media_type: MediaType,
    pub user: ReviewAuthor,
    pub text: String,
    pub rating: u8,
    #[serde(default)]
    pub replies: Vec<Reply>,
    #[serde(default)]
    pub flagged: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reply {
    #[serde(rename = "replyId")]
    pub reply_id: String,
    #[serde(rename = "replyText")]
    pub reply_text: String,
    #[serde(rename = "replyUser")]
    pub reply_user: ReviewAuthor,
    #[serde(rename = "replyDate")]
    pub reply_date: DateTime<Utc>,
    #[serde(default)]
    pub flagged: bool,
}

/// Body for posting a review; the store assigns the id.
#[derive(Clone, Debug, Serialize)]
pub struct NewReview {
    #[serde(rename = "movieId")]
    pub movie_id: u64,
    #[serde(rename = "movieMediaType")]
    pub movie_media_type: MediaType,
    pub user: ReviewAuthor,
    pub text: String,
    pub rating: u8,
    pub replies: Vec<Reply>,
    pub flagged: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl NewReview {
    pub fn new(
        movie_id: u64,
        movie_media_type: MediaType,
        user: ReviewAuthor,
        text: impl Into<String>,
        rating: u8,
    ) -> Self {
        let now = Utc::now();
        Self {
            movie_id,
            movie_media_type,
            user,
            text: text.into(),
            rating,
            replies: Vec::new(),
            flagged: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Whether `email` has already reviewed in this collection of reviews for
/// one item. Uniqueness is enforced here, before any write — the store
/// does not enforce it.
pub fn has_review_by(reviews: &[Review], email: &str) -> bool {
    reviews.iter().any(|review| review.user.email == email)
}

/// Whether `email` has already replied to this review.
pub fn has_reply_by(review: &Review, email: &str) -> bool {
    review
        .replies
        .iter()
        .any(|reply| reply.reply_user.email == email)
}

/// Collision-resistant token for ids generated client-side: the timestamp
/// in base36, zero-padded so tokens sort chronologically, plus a random
/// alphanumeric suffix.
pub fn reply_token(at: DateTime<Utc>) -> String {
    let millis = at.timestamp_millis().max(0) as u64;
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("{:0>9}-{suffix}", base36(millis))
}

fn base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn review(email: &str) -> Review {
        Review {
            id: "rev-1".to_string(),
            movie_id: 42,
            movie_media_type: MediaType::Movie,
            user: ReviewAuthor {
                name: "Ada".to_string(),
                email: email.to_string(),
            },
            text: "Great".to_string(),
            rating: 9,
            replies: Vec::new(),
            flagged: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn review_uniqueness_is_per_email() {
        let reviews = vec![review("ada@example.com")];
        assert!(has_review_by(&reviews, "ada@example.com"));
        assert!(!has_review_by(&reviews, "bob@example.com"));
    }

    #[test]
    fn reply_uniqueness_is_per_email() {
        let mut parent = review("ada@example.com");
        parent.replies.push(Reply {
            reply_id: reply_token(Utc::now()),
            reply_text: "Agreed".to_string(),
            reply_user: ReviewAuthor {
                name: "Bob".to_string(),
                email: "bob@example.com".to_string(),
            },
            reply_date: Utc::now(),
            flagged: false,
        });

        assert!(has_reply_by(&parent, "bob@example.com"));
        assert!(!has_reply_by(&parent, "carol@example.com"));
    }

    #[test]
    fn tokens_are_distinct() {
        let now = Utc::now();
        let mut tokens: Vec<String> = (0..100).map(|_| reply_token(now)).collect();
        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn tokens_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 1).unwrap();
        assert!(reply_token(earlier) < reply_token(later));
    }

    #[test]
    fn base36_round_values() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
    }

    #[test]
    fn reply_wire_shape() {
        let reply = Reply {
            reply_id: "tok".to_string(),
            reply_text: "hm".to_string(),
            reply_user: ReviewAuthor {
                name: "Bob".to_string(),
                email: "bob@example.com".to_string(),
            },
            reply_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            flagged: false,
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["replyId"], "tok");
        assert_eq!(json["replyText"], "hm");
        assert!(json.get("replyDate").is_some());
    }
}
