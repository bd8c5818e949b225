//! Domain types shared across the Marquee client: user documents, the
//! references held in a user's movie lists, and the social objects built
//! on top (notifications, movie requests, reviews).
//!
//! Types here mirror the store's wire shapes exactly (field names included)
//! and carry no I/O. Anything that can be checked without a network call —
//! list identity, status transitions, token generation — lives here too, as
//! plain functions.

pub mod notifications;
pub mod requests;
pub mod reviews;

use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

/// Minimal identification of a catalog item inside a user's lists.
///
/// Two references denote the same item iff their `(id, media_type)` pair
/// matches; the same numeric id can exist for both a movie and a show.
/// `title` is carried for display, not identity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieReference {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
}

impl MovieReference {
    pub fn key(&self) -> (u64, MediaType) {
        (self.id, self.media_type)
    }

    pub fn is_same_item(&self, other: &MovieReference) -> bool {
        self.key() == other.key()
    }
}

/// Admin tiers, stored as `"1"` and `"2"`. Regular users carry no
/// privilege field at all.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Privilege {
    #[serde(rename = "1")]
    Admin,
    #[serde(rename = "2")]
    Owner,
}

/// A user document as stored. List fields default to empty so documents
/// created before a field existed still deserialize.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    /// bcrypt hash of the account password.
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub favorites: Vec<MovieReference>,
    #[serde(default)]
    pub watchlist: Vec<MovieReference>,
    #[serde(default, rename = "watchedList")]
    pub watched_list: Vec<MovieReference>,
    #[serde(default)]
    pub following: Vec<String>,
    #[serde(default)]
    pub followers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privilege: Option<Privilege>,
}

impl User {
    pub fn is_suspended(&self) -> bool {
        self.suspended == Some(true)
    }

    pub fn is_admin(&self) -> bool {
        self.privilege.is_some()
    }
}

/// The list with `reference` appended, or `None` when an entry with the
/// same `(id, media_type)` already exists — the caller then has no write
/// to make.
pub fn upserted(
    list: &[MovieReference],
    reference: &MovieReference,
) -> Option<Vec<MovieReference>> {
    if list.iter().any(|existing| existing.is_same_item(reference)) {
        return None;
    }
    let mut next = list.to_vec();
    next.push(reference.clone());
    Some(next)
}

/// The list without the `(id, media_type)` entry. Removing a non-member
/// returns the list unchanged.
pub fn without(list: &[MovieReference], id: u64, media_type: MediaType) -> Vec<MovieReference> {
    list.iter()
        .filter(|reference| reference.key() != (id, media_type))
        .cloned()
        .collect()
}
