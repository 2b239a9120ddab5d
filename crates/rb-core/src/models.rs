//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Reviews.
//! Posts and reviews are server-owned; the client keeps a snapshot per
//! fetch cycle and never fabricates a review on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned post identifier.
pub type PostId = i64;

/// Opaque user identity as reported by the session endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// A short post with the review aggregate attached by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub author_username: String,
    pub author_user_id: UserId,
    pub created_at: DateTime<Utc>,
    /// The only field the client overwrites between fetches.
    pub reviews: ReviewAggregate,
}

/// One user's rating and comment on one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub user_id: UserId,
    pub username: String,
    pub rating: i64,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Summarized view of all reviews for a post.
///
/// `count == ratings.len()` and `average` is the mean rating, or `None`
/// when there are no ratings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewAggregate {
    pub ratings: Vec<Review>,
    #[serde(default)]
    pub average: Option<f64>,
    pub count: usize,
}

impl ReviewAggregate {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The first review written by `user`, in server order.
    pub fn review_by(&self, user: &UserId) -> Option<&Review> {
        self.ratings.iter().find(|r| &r.user_id == user)
    }

    /// Reviews newest first. Ties keep server order.
    pub fn by_recency(&self) -> Vec<&Review> {
        let mut reviews: Vec<&Review> = self.ratings.iter().collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reviews
    }

    /// True when the count matches the ratings and no user appears twice.
    pub fn is_consistent(&self) -> bool {
        if self.count != self.ratings.len() {
            return false;
        }
        let mut seen = std::collections::HashSet::with_capacity(self.ratings.len());
        self.ratings.iter().all(|r| seen.insert(&r.user_id))
    }
}

/// Local edit buffer for the current user's review on one post.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewDraft {
    /// `None` is the empty input field.
    pub rating: Option<i64>,
    pub content: String,
}

impl ReviewDraft {
    pub fn from_review(review: &Review) -> Self {
        Self {
            rating: Some(review.rating),
            content: review.content.clone(),
        }
    }
}

/// A single keystroke-level change to a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    Rating(Option<i64>),
    Content(String),
}

/// Body of the review upsert request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub rating: i64,
    #[serde(default)]
    pub content: String,
}

/// Answer of the session-status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub is_authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl SessionStatus {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            is_authenticated: true,
            user_id: Some(user_id),
        }
    }

    /// The identity to act as, only when the session is authenticated.
    pub fn current_user(self) -> Option<UserId> {
        if self.is_authenticated {
            self.user_id
        } else {
            None
        }
    }
}

/// Fields a user supplies when publishing a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: String,
}

/// A registered account as stored by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

/// Username/password pair used by login and register.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
