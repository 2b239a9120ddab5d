//! # Core Traits (Ports)
//!
//! Service-side ports are implemented by the plugins under `rb-plugins` and
//! wired by the server binary. Client-side ports are what the
//! `PostSynchronizer` consumes.

use async_trait::async_trait;

use crate::error::{RemoteError, Result, SyncError};
use crate::models::{
    NewPost, Post, PostId, ReviewAggregate, ReviewSubmission, SessionStatus, UserAccount, UserId,
};
use crate::validator::Rating;

// ── Service side ────────────────────────────────────────────────────────────

/// Data persistence contract for users, posts, and reviews.
#[async_trait]
pub trait ReviewRepo: Send + Sync {
    // User Operations
    /// Fails with `AppError::Conflict` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserAccount>;
    async fn find_user_by_name(&self, username: &str) -> Result<Option<UserAccount>>;

    // Post Operations
    async fn create_post(&self, author: &UserId, post: NewPost) -> Result<PostId>;
    async fn list_posts(&self) -> Result<Vec<Post>>;

    // Review Operations
    /// Creates the user's review on the post, or updates it in place (same id).
    /// Returns the post's full aggregate after the write.
    async fn upsert_review(
        &self,
        post_id: PostId,
        user: &UserId,
        rating: Rating,
        content: &str,
    ) -> Result<ReviewAggregate>;
}

/// Password hashing and session tokens.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String>;

    /// Verifies a password against a stored hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Issues a signed session token for the user.
    fn issue_token(&self, user: &UserId) -> Result<String>;

    /// Resolves a session token back to its user. Expired or forged tokens
    /// fail with `AppError::Unauthorized`.
    fn verify_token(&self, token: &str) -> Result<UserId>;

    /// Session lifetime, used for the cookie max-age.
    fn session_ttl_secs(&self) -> i64;
}

// ── Client side ─────────────────────────────────────────────────────────────

/// Who is logged in, as far as the server is concerned.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SessionGate: Send + Sync {
    async fn session_status(&self) -> std::result::Result<SessionStatus, RemoteError>;
}

/// The remote posts/review endpoint.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    async fn fetch_posts(&self) -> std::result::Result<Vec<Post>, RemoteError>;

    /// Upsert of the caller's review. Returns the post's aggregate, not the post.
    async fn put_review(
        &self,
        post_id: PostId,
        review: &ReviewSubmission,
    ) -> std::result::Result<ReviewAggregate, RemoteError>;
}

/// Where the engine reports every error it returns.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &SyncError);
}

/// Sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, error: &SyncError) {
        tracing::warn!(%error, "review engine error");
    }
}
