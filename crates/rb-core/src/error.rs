//! # Errors
//!
//! Centralized error handling for the Rusty-Reviews ecosystem.
//! `AppError` is the service-side taxonomy; `RemoteError`, `FetchError`,
//! `SubmitError` and `SyncError` belong to the client engine.

use crate::models::PostId;
use crate::validator::RatingError;
use thiserror::Error;

/// Message shown when the server rejects a review without saying why.
pub const GENERIC_SUBMIT_FAILURE: &str = "Failed to submit review";

/// The primary error type for service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Resource not found (e.g., Post, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., rating out of range, blank title)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing or invalid session, wrong credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Resource already exists (e.g., duplicate username)
    #[error("conflict: {0}")]
    Conflict(String),
}

/// A specialized Result type for service logic.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure reported by a remote collaborator (session gate, review backend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connection refused, reset, timed out.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server rejected request with status {status}")]
    Rejected { status: u16, message: Option<String> },

    /// A success response whose body could not be understood.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Errors of one refresh cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Non-fatal: the refresh continues as anonymous. Only ever reported to
    /// the error sink, never returned from `refresh`.
    #[error("authentication check failed: {0}")]
    AuthCheckFailed(RemoteError),

    /// Fatal for the cycle; previously displayed state stays in place.
    #[error("failed to fetch posts: {0}")]
    PostFetchFailed(RemoteError),
}

/// Errors of one review submission. None of them change local state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("invalid rating: {0}")]
    InvalidRating(#[from] RatingError),

    #[error("you must be logged in to review")]
    NotAuthenticated,

    /// Server declined; carries its message verbatim when it sent one.
    #[error("{0}")]
    Rejected(String),

    #[error("network error while submitting review: {0}")]
    TransportFailed(String),

    #[error("a review for post {0} is already being submitted")]
    InFlight(PostId),

    #[error("post {0} is not loaded")]
    UnknownPost(PostId),
}

impl From<RemoteError> for SubmitError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Rejected { message, .. } => SubmitError::Rejected(
                message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_SUBMIT_FAILURE.to_string()),
            ),
            RemoteError::Transport(msg) | RemoteError::Decode(msg) => {
                SubmitError::TransportFailed(msg)
            }
        }
    }
}

/// Everything the engine reports to its `ErrorSink`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}
