//! Rating validation shared by the client engine and the service.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("a rating is required")]
    Missing,

    #[error("rating must be between 1 and 5, got {0}")]
    OutOfRange(i64),

    #[error("rating must be a whole number, got {0:?}")]
    Malformed(String),
}

/// A rating that is known to lie in `MIN_RATING..=MAX_RATING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub fn get(self) -> i64 {
        i64::from(self.0)
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        validate(Some(value))
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        rating.get()
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts exactly the integers 1 through 5.
pub fn validate(rating: Option<i64>) -> Result<Rating, RatingError> {
    match rating {
        None => Err(RatingError::Missing),
        Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => Ok(Rating(r as u8)),
        Some(r) => Err(RatingError::OutOfRange(r)),
    }
}

/// Turns raw input text into a draft rating. Blank input is the empty
/// rating; anything that is not a whole number is malformed.
pub fn parse_rating(input: &str) -> Result<Option<i64>, RatingError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| RatingError::Malformed(trimmed.to_string()))
}
