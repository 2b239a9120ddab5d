//! Aggregate derivation and its display label.
//!
//! The service builds every aggregate it returns with [`compute`]. The client
//! only uses it as a display fallback; after a write the server's aggregate
//! replaces whatever the client holds.

use crate::models::{Review, ReviewAggregate};

pub const NO_RATINGS_LABEL: &str = "No ratings yet";

/// Derives `{ratings, average, count}` from a set of reviews.
/// The average is kept at full precision.
pub fn compute(ratings: &[Review]) -> ReviewAggregate {
    ReviewAggregate {
        ratings: ratings.to_vec(),
        average: mean(ratings),
        count: ratings.len(),
    }
}

fn mean(ratings: &[Review]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| r.rating).sum();
    Some(sum as f64 / ratings.len() as f64)
}

/// `"No ratings yet"`, or e.g. `"3.5 (2 reviews)"`.
pub fn label(aggregate: &ReviewAggregate) -> String {
    if aggregate.count == 0 {
        return NO_RATINGS_LABEL.to_string();
    }
    let average = match aggregate.average.or_else(|| mean(&aggregate.ratings)) {
        Some(avg) => avg,
        None => {
            tracing::warn!(count = aggregate.count, "aggregate has a count but no ratings or average");
            return NO_RATINGS_LABEL.to_string();
        }
    };
    let noun = if aggregate.count == 1 { "review" } else { "reviews" };
    format!("{:.1} ({} {})", average, aggregate.count, noun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use chrono::Utc;
    use proptest::prelude::*;

    fn review(user: &str, rating: i64) -> Review {
        Review {
            id: rating,
            user_id: UserId::new(user),
            username: user.to_string(),
            rating,
            content: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_set_has_no_average() {
        let agg = compute(&[]);
        assert_eq!(agg.count, 0);
        assert_eq!(agg.average, None);
        assert_eq!(label(&agg), "No ratings yet");
    }

    #[test]
    fn label_uses_singular_for_one_review() {
        let agg = compute(&[review("a", 4)]);
        assert_eq!(label(&agg), "4.0 (1 review)");
    }

    #[test]
    fn label_rounds_only_for_display() {
        let agg = compute(&[review("a", 5), review("b", 4), review("c", 4)]);
        assert_eq!(label(&agg), "4.3 (3 reviews)");
        assert!((agg.average.unwrap() - 13.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn label_falls_back_when_average_missing() {
        let mut agg = compute(&[review("a", 2), review("b", 3)]);
        agg.average = None;
        assert_eq!(label(&agg), "2.5 (2 reviews)");
    }

    #[test]
    fn count_without_ratings_or_average_shows_no_ratings() {
        let agg = ReviewAggregate { ratings: vec![], average: None, count: 2 };
        assert_eq!(label(&agg), NO_RATINGS_LABEL);
    }

    proptest! {
        #[test]
        fn average_is_arithmetic_mean(ratings in proptest::collection::vec(1i64..=5, 1..50)) {
            let reviews: Vec<Review> = ratings
                .iter()
                .enumerate()
                .map(|(i, r)| review(&format!("user-{}", i), *r))
                .collect();
            let agg = compute(&reviews);
            let expected = ratings.iter().sum::<i64>() as f64 / ratings.len() as f64;
            prop_assert_eq!(agg.count, ratings.len());
            prop_assert!((agg.average.unwrap() - expected).abs() < 1e-9);
        }
    }
}
