//! Seeding and server-result reconciliation for per-post drafts and flags.

use crate::models::{Post, PostId, ReviewAggregate, ReviewDraft, UserId};
use std::collections::HashMap;

/// Drafts and has-reviewed flags derived from one fetch cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Seeded {
    pub drafts: HashMap<PostId, ReviewDraft>,
    pub flags: HashMap<PostId, bool>,
}

/// Builds a draft and flag for every post from the current user's review.
/// Anonymous sessions get no drafts at all.
pub fn seed(posts: &[Post], current_user: Option<&UserId>) -> Seeded {
    let Some(user) = current_user else {
        return Seeded::default();
    };

    let mut seeded = Seeded {
        drafts: HashMap::with_capacity(posts.len()),
        flags: HashMap::with_capacity(posts.len()),
    };
    for post in posts {
        let (draft, flag) = seed_one(post.id, &post.reviews, user);
        seeded.drafts.insert(post.id, draft);
        seeded.flags.insert(post.id, flag);
    }
    seeded
}

fn seed_one(post_id: PostId, reviews: &ReviewAggregate, user: &UserId) -> (ReviewDraft, bool) {
    if !reviews.is_consistent() {
        tracing::warn!(
            post_id,
            count = reviews.count,
            len = reviews.ratings.len(),
            "review aggregate violates the one-review-per-user contract"
        );
    }
    match reviews.review_by(user) {
        Some(review) => (ReviewDraft::from_review(review), true),
        None => (ReviewDraft::default(), false),
    }
}

/// Replaces the post's aggregate wholesale with the server's and re-derives
/// the draft and flag for that post.
pub fn apply_server_result(
    post: &mut Post,
    server_aggregate: ReviewAggregate,
    current_user: &UserId,
) -> (ReviewDraft, bool) {
    post.reviews = server_aggregate;
    seed_one(post.id, &post.reviews, current_user)
}
