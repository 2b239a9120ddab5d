//! # PostSynchronizer
//!
//! Owns the post list, the per-post drafts and has-reviewed flags, and the
//! read/write lifecycle against the remote review endpoint.
//!
//! State sits behind a mutex that is never held across an `.await`, so all
//! methods take `&self`. Aggregates only change when a fetch or submit
//! completes; drafts change synchronously on every edit.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::aggregate;
use crate::error::{FetchError, SubmitError, SyncError};
use crate::models::{DraftEdit, Post, PostId, Review, ReviewAggregate, ReviewDraft, ReviewSubmission, UserId};
use crate::reconciler;
use crate::traits::{ErrorSink, ReviewBackend, SessionGate};
use crate::validator;

/// Everything the UI renders after a refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub posts: Vec<Post>,
    pub drafts: HashMap<PostId, ReviewDraft>,
    pub flags: HashMap<PostId, bool>,
    pub current_user: Option<UserId>,
}

#[derive(Default)]
struct SyncState {
    view: Snapshot,
    /// Generation of the refresh whose data is on display.
    applied_generation: u64,
    pending: HashSet<PostId>,
}

pub struct PostSynchronizer {
    session: Arc<dyn SessionGate>,
    backend: Arc<dyn ReviewBackend>,
    sink: Arc<dyn ErrorSink>,
    state: Mutex<SyncState>,
    issued_generation: AtomicU64,
}

/// Releases a post's pending-submit slot, even if the submit future is dropped.
struct PendingGuard<'a> {
    state: &'a Mutex<SyncState>,
    post_id: PostId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().pending.remove(&self.post_id);
    }
}

impl PostSynchronizer {
    pub fn new(
        session: Arc<dyn SessionGate>,
        backend: Arc<dyn ReviewBackend>,
        sink: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            session,
            backend,
            sink,
            state: Mutex::new(SyncState::default()),
            issued_generation: AtomicU64::new(0),
        }
    }

    /// Resolves the session, then the post list, and rebuilds drafts and flags.
    ///
    /// A failed session check degrades to an anonymous view. A failed post
    /// fetch leaves the previous view untouched. When a newer refresh has
    /// already landed, this one's data is discarded and the current view is
    /// returned. A refresh issued before a submit but finishing after it
    /// shows the server's state as of its fetch, which may predate the write.
    pub async fn refresh(&self) -> Result<Snapshot, FetchError> {
        let generation = self.issued_generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, "refresh started");

        let current_user = match self.session.session_status().await {
            Ok(status) => status.current_user(),
            Err(e) => {
                self.report(FetchError::AuthCheckFailed(e));
                None
            }
        };

        let posts = match self.backend.fetch_posts().await {
            Ok(posts) => posts,
            Err(e) => return Err(self.report(FetchError::PostFetchFailed(e))),
        };

        let seeded = reconciler::seed(&posts, current_user.as_ref());

        let mut state = self.state.lock();
        if generation <= state.applied_generation {
            tracing::debug!(
                generation,
                applied = state.applied_generation,
                "refresh superseded by a newer one"
            );
            return Ok(state.view.clone());
        }
        state.applied_generation = generation;
        state.view = Snapshot {
            posts,
            drafts: seeded.drafts,
            flags: seeded.flags,
            current_user,
        };
        tracing::info!(
            generation,
            posts = state.view.posts.len(),
            authenticated = state.view.current_user.is_some(),
            "refresh applied"
        );
        Ok(state.view.clone())
    }

    /// Applies one edit to a post's draft. No validation happens here.
    /// Returns `false` when there is no draft for the post (unknown post or
    /// anonymous session).
    pub fn update_draft(&self, post_id: PostId, edit: DraftEdit) -> bool {
        let mut state = self.state.lock();
        let Some(draft) = state.view.drafts.get_mut(&post_id) else {
            return false;
        };
        match edit {
            DraftEdit::Rating(rating) => draft.rating = rating,
            DraftEdit::Content(content) => draft.content = content,
        }
        true
    }

    /// Submits the current draft for a post and, on success, merges the
    /// server's aggregate back into the view.
    pub async fn submit(&self, post_id: PostId) -> Result<ReviewAggregate, SubmitError> {
        let (draft, user, _guard) = match self.begin_submit(post_id) {
            Ok(begun) => begun,
            Err(e) => return Err(self.report(e)),
        };

        let aggregate = self.submit_review(post_id, &draft, Some(&user)).await?;

        let mut state = self.state.lock();
        let view = &mut state.view;
        match view.posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) if view.current_user.as_ref() == Some(&user) => {
                let (draft, flag) =
                    reconciler::apply_server_result(post, aggregate.clone(), &user);
                view.drafts.insert(post_id, draft);
                view.flags.insert(post_id, flag);
            }
            // A refresh for another session landed meanwhile: drafts and
            // flags belong to that session, only the aggregate is shared.
            Some(post) => {
                post.reviews = aggregate.clone();
                tracing::debug!(post_id, user = %user, "session changed while review was in flight");
            }
            None => tracing::debug!(post_id, "post left the view while its review was in flight"),
        }
        tracing::info!(post_id, count = aggregate.count, "review saved");
        Ok(aggregate)
    }

    fn begin_submit(
        &self,
        post_id: PostId,
    ) -> Result<(ReviewDraft, UserId, PendingGuard<'_>), SubmitError> {
        let mut state = self.state.lock();
        let user = state
            .view
            .current_user
            .clone()
            .ok_or(SubmitError::NotAuthenticated)?;
        let draft = state
            .view
            .drafts
            .get(&post_id)
            .cloned()
            .ok_or(SubmitError::UnknownPost(post_id))?;
        validator::validate(draft.rating)?;
        if !state.pending.insert(post_id) {
            return Err(SubmitError::InFlight(post_id));
        }
        Ok((draft, user, PendingGuard { state: &self.state, post_id }))
    }

    /// Sends one upsert for `draft` without touching engine state.
    ///
    /// Rejects locally, before any network call, when there is no user or
    /// the rating is invalid. Whether the server creates or updates the
    /// review is its decision.
    pub async fn submit_review(
        &self,
        post_id: PostId,
        draft: &ReviewDraft,
        current_user: Option<&UserId>,
    ) -> Result<ReviewAggregate, SubmitError> {
        if current_user.is_none() {
            return Err(self.report(SubmitError::NotAuthenticated));
        }
        let rating = match validator::validate(draft.rating) {
            Ok(rating) => rating,
            Err(e) => return Err(self.report(SubmitError::InvalidRating(e))),
        };

        let body = ReviewSubmission {
            rating: rating.get(),
            content: draft.content.clone(),
        };
        tracing::debug!(post_id, rating = body.rating, "submitting review");
        self.backend
            .put_review(post_id, &body)
            .await
            .map_err(|e| self.report(SubmitError::from(e)))
    }

    fn report<E>(&self, error: E) -> E
    where
        E: Clone + Into<SyncError>,
    {
        self.sink.report(&error.clone().into());
        error
    }

    // ── Read accessors ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().view.clone()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state.lock().view.posts.clone()
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.state.lock().view.current_user.clone()
    }

    pub fn draft(&self, post_id: PostId) -> Option<ReviewDraft> {
        self.state.lock().view.drafts.get(&post_id).cloned()
    }

    pub fn has_reviewed(&self, post_id: PostId) -> bool {
        self.state
            .lock()
            .view
            .flags
            .get(&post_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn aggregate(&self, post_id: PostId) -> Option<ReviewAggregate> {
        self.with_post(post_id, |p| p.reviews.clone())
    }

    pub fn aggregate_label(&self, post_id: PostId) -> Option<String> {
        self.with_post(post_id, |p| aggregate::label(&p.reviews))
    }

    pub fn reviews_by_recency(&self, post_id: PostId) -> Vec<Review> {
        self.with_post(post_id, |p| {
            p.reviews.by_recency().into_iter().cloned().collect()
        })
        .unwrap_or_default()
    }

    pub fn is_pending(&self, post_id: PostId) -> bool {
        self.state.lock().pending.contains(&post_id)
    }

    fn with_post<R>(&self, post_id: PostId, f: impl FnOnce(&Post) -> R) -> Option<R> {
        let state = self.state.lock();
        state.view.posts.iter().find(|p| p.id == post_id).map(f)
    }
}
