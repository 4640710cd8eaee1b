//! Rating aggregation: validated writes that keep the note aggregate exact.
//!
//! The store does the heavy lifting (one critical section per note covering
//! the rating write and the aggregate rewrite). This layer validates input,
//! enforces who may remove a rating, and retries writes that lost a race.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use loosenotes_core::validation::{validate_comment, validate_rating_value};
use loosenotes_core::{NoteId, Rating, RatingAggregate, RatingId, RatingInput, Requester, UserId};
use loosenotes_store::{RatingStore, StoreError, StoreResult};

use crate::error::{AccessError, AccessResult};

/// Default number of retries after a write conflict.
pub const DEFAULT_MAX_WRITE_RETRIES: u32 = 3;

/// Drives rating writes through a [`RatingStore`].
#[derive(Clone)]
pub struct RatingAggregator {
    ratings: Arc<dyn RatingStore>,
    max_write_retries: u32,
}

impl RatingAggregator {
    pub fn new(ratings: Arc<dyn RatingStore>, max_write_retries: u32) -> Self {
        Self {
            ratings,
            max_write_retries,
        }
    }

    pub fn store(&self) -> &Arc<dyn RatingStore> {
        &self.ratings
    }

    /// Insert or update `user_id`'s rating of `note_id`.
    ///
    /// Validation happens before any write, so a rejected value leaves the
    /// stored ratings and aggregate untouched.
    pub async fn upsert(
        &self,
        note_id: NoteId,
        user_id: UserId,
        value: i64,
        comment: Option<String>,
    ) -> AccessResult<(Rating, RatingAggregate)> {
        let input = RatingInput {
            note_id,
            user_id,
            value: validate_rating_value(value)?,
            comment: validate_comment(comment)?,
        };

        let (rating, aggregate) = self
            .with_retries(|| self.ratings.upsert_rating(&input, Utc::now()))
            .await?;

        tracing::info!(
            note_id = %note_id,
            user_id = %user_id,
            rating_id = %rating.id,
            value = rating.value,
            rating_count = aggregate.count,
            average_rating = aggregate.average,
            "rating upserted"
        );
        Ok((rating, aggregate))
    }

    /// Remove a rating. Only its author or an admin may do this.
    pub async fn remove(
        &self,
        rating_id: RatingId,
        requester: &Requester,
    ) -> AccessResult<(Rating, RatingAggregate)> {
        let rating = self
            .ratings
            .get_rating(rating_id)
            .await?
            .ok_or(AccessError::NotFound("rating"))?;

        if rating.user_id != requester.user_id && !requester.is_admin() {
            tracing::warn!(
                rating_id = %rating_id,
                user_id = %requester.user_id,
                "rating removal denied"
            );
            return Err(AccessError::Forbidden);
        }

        let (removed, aggregate) = self
            .with_retries(|| self.ratings.delete_rating(rating_id))
            .await?
            .ok_or(AccessError::NotFound("rating"))?;

        tracing::info!(
            note_id = %removed.note_id,
            rating_id = %rating_id,
            rating_count = aggregate.count,
            "rating removed"
        );
        Ok((removed, aggregate))
    }

    /// Recompute and store a note's aggregate. Safe to run any number of times.
    pub async fn recompute(&self, note_id: NoteId) -> AccessResult<RatingAggregate> {
        let aggregate = self
            .with_retries(|| self.ratings.recompute_aggregate(note_id))
            .await?;
        tracing::debug!(note_id = %note_id, rating_count = aggregate.count, "aggregate recomputed");
        Ok(aggregate)
    }

    async fn with_retries<T, F, Fut>(&self, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(StoreError::Conflict(reason)) if attempt < self.max_write_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, %reason, "write conflict, retrying");
                }
                other => return other,
            }
        }
    }
}
