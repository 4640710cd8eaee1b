//! Storage traits consumed by the service layer.
//!
//! Both adapters ([`crate::PgStore`] and [`crate::MemoryStore`]) implement
//! [`NoteStore`] and [`RatingStore`]. The traits are object safe so the
//! service can hold `Arc<dyn NoteStore>` and `Arc<dyn RatingStore>`.
//!
//! # Rating writes
//!
//! `upsert_rating`, `delete_rating` and `recompute_aggregate` each run the
//! rating mutation and the aggregate rewrite inside one per-note critical
//! section (a row lock in PostgreSQL, a per-note mutex in memory). Writes to
//! different notes never contend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loosenotes_core::{
    Attachment, Note, NoteId, NoteUpdate, Page, PageRequest, Rating, RatingAggregate, RatingId,
    RatingInput, Requester, ShareToken, UserId,
};

use crate::error::StoreResult;

/// Persistence for notes, their share tokens and attachment metadata.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a freshly created note.
    async fn insert_note(&self, note: &Note) -> StoreResult<()>;

    /// Fetch a note by ID.
    async fn get_note(&self, id: NoteId) -> StoreResult<Option<Note>>;

    /// Apply a partial update. Fails with `NoteNotFound` if the note is gone.
    async fn update_note(
        &self,
        id: NoteId,
        update: &NoteUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Note>;

    /// Atomically add one to the view count and return the new count.
    async fn record_view(&self, id: NoteId) -> StoreResult<u64>;

    /// Set or clear the share token as a single value.
    async fn set_share_token(&self, id: NoteId, share: Option<&ShareToken>) -> StoreResult<()>;

    /// Reassign ownership.
    async fn set_owner(&self, id: NoteId, owner: UserId, now: DateTime<Utc>)
    -> StoreResult<Note>;

    /// Notes the viewer may list: everything for admins, own plus public for
    /// users, public only for anonymous callers. Newest first.
    async fn list_visible_notes(
        &self,
        viewer: Option<&Requester>,
        page: PageRequest,
    ) -> StoreResult<Page<Note>>;

    /// Public notes with at least one rating, by average then count, descending.
    async fn list_top_rated(&self, page: PageRequest) -> StoreResult<Page<Note>>;

    /// Case-insensitive substring match on title or content among the
    /// notes [`NoteStore::list_visible_notes`] would return.
    async fn search_notes(
        &self,
        query: &str,
        viewer: Option<&Requester>,
        page: PageRequest,
    ) -> StoreResult<Page<Note>>;

    /// Every note ID, oldest first.
    async fn list_note_ids(&self) -> StoreResult<Vec<NoteId>>;

    async fn insert_attachment(&self, attachment: &Attachment) -> StoreResult<()>;

    async fn list_attachments(&self, note_id: NoteId) -> StoreResult<Vec<Attachment>>;

    /// Delete ratings, attachment rows and the note in one unit.
    ///
    /// Returns `false` when the note was already gone.
    async fn delete_note_cascade(&self, id: NoteId) -> StoreResult<bool>;
}

/// Persistence for ratings and the cached per-note aggregate.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Insert or update the caller's rating and rewrite the note aggregate.
    ///
    /// An existing `(note_id, user_id)` rating keeps its `id` and
    /// `created_at`. Fails with `NoteNotFound` if the note does not exist.
    async fn upsert_rating(
        &self,
        input: &RatingInput,
        now: DateTime<Utc>,
    ) -> StoreResult<(Rating, RatingAggregate)>;

    async fn get_rating(&self, id: RatingId) -> StoreResult<Option<Rating>>;

    /// Delete a rating and rewrite its note's aggregate.
    ///
    /// Returns `None` when the rating does not exist.
    async fn delete_rating(&self, id: RatingId) -> StoreResult<Option<(Rating, RatingAggregate)>>;

    /// Recompute the aggregate from the rating set and store it. Idempotent.
    async fn recompute_aggregate(&self, note_id: NoteId) -> StoreResult<RatingAggregate>;

    /// Ratings for one note, newest first.
    async fn list_note_ratings(
        &self,
        note_id: NoteId,
        page: PageRequest,
    ) -> StoreResult<Page<Rating>>;

    /// Ratings written by one user, newest first.
    async fn list_user_ratings(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> StoreResult<Page<Rating>>;
}
