//! In-memory store for tests and `STORAGE_BACKEND=memory` runs.
//!
//! The note table is a `std::sync::RwLock<HashMap<..>>` that is only held
//! for lookups and inserts, never across an await. Each note sits behind its
//! own `tokio::sync::Mutex`; rating writes and aggregate rewrites take that
//! mutex, so two notes never share a lock. A deleted note is flagged inside
//! its mutex before leaving the map, which stops a writer that fetched the
//! entry earlier from resurrecting it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loosenotes_core::{
    Attachment, Note, NoteId, NoteUpdate, Page, PageRequest, Rating, RatingAggregate, RatingId,
    RatingInput, Requester, ShareToken, UserId,
};
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::repository::{NoteStore, RatingStore};

#[derive(Debug)]
struct NoteEntry {
    note: Note,
    ratings: Vec<Rating>,
    attachments: Vec<Attachment>,
    deleted: bool,
}

impl NoteEntry {
    fn refresh_aggregate(&mut self) -> RatingAggregate {
        let aggregate = RatingAggregate::from_values(self.ratings.iter().map(|r| r.value));
        self.note.aggregate = aggregate;
        aggregate
    }
}

type SharedEntry = Arc<Mutex<NoteEntry>>;

/// Note and rating store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    notes: RwLock<HashMap<NoteId, SharedEntry>>,
    /// Which note each rating belongs to.
    rating_index: RwLock<HashMap<RatingId, NoteId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: NoteId) -> StoreResult<Option<SharedEntry>> {
        let notes = self.notes.read().map_err(|_| StoreError::Poisoned)?;
        Ok(notes.get(&id).cloned())
    }

    fn require_entry(&self, id: NoteId) -> StoreResult<SharedEntry> {
        self.entry(id)?
            .ok_or(StoreError::NoteNotFound(*id.as_uuid()))
    }

    fn all_entries(&self) -> StoreResult<Vec<SharedEntry>> {
        let notes = self.notes.read().map_err(|_| StoreError::Poisoned)?;
        Ok(notes.values().cloned().collect())
    }

    fn index_rating(&self, rating: RatingId, note: NoteId) -> StoreResult<()> {
        self.rating_index
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(rating, note);
        Ok(())
    }

    fn unindex_ratings(&self, ids: impl IntoIterator<Item = RatingId>) -> StoreResult<()> {
        let mut index = self.rating_index.write().map_err(|_| StoreError::Poisoned)?;
        for id in ids {
            index.remove(&id);
        }
        Ok(())
    }

    fn note_of_rating(&self, id: RatingId) -> StoreResult<Option<NoteId>> {
        let index = self.rating_index.read().map_err(|_| StoreError::Poisoned)?;
        Ok(index.get(&id).copied())
    }

    /// Snapshot every live note, then filter and order.
    async fn collect_notes<F>(&self, mut keep: F) -> StoreResult<Vec<Note>>
    where
        F: FnMut(&Note) -> bool + Send,
    {
        let mut out = Vec::new();
        for entry in self.all_entries()? {
            let guard = entry.lock().await;
            if !guard.deleted && keep(&guard.note) {
                out.push(guard.note.clone());
            }
        }
        Ok(out)
    }

    async fn collect_ratings<F>(&self, mut keep: F) -> StoreResult<Vec<Rating>>
    where
        F: FnMut(&Rating) -> bool + Send,
    {
        let mut out = Vec::new();
        for entry in self.all_entries()? {
            let guard = entry.lock().await;
            if !guard.deleted {
                out.extend(guard.ratings.iter().filter(|r| keep(r)).cloned());
            }
        }
        Ok(out)
    }
}

fn is_visible(note: &Note, viewer: Option<&Requester>) -> bool {
    match viewer {
        Some(r) if r.is_admin() => true,
        Some(r) => note.is_public || note.is_owned_by(r.user_id),
        None => note.is_public,
    }
}

fn newest_notes_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

fn newest_ratings_first(ratings: &mut [Rating]) {
    ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn insert_note(&self, note: &Note) -> StoreResult<()> {
        let entry = NoteEntry {
            note: note.clone(),
            ratings: Vec::new(),
            attachments: Vec::new(),
            deleted: false,
        };
        self.notes
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(note.id, Arc::new(Mutex::new(entry)));
        Ok(())
    }

    async fn get_note(&self, id: NoteId) -> StoreResult<Option<Note>> {
        let Some(entry) = self.entry(id)? else {
            return Ok(None);
        };
        let guard = entry.lock().await;
        Ok((!guard.deleted).then(|| guard.note.clone()))
    }

    async fn update_note(
        &self,
        id: NoteId,
        update: &NoteUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Note> {
        let entry = self.require_entry(id)?;
        let mut guard = entry.lock().await;
        if guard.deleted {
            return Err(StoreError::NoteNotFound(*id.as_uuid()));
        }
        update.apply_to(&mut guard.note, now);
        Ok(guard.note.clone())
    }

    async fn record_view(&self, id: NoteId) -> StoreResult<u64> {
        let entry = self.require_entry(id)?;
        let mut guard = entry.lock().await;
        if guard.deleted {
            return Err(StoreError::NoteNotFound(*id.as_uuid()));
        }
        guard.note.view_count += 1;
        Ok(guard.note.view_count)
    }

    async fn set_share_token(&self, id: NoteId, share: Option<&ShareToken>) -> StoreResult<()> {
        let entry = self.require_entry(id)?;
        let mut guard = entry.lock().await;
        if guard.deleted {
            return Err(StoreError::NoteNotFound(*id.as_uuid()));
        }
        guard.note.share = share.cloned();
        Ok(())
    }

    async fn set_owner(
        &self,
        id: NoteId,
        owner: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<Note> {
        let entry = self.require_entry(id)?;
        let mut guard = entry.lock().await;
        if guard.deleted {
            return Err(StoreError::NoteNotFound(*id.as_uuid()));
        }
        guard.note.owner_id = owner;
        guard.note.updated_at = now;
        Ok(guard.note.clone())
    }

    async fn list_visible_notes(
        &self,
        viewer: Option<&Requester>,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        let mut notes = self.collect_notes(|n| is_visible(n, viewer)).await?;
        newest_notes_first(&mut notes);
        Ok(Page::from_sorted(notes, page))
    }

    async fn list_top_rated(&self, page: PageRequest) -> StoreResult<Page<Note>> {
        let mut notes = self
            .collect_notes(|n| n.is_public && !n.aggregate.is_empty())
            .await?;
        notes.sort_by(|a, b| {
            b.aggregate
                .average
                .total_cmp(&a.aggregate.average)
                .then(b.aggregate.count.cmp(&a.aggregate.count))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(Page::from_sorted(notes, page))
    }

    async fn search_notes(
        &self,
        query: &str,
        viewer: Option<&Requester>,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        let needle = query.to_lowercase();
        let mut notes = self
            .collect_notes(|n| {
                is_visible(n, viewer)
                    && (n.title.to_lowercase().contains(&needle)
                        || n.content.to_lowercase().contains(&needle))
            })
            .await?;
        newest_notes_first(&mut notes);
        Ok(Page::from_sorted(notes, page))
    }

    async fn list_note_ids(&self) -> StoreResult<Vec<NoteId>> {
        let mut notes = self.collect_notes(|_| true).await?;
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(notes.into_iter().map(|n| n.id).collect())
    }

    async fn insert_attachment(&self, attachment: &Attachment) -> StoreResult<()> {
        let entry = self.require_entry(attachment.note_id)?;
        let mut guard = entry.lock().await;
        if guard.deleted {
            return Err(StoreError::NoteNotFound(*attachment.note_id.as_uuid()));
        }
        guard.attachments.push(attachment.clone());
        Ok(())
    }

    async fn list_attachments(&self, note_id: NoteId) -> StoreResult<Vec<Attachment>> {
        let Some(entry) = self.entry(note_id)? else {
            return Ok(Vec::new());
        };
        let guard = entry.lock().await;
        if guard.deleted {
            return Ok(Vec::new());
        }
        Ok(guard.attachments.clone())
    }

    async fn delete_note_cascade(&self, id: NoteId) -> StoreResult<bool> {
        let Some(entry) = self.entry(id)? else {
            return Ok(false);
        };
        let mut guard = entry.lock().await;
        if guard.deleted {
            return Ok(false);
        }

        guard.deleted = true;
        let rating_ids: Vec<RatingId> = guard.ratings.drain(..).map(|r| r.id).collect();
        guard.attachments.clear();

        self.unindex_ratings(rating_ids)?;
        self.notes
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn upsert_rating(
        &self,
        input: &RatingInput,
        now: DateTime<Utc>,
    ) -> StoreResult<(Rating, RatingAggregate)> {
        let entry = self.require_entry(input.note_id)?;
        let mut guard = entry.lock().await;
        if guard.deleted {
            return Err(StoreError::NoteNotFound(*input.note_id.as_uuid()));
        }

        let existing = guard
            .ratings
            .iter()
            .position(|r| r.user_id == input.user_id);

        let rating = match existing {
            Some(pos) => {
                let existing = &mut guard.ratings[pos];
                existing.value = input.value;
                existing.comment.clone_from(&input.comment);
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let rating = Rating {
                    id: RatingId::new(),
                    note_id: input.note_id,
                    user_id: input.user_id,
                    value: input.value,
                    comment: input.comment.clone(),
                    created_at: now,
                    updated_at: now,
                };
                self.index_rating(rating.id, rating.note_id)?;
                guard.ratings.push(rating.clone());
                rating
            }
        };

        let aggregate = guard.refresh_aggregate();
        Ok((rating, aggregate))
    }

    async fn get_rating(&self, id: RatingId) -> StoreResult<Option<Rating>> {
        let Some(note_id) = self.note_of_rating(id)? else {
            return Ok(None);
        };
        let Some(entry) = self.entry(note_id)? else {
            return Ok(None);
        };
        let guard = entry.lock().await;
        Ok(guard.ratings.iter().find(|r| r.id == id).cloned())
    }

    async fn delete_rating(&self, id: RatingId) -> StoreResult<Option<(Rating, RatingAggregate)>> {
        let Some(note_id) = self.note_of_rating(id)? else {
            return Ok(None);
        };
        let Some(entry) = self.entry(note_id)? else {
            return Ok(None);
        };
        let mut guard = entry.lock().await;
        let Some(pos) = guard.ratings.iter().position(|r| r.id == id) else {
            return Ok(None);
        };

        let removed = guard.ratings.remove(pos);
        self.unindex_ratings([id])?;
        let aggregate = guard.refresh_aggregate();
        Ok(Some((removed, aggregate)))
    }

    async fn recompute_aggregate(&self, note_id: NoteId) -> StoreResult<RatingAggregate> {
        let entry = self.require_entry(note_id)?;
        let mut guard = entry.lock().await;
        if guard.deleted {
            return Err(StoreError::NoteNotFound(*note_id.as_uuid()));
        }
        Ok(guard.refresh_aggregate())
    }

    async fn list_note_ratings(
        &self,
        note_id: NoteId,
        page: PageRequest,
    ) -> StoreResult<Page<Rating>> {
        let mut ratings = match self.entry(note_id)? {
            Some(entry) => {
                let guard = entry.lock().await;
                if guard.deleted { Vec::new() } else { guard.ratings.clone() }
            }
            None => Vec::new(),
        };
        newest_ratings_first(&mut ratings);
        Ok(Page::from_sorted(ratings, page))
    }

    async fn list_user_ratings(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> StoreResult<Page<Rating>> {
        let mut ratings = self.collect_ratings(|r| r.user_id == user_id).await?;
        newest_ratings_first(&mut ratings);
        Ok(Page::from_sorted(ratings, page))
    }
}
