//! Note access service: every caller-facing operation on notes and ratings.
//!
//! Each operation follows the same shape: load the note (`NotFound` if
//! absent), ask [`AccessPolicy`] (`Forbidden` / `Unauthenticated` on deny),
//! then perform the mutation through the store, the rating aggregator or the
//! share token issuer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use loosenotes_core::validation::{validate_content, validate_query, validate_title};
use loosenotes_core::{
    AccessPolicy, Attachment, AttachmentId, NewNote, Note, NoteId, NoteUpdate, Page, PageRequest,
    Rating, RatingAggregate, RatingId, Requester, UserId, ValidationError,
};
use loosenotes_store::{NoteStore, RatingStore};
use serde::Serialize;

use crate::aggregator::{DEFAULT_MAX_WRITE_RETRIES, RatingAggregator};
use crate::error::{AccessError, AccessResult};
use crate::files::FileStorage;
use crate::share::{DEFAULT_SHARE_TTL_DAYS, ShareTokenIssuer};

/// Tunables for [`NoteAccessService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL used to build share links, without a trailing slash.
    pub public_base_url: String,
    /// Token lifetime when the caller does not pass one.
    pub default_share_ttl_days: u32,
    /// Retries after a storage write conflict before giving up.
    pub max_write_retries: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000".to_string(),
            default_share_ttl_days: DEFAULT_SHARE_TTL_DAYS,
            max_write_retries: DEFAULT_MAX_WRITE_RETRIES,
        }
    }
}

/// A note as returned to a reader.
#[derive(Debug, Clone, Serialize)]
pub struct NoteView {
    pub note: Note,
    pub attachments: Vec<Attachment>,
}

/// A rating plus the note aggregate after the write.
#[derive(Debug, Clone, Serialize)]
pub struct RatedNote {
    pub rating: Rating,
    pub aggregate: RatingAggregate,
}

/// A freshly issued share link.
#[derive(Debug, Clone, Serialize)]
pub struct ShareLink {
    pub token: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of an aggregate reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub notes_checked: usize,
    pub notes_repaired: usize,
}

/// Orchestrates access checks and storage for notes, ratings and shares.
#[derive(Clone)]
pub struct NoteAccessService {
    notes: Arc<dyn NoteStore>,
    aggregator: RatingAggregator,
    shares: ShareTokenIssuer,
    files: Arc<dyn FileStorage>,
    config: ServiceConfig,
}

impl std::fmt::Debug for NoteAccessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteAccessService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NoteAccessService {
    /// Build the service over a store implementing both storage traits.
    pub fn new<S>(store: Arc<S>, files: Arc<dyn FileStorage>, config: ServiceConfig) -> Self
    where
        S: NoteStore + RatingStore + 'static,
    {
        let notes: Arc<dyn NoteStore> = store.clone();
        let ratings: Arc<dyn RatingStore> = store;
        Self::from_parts(notes, ratings, files, config)
    }

    /// Build the service from separately supplied stores.
    pub fn from_parts(
        notes: Arc<dyn NoteStore>,
        ratings: Arc<dyn RatingStore>,
        files: Arc<dyn FileStorage>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            aggregator: RatingAggregator::new(ratings, config.max_write_retries),
            shares: ShareTokenIssuer::new(notes.clone()),
            notes,
            files,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &RatingAggregator {
        &self.aggregator
    }

    async fn load_note(&self, note_id: NoteId) -> AccessResult<Note> {
        self.notes
            .get_note(note_id)
            .await?
            .ok_or(AccessError::NotFound("note"))
    }

    fn ensure_readable(
        note: &Note,
        requester: Option<&Requester>,
        share_token: Option<&str>,
    ) -> AccessResult<()> {
        if AccessPolicy::can_read(note, requester, share_token, Utc::now()).is_deny() {
            tracing::warn!(
                note_id = %note.id,
                user_id = ?requester.map(|r| r.user_id.to_string()),
                with_token = share_token.is_some(),
                "read denied"
            );
            return Err(AccessError::Forbidden);
        }
        Ok(())
    }

    fn ensure_writable(note: &Note, requester: &Requester) -> AccessResult<()> {
        if AccessPolicy::can_write(note, requester).is_deny() {
            tracing::warn!(note_id = %note.id, user_id = %requester.user_id, "write denied");
            return Err(AccessError::Forbidden);
        }
        Ok(())
    }

    // ========================================================================
    // Notes
    // ========================================================================

    /// Create a note owned by the requester. Aggregate fields start at zero.
    pub async fn create_note(&self, requester: &Requester, draft: NewNote) -> AccessResult<Note> {
        let title = validate_title(&draft.title)?;
        validate_content(&draft.content)?;

        let note = Note::new(
            requester.user_id,
            NewNote {
                title,
                content: draft.content,
                is_public: draft.is_public,
            },
            Utc::now(),
        );
        self.notes.insert_note(&note).await?;

        tracing::info!(note_id = %note.id, user_id = %requester.user_id, "note created");
        Ok(note)
    }

    /// Read a note, counting the view.
    ///
    /// Unknown IDs are `NotFound`; existing notes the caller may not read are
    /// `Forbidden`.
    pub async fn get_note(
        &self,
        note_id: NoteId,
        requester: Option<&Requester>,
        share_token: Option<&str>,
    ) -> AccessResult<NoteView> {
        let mut note = self.load_note(note_id).await?;
        Self::ensure_readable(&note, requester, share_token)?;

        note.view_count = self.notes.record_view(note_id).await?;
        let attachments = self.notes.list_attachments(note_id).await?;

        tracing::debug!(note_id = %note_id, view_count = note.view_count, "note read");
        Ok(NoteView { note, attachments })
    }

    /// Change title, content or visibility.
    pub async fn update_note(
        &self,
        note_id: NoteId,
        requester: &Requester,
        mut update: NoteUpdate,
    ) -> AccessResult<Note> {
        if update.is_empty() {
            return Err(ValidationError::EmptyUpdate.into());
        }
        if let Some(title) = update.title.as_deref() {
            update.title = Some(validate_title(title)?);
        }
        if let Some(content) = update.content.as_deref() {
            validate_content(content)?;
        }

        let note = self.load_note(note_id).await?;
        Self::ensure_writable(&note, requester)?;

        let updated = self.notes.update_note(note_id, &update, Utc::now()).await?;
        tracing::info!(note_id = %note_id, user_id = %requester.user_id, "note updated");
        Ok(updated)
    }

    /// Notes the caller may list, newest first.
    pub async fn list_notes(
        &self,
        requester: Option<&Requester>,
        page: PageRequest,
    ) -> AccessResult<Page<Note>> {
        Ok(self.notes.list_visible_notes(requester, page).await?)
    }

    /// Public notes with ratings, best first.
    pub async fn top_rated(&self, page: PageRequest) -> AccessResult<Page<Note>> {
        Ok(self.notes.list_top_rated(page).await?)
    }

    /// Substring search over title and content among visible notes.
    pub async fn search(
        &self,
        query: &str,
        requester: Option<&Requester>,
        page: PageRequest,
    ) -> AccessResult<Page<Note>> {
        let query = validate_query(query)?;
        Ok(self.notes.search_notes(query, requester, page).await?)
    }

    /// Delete a note with its ratings and attachments.
    ///
    /// Attachment files go first; a missing file is fine, any other file
    /// error aborts before the rows are touched. Running this again after a
    /// partial failure finishes the job.
    pub async fn delete_note(&self, note_id: NoteId, requester: &Requester) -> AccessResult<()> {
        let note = self.load_note(note_id).await?;
        Self::ensure_writable(&note, requester)?;

        let attachments = self.notes.list_attachments(note_id).await?;
        for attachment in &attachments {
            if let Err(e) = self.files.delete(&attachment.storage_path).await {
                tracing::error!(
                    note_id = %note_id,
                    attachment_id = %attachment.id,
                    error = %e,
                    "failed to delete attachment file"
                );
                return Err(e.into());
            }
        }

        let removed = self.notes.delete_note_cascade(note_id).await?;
        tracing::info!(
            note_id = %note_id,
            user_id = %requester.user_id,
            attachments = attachments.len(),
            removed,
            "note deleted"
        );
        Ok(())
    }

    /// Attach a file to a note the caller may write.
    pub async fn add_attachment(
        &self,
        note_id: NoteId,
        requester: &Requester,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> AccessResult<Attachment> {
        let note = self.load_note(note_id).await?;
        Self::ensure_writable(&note, requester)?;

        let id = AttachmentId::new();
        let attachment = Attachment {
            id,
            note_id,
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            storage_path: format!("{note_id}/{id}"),
            size_bytes: bytes.len() as u64,
            uploaded_at: Utc::now(),
        };

        self.files.save(&attachment.storage_path, bytes).await?;
        if let Err(e) = self.notes.insert_attachment(&attachment).await {
            // Keep disk and metadata in step: no row, no file.
            if let Err(cleanup) = self.files.delete(&attachment.storage_path).await {
                tracing::warn!(
                    note_id = %note_id,
                    storage_path = %attachment.storage_path,
                    error = %cleanup,
                    "failed to remove orphaned attachment file"
                );
            }
            return Err(e.into());
        }

        tracing::info!(note_id = %note_id, attachment_id = %id, "attachment added");
        Ok(attachment)
    }

    /// Reassign a note to another user. Admins only.
    pub async fn change_owner(
        &self,
        note_id: NoteId,
        requester: &Requester,
        new_owner: UserId,
    ) -> AccessResult<Note> {
        if !requester.is_admin() {
            tracing::warn!(note_id = %note_id, user_id = %requester.user_id, "owner change denied");
            return Err(AccessError::Forbidden);
        }

        let note = self.notes.set_owner(note_id, new_owner, Utc::now()).await?;
        tracing::info!(
            note_id = %note_id,
            admin_id = %requester.user_id,
            new_owner = %new_owner,
            "note owner changed"
        );
        Ok(note)
    }

    // ========================================================================
    // Ratings
    // ========================================================================

    /// Rate a note, replacing the caller's earlier rating if any.
    pub async fn rate_note(
        &self,
        note_id: NoteId,
        requester: Option<&Requester>,
        value: i64,
        comment: Option<String>,
    ) -> AccessResult<RatedNote> {
        let note = self.load_note(note_id).await?;

        let Some(requester) = requester else {
            return Err(AccessError::Unauthenticated);
        };
        if AccessPolicy::can_rate(&note, Some(requester), Utc::now()).is_deny() {
            tracing::warn!(note_id = %note_id, user_id = %requester.user_id, "rating denied");
            return Err(AccessError::Forbidden);
        }

        let (rating, aggregate) = self
            .aggregator
            .upsert(note_id, requester.user_id, value, comment)
            .await?;
        Ok(RatedNote { rating, aggregate })
    }

    /// Ratings for a note the caller may read, newest first.
    pub async fn list_ratings(
        &self,
        note_id: NoteId,
        requester: Option<&Requester>,
        share_token: Option<&str>,
        page: PageRequest,
    ) -> AccessResult<Page<Rating>> {
        let note = self.load_note(note_id).await?;
        Self::ensure_readable(&note, requester, share_token)?;
        Ok(self
            .aggregator
            .store()
            .list_note_ratings(note_id, page)
            .await?)
    }

    /// One rating, if the caller may read its note.
    pub async fn get_rating(
        &self,
        rating_id: RatingId,
        requester: Option<&Requester>,
        share_token: Option<&str>,
    ) -> AccessResult<Rating> {
        let rating = self
            .aggregator
            .store()
            .get_rating(rating_id)
            .await?
            .ok_or(AccessError::NotFound("rating"))?;
        let note = self.load_note(rating.note_id).await?;
        Self::ensure_readable(&note, requester, share_token)?;
        Ok(rating)
    }

    /// Remove a rating (author or admin) and return the refreshed aggregate.
    pub async fn remove_rating(
        &self,
        rating_id: RatingId,
        requester: &Requester,
    ) -> AccessResult<RatingAggregate> {
        let (_, aggregate) = self.aggregator.remove(rating_id, requester).await?;
        Ok(aggregate)
    }

    /// The caller's own ratings, newest first.
    pub async fn user_ratings(
        &self,
        requester: &Requester,
        page: PageRequest,
    ) -> AccessResult<Page<Rating>> {
        Ok(self
            .aggregator
            .store()
            .list_user_ratings(requester.user_id, page)
            .await?)
    }

    /// Recompute every note's aggregate. Admins only.
    pub async fn reconcile_all(&self, requester: &Requester) -> AccessResult<ReconcileReport> {
        if !requester.is_admin() {
            return Err(AccessError::Forbidden);
        }

        let mut report = ReconcileReport {
            notes_checked: 0,
            notes_repaired: 0,
        };
        for note_id in self.notes.list_note_ids().await? {
            let Some(before) = self.notes.get_note(note_id).await? else {
                continue;
            };
            let after = match self.aggregator.recompute(note_id).await {
                Ok(aggregate) => aggregate,
                // Deleted between listing and recompute.
                Err(AccessError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            report.notes_checked += 1;
            if before.aggregate != after {
                report.notes_repaired += 1;
                tracing::warn!(
                    note_id = %note_id,
                    cached_count = before.aggregate.count,
                    actual_count = after.count,
                    "repaired stale aggregate"
                );
            }
        }

        tracing::info!(
            checked = report.notes_checked,
            repaired = report.notes_repaired,
            "aggregate reconciliation finished"
        );
        Ok(report)
    }

    // ========================================================================
    // Share links
    // ========================================================================

    /// Issue a share token and build the link for it.
    pub async fn generate_share_link(
        &self,
        note_id: NoteId,
        requester: &Requester,
        ttl_days: Option<i64>,
    ) -> AccessResult<ShareLink> {
        let note = self.load_note(note_id).await?;
        let ttl = ttl_days.unwrap_or(i64::from(self.config.default_share_ttl_days));

        let token = self.shares.issue(&note, requester, ttl, Utc::now()).await?;
        let url = format!(
            "{}/notes/{}?token={}",
            self.config.public_base_url.trim_end_matches('/'),
            note_id,
            token.value
        );

        Ok(ShareLink {
            token: token.value,
            url,
            expires_at: token.expires_at,
        })
    }

    /// Revoke the note's share token, if any.
    pub async fn revoke_share_link(&self, note_id: NoteId, requester: &Requester) -> AccessResult<()> {
        let note = self.load_note(note_id).await?;
        self.shares.revoke(&note, requester).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::LocalFileStorage;
    use loosenotes_store::MemoryStore;

    struct Fixture {
        service: NoteAccessService,
        store: Arc<MemoryStore>,
        owner: Requester,
        dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let files = Arc::new(LocalFileStorage::new(dir.path()));
        let service = NoteAccessService::new(store.clone(), files, ServiceConfig::default());
        Fixture {
            service,
            store,
            owner: Requester::user(UserId::new()),
            dir,
        }
    }

    fn draft(is_public: bool) -> NewNote {
        NewNote {
            title: "Shopping list".into(),
            content: "eggs".into(),
            is_public,
        }
    }

    // Scenario: private note read by a stranger is forbidden and not counted.
    #[tokio::test]
    async fn private_note_forbidden_to_stranger() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(false)).await.unwrap();
        let stranger = Requester::user(UserId::new());

        let err = f
            .service
            .get_note(note.id, Some(&stranger), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Forbidden));

        let stored = f.store.get_note(note.id).await.unwrap().unwrap();
        assert_eq!(stored.view_count, 0);
    }

    #[tokio::test]
    async fn unknown_note_is_not_found() {
        let f = fixture();
        let err = f.service.get_note(NoteId::new(), None, None).await.unwrap_err();
        assert!(matches!(err, AccessError::NotFound("note")));
    }

    // Scenario: anonymous read of a public note bumps the view count.
    #[tokio::test]
    async fn public_read_increments_views() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(true)).await.unwrap();

        let first = f.service.get_note(note.id, None, None).await.unwrap();
        let second = f.service.get_note(note.id, None, None).await.unwrap();
        assert_eq!(first.note.view_count, 1);
        assert_eq!(second.note.view_count, 2);
    }

    // Scenario: the same user rating twice updates in place.
    #[tokio::test]
    async fn re_rating_updates_in_place() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(true)).await.unwrap();
        let rater = Requester::user(UserId::new());

        let first = f.service.rate_note(note.id, Some(&rater), 5, None).await.unwrap();
        let second = f.service.rate_note(note.id, Some(&rater), 2, None).await.unwrap();

        assert_eq!(first.rating.id, second.rating.id);
        assert_eq!(second.aggregate.count, 1);
        assert_eq!(second.aggregate.average, 2.0);
    }

    // Scenario: two users average out.
    #[tokio::test]
    async fn two_users_average() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(true)).await.unwrap();

        f.service
            .rate_note(note.id, Some(&Requester::user(UserId::new())), 2, None)
            .await
            .unwrap();
        let rated = f
            .service
            .rate_note(note.id, Some(&Requester::user(UserId::new())), 4, None)
            .await
            .unwrap();

        assert_eq!(rated.aggregate.count, 2);
        assert_eq!(rated.aggregate.average, 3.0);
    }

    // Scenario: share, read via token, revoke, read fails.
    #[tokio::test]
    async fn share_and_revoke_round_trip() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(false)).await.unwrap();

        let link = f
            .service
            .generate_share_link(note.id, &f.owner, None)
            .await
            .unwrap();
        assert!(link.url.ends_with(&format!("/notes/{}?token={}", note.id, link.token)));
        assert_eq!(link.token.len(), 64);

        let view = f
            .service
            .get_note(note.id, None, Some(&link.token))
            .await
            .unwrap();
        assert_eq!(view.note.id, note.id);

        f.service.revoke_share_link(note.id, &f.owner).await.unwrap();
        let err = f
            .service
            .get_note(note.id, None, Some(&link.token))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Forbidden));
    }

    // Scenario: out-of-range value is rejected with no state change.
    #[tokio::test]
    async fn out_of_range_rating_is_rejected() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(true)).await.unwrap();
        let rater = Requester::user(UserId::new());

        let err = f
            .service
            .rate_note(note.id, Some(&rater), 6, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Validation(_)));

        let stored = f.store.get_note(note.id).await.unwrap().unwrap();
        assert_eq!(stored.aggregate, RatingAggregate::empty());
    }

    #[tokio::test]
    async fn anonymous_rating_is_unauthenticated() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(true)).await.unwrap();
        let err = f.service.rate_note(note.id, None, 3, None).await.unwrap_err();
        assert!(matches!(err, AccessError::Unauthenticated));
    }

    #[tokio::test]
    async fn share_token_does_not_grant_rating() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(false)).await.unwrap();
        f.service
            .generate_share_link(note.id, &f.owner, Some(1))
            .await
            .unwrap();

        let stranger = Requester::user(UserId::new());
        let err = f
            .service
            .rate_note(note.id, Some(&stranger), 4, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Forbidden));
    }

    #[tokio::test]
    async fn update_requires_write_access() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(true)).await.unwrap();
        let update = NoteUpdate {
            title: Some("Renamed note".into()),
            ..Default::default()
        };

        let stranger = Requester::user(UserId::new());
        assert!(matches!(
            f.service.update_note(note.id, &stranger, update.clone()).await,
            Err(AccessError::Forbidden)
        ));

        let updated = f.service.update_note(note.id, &f.owner, update).await.unwrap();
        assert_eq!(updated.title, "Renamed note");
    }

    #[tokio::test]
    async fn delete_cascades_files_and_ratings() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(true)).await.unwrap();
        let attachment = f
            .service
            .add_attachment(note.id, &f.owner, "a.txt", "text/plain", b"bytes")
            .await
            .unwrap();
        let rated = f
            .service
            .rate_note(note.id, Some(&Requester::user(UserId::new())), 3, None)
            .await
            .unwrap();

        let file = f.dir.path().join(&attachment.storage_path);
        assert!(file.exists());

        // A file removed out-of-band must not block deletion.
        tokio::fs::remove_file(&file).await.unwrap();

        f.service.delete_note(note.id, &f.owner).await.unwrap();
        assert!(f.store.get_note(note.id).await.unwrap().is_none());
        assert!(f.store.get_rating(rated.rating.id).await.unwrap().is_none());
        assert!(matches!(
            f.service.delete_note(note.id, &f.owner).await,
            Err(AccessError::NotFound("note"))
        ));
    }

    /// Delegates to a `MemoryStore` but refuses attachment rows.
    struct RejectAttachments(Arc<MemoryStore>);

    #[async_trait::async_trait]
    impl NoteStore for RejectAttachments {
        async fn insert_note(&self, note: &Note) -> loosenotes_store::StoreResult<()> {
            self.0.insert_note(note).await
        }

        async fn get_note(&self, id: NoteId) -> loosenotes_store::StoreResult<Option<Note>> {
            self.0.get_note(id).await
        }

        async fn update_note(
            &self,
            id: NoteId,
            update: &NoteUpdate,
            now: DateTime<Utc>,
        ) -> loosenotes_store::StoreResult<Note> {
            self.0.update_note(id, update, now).await
        }

        async fn record_view(&self, id: NoteId) -> loosenotes_store::StoreResult<u64> {
            self.0.record_view(id).await
        }

        async fn set_share_token(
            &self,
            id: NoteId,
            share: Option<&loosenotes_core::ShareToken>,
        ) -> loosenotes_store::StoreResult<()> {
            self.0.set_share_token(id, share).await
        }

        async fn set_owner(
            &self,
            id: NoteId,
            owner: UserId,
            now: DateTime<Utc>,
        ) -> loosenotes_store::StoreResult<Note> {
            self.0.set_owner(id, owner, now).await
        }

        async fn list_visible_notes(
            &self,
            viewer: Option<&Requester>,
            page: PageRequest,
        ) -> loosenotes_store::StoreResult<Page<Note>> {
            self.0.list_visible_notes(viewer, page).await
        }

        async fn list_top_rated(
            &self,
            page: PageRequest,
        ) -> loosenotes_store::StoreResult<Page<Note>> {
            self.0.list_top_rated(page).await
        }

        async fn search_notes(
            &self,
            query: &str,
            viewer: Option<&Requester>,
            page: PageRequest,
        ) -> loosenotes_store::StoreResult<Page<Note>> {
            self.0.search_notes(query, viewer, page).await
        }

        async fn list_note_ids(&self) -> loosenotes_store::StoreResult<Vec<NoteId>> {
            self.0.list_note_ids().await
        }

        async fn insert_attachment(
            &self,
            _attachment: &Attachment,
        ) -> loosenotes_store::StoreResult<()> {
            Err(loosenotes_store::StoreError::Poisoned)
        }

        async fn list_attachments(
            &self,
            note_id: NoteId,
        ) -> loosenotes_store::StoreResult<Vec<Attachment>> {
            self.0.list_attachments(note_id).await
        }

        async fn delete_note_cascade(&self, id: NoteId) -> loosenotes_store::StoreResult<bool> {
            self.0.delete_note_cascade(id).await
        }
    }

    #[tokio::test]
    async fn failed_attachment_row_removes_saved_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let service = NoteAccessService::from_parts(
            Arc::new(RejectAttachments(store.clone())),
            store,
            Arc::new(LocalFileStorage::new(dir.path())),
            ServiceConfig::default(),
        );
        let owner = Requester::user(UserId::new());
        let note = service.create_note(&owner, draft(false)).await.unwrap();

        let err = service
            .add_attachment(note.id, &owner, "a.txt", "text/plain", b"bytes")
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Storage(_)));

        let note_dir = dir.path().join(note.id.to_string());
        let mut leftover = Vec::new();
        if note_dir.exists() {
            let mut entries = tokio::fs::read_dir(&note_dir).await.unwrap();
            while let Some(entry) = entries.next_entry().await.unwrap() {
                leftover.push(entry.path());
            }
        }
        assert!(leftover.is_empty(), "orphaned files: {leftover:?}");
        let view = service.get_note(note.id, Some(&owner), None).await.unwrap();
        assert!(view.attachments.is_empty());
    }

    #[tokio::test]
    async fn stranger_cannot_delete() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(true)).await.unwrap();
        let stranger = Requester::user(UserId::new());
        assert!(matches!(
            f.service.delete_note(note.id, &stranger).await,
            Err(AccessError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn only_admin_changes_owner() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(false)).await.unwrap();
        let new_owner = UserId::new();

        assert!(matches!(
            f.service.change_owner(note.id, &f.owner, new_owner).await,
            Err(AccessError::Forbidden)
        ));

        let admin = Requester::admin(UserId::new());
        let moved = f.service.change_owner(note.id, &admin, new_owner).await.unwrap();
        assert_eq!(moved.owner_id, new_owner);

        assert!(matches!(
            f.service.change_owner(NoteId::new(), &admin, new_owner).await,
            Err(AccessError::NotFound("note"))
        ));
    }

    #[tokio::test]
    async fn list_ratings_requires_read_access() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(false)).await.unwrap();
        f.service
            .rate_note(note.id, Some(&f.owner), 5, Some("mine".into()))
            .await
            .unwrap();

        assert!(matches!(
            f.service
                .list_ratings(note.id, None, None, PageRequest::default())
                .await,
            Err(AccessError::Forbidden)
        ));

        let page = f
            .service
            .list_ratings(note.id, Some(&f.owner), None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].comment.as_deref(), Some("mine"));
    }

    #[tokio::test]
    async fn reconcile_repairs_nothing_when_consistent() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(true)).await.unwrap();
        f.service
            .rate_note(note.id, Some(&Requester::user(UserId::new())), 4, None)
            .await
            .unwrap();

        let admin = Requester::admin(UserId::new());
        let report = f.service.reconcile_all(&admin).await.unwrap();
        assert_eq!(report.notes_checked, 1);
        assert_eq!(report.notes_repaired, 0);

        assert!(matches!(
            f.service.reconcile_all(&f.owner).await,
            Err(AccessError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn concurrent_ratings_keep_exact_aggregate() {
        let f = fixture();
        let note = f.service.create_note(&f.owner, draft(true)).await.unwrap();
        let service = Arc::new(f.service.clone());

        let values: Vec<i64> = (0..40).map(|i| i % 5 + 1).collect();
        let writes = values.iter().map(|&v| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let rater = Requester::user(UserId::new());
                service.rate_note(note.id, Some(&rater), v, None).await
            })
        });
        for joined in futures::future::join_all(writes).await {
            joined.unwrap().unwrap();
        }

        let stored = f.store.get_note(note.id).await.unwrap().unwrap();
        let expected = RatingAggregate::from_values(values.iter().map(|&v| v as u8));
        assert_eq!(stored.aggregate, expected);
        assert_eq!(stored.aggregate.count, 40);
    }
}
