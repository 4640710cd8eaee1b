//! Database models for the storage layer.
//!
//! These types map directly to database rows and are used for
//! sqlx queries. They are separate from the domain types in
//! loosenotes-core so column types can follow PostgreSQL.

use chrono::{DateTime, Utc};
use loosenotes_core::{
    Attachment, AttachmentId, Note, NoteId, Rating, RatingAggregate, RatingId, ShareToken, UserId,
};
use sqlx::FromRow;
use uuid::Uuid;

/// Columns selected for every [`NoteRow`] query.
pub const NOTE_COLUMNS: &str = "id, owner_id, title, content, is_public, share_token, \
     share_expires_at, view_count, average_rating, rating_count, created_at, updated_at";

/// Columns selected for every [`RatingRow`] query.
pub const RATING_COLUMNS: &str = "id, note_id, user_id, value, comment, created_at, updated_at";

/// Database row for the `notes` table.
#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub share_token: Option<String>,
    pub share_expires_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub average_rating: f64,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        // The table constraint keeps the pair together.
        let share = match (row.share_token, row.share_expires_at) {
            (Some(value), Some(expires_at)) => Some(ShareToken { value, expires_at }),
            _ => None,
        };

        Note {
            id: NoteId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            title: row.title,
            content: row.content,
            is_public: row.is_public,
            share,
            view_count: row.view_count.max(0) as u64,
            aggregate: RatingAggregate {
                average: row.average_rating,
                count: row.rating_count.max(0) as u32,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for the `ratings` table.
#[derive(Debug, Clone, FromRow)]
pub struct RatingRow {
    pub id: Uuid,
    pub note_id: Uuid,
    pub user_id: Uuid,
    pub value: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Rating {
            id: RatingId::from_uuid(row.id),
            note_id: NoteId::from_uuid(row.note_id),
            user_id: UserId::from_uuid(row.user_id),
            // CHECK (value BETWEEN 1 AND 5)
            value: row.value.clamp(1, 5) as u8,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for the `note_attachments` table.
#[derive(Debug, Clone, FromRow)]
pub struct AttachmentRow {
    pub id: Uuid,
    pub note_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub storage_path: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Attachment {
            id: AttachmentId::from_uuid(row.id),
            note_id: NoteId::from_uuid(row.note_id),
            file_name: row.file_name,
            content_type: row.content_type,
            storage_path: row.storage_path,
            size_bytes: row.size_bytes.max(0) as u64,
            uploaded_at: row.uploaded_at,
        }
    }
}

/// `SUM(value)` and `COUNT(*)` over one note's ratings.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct RatingTotalsRow {
    pub sum: i64,
    pub count: i64,
}

impl From<RatingTotalsRow> for RatingAggregate {
    fn from(row: RatingTotalsRow) -> Self {
        let count = row.count.clamp(0, i64::from(u32::MAX)) as u32;
        RatingAggregate::from_totals(row.sum.max(0) as u64, count)
    }
}
