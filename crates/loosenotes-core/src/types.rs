//! Core data types for LooseNotes.
//!
//! Notes are owned by exactly one user, may be public or private, and may
//! carry a single share token. Ratings are keyed one-per-user-per-note and
//! roll up into a cached [`RatingAggregate`] stored on the note.
//!
//! All types derive `Debug`, `Clone`, `Serialize`, and `Deserialize` for
//! inspection, copying, and JSON serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::aggregate::RatingAggregate;
use crate::share::ShareToken;

// ============================================================================
// ID Types
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random identifier using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a note.
    NoteId
);

uuid_id!(
    /// Unique identifier for a user, as resolved by the identity provider.
    UserId
);

uuid_id!(
    /// Unique identifier for a rating record.
    RatingId
);

uuid_id!(
    /// Unique identifier for an attachment's metadata row.
    AttachmentId
);

// ============================================================================
// Identity
// ============================================================================

/// Role carried by an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Parses a role claim. Anything other than `admin` is a plain user.
    #[must_use]
    pub fn from_claim(claim: &str) -> Self {
        if claim.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::User
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// An authenticated caller.
///
/// Anonymous callers are represented as `Option<&Requester>::None` at every
/// API boundary rather than by a sentinel identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub user_id: UserId,
    pub role: Role,
}

impl Requester {
    #[must_use]
    pub const fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::User,
        }
    }

    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    /// Whether this identity may bypass ownership checks.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// ============================================================================
// Core Domain Types
// ============================================================================

/// A note and its cached rating aggregate.
///
/// `aggregate` is derived data: it is only ever written by the rating
/// aggregation path and always matches a recomputation over the note's
/// ratings once a rating mutation has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub owner_id: UserId,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    /// Active share token, if one has been issued and not revoked.
    pub share: Option<ShareToken>,
    pub view_count: u64,
    pub aggregate: RatingAggregate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a new note with a zeroed aggregate and no share token.
    #[must_use]
    pub fn new(owner_id: UserId, draft: NewNote, now: DateTime<Utc>) -> Self {
        Self {
            id: NoteId::new(),
            owner_id,
            title: draft.title,
            content: draft.content,
            is_public: draft.is_public,
            share: None,
            view_count: 0,
            aggregate: RatingAggregate::empty(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` is the note's owner. Exact identity match only.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }
}

/// Input for creating a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_public: bool,
}

/// Partial update of a note's user-editable fields.
///
/// Aggregate fields, view count, share token and owner are deliberately
/// absent: clients cannot write them through this path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl NoteUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.is_public.is_none()
    }

    /// Applies the update to `note` in place, bumping `updated_at`.
    pub fn apply_to(&self, note: &mut Note, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            note.title.clone_from(title);
        }
        if let Some(content) = &self.content {
            note.content.clone_from(content);
        }
        if let Some(is_public) = self.is_public {
            note.is_public = is_public;
        }
        note.updated_at = now;
    }
}

/// A single user's rating of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub note_id: NoteId,
    pub user_id: UserId,
    /// Star value, always within 1..=5.
    pub value: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a rating upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingInput {
    pub note_id: NoteId,
    pub user_id: UserId,
    pub value: u8,
    pub comment: Option<String>,
}

/// Metadata for a file attached to a note. File bytes live in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub note_id: NoteId,
    pub file_name: String,
    pub content_type: String,
    /// Location understood by the file-storage collaborator.
    pub storage_path: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

// ============================================================================
// Pagination
// ============================================================================

/// Default page size for listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A 1-based page request, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Builds a page request, clamping `page` to at least 1 and `limit`
    /// into `1..=MAX_PAGE_LIMIT`.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Number of items to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the total count across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
        }
    }

    /// Total number of pages, zero when there are no items.
    #[must_use]
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }

    /// Slices an already-sorted full result set into the requested page.
    #[must_use]
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit as usize)
            .collect();
        Self::new(items, total, request)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewNote {
        NewNote {
            title: "Groceries".to_string(),
            content: "eggs, milk".to_string(),
            is_public: false,
        }
    }

    #[test]
    fn note_id_display_fromstr() {
        let id = NoteId::new();
        let parsed: NoteId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn user_id_serializes_as_bare_uuid() {
        let id = UserId::from_uuid(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }

    #[test]
    fn role_from_claim() {
        assert_eq!(Role::from_claim("admin"), Role::Admin);
        assert_eq!(Role::from_claim("ADMIN"), Role::Admin);
        assert_eq!(Role::from_claim("user"), Role::User);
        assert_eq!(Role::from_claim("superuser"), Role::User);
    }

    #[test]
    fn requester_admin_flag() {
        let id = UserId::new();
        assert!(Requester::admin(id).is_admin());
        assert!(!Requester::user(id).is_admin());
    }

    #[test]
    fn new_note_starts_zeroed() {
        let owner = UserId::new();
        let note = Note::new(owner, draft(), Utc::now());
        assert_eq!(note.owner_id, owner);
        assert_eq!(note.view_count, 0);
        assert_eq!(note.aggregate, RatingAggregate::empty());
        assert!(note.share.is_none());
        assert!(note.is_owned_by(owner));
        assert!(!note.is_owned_by(UserId::new()));
    }

    #[test]
    fn note_update_applies_only_present_fields() {
        let created = Utc::now();
        let mut note = Note::new(UserId::new(), draft(), created);
        let later = created + chrono::Duration::seconds(5);

        NoteUpdate {
            is_public: Some(true),
            ..Default::default()
        }
        .apply_to(&mut note, later);

        assert!(note.is_public);
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.updated_at, later);
    }

    #[test]
    fn page_request_clamps() {
        let req = PageRequest::new(Some(0), Some(1000));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_PAGE_LIMIT);

        let req = PageRequest::new(Some(3), Some(0));
        assert_eq!(req.limit, 1);
        assert_eq!(req.offset(), 2);
    }

    #[test]
    fn page_from_sorted_slices_and_counts() {
        let page = Page::from_sorted((1..=25).collect::<Vec<_>>(), PageRequest::new(Some(3), Some(10)));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.pages(), 3);

        let empty: Page<u8> = Page::from_sorted(vec![], PageRequest::default());
        assert_eq!(empty.pages(), 0);
    }
}
