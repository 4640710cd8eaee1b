//! Note routes.
//!
//! - POST /notes - Create a note
//! - GET /notes - Notes visible to the caller
//! - GET /notes/top-rated - Public notes by rating
//! - GET /notes/search?q= - Substring search
//! - GET /notes/{id}?token= - Read one note
//! - PUT /notes/{id} - Update title, content or visibility
//! - DELETE /notes/{id} - Delete with ratings and attachments

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use loosenotes_core::{AccessPolicy, Attachment, NewNote, Note, NoteId, NoteUpdate, Requester};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Authenticated, MaybeAuthenticated};
use crate::routes::{PageParams, PageResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// `?token=` on reads of a shared note.
#[derive(Debug, Default, Deserialize)]
pub struct TokenParams {
    pub token: Option<String>,
}

/// `?q=&page=&limit=` for search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Share token details, shown only to callers who may manage the note.
#[derive(Debug, Serialize)]
pub struct ShareInfo {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Attachment metadata. The storage path stays server-side.
#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentResponse {
    fn from(a: Attachment) -> Self {
        Self {
            id: *a.id.as_uuid(),
            file_name: a.file_name,
            content_type: a.content_type,
            size_bytes: a.size_bytes,
            uploaded_at: a.uploaded_at,
        }
    }
}

/// A note as seen over HTTP.
#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub view_count: u64,
    pub average_rating: f64,
    pub rating_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share: Option<ShareInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentResponse>>,
}

impl NoteResponse {
    /// Render `note` for `viewer`. The share token is included only when the
    /// viewer may write the note.
    pub fn for_viewer(note: Note, viewer: Option<&Requester>) -> Self {
        let show_share = viewer.is_some_and(|r| AccessPolicy::can_write(&note, r).is_allow());
        let share = note.share.filter(|_| show_share).map(|s| ShareInfo {
            token: s.value,
            expires_at: s.expires_at,
        });

        Self {
            id: *note.id.as_uuid(),
            owner_id: *note.owner_id.as_uuid(),
            title: note.title,
            content: note.content,
            is_public: note.is_public,
            view_count: note.view_count,
            average_rating: note.aggregate.average,
            rating_count: note.aggregate.count,
            created_at: note.created_at,
            updated_at: note.updated_at,
            share,
            attachments: None,
        }
    }

    fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = Some(attachments.into_iter().map(Into::into).collect());
        self
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /notes - Create a note owned by the caller.
///
/// # Response
///
/// - 201 Created: the note
/// - 400 Bad Request: title or content invalid
/// - 401 Unauthorized: no identity
async fn create_note(
    State(state): State<AppState>,
    Authenticated(requester): Authenticated,
    Json(draft): Json<NewNote>,
) -> ApiResult<(StatusCode, Json<NoteResponse>)> {
    let note = state.service().create_note(&requester, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(NoteResponse::for_viewer(note, Some(&requester))),
    ))
}

/// GET /notes - Own and public notes (all notes for admins), newest first.
async fn list_notes(
    State(state): State<AppState>,
    viewer: MaybeAuthenticated,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PageResponse<NoteResponse>>> {
    let page = state
        .service()
        .list_notes(viewer.requester(), params.request())
        .await?;
    let page = page.map(|note| NoteResponse::for_viewer(note, viewer.requester()));
    Ok(Json(page.into()))
}

/// GET /notes/top-rated - Public notes with at least one rating.
async fn top_rated(
    State(state): State<AppState>,
    viewer: MaybeAuthenticated,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PageResponse<NoteResponse>>> {
    let page = state.service().top_rated(params.request()).await?;
    let page = page.map(|note| NoteResponse::for_viewer(note, viewer.requester()));
    Ok(Json(page.into()))
}

/// GET /notes/search?q= - Case-insensitive substring search.
///
/// # Response
///
/// - 200 OK: matching visible notes
/// - 400 Bad Request: empty query
async fn search_notes(
    State(state): State<AppState>,
    viewer: MaybeAuthenticated,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<PageResponse<NoteResponse>>> {
    let request = loosenotes_core::PageRequest::new(params.page, params.limit);
    let page = state
        .service()
        .search(&params.q, viewer.requester(), request)
        .await?;
    let page = page.map(|note| NoteResponse::for_viewer(note, viewer.requester()));
    Ok(Json(page.into()))
}

/// GET /notes/{id} - Read a note, counting the view.
///
/// # Response
///
/// - 200 OK: the note with its attachments
/// - 403 Forbidden: private note without owner, admin or valid token
/// - 404 Not Found: no such note
async fn get_note(
    State(state): State<AppState>,
    viewer: MaybeAuthenticated,
    Path(id): Path<Uuid>,
    Query(params): Query<TokenParams>,
) -> ApiResult<Json<NoteResponse>> {
    let note_id = NoteId::from_uuid(id);
    let view = state
        .service()
        .get_note(note_id, viewer.requester(), params.token.as_deref())
        .await?;

    tracing::debug!(note_id = %note_id, via_token = params.token.is_some(), "Note served");
    Ok(Json(
        NoteResponse::for_viewer(view.note, viewer.requester()).with_attachments(view.attachments),
    ))
}

/// PUT /notes/{id} - Update title, content or visibility.
async fn update_note(
    State(state): State<AppState>,
    Authenticated(requester): Authenticated,
    Path(id): Path<Uuid>,
    Json(update): Json<NoteUpdate>,
) -> ApiResult<Json<NoteResponse>> {
    let note = state
        .service()
        .update_note(NoteId::from_uuid(id), &requester, update)
        .await?;
    Ok(Json(NoteResponse::for_viewer(note, Some(&requester))))
}

/// DELETE /notes/{id} - Delete a note, its ratings and its attachments.
///
/// # Response
///
/// - 204 No Content: deleted
/// - 403 Forbidden: caller is neither owner nor admin
/// - 404 Not Found: no such note
async fn delete_note(
    State(state): State<AppState>,
    Authenticated(requester): Authenticated,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .service()
        .delete_note(NoteId::from_uuid(id), &requester)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build note routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/top-rated", get(top_rated))
        .route("/notes/search", get(search_notes))
        .route(
            "/notes/{id}",
            get(get_note).put(update_note).delete(delete_note),
        )
}
