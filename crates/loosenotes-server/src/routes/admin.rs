//! Admin maintenance routes.
//!
//! - PUT /admin/notes/{id}/owner - Reassign a note
//! - POST /admin/notes/reconcile - Recompute every cached aggregate

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};
use loosenotes_core::{NoteId, UserId};
use loosenotes_service::ReconcileReport;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::Authenticated;
use crate::routes::notes::NoteResponse;
use crate::state::AppState;

/// Request body for an owner change.
#[derive(Debug, Deserialize)]
pub struct OwnerRequest {
    pub owner_id: UserId,
}

/// PUT /admin/notes/{id}/owner - Reassign a note to another user.
///
/// # Response
///
/// - 200 OK: the updated note
/// - 403 Forbidden: caller is not an admin
/// - 404 Not Found: no such note
async fn change_owner(
    State(state): State<AppState>,
    Authenticated(requester): Authenticated,
    Path(id): Path<Uuid>,
    Json(body): Json<OwnerRequest>,
) -> ApiResult<Json<NoteResponse>> {
    let note = state
        .service()
        .change_owner(NoteId::from_uuid(id), &requester, body.owner_id)
        .await?;
    Ok(Json(NoteResponse::for_viewer(note, Some(&requester))))
}

/// POST /admin/notes/reconcile - Repair drifted aggregates.
async fn reconcile(
    State(state): State<AppState>,
    Authenticated(requester): Authenticated,
) -> ApiResult<Json<ReconcileReport>> {
    let report = state.service().reconcile_all(&requester).await?;
    Ok(Json(report))
}

/// Build admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/notes/{id}/owner", put(change_owner))
        .route("/admin/notes/reconcile", post(reconcile))
}
