//! Share link routes.
//!
//! - POST /notes/{id}/share - Issue a share token (replaces any previous one)
//! - DELETE /notes/{id}/share - Revoke the share token

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use loosenotes_core::NoteId;
use loosenotes_service::ShareLink;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::Authenticated;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for issuing a share token. The body itself is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ShareRequest {
    /// Lifetime in days; the server default applies when absent.
    #[serde(default)]
    pub ttl_days: Option<i64>,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_share_request(body: &Bytes) -> ApiResult<ShareRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ShareRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid share request body: {e}")))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /notes/{id}/share - Issue a share token.
///
/// # Request Body
///
/// ```json
/// { "ttl_days": 7 }
/// ```
///
/// # Response
///
/// - 201 Created: token, link and expiry
/// - 400 Bad Request: `ttl_days` below 1 or above 365
/// - 403 Forbidden: caller is neither owner nor admin
/// - 404 Not Found: no such note
async fn issue_share(
    State(state): State<AppState>,
    Authenticated(requester): Authenticated,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ShareLink>)> {
    let request = parse_share_request(&body)?;
    let note_id = NoteId::from_uuid(id);

    let link = state
        .service()
        .generate_share_link(note_id, &requester, request.ttl_days)
        .await?;

    tracing::info!(
        note_id = %note_id,
        user_id = %requester.user_id,
        expires_at = %link.expires_at,
        "Share link issued"
    );
    Ok((StatusCode::CREATED, Json(link)))
}

/// DELETE /notes/{id}/share - Revoke the share token.
///
/// # Response
///
/// - 204 No Content: revoked (also when there was no token)
/// - 403 Forbidden: caller is neither owner nor admin
/// - 404 Not Found: no such note
async fn revoke_share(
    State(state): State<AppState>,
    Authenticated(requester): Authenticated,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .service()
        .revoke_share_link(NoteId::from_uuid(id), &requester)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build share routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/notes/{id}/share", post(issue_share).delete(revoke_share))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_uses_default_ttl() {
        let request = parse_share_request(&Bytes::new()).unwrap();
        assert_eq!(request.ttl_days, None);
    }

    #[test]
    fn ttl_is_read_from_body() {
        let request = parse_share_request(&Bytes::from_static(br#"{"ttl_days": 3}"#)).unwrap();
        assert_eq!(request.ttl_days, Some(3));
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let err = parse_share_request(&Bytes::from_static(b"{ttl")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
