//! Rating routes.
//!
//! - POST /notes/{id}/ratings - Rate a note (one rating per user, upserted)
//! - GET /notes/{id}/ratings - Ratings on a readable note
//! - GET /ratings/{id} - One rating
//! - DELETE /ratings/{id} - Remove a rating
//! - GET /users/me/ratings - The caller's ratings

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use loosenotes_core::{NoteId, PageRequest, Rating, RatingAggregate, RatingId, ValidationError};
use loosenotes_service::RatedNote;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Authenticated, MaybeAuthenticated};
use crate::routes::notes::TokenParams;
use crate::routes::{PageParams, PageResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for rating a note.
///
/// `value` is taken as a raw JSON number so that `4.5` is reported as a
/// non-integer rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub value: serde_json::Number,
    #[serde(default)]
    pub comment: Option<String>,
}

/// `?token=&page=&limit=` for listing a note's ratings.
#[derive(Debug, Default, Deserialize)]
pub struct RatingsParams {
    pub token: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Response after a rating is removed.
#[derive(Debug, Serialize)]
pub struct RemovedRating {
    pub rating_id: Uuid,
    pub aggregate: RatingAggregate,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn rating_value(number: &serde_json::Number) -> Result<i64, ValidationError> {
    if let Some(v) = number.as_i64() {
        return Ok(v);
    }
    if number.is_u64() {
        return Err(ValidationError::RatingOutOfRange(i64::MAX));
    }
    Err(ValidationError::RatingNotInteger)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /notes/{id}/ratings - Create or replace the caller's rating.
///
/// # Response
///
/// - 200 OK: the rating and the note's new aggregate
/// - 400 Bad Request: value outside 1..=5, non-integer, or comment too long
/// - 401 Unauthorized: anonymous caller
/// - 403 Forbidden: caller may not read the note
/// - 404 Not Found: no such note
/// - 409 Conflict: write kept conflicting after retries
async fn rate_note(
    State(state): State<AppState>,
    caller: MaybeAuthenticated,
    Path(id): Path<Uuid>,
    Json(body): Json<RateRequest>,
) -> ApiResult<Json<RatedNote>> {
    let value = rating_value(&body.value).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let rated = state
        .service()
        .rate_note(NoteId::from_uuid(id), caller.requester(), value, body.comment)
        .await?;
    Ok(Json(rated))
}

/// GET /notes/{id}/ratings - Ratings on a note, newest first.
async fn list_note_ratings(
    State(state): State<AppState>,
    viewer: MaybeAuthenticated,
    Path(id): Path<Uuid>,
    Query(params): Query<RatingsParams>,
) -> ApiResult<Json<PageResponse<Rating>>> {
    let page = state
        .service()
        .list_ratings(
            NoteId::from_uuid(id),
            viewer.requester(),
            params.token.as_deref(),
            PageRequest::new(params.page, params.limit),
        )
        .await?;
    Ok(Json(page.into()))
}

/// GET /ratings/{id} - One rating, if its note is readable.
async fn get_rating(
    State(state): State<AppState>,
    viewer: MaybeAuthenticated,
    Path(id): Path<Uuid>,
    Query(params): Query<TokenParams>,
) -> ApiResult<Json<Rating>> {
    let rating = state
        .service()
        .get_rating(
            RatingId::from_uuid(id),
            viewer.requester(),
            params.token.as_deref(),
        )
        .await?;
    Ok(Json(rating))
}

/// DELETE /ratings/{id} - Remove a rating (author or admin).
///
/// # Response
///
/// - 200 OK: the note's aggregate after removal
/// - 403 Forbidden: caller is neither author nor admin
/// - 404 Not Found: no such rating
async fn delete_rating(
    State(state): State<AppState>,
    Authenticated(requester): Authenticated,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RemovedRating>> {
    let aggregate = state
        .service()
        .remove_rating(RatingId::from_uuid(id), &requester)
        .await?;
    Ok(Json(RemovedRating {
        rating_id: id,
        aggregate,
    }))
}

/// GET /users/me/ratings - The caller's ratings, newest first.
async fn my_ratings(
    State(state): State<AppState>,
    Authenticated(requester): Authenticated,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PageResponse<Rating>>> {
    let page = state
        .service()
        .user_ratings(&requester, params.request())
        .await?;
    Ok(Json(page.into()))
}

/// Build rating routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notes/{id}/ratings",
            post(rate_note).get(list_note_ratings),
        )
        .route("/ratings/{id}", get(get_rating).delete(delete_rating))
        .route("/users/me/ratings", get(my_ratings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(raw: &str) -> serde_json::Number {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn integer_values_pass_through() {
        assert_eq!(rating_value(&number("4")).unwrap(), 4);
        assert_eq!(rating_value(&number("-2")).unwrap(), -2);
    }

    #[test]
    fn fractional_values_are_not_integers() {
        assert_eq!(
            rating_value(&number("4.5")),
            Err(ValidationError::RatingNotInteger)
        );
    }

    #[test]
    fn huge_values_are_out_of_range() {
        assert!(matches!(
            rating_value(&number("18446744073709551615")),
            Err(ValidationError::RatingOutOfRange(_))
        ));
    }
}
