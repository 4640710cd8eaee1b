//! Caller identity extraction from a JWT Bearer token or dev headers.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation};
use loosenotes_core::{Requester, Role, UserId};
use serde::Deserialize;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Dev identity header carrying the user UUID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Dev identity header carrying the role (`user` or `admin`).
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// JWT claims structure.
#[derive(Debug, Deserialize)]
pub struct Claims {
    /// Subject: the user UUID.
    pub sub: String,
    /// Issuer.
    #[serde(default)]
    pub iss: Option<String>,
    /// `admin` or `user`; absent means `user`.
    #[serde(default)]
    pub role: Option<String>,
}

/// An authenticated caller. Rejects anonymous requests with 401.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Requester);

/// A caller who may be anonymous.
///
/// A present but invalid credential is still rejected; only the total
/// absence of one yields `None`.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthenticated(pub Option<Requester>);

impl MaybeAuthenticated {
    pub fn requester(&self) -> Option<&Requester> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_identity(&parts.headers, state.config())?
            .map(Authenticated)
            .ok_or_else(|| {
                ApiError::Unauthorized("Missing Authorization: Bearer <jwt> header".into())
            })
    }
}

impl FromRequestParts<AppState> for MaybeAuthenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_identity(&parts.headers, state.config()).map(MaybeAuthenticated)
    }
}

/// Resolve the caller from request headers.
///
/// Priority:
/// 1. `Authorization: Bearer <jwt>`, verified against the configured key.
/// 2. `X-User-Id` (+ optional `X-User-Role`), only with `allow_dev_identity`.
/// 3. Otherwise anonymous.
pub fn resolve_identity(
    headers: &HeaderMap,
    config: &ServerConfig,
) -> Result<Option<Requester>, ApiError> {
    if let Some(auth_header) = headers.get(http::header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| {
            ApiError::Unauthorized("Authorization header contains invalid characters".into())
        })?;

        let Some(token) = auth_str.strip_prefix("Bearer ") else {
            return Err(ApiError::Unauthorized(
                "Authorization header must use the Bearer scheme".into(),
            ));
        };
        return extract_from_jwt(token.trim(), config).map(Some);
    }

    if config.allow_dev_identity {
        return extract_from_dev_headers(headers);
    }

    Ok(None)
}

/// Validate a JWT and build the requester from its claims.
fn extract_from_jwt(token: &str, config: &ServerConfig) -> Result<Requester, ApiError> {
    if config.jwt_public_key.is_empty() {
        tracing::error!("bearer token presented but JWT_PUBLIC_KEY is not configured");
        return Err(ApiError::internal());
    }

    let key = DecodingKey::from_ed_pem(config.jwt_public_key.as_bytes()).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse JWT public key");
        ApiError::internal()
    })?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_issuer(&[config.jwt_issuer.as_str()]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data: TokenData<Claims> =
        jsonwebtoken::decode(token, &key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized(format!("Invalid token: {e}"))
        })?;

    let user_id = parse_user_id(&token_data.claims.sub)
        .map_err(|_| ApiError::Unauthorized("Token subject is not a user id".into()))?;
    let role = token_data
        .claims
        .role
        .as_deref()
        .map(Role::from_claim)
        .unwrap_or_default();

    Ok(Requester { user_id, role })
}

/// Read the dev identity headers. No `X-User-Id` means anonymous.
fn extract_from_dev_headers(headers: &HeaderMap) -> Result<Option<Requester>, ApiError> {
    let Some(header_value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    let raw = header_value.to_str().map_err(|_| {
        ApiError::BadRequest("X-User-Id header contains invalid characters".to_string())
    })?;
    let user_id = parse_user_id(raw)?;

    let role = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(Role::from_claim)
        .unwrap_or_default();

    tracing::debug!(user_id = %user_id, role = role.as_str(), "Using dev identity headers");
    Ok(Some(Requester { user_id, role }))
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.trim()
        .parse::<UserId>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid user id: {e}")))
}
