//! loosenotes-server: HTTP API server for LooseNotes
//!
//! This crate provides:
//! - REST endpoints for notes, ratings, share links and admin maintenance
//! - Caller identity from EdDSA JWTs (or dev headers)
//! - JSON error responses mapped from the service error taxonomy
//!
//! # Architecture
//!
//! Handlers are thin: they extract the caller, translate path and body into
//! domain types, and delegate to [`loosenotes_service::NoteAccessService`].
//! The middleware stack adds request IDs, tracing spans and CORS.
//!
//! # Usage
//!
//! ```rust,ignore
//! use loosenotes_server::{AppState, ServerConfig, build_app};
//!
//! let config = ServerConfig::from_env()?;
//! let app = build_app(AppState::new(service, config.clone()))?;
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// Re-exports for convenience
pub use config::{ConfigError, LogFormat, ServerConfig, StorageBackend};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

// Re-export dependent crates
pub use loosenotes_core;
pub use loosenotes_service;
pub use loosenotes_store;

/// Build the router with the full middleware stack.
pub fn build_app(state: AppState) -> Result<Router, ConfigError> {
    let cors = build_cors_layer(&state.config().cors_allowed_origins)?;

    // The request ID layer is outermost so the trace span can record it.
    Ok(routes::build_router(state)
        .layer(axum::middleware::from_fn(
            middleware::propagate_request_id,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(middleware::request_span))
        .layer(middleware::request_id_layer()))
}

/// Build CORS layer from configuration.
pub fn build_cors_layer(allowed_origins: &str) -> Result<CorsLayer, ConfigError> {
    if allowed_origins.trim() == "*" {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<HeaderValue>()
                .map_err(|e| ConfigError::InvalidValue {
                    name: "CORS_ALLOWED_ORIGINS".to_string(),
                    reason: format!("{s}: {e}"),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any))
}
