//! Command implementations and the shared HTTP/output plumbing.

pub mod create;
pub mod delete;
pub mod rate;
pub mod ratings;
pub mod read;
pub mod share;
pub mod top;
pub mod unrate;

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors surfaced to the user.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The server answered with an error body.
    #[error("{status} {code}: {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },

    /// Transport or decoding failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The bearer token cannot be sent as a header.
    #[error("token contains characters that are not valid in an HTTP header")]
    InvalidToken,
}

/// Server error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    code: String,
    message: String,
}

/// Formats a value for a human at the terminal.
pub trait HumanReadable {
    fn print_human(&self);
}

/// Build a client that sends the bearer token on every request.
pub fn build_client(token: Option<&str>) -> Result<Client, CliError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| CliError::InvalidToken)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(Client::builder().default_headers(headers).build()?)
}

/// Send a request and decode a JSON response body.
pub async fn make_request<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await.map_err(CliError::Http)?;
    let response = check_status(response).await?;
    Ok(response.json::<T>().await.map_err(CliError::Http)?)
}

/// Send a request whose success response has no body.
pub async fn send_empty(request: RequestBuilder) -> Result<()> {
    let response = request.send().await.map_err(CliError::Http)?;
    check_status(response).await?;
    Ok(())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CliError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(api_error(status, &text))
}

fn api_error(status: StatusCode, body: &str) -> CliError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => CliError::Api {
            status,
            code: parsed.error.code,
            message: parsed.error.message,
        },
        Err(_) => CliError::Api {
            status,
            code: "HTTP_ERROR".to_string(),
            message: if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            },
        },
    }
}

/// Print as JSON, or formatted with `--human`.
pub fn output<T: Serialize + HumanReadable>(value: &T, human: bool) -> Result<()> {
    if human {
        value.print_human();
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Shorten `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Five-slot star bar for an average rating.
pub fn stars(average: f64) -> String {
    let filled = average.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "*".repeat(filled), ".".repeat(5 - filled))
}

// ============================================================================
// Shared response types
// ============================================================================

/// A paginated list.
#[derive(Debug, Deserialize, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}

/// Share token details on a note.
#[derive(Debug, Deserialize, Serialize)]
pub struct ShareInfo {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// A note as returned by the server.
#[derive(Debug, Deserialize, Serialize)]
pub struct Note {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share: Option<ShareInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentInfo>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AttachmentInfo {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// A single rating.
#[derive(Debug, Deserialize, Serialize)]
pub struct Rating {
    pub id: Uuid,
    pub note_id: Uuid,
    pub user_id: Uuid,
    pub value: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note's cached rating summary.
#[derive(Debug, Deserialize, Serialize)]
pub struct Aggregate {
    pub average_rating: f64,
    pub rating_count: u32,
}
