//! Server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use loosenotes_core::validation::validate_ttl_days;
use loosenotes_service::{DEFAULT_MAX_WRITE_RETRIES, DEFAULT_SHARE_TTL_DAYS, ServiceConfig};

/// Default JWT issuer accepted by the server.
pub const DEFAULT_JWT_ISSUER: &str = "loosenotes-auth";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected text or json, got {other}")),
        }
    }
}

/// Which storage adapter backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected postgres or memory, got {other}")),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server port to listen on.
    pub port: u16,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// CORS allowed origins (comma-separated or "*" for all).
    pub cors_allowed_origins: String,
    /// Ed25519 public key (PEM) used to verify bearer tokens. Empty disables JWT auth.
    pub jwt_public_key: String,
    /// Required `iss` claim.
    pub jwt_issuer: String,
    /// Accept `X-User-Id` / `X-User-Role` headers in place of a token.
    pub allow_dev_identity: bool,
    /// Base URL for share links.
    pub public_base_url: String,
    /// Root directory for attachment files.
    pub upload_dir: PathBuf,
    /// Storage adapter.
    pub storage_backend: StorageBackend,
    /// Retries after a write conflict.
    pub max_write_retries: u32,
    /// Share token lifetime when the caller does not choose one.
    pub default_share_ttl_days: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            cors_allowed_origins: "*".to_string(),
            jwt_public_key: String::new(),
            jwt_issuer: DEFAULT_JWT_ISSUER.to_string(),
            allow_dev_identity: false,
            public_base_url: "http://localhost:3000".to_string(),
            upload_dir: PathBuf::from("./uploads"),
            storage_backend: StorageBackend::Postgres,
            max_write_retries: DEFAULT_MAX_WRITE_RETRIES,
            default_share_ttl_days: DEFAULT_SHARE_TTL_DAYS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `PORT`: Server port (default: 3000)
    /// - `LOG_LEVEL`: Logging level (default: "info")
    /// - `LOG_FORMAT`: `text` or `json` (default: "text")
    /// - `CORS_ALLOWED_ORIGINS`: Allowed CORS origins (default: "*")
    /// - `JWT_PUBLIC_KEY`: Ed25519 PEM public key (default: unset)
    /// - `JWT_ISSUER`: Required issuer (default: "loosenotes-auth")
    /// - `ALLOW_DEV_IDENTITY`: Trust identity headers (default: false)
    /// - `PUBLIC_BASE_URL`: Base for share links (default: "http://localhost:3000")
    /// - `UPLOAD_DIR`: Attachment root (default: "./uploads")
    /// - `STORAGE_BACKEND`: `postgres` or `memory` (default: "postgres")
    /// - `MAX_WRITE_RETRIES`: Conflict retries (default: 3)
    /// - `DEFAULT_SHARE_TTL_DAYS`: Token lifetime (default: 7)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_share_ttl_days =
            parse_var(&lookup, "DEFAULT_SHARE_TTL_DAYS", defaults.default_share_ttl_days)?;
        validate_ttl_days(i64::from(default_share_ttl_days)).map_err(|e| {
            ConfigError::InvalidValue {
                name: "DEFAULT_SHARE_TTL_DAYS".to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            port: parse_var(&lookup, "PORT", defaults.port)?,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_var(&lookup, "LOG_FORMAT", defaults.log_format)?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or(defaults.cors_allowed_origins),
            jwt_public_key: lookup("JWT_PUBLIC_KEY").unwrap_or_default(),
            jwt_issuer: lookup("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            allow_dev_identity: lookup("ALLOW_DEV_IDENTITY")
                .map(|s| parse_flag(&s))
                .unwrap_or(false),
            public_base_url: lookup("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            storage_backend: parse_var(&lookup, "STORAGE_BACKEND", defaults.storage_backend)?,
            max_write_retries: parse_var(&lookup, "MAX_WRITE_RETRIES", defaults.max_write_retries)?,
            default_share_ttl_days,
        })
    }

    /// Get the socket address for the server.
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    /// The service-layer slice of this configuration.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            public_base_url: self.public_base_url.trim_end_matches('/').to_string(),
            default_share_ttl_days: self.default_share_ttl_days,
            max_write_retries: self.max_write_retries,
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name: name.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid environment variable value.
    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}
