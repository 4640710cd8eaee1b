//! loosenotes-service: note access control and rating aggregation
//!
//! This crate provides:
//! - `NoteAccessService`, the entry point for every note and rating operation
//! - `RatingAggregator`, validated rating writes with conflict retries
//! - `ShareTokenIssuer`, share token issue / revoke / validate
//! - The `FileStorage` collaborator for attachment bytes
//! - The `AccessError` taxonomy the HTTP layer maps to status codes
//!
//! # Usage
//!
//! ```rust,ignore
//! use loosenotes_service::{LocalFileStorage, NoteAccessService, ServiceConfig};
//! use loosenotes_store::MemoryStore;
//!
//! let service = NoteAccessService::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(LocalFileStorage::new("./uploads")),
//!     ServiceConfig::default(),
//! );
//! let view = service.get_note(note_id, Some(&requester), None).await?;
//! ```

pub mod aggregator;
pub mod error;
pub mod files;
pub mod service;
pub mod share;

pub use aggregator::{DEFAULT_MAX_WRITE_RETRIES, RatingAggregator};
pub use error::{AccessError, AccessResult};
pub use files::{FileStorage, FileStorageError, LocalFileStorage};
pub use service::{NoteAccessService, NoteView, RatedNote, ReconcileReport, ServiceConfig, ShareLink};
pub use share::{DEFAULT_SHARE_TTL_DAYS, ShareTokenIssuer};
