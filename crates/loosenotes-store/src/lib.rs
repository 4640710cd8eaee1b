//! loosenotes-store: Storage layer for LooseNotes
//!
//! This crate provides:
//! - The `NoteStore` and `RatingStore` traits the service layer consumes
//! - A PostgreSQL adapter (`PgStore`) using row locks for per-note rating writes
//! - An in-memory adapter (`MemoryStore`) with per-note mutexes
//! - Migration management
//!
//! # Usage
//!
//! ```rust,ignore
//! use loosenotes_store::{PgStore, StoreConfig, RatingStore};
//!
//! let config = StoreConfig::from_env()?;
//! let store = PgStore::connect(config).await?;
//!
//! // Rate a note; the aggregate is rewritten in the same transaction
//! let (rating, aggregate) = store.upsert_rating(&input, Utc::now()).await?;
//! ```

pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod schema;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use repository::{NoteStore, RatingStore};
pub use store::{PgStore, StoreConfig};

// Re-export loosenotes-core for downstream crates
pub use loosenotes_core;
