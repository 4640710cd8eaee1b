//! loosenotes-core: domain types and pure rules for LooseNotes
//!
//! This crate provides:
//! - Note, rating, attachment and identity types
//! - The rating aggregate and its rounding rule
//! - Share tokens (generation, constant-time validation, expiry)
//! - The access policy deciding read / write / rate
//! - Input validation
//!
//! Nothing in here performs I/O. Storage lives in `loosenotes-store`, and the
//! orchestration of policy plus storage lives in `loosenotes-service`.
//!
//! # Usage
//!
//! ```rust
//! use chrono::Utc;
//! use loosenotes_core::{AccessPolicy, NewNote, Note, Requester, UserId};
//!
//! let owner = Requester::user(UserId::new());
//! let note = Note::new(
//!     owner.user_id,
//!     NewNote { title: "Draft".into(), content: "...".into(), is_public: false },
//!     Utc::now(),
//! );
//!
//! assert!(AccessPolicy::can_read(&note, Some(&owner), None, Utc::now()).is_allow());
//! assert!(AccessPolicy::can_read(&note, None, None, Utc::now()).is_deny());
//! ```

pub mod aggregate;
pub mod policy;
pub mod share;
pub mod types;
pub mod validation;

pub use aggregate::{RatingAggregate, round_half_even_tenths};
pub use policy::{AccessPolicy, Decision};
pub use share::{SHARE_TOKEN_BYTES, ShareToken};
pub use types::{
    Attachment, AttachmentId, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, NewNote, Note, NoteId,
    NoteUpdate, Page, PageRequest, Rating, RatingId, RatingInput, Requester, Role, UserId,
};
pub use validation::{MAX_COMMENT_CHARS, MAX_RATING, MAX_SHARE_TTL_DAYS, MIN_RATING, ValidationError};
