//! Access policy: who may read, write or rate a note.
//!
//! Pure functions over a note, an optional requester, an optional share token
//! and the current time. No I/O, no clock reads; callers pass `now`.
//!
//! # Rules
//!
//! | Check       | Allowed when                                                      |
//! |-------------|-------------------------------------------------------------------|
//! | `can_read`  | public, or owner, or admin, or a valid unexpired share token      |
//! | `can_write` | owner or admin (share tokens never grant write)                   |
//! | `can_rate`  | authenticated and `can_read` without a token                      |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Note, Requester};

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    #[must_use]
    pub const fn from_bool(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }

    #[must_use]
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }

    #[must_use]
    pub const fn is_deny(self) -> bool {
        matches!(self, Self::Deny)
    }
}

/// Stateless access rules.
pub struct AccessPolicy;

impl AccessPolicy {
    /// Read access. An expired token behaves exactly like no token.
    #[must_use]
    pub fn can_read(
        note: &Note,
        requester: Option<&Requester>,
        share_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Decision {
        if note.is_public {
            return Decision::Allow;
        }
        if let Some(requester) = requester {
            if note.is_owned_by(requester.user_id) || requester.is_admin() {
                return Decision::Allow;
            }
        }
        let token_ok = match (share_token, note.share.as_ref()) {
            (Some(candidate), Some(share)) => share.is_valid_at(candidate, now),
            _ => false,
        };
        Decision::from_bool(token_ok)
    }

    /// Write access: update, share, revoke, delete.
    #[must_use]
    pub fn can_write(note: &Note, requester: &Requester) -> Decision {
        Decision::from_bool(note.is_owned_by(requester.user_id) || requester.is_admin())
    }

    /// Rating access. A share token alone never lets someone rate.
    #[must_use]
    pub fn can_rate(note: &Note, requester: Option<&Requester>, now: DateTime<Utc>) -> Decision {
        match requester {
            Some(r) => Self::can_read(note, Some(r), None, now),
            None => Decision::Deny,
        }
    }
}
