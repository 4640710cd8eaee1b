//! Share tokens: bearer secrets granting read access to one private note.
//!
//! A token is 32 bytes from the OS CSPRNG, hex encoded (64 characters). The
//! token value and its expiry travel together as one value; a note either has
//! a complete `ShareToken` or none at all.
//!
//! Comparison hashes both sides with blake3 and compares the digests, whose
//! `PartialEq` is constant time, so the check does not leak how many leading
//! characters of a guess were correct.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::ValidationError;

/// Number of random bytes in a share token.
pub const SHARE_TOKEN_BYTES: usize = 32;

/// A share token and its expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl ShareToken {
    /// Issues a fresh token that expires `ttl_days` after `now`.
    ///
    /// Fails with `TtlTooLong` when the expiry is not representable.
    pub fn issue(ttl_days: u32, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let ttl = i64::from(ttl_days);
        let expires_at = Duration::try_days(ttl)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or(ValidationError::TtlTooLong(ttl))?;
        Ok(Self {
            value: generate_token_value(),
            expires_at,
        })
    }

    /// Whether `candidate` is this token and the token is unexpired at `now`.
    #[must_use]
    pub fn is_valid_at(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        // Evaluate both so timing does not reveal which check failed.
        let matches = self.matches(candidate);
        let live = now < self.expires_at;
        matches & live
    }

    /// Constant-time equality against `candidate`.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        blake3::hash(self.value.as_bytes()) == blake3::hash(candidate.as_bytes())
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn generate_token_value() -> String {
    let mut bytes = [0u8; SHARE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
