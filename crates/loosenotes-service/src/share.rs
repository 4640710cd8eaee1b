//! Share token issuance and revocation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use loosenotes_core::validation::validate_ttl_days;
use loosenotes_core::{AccessPolicy, Note, Requester, ShareToken};
use loosenotes_store::NoteStore;

use crate::error::{AccessError, AccessResult};

/// Default lifetime of a share token, in days.
pub const DEFAULT_SHARE_TTL_DAYS: u32 = 7;

/// Issues, revokes and checks a note's share token.
#[derive(Clone)]
pub struct ShareTokenIssuer {
    notes: Arc<dyn NoteStore>,
}

impl ShareTokenIssuer {
    pub fn new(notes: Arc<dyn NoteStore>) -> Self {
        Self { notes }
    }

    /// Issue a fresh token, replacing any previous one.
    ///
    /// The old token stops working as soon as the new one is stored.
    pub async fn issue(
        &self,
        note: &Note,
        requester: &Requester,
        ttl_days: i64,
        now: DateTime<Utc>,
    ) -> AccessResult<ShareToken> {
        if AccessPolicy::can_write(note, requester).is_deny() {
            tracing::warn!(note_id = %note.id, user_id = %requester.user_id, "share denied");
            return Err(AccessError::Forbidden);
        }
        let ttl_days = validate_ttl_days(ttl_days)?;

        let token = ShareToken::issue(ttl_days, now)?;
        self.notes.set_share_token(note.id, Some(&token)).await?;

        tracing::info!(
            note_id = %note.id,
            user_id = %requester.user_id,
            expires_at = %token.expires_at,
            "share token issued"
        );
        Ok(token)
    }

    /// Clear the note's token. Revoking a note without a token succeeds.
    pub async fn revoke(&self, note: &Note, requester: &Requester) -> AccessResult<()> {
        if AccessPolicy::can_write(note, requester).is_deny() {
            tracing::warn!(note_id = %note.id, user_id = %requester.user_id, "revoke denied");
            return Err(AccessError::Forbidden);
        }

        self.notes.set_share_token(note.id, None).await?;
        tracing::info!(note_id = %note.id, user_id = %requester.user_id, "share token revoked");
        Ok(())
    }

    /// Whether `token` currently grants access to `note`.
    pub fn validate(note: &Note, token: &str, now: DateTime<Utc>) -> bool {
        note.share
            .as_ref()
            .is_some_and(|share| share.is_valid_at(token, now))
    }
}
