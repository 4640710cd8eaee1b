//! Input validation shared by the service and the HTTP layer.

use thiserror::Error;

/// Lowest accepted star value.
pub const MIN_RATING: i64 = 1;
/// Highest accepted star value.
pub const MAX_RATING: i64 = 5;
/// Longest accepted rating comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 500;

/// Longest accepted share token lifetime, in days.
pub const MAX_SHARE_TTL_DAYS: i64 = 365;

const MIN_TITLE_CHARS: usize = 3;
const MAX_TITLE_CHARS: usize = 100;

/// Rejected input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rating value must be an integer between 1 and 5, got {0}")]
    RatingOutOfRange(i64),

    #[error("rating value must be an integer")]
    RatingNotInteger,

    #[error("comment exceeds 500 characters ({0} given)")]
    CommentTooLong(usize),

    #[error("share token ttl must be at least one day")]
    NonPositiveTtl,

    #[error("share token ttl must be at most 365 days, got {0}")]
    TtlTooLong(i64),

    #[error("title must be between 3 and 100 characters")]
    TitleLength,

    #[error("content must not be empty")]
    EmptyContent,

    #[error("update must change at least one field")]
    EmptyUpdate,

    #[error("search query must not be empty")]
    EmptyQuery,
}

/// Checks a star value and narrows it to `u8`.
pub fn validate_rating_value(value: i64) -> Result<u8, ValidationError> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        // In range, so the cast is lossless.
        Ok(value as u8)
    } else {
        Err(ValidationError::RatingOutOfRange(value))
    }
}

/// Checks comment length in characters (not bytes). Blank comments become `None`.
pub fn validate_comment(comment: Option<String>) -> Result<Option<String>, ValidationError> {
    match comment {
        None => Ok(None),
        Some(c) if c.trim().is_empty() => Ok(None),
        Some(c) => {
            let chars = c.chars().count();
            if chars > MAX_COMMENT_CHARS {
                Err(ValidationError::CommentTooLong(chars))
            } else {
                Ok(Some(c))
            }
        }
    }
}

/// Checks a share token lifetime: between one day and [`MAX_SHARE_TTL_DAYS`].
pub fn validate_ttl_days(ttl_days: i64) -> Result<u32, ValidationError> {
    if ttl_days <= 0 {
        return Err(ValidationError::NonPositiveTtl);
    }
    if ttl_days > MAX_SHARE_TTL_DAYS {
        return Err(ValidationError::TtlTooLong(ttl_days));
    }
    u32::try_from(ttl_days).map_err(|_| ValidationError::TtlTooLong(ttl_days))
}

/// Trims and checks a note title.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    let len = trimmed.chars().count();
    if (MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::TitleLength)
    }
}

pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        Err(ValidationError::EmptyContent)
    } else {
        Ok(())
    }
}

/// Trims a search query and rejects blank input.
pub fn validate_query(query: &str) -> Result<&str, ValidationError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyQuery)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert_eq!(validate_rating_value(1), Ok(1));
        assert_eq!(validate_rating_value(5), Ok(5));
        assert_eq!(
            validate_rating_value(0),
            Err(ValidationError::RatingOutOfRange(0))
        );
        assert_eq!(
            validate_rating_value(6),
            Err(ValidationError::RatingOutOfRange(6))
        );
        assert!(validate_rating_value(-3).is_err());
    }

    #[test]
    fn comment_counts_characters_not_bytes() {
        let accented = "é".repeat(MAX_COMMENT_CHARS);
        assert!(accented.len() > MAX_COMMENT_CHARS);
        assert!(validate_comment(Some(accented)).is_ok());

        let long = "x".repeat(MAX_COMMENT_CHARS + 1);
        assert_eq!(
            validate_comment(Some(long)),
            Err(ValidationError::CommentTooLong(MAX_COMMENT_CHARS + 1))
        );
    }

    #[test]
    fn blank_comment_is_dropped() {
        assert_eq!(validate_comment(Some("   ".into())), Ok(None));
        assert_eq!(validate_comment(None), Ok(None));
    }

    #[test]
    fn ttl_must_be_positive() {
        assert_eq!(validate_ttl_days(7), Ok(7));
        assert_eq!(validate_ttl_days(0), Err(ValidationError::NonPositiveTtl));
        assert_eq!(validate_ttl_days(-1), Err(ValidationError::NonPositiveTtl));
    }

    #[test]
    fn ttl_has_an_upper_bound() {
        assert_eq!(validate_ttl_days(MAX_SHARE_TTL_DAYS), Ok(365));
        assert_eq!(
            validate_ttl_days(MAX_SHARE_TTL_DAYS + 1),
            Err(ValidationError::TtlTooLong(366))
        );
        assert_eq!(
            validate_ttl_days(100_000_000),
            Err(ValidationError::TtlTooLong(100_000_000))
        );
        assert_eq!(
            validate_ttl_days(i64::MAX),
            Err(ValidationError::TtlTooLong(i64::MAX))
        );
    }

    #[test]
    fn title_is_trimmed_and_bounded() {
        assert_eq!(validate_title("  abc  "), Ok("abc".to_string()));
        assert_eq!(validate_title("ab"), Err(ValidationError::TitleLength));
        assert_eq!(
            validate_title(&"t".repeat(101)),
            Err(ValidationError::TitleLength)
        );
    }

    #[test]
    fn query_is_trimmed() {
        assert_eq!(validate_query("  milk "), Ok("milk"));
        assert_eq!(validate_query("   "), Err(ValidationError::EmptyQuery));
    }

    #[test]
    fn content_must_not_be_blank() {
        assert!(validate_content("hello").is_ok());
        assert_eq!(validate_content(" \n"), Err(ValidationError::EmptyContent));
    }
}
