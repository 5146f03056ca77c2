//! Edit-time validation of keyword definitions.
//!
//! These checks run when keywords are created or edited (and from the
//! CLI's config check), never on the inbound match path: the matcher
//! assumes every snapshot it sees has already passed them.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::keyword::{Keyword, INFO_WORDS, NAME_PREFIX, START_WORDS, STOP_WORDS};

pub const MAX_KEYWORD_LENGTH: usize = 12;

lazy_static! {
    // Characters available in the GSM 03.38 basic set. Keywords outside
    // this set would not survive a round trip over SMS.
    static ref GSM_CHARS: Regex = Regex::new(
        r#"^[\w@?£!1$"¥#è?¤é%ù&ì\\ò(Ç)*:Ø+;ÄäøÆ,<LÖlöæ\-=ÑñÅß.>ÜüåÉ/§à¡¿']+$"#
    )
    .unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("keyword may not be empty")]
    Empty,
    #[error("keyword must be all lower case: {0}")]
    NotLowerCase(String),
    #[error("keyword is longer than {MAX_KEYWORD_LENGTH} characters: {0}")]
    TooLong(String),
    #[error("keyword contains characters outside the GSM character set: {0}")]
    NotGsm(String),
    #[error("keyword clashes with the reserved word '{reserved}': {token}")]
    Reserved { token: String, reserved: String },
    #[error("keyword '{token}' overlaps with existing keyword '{existing}'")]
    Overlap { token: String, existing: String },
    #[error("keyword '{0}' would deactivate before it activates")]
    BackwardsWindow(String),
}

/// Check a proposed keyword token against the token rules and the other
/// un-archived tokens already defined.
///
/// Because matching is by prefix, a token may not share a prefix with a
/// reserved word or another keyword in either direction: "event" and
/// "events" side by side would make matches order-dependent.
pub fn validate_keyword_token(token: &str, existing: &[&str]) -> Result<(), ValidationError> {
    if token.is_empty() {
        return Err(ValidationError::Empty);
    }
    if token.chars().any(|c| c.is_uppercase()) {
        return Err(ValidationError::NotLowerCase(token.to_string()));
    }
    if token.chars().count() > MAX_KEYWORD_LENGTH {
        return Err(ValidationError::TooLong(token.to_string()));
    }
    if !GSM_CHARS.is_match(token) {
        return Err(ValidationError::NotGsm(token.to_string()));
    }

    let reserved = STOP_WORDS
        .iter()
        .chain(START_WORDS)
        .chain(INFO_WORDS)
        .chain(std::iter::once(&NAME_PREFIX));
    for word in reserved {
        if token.starts_with(word) || word.starts_with(token) {
            return Err(ValidationError::Reserved {
                token: token.to_string(),
                reserved: word.to_string(),
            });
        }
    }

    for other in existing {
        if token.starts_with(other) || other.starts_with(token) {
            return Err(ValidationError::Overlap {
                token: token.to_string(),
                existing: other.to_string(),
            });
        }
    }

    Ok(())
}

/// The live window must not be backwards when both ends are set.
pub fn validate_window(keyword: &Keyword) -> Result<(), ValidationError> {
    if let Some(deactivate_time) = keyword.deactivate_time {
        if keyword.activate_time > deactivate_time {
            return Err(ValidationError::BackwardsWindow(keyword.keyword.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_valid_tokens() {
        assert!(validate_keyword_token("event", &[]).is_ok());
        assert!(validate_keyword_token("bbq2025", &["event"]).is_ok());
    }

    #[test]
    fn test_token_shape_rules() {
        assert_eq!(validate_keyword_token("", &[]), Err(ValidationError::Empty));
        assert!(matches!(
            validate_keyword_token("Event", &[]),
            Err(ValidationError::NotLowerCase(_))
        ));
        assert!(matches!(
            validate_keyword_token("averylongkeyword", &[]),
            Err(ValidationError::TooLong(_))
        ));
        assert!(matches!(
            validate_keyword_token("caf\u{00e9}\u{2603}", &[]),
            Err(ValidationError::NotGsm(_))
        ));
    }

    #[test]
    fn test_reserved_words_are_rejected_in_both_prefix_directions() {
        assert!(matches!(
            validate_keyword_token("stop", &[]),
            Err(ValidationError::Reserved { .. })
        ));
        // Token extending a reserved word.
        assert!(matches!(
            validate_keyword_token("names", &[]),
            Err(ValidationError::Reserved { .. })
        ));
        // Token that is a prefix of a reserved word.
        assert!(matches!(
            validate_keyword_token("sto", &[]),
            Err(ValidationError::Reserved { .. })
        ));
        assert!(matches!(
            validate_keyword_token("helper", &[]),
            Err(ValidationError::Reserved { .. })
        ));
    }

    #[test]
    fn test_overlapping_tokens_are_rejected() {
        assert!(matches!(
            validate_keyword_token("event", &["events"]),
            Err(ValidationError::Overlap { .. })
        ));
        assert!(matches!(
            validate_keyword_token("events", &["event"]),
            Err(ValidationError::Overlap { .. })
        ));
        assert!(matches!(
            validate_keyword_token("event", &["event"]),
            Err(ValidationError::Overlap { .. })
        ));
        assert!(validate_keyword_token("event", &["bbq"]).is_ok());
    }

    #[test]
    fn test_window_validation() {
        let mut keyword = Keyword {
            keyword: "event".to_string(),
            description: String::new(),
            is_archived: false,
            disable_all_replies: false,
            custom_response: String::new(),
            custom_response_new_person: String::new(),
            deactivated_response: String::new(),
            too_early_response: String::new(),
            activate_time: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            deactivate_time: Some(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()),
            linked_groups: Vec::new(),
        };
        assert!(validate_window(&keyword).is_ok());

        keyword.deactivate_time = Some(Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(
            validate_window(&keyword),
            Err(ValidationError::BackwardsWindow("event".to_string()))
        );

        keyword.deactivate_time = None;
        assert!(validate_window(&keyword).is_ok());
    }
}
