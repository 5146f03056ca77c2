//! Reply resolution for matched keywords and reserved words.

use chrono::{DateTime, Utc};

use crate::config::DefaultResponses;
use crate::keyword::Keyword;
use crate::personalize::substitute_keyword;

/// Reply for the reserved "info"/"help" words. The carrier usually answers
/// these itself; this text covers numbers where it does not.
pub const INFO_REPLY: &str =
    "Reply with one of our keywords, or with 'name John Smith' to tell us who you are. \
     Reply STOP to opt out.";

/// Pick the response for a matched keyword.
///
/// Precedence, first applicable rule wins:
/// 1. `disable_all_replies` silences the keyword outright.
/// 2. Outside the live window, the keyword's own deactivated/too-early
///    response applies, falling back to the site-wide not-live default.
/// 3. Inside the window, `custom_response` (or the site-wide auto reply if
///    unset), overridden by `custom_response_new_person` for new senders.
///
/// `%keyword%` is substituted whichever branch produced the reply.
pub fn resolve_keyword_reply(
    keyword: &Keyword,
    now: DateTime<Utc>,
    is_new_sender: bool,
    defaults: &DefaultResponses,
) -> String {
    if keyword.disable_all_replies {
        return String::new();
    }

    let reply = if !keyword.is_live(now) {
        if keyword.has_ended(now) && !keyword.deactivated_response.is_empty() {
            keyword.deactivated_response.clone()
        } else if keyword.has_not_started(now) && !keyword.too_early_response.is_empty() {
            keyword.too_early_response.clone()
        } else {
            defaults.default_no_keyword_not_live.clone()
        }
    } else {
        let base = if keyword.custom_response.is_empty() {
            defaults.default_no_keyword_auto_reply.clone()
        } else {
            keyword.custom_response.clone()
        };
        if is_new_sender && !keyword.custom_response_new_person.is_empty() {
            keyword.custom_response_new_person.clone()
        } else {
            base
        }
    };

    substitute_keyword(&reply, &keyword.keyword)
}

/// Parse a "name <first> <last>" command from the raw body.
///
/// The command token itself is discarded, the next whitespace-separated
/// token is the first name and the remainder (joined with single spaces)
/// is the last name. Fewer than two tokens after the command is a parse
/// failure.
pub fn parse_name_command(body: &str) -> Option<(String, String)> {
    let trimmed = body.trim_start_matches(|c: char| !c.is_alphanumeric());
    let mut tokens = trimmed.split_whitespace();
    let command = tokens.next()?;
    if !command
        .get(..4)
        .is_some_and(|p| p.eq_ignore_ascii_case("name"))
    {
        return None;
    }

    let first = tokens.next()?.to_string();
    let rest: Vec<&str> = tokens.collect();
    if rest.is_empty() {
        return None;
    }
    Some((first, rest.join(" ")))
}
