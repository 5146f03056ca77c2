use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // Matches the characters stripped from inbound bodies before matching.
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[\W_]+").unwrap();
}

/// Words the carrier treats as opt-out requests. Any inbound message
/// starting with one of these must set the blocking flag.
pub const STOP_WORDS: &[&str] = &["stop", "stopall", "unsubscribe", "cancel", "end", "quit"];
/// Words that opt a previously blocked sender back in.
pub const START_WORDS: &[&str] = &["start", "yes", "unstop"];
pub const INFO_WORDS: &[&str] = &["info", "help"];
/// Prefix for the "name <first> <last>" self-identification command.
pub const NAME_PREFIX: &str = "name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedWord {
    Stop,
    Start,
    Info,
    Name,
}

impl ReservedWord {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservedWord::Stop => "stop",
            ReservedWord::Start => "start",
            ReservedWord::Info => "info",
            ReservedWord::Name => "name",
        }
    }
}

/// Result of classifying one inbound body against the keyword snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult<'a> {
    Reserved(ReservedWord),
    Keyword(&'a Keyword),
    NoMatch,
}

impl MatchResult<'_> {
    /// Label stored against the inbound message for audit purposes.
    pub fn label(&self) -> &str {
        match self {
            MatchResult::Reserved(word) => word.as_str(),
            MatchResult::Keyword(keyword) => &keyword.keyword,
            MatchResult::NoMatch => "No Match",
        }
    }
}

/// A keyword definition as read from the admin-maintained store.
///
/// The live window is derived from `activate_time`/`deactivate_time` on
/// every call with the caller's clock. Nothing temporal is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub keyword: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_archived: bool,
    /// Never reply to this keyword, even when matched.
    #[serde(default)]
    pub disable_all_replies: bool,
    #[serde(default)]
    pub custom_response: String,
    /// Used instead of `custom_response` when the sender is new.
    #[serde(default)]
    pub custom_response_new_person: String,
    /// Sent when the keyword matched after its deactivation time.
    #[serde(default)]
    pub deactivated_response: String,
    /// Sent when the keyword matched before its activation time.
    #[serde(default)]
    pub too_early_response: String,
    #[serde(default = "Utc::now")]
    pub activate_time: DateTime<Utc>,
    /// None means the keyword never deactivates.
    #[serde(default)]
    pub deactivate_time: Option<DateTime<Utc>>,
    /// Groups the sender is added to on a match.
    #[serde(default)]
    pub linked_groups: Vec<String>,
}

impl Keyword {
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now > self.activate_time
    }

    pub fn has_not_started(&self, now: DateTime<Utc>) -> bool {
        !self.has_started(now)
    }

    pub fn has_not_ended(&self, now: DateTime<Utc>) -> bool {
        match self.deactivate_time {
            None => true,
            Some(deactivate_time) => now < deactivate_time,
        }
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        !self.has_not_ended(now)
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.has_started(now) && self.has_not_ended(now)
    }
}

/// Immutable snapshot of the un-archived keywords, ordered for matching.
///
/// Built once per inbound message (or from a short-lived cache) and shared
/// freely: matching takes `&self` and holds no interior mutability.
pub struct KeywordRegistry {
    keywords: Vec<Keyword>,
}

impl KeywordRegistry {
    pub fn new(mut keywords: Vec<Keyword>) -> Self {
        keywords.retain(|k| !k.is_archived);
        // Ascending token order decides ties between overlapping prefixes.
        keywords.sort_by(|a, b| a.keyword.cmp(&b.keyword));
        KeywordRegistry { keywords }
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    /// Lowercase, trim and drop every non-alphanumeric character, so that
    /// punctuation-prefixed messages ("!!!test") match their keyword.
    pub fn normalize(text: &str) -> String {
        let lowered = text.to_lowercase();
        NON_ALPHANUMERIC.replace_all(lowered.trim(), "").into_owned()
    }

    /// Classify an inbound body. Reserved words are checked first, in
    /// fixed priority order, and short-circuit keyword lookup entirely.
    pub fn find_match(&self, text: &str) -> MatchResult<'_> {
        let cleaned = Self::normalize(text);
        if cleaned.is_empty() {
            return MatchResult::NoMatch;
        }

        if STOP_WORDS.iter().any(|w| cleaned.starts_with(w)) {
            return MatchResult::Reserved(ReservedWord::Stop);
        }
        if START_WORDS.iter().any(|w| cleaned.starts_with(w)) {
            return MatchResult::Reserved(ReservedWord::Start);
        }
        if INFO_WORDS.iter().any(|w| cleaned.starts_with(w)) {
            return MatchResult::Reserved(ReservedWord::Info);
        }
        if cleaned.starts_with(NAME_PREFIX) {
            return MatchResult::Reserved(ReservedWord::Name);
        }

        // Linear scan is fine here - deployments have tens of keywords,
        // not thousands. First prefix match in token order wins.
        for keyword in &self.keywords {
            if cleaned.starts_with(&keyword.keyword) {
                log::debug!("matched keyword '{}' for body {cleaned:?}", keyword.keyword);
                return MatchResult::Keyword(keyword);
            }
        }

        log::debug!("no keyword matched for body {cleaned:?}");
        MatchResult::NoMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn keyword(token: &str) -> Keyword {
        Keyword {
            keyword: token.to_string(),
            description: String::new(),
            is_archived: false,
            disable_all_replies: false,
            custom_response: String::new(),
            custom_response_new_person: String::new(),
            deactivated_response: String::new(),
            too_early_response: String::new(),
            activate_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            deactivate_time: None,
            linked_groups: Vec::new(),
        }
    }

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(KeywordRegistry::normalize("  !!!Test Msg  "), "testmsg");
        assert_eq!(KeywordRegistry::normalize("under_score"), "underscore");
    }

    #[test]
    fn test_empty_and_garbage_bodies_do_not_match() {
        let registry = KeywordRegistry::new(vec![keyword("test")]);
        for body in ["", "   ", "###", "_"] {
            assert_eq!(registry.find_match(body), MatchResult::NoMatch);
        }
    }

    #[test]
    fn test_prefix_match_with_punctuation() {
        let registry = KeywordRegistry::new(vec![keyword("test")]);
        for body in ["test", "Test msg", "!!!test", "TESTING 1 2 3"] {
            match registry.find_match(body) {
                MatchResult::Keyword(k) => assert_eq!(k.keyword, "test"),
                other => panic!("expected keyword match for {body:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_alphabetic_tie_break_on_overlapping_prefixes() {
        // "alpha" sorts before "alphabet", so it wins for "alphabetical".
        let registry = KeywordRegistry::new(vec![keyword("alphabet"), keyword("alpha")]);
        match registry.find_match("alphabetical order") {
            MatchResult::Keyword(k) => assert_eq!(k.keyword, "alpha"),
            other => panic!("expected keyword match, got {other:?}"),
        }
    }

    #[test]
    fn test_archived_keywords_are_excluded() {
        let mut archived = keyword("test");
        archived.is_archived = true;
        let registry = KeywordRegistry::new(vec![archived]);
        assert_eq!(registry.find_match("test"), MatchResult::NoMatch);
    }

    #[test]
    fn test_reserved_words_short_circuit_keywords() {
        // Even a keyword sharing the prefix loses to the reserved word.
        let registry = KeywordRegistry::new(vec![keyword("stopit")]);
        assert_eq!(
            registry.find_match("stopit now"),
            MatchResult::Reserved(ReservedWord::Stop)
        );
    }

    #[test]
    fn test_reserved_word_priority_order() {
        let registry = KeywordRegistry::new(Vec::new());
        let cases = [
            ("STOP", ReservedWord::Stop),
            ("unsubscribe me", ReservedWord::Stop),
            ("!!!cancel", ReservedWord::Stop),
            ("quit", ReservedWord::Stop),
            ("start", ReservedWord::Start),
            ("Yes please", ReservedWord::Start),
            ("unstop", ReservedWord::Start),
            ("info", ReservedWord::Info),
            ("HELP", ReservedWord::Info),
            ("name John Smith", ReservedWord::Name),
        ];
        for (body, expected) in cases {
            assert_eq!(
                registry.find_match(body),
                MatchResult::Reserved(expected),
                "body {body:?}"
            );
        }
    }

    #[test]
    fn test_live_window_is_derived_from_the_clock() {
        let mut k = keyword("event");
        k.activate_time = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        k.deactivate_time = Some(Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap());

        let before = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let during = Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();

        assert!(k.has_not_started(before));
        assert!(!k.is_live(before));
        assert!(k.is_live(during));
        assert!(k.has_ended(after));
        assert!(!k.is_live(after));

        // No deactivation time means the keyword never ends.
        k.deactivate_time = None;
        assert!(k.is_live(after));
    }

    #[test]
    fn test_match_label() {
        let registry = KeywordRegistry::new(vec![keyword("test")]);
        assert_eq!(registry.find_match("stop").label(), "stop");
        assert_eq!(registry.find_match("test msg").label(), "test");
        assert_eq!(registry.find_match("zzz").label(), "No Match");
    }
}
