pub mod config;
pub mod keyword;
pub mod personalize;
pub mod processor;
pub mod reply;
pub mod validators;

pub use config::{Config, DefaultResponses, Group, SiteConfig};
pub use keyword::{Keyword, KeywordRegistry, MatchResult, ReservedWord};
pub use processor::{Command, InboundSmsProcessor, ProcessOutcome, Recipient, SideEffectSink};
pub use reply::resolve_keyword_reply;
pub use validators::ValidationError;
