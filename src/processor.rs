//! Orchestration of one inbound SMS: classification, reply construction
//! and side-effect emission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Config, DefaultResponses, Group, SiteConfig};
use crate::keyword::{Keyword, KeywordRegistry, MatchResult, ReservedWord};
use crate::personalize::{personalize, substitute_name};
use crate::reply::{parse_name_command, resolve_keyword_reply, INFO_REPLY};

/// First name given to contacts created from an unrecognised number.
/// `Recipient::is_new` is the only place this sentinel is interpreted.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Read model of the sender, supplied by the surrounding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub number: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Set when the carrier told us this number opted out.
    #[serde(default)]
    pub is_blocking: bool,
    /// Automated replies are disabled for this person.
    #[serde(default)]
    pub do_not_reply: bool,
    /// No message of any kind may be sent to this person.
    #[serde(default)]
    pub never_contact: bool,
}

impl Recipient {
    /// A contact we have not yet identified by name.
    pub fn is_new(&self) -> bool {
        self.first_name == UNKNOWN_NAME
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A persistence or transport request emitted while processing a message.
/// The core never performs these itself; the caller applies them after
/// the webhook response is built. All of them are safe to replay:
/// `AddToGroups` is a set union, the rest overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Command {
    SetBlocking {
        number: String,
        blocking: bool,
    },
    UpdateName {
        number: String,
        first_name: String,
        last_name: String,
    },
    AddToGroups {
        number: String,
        groups: Vec<String>,
    },
    /// Send the auto name request template as a separate outbound message.
    RequestName {
        number: String,
    },
    Notify {
        channel: String,
        subject: String,
        body: String,
    },
}

/// Receives the commands emitted during processing, in emission order.
/// The surrounding application implements this against its queue; tests
/// and simple callers can use the `Vec<Command>` implementation.
pub trait SideEffectSink {
    fn emit(&mut self, command: Command);
}

impl SideEffectSink for Vec<Command> {
    fn emit(&mut self, command: Command) {
        self.push(command);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Empty string means no reply is sent.
    pub reply: String,
    /// Label of what matched ("stop", a keyword token, "No Match", ...),
    /// recorded against the inbound message for audit.
    pub matched: String,
    pub commands: Vec<Command>,
}

/// Processes inbound messages against an immutable snapshot of keyword
/// and site state. Holds no interior mutability, so one processor can be
/// shared across concurrent webhook deliveries; liveness is always
/// computed from the `received_at` passed to each call.
pub struct InboundSmsProcessor {
    registry: KeywordRegistry,
    site: SiteConfig,
    responses: DefaultResponses,
    groups: Vec<Group>,
}

impl InboundSmsProcessor {
    pub fn new(config: Config) -> Self {
        InboundSmsProcessor {
            registry: KeywordRegistry::new(config.keywords),
            site: config.site,
            responses: config.responses,
            groups: config.groups,
        }
    }

    pub fn registry(&self) -> &KeywordRegistry {
        &self.registry
    }

    /// Process one inbound message, collecting commands into a fresh list.
    pub fn process(
        &self,
        sender: &Recipient,
        body: &str,
        received_at: DateTime<Utc>,
    ) -> ProcessOutcome {
        let mut commands = Vec::new();
        let (reply, matched) = self.process_with_sink(sender, body, received_at, &mut commands);
        ProcessOutcome {
            reply,
            matched,
            commands,
        }
    }

    /// Process one inbound message, emitting commands into the caller's
    /// sink. Returns the reply (possibly empty) and the match label.
    pub fn process_with_sink(
        &self,
        sender: &Recipient,
        body: &str,
        received_at: DateTime<Utc>,
        sink: &mut dyn SideEffectSink,
    ) -> (String, String) {
        let is_new_sender = sender.is_new();
        let result = self.registry.find_match(body);
        let matched = result.label().to_string();
        log::debug!("message from {} matched {matched:?}", sender.number);

        let mut reply = String::new();
        // %name% is normally filled with the stored first name; a
        // successful name update personalises with the new name instead.
        let mut personal_name = sender.first_name.clone();
        // "start" must still be answered while the sender is blocking,
        // otherwise they could never opt back in.
        let mut bypass_blocking = false;

        match result {
            MatchResult::Reserved(ReservedWord::Stop) => {
                sink.emit(Command::SetBlocking {
                    number: sender.number.clone(),
                    blocking: true,
                });
                sink.emit(Command::Notify {
                    channel: self.site.office_email.clone(),
                    subject: "Blacklist update".to_string(),
                    body: format!("{} ({}) is now blocking us", sender.number, sender.full_name()),
                });
            }
            MatchResult::Reserved(ReservedWord::Start) => {
                sink.emit(Command::SetBlocking {
                    number: sender.number.clone(),
                    blocking: false,
                });
                reply = self.responses.start_reply.clone();
                bypass_blocking = true;
            }
            MatchResult::Reserved(ReservedWord::Info) => {
                reply = INFO_REPLY.to_string();
            }
            MatchResult::Reserved(ReservedWord::Name) => match parse_name_command(body) {
                Some((first_name, last_name)) => {
                    sink.emit(Command::UpdateName {
                        number: sender.number.clone(),
                        first_name: first_name.clone(),
                        last_name,
                    });
                    reply = substitute_name(&self.responses.name_update_reply, &first_name);
                    personal_name = first_name;
                }
                None => {
                    log::debug!("could not parse name command from {}", sender.number);
                    reply = self.responses.name_failure_reply.clone();
                }
            },
            MatchResult::Keyword(keyword) => {
                reply = resolve_keyword_reply(keyword, received_at, is_new_sender, &self.responses);
                // Group joins fire even when the reply ends up suppressed:
                // blocking hides the message, not the membership change.
                let groups = self.unarchived_linked_groups(keyword);
                if !groups.is_empty() {
                    sink.emit(Command::AddToGroups {
                        number: sender.number.clone(),
                        groups,
                    });
                }
            }
            MatchResult::NoMatch => {
                reply = self.responses.keyword_no_match.clone();
                if is_new_sender && !sender.is_blocking && !sender.never_contact {
                    if !self.site.disable_all_replies && !self.responses.auto_name_request.is_empty()
                    {
                        sink.emit(Command::RequestName {
                            number: sender.number.clone(),
                        });
                    }
                    sink.emit(Command::Notify {
                        channel: self.site.office_email.clone(),
                        subject: "Unknown contact".to_string(),
                        body: format!(
                            "SMS: {body}\nFrom: {}\n\nThis person is unknown and has been asked \
                             for their name.",
                            sender.number
                        ),
                    });
                }
            }
        }

        if !reply.is_empty() {
            reply = personalize(&reply, &personal_name);
        }

        let suppressed = self.site.disable_all_replies
            || sender.do_not_reply
            || sender.never_contact
            || (sender.is_blocking && !bypass_blocking);
        if suppressed && !reply.is_empty() {
            log::info!("reply to {} suppressed", sender.number);
            reply.clear();
        }

        (reply, matched)
    }

    fn unarchived_linked_groups(&self, keyword: &Keyword) -> Vec<String> {
        keyword
            .linked_groups
            .iter()
            .filter(|name| {
                self.groups
                    .iter()
                    .any(|g| &g.name == *name && !g.is_archived)
            })
            .cloned()
            .collect()
    }
}
