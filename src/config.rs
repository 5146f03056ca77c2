use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::keyword::Keyword;
use crate::validators::{validate_keyword_token, validate_window, ValidationError};

/// Full read snapshot handed to the processor: site switches, default
/// response templates, group read models and keyword definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub responses: DefaultResponses,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Global kill switch: no automated reply is ever sent while set.
    #[serde(default)]
    pub disable_all_replies: bool,
    /// Address that receives blacklist and unknown-contact notifications.
    #[serde(default)]
    pub office_email: String,
}

/// Read model of a recipient group. Only the archived flag matters here:
/// archived groups are skipped when a keyword match triggers group joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
}

/// Site-wide fallback templates. An empty template means "send nothing".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultResponses {
    pub keyword_no_match: String,
    pub default_no_keyword_auto_reply: String,
    pub default_no_keyword_not_live: String,
    pub start_reply: String,
    pub auto_name_request: String,
    pub name_update_reply: String,
    pub name_failure_reply: String,
}

impl Default for DefaultResponses {
    fn default() -> Self {
        DefaultResponses {
            keyword_no_match: "Thank you, %name%, your message has not matched any of our \
                               keywords. Please correct your message and try again."
                .to_string(),
            default_no_keyword_auto_reply: "Thank you, %name%, your message has been received."
                .to_string(),
            default_no_keyword_not_live: "Thank you, %name%, for your text. But \"%keyword%\" \
                                          is not active..."
                .to_string(),
            start_reply: "Thanks for signing up!".to_string(),
            auto_name_request: "Hi there, I'm afraid we currently don't have your number in \
                                our address book. Could you please reply in the format\n\
                                'name John Smith'"
                .to_string(),
            name_update_reply: "Thanks %s!".to_string(),
            name_failure_reply: "Something went wrong, sorry, please try again with the format \
                                 'name John Smith'."
                .to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            site: SiteConfig {
                disable_all_replies: false,
                office_email: "office@example.com".to_string(),
            },
            responses: DefaultResponses::default(),
            groups: vec![Group {
                name: "Welcome Team".to_string(),
                is_archived: false,
            }],
            keywords: vec![Keyword {
                keyword: "welcome".to_string(),
                description: "Newcomers introduction".to_string(),
                is_archived: false,
                disable_all_replies: false,
                custom_response: "Thanks %name%, we will be in touch shortly!".to_string(),
                custom_response_new_person: String::new(),
                deactivated_response: String::new(),
                too_early_response: String::new(),
                activate_time: Utc::now(),
                deactivate_time: None,
                linked_groups: vec!["Welcome Team".to_string()],
            }],
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Run the edit-time checks over every keyword in the snapshot. These
    /// are the same rules the admin surface applies on keyword creation;
    /// the match path itself assumes they already passed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (i, keyword) in self.keywords.iter().enumerate() {
            if !keyword.is_archived {
                let others: Vec<&str> = self
                    .keywords
                    .iter()
                    .enumerate()
                    .filter(|(j, k)| *j != i && !k.is_archived)
                    .map(|(_, k)| k.keyword.as_str())
                    .collect();
                validate_keyword_token(&keyword.keyword, &others)?;
            }
            validate_window(keyword)?;
        }
        Ok(())
    }
}
