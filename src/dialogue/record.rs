//! Record model for the persisted dialogue log.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a dialogue record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueRole {
    /// Behavioral instruction seeded once per conversation.
    System,
    /// Inbound question from the platform.
    User,
    /// Generated answer.
    Assistant,
}

impl DialogueRole {
    /// Stable string form for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for DialogueRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DialogueRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(value.to_string()),
        }
    }
}

/// Role/content pair in the shape the completion endpoint expects.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role.
    pub role: DialogueRole,
    /// Message content.
    pub content: String,
}

impl ChatMessage {
    /// Build a message with the given role.
    #[must_use]
    pub fn new(role: DialogueRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}
