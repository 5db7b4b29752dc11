//! UI-agnostic chat state types
//!
//! These are shared by every surface that shows a conversation (the HTML
//! renderer, the terminal `chat` command) and don't depend on any of them.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A chat message in the agent conversation
///
/// Messages are created when sent or received and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Local>>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Stamp the message with the current local time.
    pub fn stamped_now(self) -> Self {
        self.with_timestamp(Local::now())
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        assert_eq!(ChatRole::from_str("Assistant"), Some(ChatRole::Assistant));
        assert_eq!(ChatRole::from_str("user"), Some(ChatRole::User));
        assert_eq!(ChatRole::from_str("system"), None);
        assert_eq!(ChatRole::User.as_str(), "user");
    }

    #[test]
    fn test_message_serializes_role_lowercase_without_timestamp() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
