//! Request and response models shared by clients.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Role of the message sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Reason for finishing the response generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    /// The token limit (`max_tokens`) was reached
    Length,
    Other,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Usage {
    /// Total prompt tokens used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,

    /// Total completion tokens used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
}

/// Provider-agnostic response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Generated messages (typically one assistant message)
    pub data: Vec<Message>,

    /// Token usage information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Finish reason for the response generation
    pub finish: FinishReason,
}

impl Response {
    /// Concatenated content of all generated messages.
    pub fn text(&self) -> String {
        self.data.iter().map(|m| m.content.as_str()).join("\n\n")
    }
}

/// Streaming response chunk - can be data, usage, or finish information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StreamChunk {
    /// Message content delta
    Data(Message),

    /// Token usage information
    Usage(Usage),

    /// Finish reason
    Finish(FinishReason),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::from_str::<Role>("\"system\"").unwrap(), Role::System);
    }

    #[test]
    fn test_response_text_joins_messages() {
        let response = Response {
            data: vec![Message::assistant("first"), Message::assistant("second")],
            usage: None,
            finish: FinishReason::Stop,
        };
        assert_eq!(response.text(), "first\n\nsecond");
    }
}
