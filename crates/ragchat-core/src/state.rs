//! UI-agnostic chat state types
//!
//! This module contains the data structures shared between the terminal
//! client and the gateway. None of them depend on a UI framework.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reply appended to the transcript when a submission fails for any reason.
pub const ERROR_REPLY: &str = "Sorry, I encountered an error.";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
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
}

/// Opaque session identifier derived from the creation time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(i64);

impl SessionId {
    pub(crate) fn from_millis(millis: i64) -> Self {
        Self(millis)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one accepted submission, used to match a reply to its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionId(u64);

impl SubmissionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A chat session and the transcript it owns.
///
/// The id, title and creation time are fixed at creation. The transcript only
/// grows, and only through the submission controller.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: SessionId,
    title: String,
    created_at: DateTime<Utc>,
    pub(crate) transcript: Vec<ChatMessage>,
    pub(crate) pending: Option<SubmissionId>,
}

impl ChatSession {
    pub(crate) fn new(id: SessionId, title: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            created_at,
            transcript: Vec::new(),
            pending: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hello")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hello"}"#);
    }

    #[test]
    fn test_message_parses_assistant_role() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hi there"}"#).unwrap();
        assert_eq!(msg, ChatMessage::assistant("hi there"));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let parsed = serde_json::from_str::<ChatMessage>(r#"{"role":"system","content":"x"}"#);
        assert!(parsed.is_err());
    }
}
