//! Message domain types.
//!
//! A message is one turn in the console conversation. User messages are
//! complete on creation; assistant messages may stream; notices are
//! interim progress feedback that the engine removes once resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a message within a history.
///
/// Allocated by [`History`](crate::history::History) in strictly increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// The role of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The console operator
    User,
    /// The generation backend
    Assistant,
    /// Ephemeral progress feedback from the engine
    Notice,
}

/// Lifecycle status of a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Body is still being appended to.
    Streaming,
    /// Body is final.
    Complete,
    /// Generation faulted; body holds whatever arrived before the fault.
    Failed,
    /// Generation was cancelled; body holds whatever arrived before cancellation.
    Cancelled,
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,

    /// Who produced this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Body lifecycle
    pub status: MessageStatus,
}

impl Message {
    /// A complete user message.
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, Role::User, content, MessageStatus::Complete)
    }

    /// A finished assistant message.
    pub fn assistant(id: MessageId, content: impl Into<String>, status: MessageStatus) -> Self {
        Self::new(id, Role::Assistant, content, status)
    }

    /// A progress notice.
    pub fn notice(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, Role::Notice, content, MessageStatus::Complete)
    }

    fn new(id: MessageId, role: Role, content: impl Into<String>, status: MessageStatus) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            timestamp: Utc::now(),
            status,
        }
    }

    /// Whether the body is still being appended to.
    pub fn is_streaming(&self) -> bool {
        self.status == MessageStatus::Streaming
    }

    /// Whether the message may still be mutated by the engine.
    ///
    /// Streaming assistant messages and notices are open; everything else
    /// is frozen.
    pub fn is_open(&self) -> bool {
        self.is_streaming() || self.role == Role::Notice
    }
}
