//! Conversation history — an ordered, versioned sequence of messages.
//!
//! All changes go through [`History::apply`]. Every successful mutation
//! bumps the version, so observers holding a [`HistorySnapshot`] can tell
//! whether they are looking at the latest state.
//!
//! The history is append-only with one exception: *open* messages (a
//! streaming assistant reply or a progress notice) may be edited or removed
//! until they are frozen. At most one message is open at any time.

use std::sync::Arc;

use crate::error::HistoryError;
use crate::message::{Message, MessageId, MessageStatus, Role};

/// A single change to the history.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Append a new message; the history allocates its id.
    Append {
        role: Role,
        content: String,
        status: MessageStatus,
    },
    /// Append an increment to a streaming message.
    AppendText { id: MessageId, text: String },
    /// Replace the body and status of an open message in place.
    Replace {
        id: MessageId,
        content: String,
        status: MessageStatus,
    },
    /// Change the status of an open message, keeping its body.
    SetStatus { id: MessageId, status: MessageStatus },
    /// Remove an open message.
    Remove { id: MessageId },
}

impl Mutation {
    pub fn append(role: Role, content: impl Into<String>, status: MessageStatus) -> Self {
        Self::Append {
            role,
            content: content.into(),
            status,
        }
    }
}

/// Read-only view of the history at a given version.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    pub version: u64,
    pub messages: Arc<Vec<Message>>,
}

impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// The currently open message, if any.
    pub fn open_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_open())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }
}

/// The conversation history owned by the engine.
#[derive(Debug, Default)]
pub struct History {
    messages: Vec<Message>,
    version: u64,
    next_id: u64,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// The currently open message, if any.
    pub fn open_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_open())
    }

    /// Apply a mutation. Returns the id of the affected message.
    pub fn apply(&mut self, mutation: Mutation) -> Result<MessageId, HistoryError> {
        let id = match mutation {
            Mutation::Append {
                role,
                content,
                status,
            } => {
                let opens = status == MessageStatus::Streaming || role == Role::Notice;
                if opens {
                    if let Some(open) = self.open_message() {
                        return Err(HistoryError::AlreadyOpen { open: open.id.0 });
                    }
                }
                self.next_id += 1;
                let id = MessageId(self.next_id);
                let message = match role {
                    Role::User => Message::user(id, content),
                    Role::Notice => Message::notice(id, content),
                    Role::Assistant => Message::assistant(id, content, status),
                };
                self.messages.push(message);
                id
            }
            Mutation::AppendText { id, text } => {
                let message = self.open_mut(id)?;
                if !message.is_streaming() {
                    return Err(HistoryError::NotStreaming(id.0));
                }
                message.content.push_str(&text);
                id
            }
            Mutation::Replace {
                id,
                content,
                status,
            } => {
                let message = self.open_mut(id)?;
                message.content = content;
                message.status = status;
                id
            }
            Mutation::SetStatus { id, status } => {
                self.open_mut(id)?.status = status;
                id
            }
            Mutation::Remove { id } => {
                self.open_mut(id)?;
                self.messages.retain(|m| m.id != id);
                id
            }
        };
        self.version += 1;
        Ok(id)
    }

    /// A read-only copy of the current state.
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            version: self.version,
            messages: Arc::new(self.messages.clone()),
        }
    }

    fn open_mut(&mut self, id: MessageId) -> Result<&mut Message, HistoryError> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(HistoryError::UnknownMessage(id.0))?;
        if !message.is_open() {
            return Err(HistoryError::Frozen(id.0));
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_version_tracks_mutations() {
        let mut history = History::new();
        let a = history
            .apply(Mutation::append(Role::User, "one", MessageStatus::Complete))
            .unwrap();
        let b = history
            .apply(Mutation::append(Role::User, "two", MessageStatus::Complete))
            .unwrap();
        assert!(b > a);
        assert_eq!(history.version(), 2);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn streaming_message_grows_then_freezes() {
        let mut history = History::new();
        let id = history
            .apply(Mutation::append(Role::Assistant, "", MessageStatus::Streaming))
            .unwrap();
        history
            .apply(Mutation::AppendText { id, text: "Sys".into() })
            .unwrap();
        history
            .apply(Mutation::AppendText { id, text: "tem optimal.".into() })
            .unwrap();
        history
            .apply(Mutation::SetStatus { id, status: MessageStatus::Complete })
            .unwrap();

        let msg = history.get(id).unwrap();
        assert_eq!(msg.content, "System optimal.");
        assert!(!msg.is_streaming());
        assert!(history.open_message().is_none());
    }

    #[test]
    fn only_one_open_message_at_a_time() {
        let mut history = History::new();
        let notice = history
            .apply(Mutation::append(Role::Notice, "Scanning memory...", MessageStatus::Complete))
            .unwrap();
        let err = history
            .apply(Mutation::append(Role::Assistant, "", MessageStatus::Streaming))
            .unwrap_err();
        assert_eq!(err, HistoryError::AlreadyOpen { open: notice.0 });
        // A failed append leaves the version untouched.
        assert_eq!(history.version(), 1);
    }

    #[test]
    fn frozen_messages_cannot_be_edited_or_removed() {
        let mut history = History::new();
        let id = history
            .apply(Mutation::append(Role::User, "status report", MessageStatus::Complete))
            .unwrap();
        assert_eq!(
            history.apply(Mutation::Remove { id }).unwrap_err(),
            HistoryError::Frozen(id.0)
        );
        assert_eq!(
            history
                .apply(Mutation::AppendText { id, text: "x".into() })
                .unwrap_err(),
            HistoryError::Frozen(id.0)
        );
    }

    #[test]
    fn notice_can_be_replaced_then_removed() {
        let mut history = History::new();
        let id = history
            .apply(Mutation::append(Role::Notice, "Scanning memory...", MessageStatus::Complete))
            .unwrap();
        history
            .apply(Mutation::Replace {
                id,
                content: "Identified 1 relevant memory fragments.".into(),
                status: MessageStatus::Complete,
            })
            .unwrap();
        assert_eq!(
            history.get(id).unwrap().content,
            "Identified 1 relevant memory fragments."
        );
        history.apply(Mutation::Remove { id }).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut history = History::new();
        let err = history
            .apply(Mutation::Remove { id: MessageId(42) })
            .unwrap_err();
        assert_eq!(err, HistoryError::UnknownMessage(42));
    }

    #[test]
    fn snapshots_are_detached_from_later_mutations() {
        let mut history = History::new();
        history
            .apply(Mutation::append(Role::User, "first", MessageStatus::Complete))
            .unwrap();
        let snap = history.snapshot();
        history
            .apply(Mutation::append(Role::User, "second", MessageStatus::Complete))
            .unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.version, 1);
        assert_eq!(history.snapshot().len(), 2);
    }
}
