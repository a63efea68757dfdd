//! Types for conversation management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ConversationId, MessageId};
use super::label::relative_label;

/// Title given to conversations before their first message.
pub const DEFAULT_TITLE: &str = "New conversation";

/// Placeholder text of a pending assistant message.
pub const PENDING_TEXT: &str = "...";

/// Author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person chatting.
    User,
    /// The text generator.
    Assistant,
}

/// Lifecycle state of a message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Real content.
    #[default]
    Final,
    /// Placeholder while the generator is working.
    Pending,
    /// Generic failure notice shown in place of an answer.
    Error,
}

/// A single chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within the owning conversation.
    pub id: MessageId,
    /// Who wrote it.
    pub sender: Sender,
    /// Content; a placeholder while pending.
    pub text: String,
    /// Lifecycle state.
    pub status: MessageStatus,
}

impl Message {
    /// A final message written by the user.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::User,
            text: text.into(),
            status: MessageStatus::Final,
        }
    }

    /// A pending assistant placeholder.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::Assistant,
            text: PENDING_TEXT.to_string(),
            status: MessageStatus::Pending,
        }
    }

    /// A final assistant answer.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::Assistant,
            text: text.into(),
            status: MessageStatus::Final,
        }
    }

    /// An assistant error notice.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::Assistant,
            text: text.into(),
            status: MessageStatus::Error,
        }
    }

    /// Whether this message is a pending placeholder.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }
}

/// A titled, ordered list of messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier.
    pub id: ConversationId,
    /// Display title.
    pub title: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Messages in send order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation with the default title.
    #[must_use]
    pub fn new(id: ConversationId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            created_at,
            messages: Vec::new(),
        }
    }

    /// Number of messages with `status = pending`.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_pending()).count()
    }

    /// Human-readable creation label relative to `now`.
    #[must_use]
    pub fn created_label(&self, now: DateTime<Utc>) -> String {
        relative_label(self.created_at, now)
    }
}

/// Sidebar projection of a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Display title.
    pub title: String,
    /// Relative creation label ("2 hours ago").
    pub created_label: String,
    /// Number of messages.
    pub message_count: usize,
    /// Whether this is the current conversation.
    pub is_current: bool,
}
