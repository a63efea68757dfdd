//! Error types for conversation management.

use thiserror::Error;

use super::ids::ConversationId;

/// Validation errors raised by store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Rename target title is blank after trimming.
    #[error("conversation title must not be empty")]
    EmptyTitle,
    /// No conversation with this id exists.
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),
}

/// Convenience result alias for store operations.
pub type ChatResult<T> = Result<T, ChatError>;
