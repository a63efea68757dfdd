//! In-memory conversation store driven by a pure reducer.
//!
//! Every state change is a [`ConversationAction`] applied by [`reduce`], which
//! consumes the previous state and returns the next one. The `&mut self`
//! methods on [`ConversationStore`] are thin wrappers that validate input,
//! build the action and run it through the reducer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::errors::{ChatError, ChatResult};
use super::ids::{ConversationId, MessageId};
use super::title::derive_title;
use super::types::{Conversation, ConversationSummary, DEFAULT_TITLE, Message};

/// Base URL for shareable conversation links.
const SHARE_BASE_URL: &str = "https://healthhub-chatbot.com/share";

/// A state transition of the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConversationAction {
    /// Insert an empty conversation at the head and make it current.
    Create {
        /// Identifier of the new conversation.
        id: ConversationId,
        /// Creation time.
        created_at: DateTime<Utc>,
    },
    /// Make an existing conversation current.
    Select {
        /// Conversation to select.
        id: ConversationId,
    },
    /// Replace the title of a conversation.
    Rename {
        /// Conversation to rename.
        id: ConversationId,
        /// New title; blank titles are ignored.
        title: String,
    },
    /// Remove a conversation.
    Delete {
        /// Conversation to delete.
        id: ConversationId,
    },
    /// Append a user message, deriving the title on the first one.
    AppendUser {
        /// Target conversation.
        conversation: ConversationId,
        /// The user's message.
        message: Message,
    },
    /// Append the pending assistant placeholder.
    AppendPending {
        /// Target conversation.
        conversation: ConversationId,
        /// The placeholder.
        message: Message,
    },
    /// Replace the pending placeholder with the answer or error notice.
    ///
    /// Ignored unless the conversation's last message is that placeholder.
    Settle {
        /// Target conversation.
        conversation: ConversationId,
        /// Placeholder being replaced.
        pending: MessageId,
        /// Final or error message.
        message: Message,
    },
}

/// Ordered conversations (newest first) and the current selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    current: Option<ConversationId>,
}

/// Apply `action` to `state` and return the next state.
///
/// The reducer never fails: actions that target unknown conversations or
/// would break an invariant leave the state unchanged. After every action,
/// a non-empty store has exactly one current conversation.
#[must_use]
pub fn reduce(mut state: ConversationStore, action: ConversationAction) -> ConversationStore {
    match action {
        ConversationAction::Create { id, created_at } => {
            if state.position(id).is_none() {
                state.conversations.insert(0, Conversation::new(id, created_at));
                state.current = Some(id);
            }
        }
        ConversationAction::Select { id } => {
            if state.position(id).is_some() {
                state.current = Some(id);
            }
        }
        ConversationAction::Rename { id, title } => {
            if !title.trim().is_empty() {
                if let Some(conversation) = state.get_mut(id) {
                    conversation.title = title;
                }
            }
        }
        ConversationAction::Delete { id } => {
            if let Some(index) = state.position(id) {
                state.conversations.remove(index);
                if state.current == Some(id) {
                    state.current = state.conversations.first().map(|c| c.id);
                }
            }
        }
        ConversationAction::AppendUser {
            conversation,
            message,
        } => {
            if let Some(conversation) = state.get_mut(conversation) {
                if !ends_with_pending(conversation) {
                    if conversation.messages.is_empty() && conversation.title == DEFAULT_TITLE {
                        conversation.title = derive_title(&message.text);
                    }
                    conversation.messages.push(message);
                }
            }
        }
        ConversationAction::AppendPending {
            conversation,
            message,
        } => {
            if let Some(conversation) = state.get_mut(conversation) {
                if !ends_with_pending(conversation) {
                    conversation.messages.push(message);
                }
            }
        }
        ConversationAction::Settle {
            conversation,
            pending,
            message,
        } => {
            if let Some(conversation) = state.get_mut(conversation) {
                let settles_tail = conversation
                    .messages
                    .last()
                    .is_some_and(|m| m.is_pending() && m.id == pending);
                if settles_tail {
                    conversation.messages.pop();
                    conversation.messages.push(message);
                }
            }
        }
    }

    if state.current.is_none() {
        state.current = state.conversations.first().map(|c| c.id);
    }
    state
}

fn ends_with_pending(conversation: &Conversation) -> bool {
    conversation.messages.last().is_some_and(Message::is_pending)
}

impl ConversationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` through [`reduce`] in place.
    pub fn apply(&mut self, action: ConversationAction) {
        let state = std::mem::take(self);
        *self = reduce(state, action);
    }

    /// Create a new conversation stamped with the current time.
    pub fn create_conversation(&mut self) -> ConversationId {
        self.create_conversation_at(Utc::now())
    }

    /// Create a new conversation with an explicit creation time.
    pub fn create_conversation_at(&mut self, created_at: DateTime<Utc>) -> ConversationId {
        let id = ConversationId::new();
        self.apply(ConversationAction::Create { id, created_at });
        id
    }

    /// Make `id` the current conversation.
    ///
    /// # Errors
    /// Returns `NotFound` (state unchanged) if `id` is unknown.
    pub fn select_conversation(&mut self, id: ConversationId) -> ChatResult<()> {
        self.ensure_exists(id)?;
        self.apply(ConversationAction::Select { id });
        Ok(())
    }

    /// Rename a conversation.
    ///
    /// # Errors
    /// Returns `EmptyTitle` for blank titles and `NotFound` for unknown ids;
    /// the title is unchanged in both cases.
    pub fn rename_conversation(&mut self, id: ConversationId, title: &str) -> ChatResult<()> {
        if title.trim().is_empty() {
            return Err(ChatError::EmptyTitle);
        }
        self.ensure_exists(id)?;
        self.apply(ConversationAction::Rename {
            id,
            title: title.to_string(),
        });
        Ok(())
    }

    /// Delete a conversation, moving the selection if it was current.
    ///
    /// # Errors
    /// Returns `NotFound` if `id` is unknown.
    pub fn delete_conversation(&mut self, id: ConversationId) -> ChatResult<()> {
        self.ensure_exists(id)?;
        self.apply(ConversationAction::Delete { id });
        Ok(())
    }

    /// Sidebar projection in display order.
    #[must_use]
    pub fn list_conversations(&self, now: DateTime<Utc>) -> Vec<ConversationSummary> {
        self.conversations
            .iter()
            .map(|c| self.summarize(c, now))
            .collect()
    }

    /// Sidebar projection of one conversation.
    #[must_use]
    pub fn summary(&self, id: ConversationId, now: DateTime<Utc>) -> Option<ConversationSummary> {
        self.get(id).map(|c| self.summarize(c, now))
    }

    /// Shareable link for a conversation.
    ///
    /// # Errors
    /// Returns `NotFound` if `id` is unknown.
    pub fn share_link(&self, id: ConversationId) -> ChatResult<String> {
        self.ensure_exists(id)?;
        Ok(format!("{SHARE_BASE_URL}/{id}"))
    }

    /// All conversations, newest first.
    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Identifier of the current conversation.
    #[must_use]
    pub const fn current_id(&self) -> Option<ConversationId> {
        self.current
    }

    /// The current conversation.
    #[must_use]
    pub fn current(&self) -> Option<&Conversation> {
        self.current.and_then(|id| self.get(id))
    }

    /// Look up a conversation.
    #[must_use]
    pub fn get(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Whether a conversation exists.
    #[must_use]
    pub fn contains(&self, id: ConversationId) -> bool {
        self.position(id).is_some()
    }

    /// Number of conversations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether the store holds no conversations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub(crate) fn insert_seeded(&mut self, conversation: Conversation) {
        if self.position(conversation.id).is_none() {
            self.conversations.push(conversation);
        }
        if self.current.is_none() {
            self.current = self.conversations.first().map(|c| c.id);
        }
    }

    fn summarize(&self, c: &Conversation, now: DateTime<Utc>) -> ConversationSummary {
        ConversationSummary {
            id: c.id,
            title: c.title.clone(),
            created_label: c.created_label(now),
            message_count: c.messages.len(),
            is_current: self.current == Some(c.id),
        }
    }

    fn ensure_exists(&self, id: ConversationId) -> ChatResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(ChatError::NotFound(id))
        }
    }

    fn position(&self, id: ConversationId) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }

    fn get_mut(&mut self, id: ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::MessageStatus;

    fn store_with(n: usize) -> (ConversationStore, Vec<ConversationId>) {
        let mut store = ConversationStore::new();
        let mut ids: Vec<ConversationId> = (0..n).map(|_| store.create_conversation()).collect();
        // Newest is at the head.
        ids.reverse();
        (store, ids)
    }

    #[test]
    fn test_create_inserts_at_head_and_selects() {
        let (mut store, ids) = store_with(2);
        let id = store.create_conversation();
        assert_eq!(store.len(), 3);
        assert_eq!(store.conversations()[0].id, id);
        assert_eq!(store.current_id(), Some(id));
        assert_eq!(store.conversations()[1].id, ids[0]);
        assert_eq!(store.conversations()[0].title, DEFAULT_TITLE);
    }

    #[test]
    fn test_create_with_duplicate_id_is_ignored() {
        let (store, ids) = store_with(1);
        let next = reduce(
            store.clone(),
            ConversationAction::Create {
                id: ids[0],
                created_at: Utc::now(),
            },
        );
        assert_eq!(next, store);
    }

    #[test]
    fn test_select_unknown_is_ignored() {
        let (mut store, ids) = store_with(2);
        let before = store.clone();
        let unknown = ConversationId::new();
        assert_eq!(store.select_conversation(unknown), Err(ChatError::NotFound(unknown)));
        assert_eq!(store, before);

        store.select_conversation(ids[1]).unwrap();
        assert_eq!(store.current_id(), Some(ids[1]));
    }

    #[test]
    fn test_rename_rejects_blank_title() {
        let (mut store, ids) = store_with(1);
        store.rename_conversation(ids[0], "  Flu notes ").unwrap();
        assert_eq!(store.get(ids[0]).unwrap().title, "  Flu notes ");
        store.rename_conversation(ids[0], "Flu notes").unwrap();

        assert_eq!(store.rename_conversation(ids[0], "   "), Err(ChatError::EmptyTitle));
        assert_eq!(store.rename_conversation(ids[0], ""), Err(ChatError::EmptyTitle));
        assert_eq!(store.get(ids[0]).unwrap().title, "Flu notes");

        // The reducer alone also ignores blank titles.
        let next = reduce(
            store.clone(),
            ConversationAction::Rename {
                id: ids[0],
                title: "\t\n".to_string(),
            },
        );
        assert_eq!(next.get(ids[0]).unwrap().title, "Flu notes");
    }

    #[test]
    fn test_rename_unknown_conversation() {
        let (mut store, _) = store_with(1);
        let unknown = ConversationId::new();
        assert_eq!(
            store.rename_conversation(unknown, "title"),
            Err(ChatError::NotFound(unknown))
        );
    }

    #[test]
    fn test_delete_current_selects_next() {
        // [A, B], current = A
        let (mut store, ids) = store_with(2);
        let (a, b) = (ids[0], ids[1]);
        store.select_conversation(a).unwrap();

        store.delete_conversation(a).unwrap();
        assert_eq!(store.current_id(), Some(b));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_non_current_keeps_selection() {
        let (mut store, ids) = store_with(3);
        store.select_conversation(ids[2]).unwrap();
        store.delete_conversation(ids[0]).unwrap();
        assert_eq!(store.current_id(), Some(ids[2]));
    }

    #[test]
    fn test_delete_always_leaves_well_defined_current() {
        for size in 1..=4 {
            for victim in 0..size {
                let (mut store, ids) = store_with(size);
                store.select_conversation(ids[victim]).unwrap();
                store.delete_conversation(ids[victim]).unwrap();

                if store.is_empty() {
                    assert_eq!(store.current_id(), None);
                } else {
                    assert_eq!(store.current_id(), Some(store.conversations()[0].id));
                }
            }
        }
    }

    #[test]
    fn test_first_user_message_derives_title() {
        let (mut store, ids) = store_with(1);
        let long = "How do I manage seasonal allergies at home?";
        store.apply(ConversationAction::AppendUser {
            conversation: ids[0],
            message: Message::user(long),
        });
        assert_eq!(store.get(ids[0]).unwrap().title, "How do I manage seasonal al...");

        // Later messages leave the title alone.
        store.apply(ConversationAction::AppendUser {
            conversation: ids[0],
            message: Message::user("Another question"),
        });
        assert_eq!(store.get(ids[0]).unwrap().title, "How do I manage seasonal al...");
    }

    #[test]
    fn test_renamed_conversation_keeps_title_on_first_message() {
        let (mut store, ids) = store_with(1);
        store.rename_conversation(ids[0], "Mine").unwrap();
        store.apply(ConversationAction::AppendUser {
            conversation: ids[0],
            message: Message::user("hello"),
        });
        assert_eq!(store.get(ids[0]).unwrap().title, "Mine");
    }

    #[test]
    fn test_pending_is_replaced_not_appended_after() {
        let (mut store, ids) = store_with(1);
        let conversation = ids[0];
        let pending = Message::pending();
        let pending_id = pending.id;

        store.apply(ConversationAction::AppendUser {
            conversation,
            message: Message::user("test"),
        });
        store.apply(ConversationAction::AppendPending {
            conversation,
            message: pending,
        });

        // A second placeholder or user message cannot land after a pending tail.
        store.apply(ConversationAction::AppendPending {
            conversation,
            message: Message::pending(),
        });
        store.apply(ConversationAction::AppendUser {
            conversation,
            message: Message::user("too early"),
        });
        let messages = &store.get(conversation).unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert!(messages[1].is_pending());

        store.apply(ConversationAction::Settle {
            conversation,
            pending: pending_id,
            message: Message::assistant("answer"),
        });
        let messages = &store.get(conversation).unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].status, MessageStatus::Final);
        assert_eq!(messages[1].text, "answer");
        assert_eq!(store.get(conversation).unwrap().pending_count(), 0);
    }

    #[test]
    fn test_settle_requires_matching_pending_tail() {
        let (mut store, ids) = store_with(1);
        let conversation = ids[0];
        let pending = Message::pending();
        let pending_id = pending.id;
        store.apply(ConversationAction::AppendUser {
            conversation,
            message: Message::user("test"),
        });
        store.apply(ConversationAction::AppendPending {
            conversation,
            message: pending,
        });
        let before = store.clone();

        // Unknown placeholder id.
        store.apply(ConversationAction::Settle {
            conversation,
            pending: MessageId::new(),
            message: Message::assistant("stray"),
        });
        assert_eq!(store, before);

        store.apply(ConversationAction::Settle {
            conversation,
            pending: pending_id,
            message: Message::assistant("answer"),
        });
        let settled = store.clone();

        // Settling the same placeholder twice appends nothing.
        store.apply(ConversationAction::Settle {
            conversation,
            pending: pending_id,
            message: Message::error("again"),
        });
        assert_eq!(store, settled);
        assert_eq!(store.get(conversation).unwrap().messages.len(), 2);
    }

    #[test]
    fn test_settle_ignores_pending_that_is_not_last() {
        let (store, ids) = store_with(1);
        let conversation = ids[0];
        let pending = Message::pending();
        let pending_id = pending.id;

        // A placeholder followed by another message, built directly.
        let mut state = store;
        if let Some(c) = state.get_mut(conversation) {
            c.messages.push(Message::user("q"));
            c.messages.push(pending);
            c.messages.push(Message::assistant("later"));
        }
        let next = reduce(
            state.clone(),
            ConversationAction::Settle {
                conversation,
                pending: pending_id,
                message: Message::assistant("answer"),
            },
        );
        assert_eq!(next, state);
    }

    #[test]
    fn test_settle_on_deleted_conversation_is_dropped() {
        let (mut store, ids) = store_with(2);
        store.delete_conversation(ids[0]).unwrap();
        let before = store.clone();
        store.apply(ConversationAction::Settle {
            conversation: ids[0],
            pending: MessageId::new(),
            message: Message::assistant("late"),
        });
        assert_eq!(store, before);
    }

    #[test]
    fn test_list_projection() {
        let (mut store, ids) = store_with(2);
        store.select_conversation(ids[1]).unwrap();
        let list = store.list_conversations(Utc::now());
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, ids[0]);
        assert!(!list[0].is_current);
        assert!(list[1].is_current);
        assert_eq!(list[1].created_label, "Just now");
    }

    #[test]
    fn test_share_link() {
        let (store, ids) = store_with(1);
        let link = store.share_link(ids[0]).unwrap();
        assert_eq!(link, format!("https://healthhub-chatbot.com/share/{}", ids[0]));
        assert!(store.share_link(ConversationId::new()).is_err());
    }
}
