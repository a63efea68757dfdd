//! Conversation management.
//!
//! - `store`: the reducer-driven in-memory conversation list
//! - `pipeline`: user message to settled assistant answer
//! - `label`, `title`: display helpers
//! - `seed`: placeholder history for a fresh session

pub mod errors;
pub mod ids;
pub mod label;
pub mod pipeline;
pub mod seed;
pub mod store;
pub mod title;
pub mod types;

pub use errors::{ChatError, ChatResult};
pub use ids::{ConversationId, MessageId};
pub use label::relative_label;
pub use pipeline::{FAILURE_NOTICE, MessagePipeline, SendOutcome, SharedStore};
pub use store::{ConversationAction, ConversationStore, reduce};
pub use title::{MAX_TITLE_CHARS, derive_title};
pub use types::{
    Conversation, ConversationSummary, DEFAULT_TITLE, Message, MessageStatus, PENDING_TEXT, Sender,
};
