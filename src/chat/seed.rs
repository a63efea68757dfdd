//! Placeholder history shown to a fresh session.

use chrono::{DateTime, Duration, Utc};

use super::ids::ConversationId;
use super::store::ConversationStore;
use super::types::Conversation;

/// Titles and ages (in hours) of the placeholder conversations, newest first.
const PLACEHOLDERS: [(&str, i64); 7] = [
    ("COVID-19 vaccine questions", 2),
    ("Allergy symptoms consultation", 24),
    ("Nutrition advice for diabetes", 2 * 24),
    ("Exercise recommendations", 7 * 24),
    ("Sleep disorder concerns", 8 * 24),
    ("Mental health discussion", 14 * 24),
    ("Child vaccination schedule", 21 * 24),
];

impl ConversationStore {
    /// A store seeded with the placeholder conversations; the first is current.
    #[must_use]
    pub fn with_placeholders(now: DateTime<Utc>) -> Self {
        let mut store = Self::new();
        for (title, age_hours) in PLACEHOLDERS {
            let created_at = now - Duration::hours(age_hours);
            let mut conversation = Conversation::new(ConversationId::new(), created_at);
            conversation.title = title.to_string();
            store.insert_seeded(conversation);
        }
        store
    }
}
