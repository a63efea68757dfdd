//! Title derivation from the first user message.

/// Longest title kept verbatim.
pub const MAX_TITLE_CHARS: usize = 30;

/// Characters kept before the ellipsis when a title is too long.
const TRUNCATED_CHARS: usize = 27;

/// Derive a conversation title from the first message text.
///
/// Texts of at most 30 characters are used as is; longer ones keep their
/// first 27 characters followed by `"..."`.
#[must_use]
pub fn derive_title(text: &str) -> String {
    if text.chars().count() <= MAX_TITLE_CHARS {
        return text.to_string();
    }
    let mut title: String = text.chars().take(TRUNCATED_CHARS).collect();
    title.push_str("...");
    title
}
