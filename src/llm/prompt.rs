//! Prompt construction for the health assistant.

/// Fixed instruction prepended to every user question.
pub const HEALTH_INSTRUCTION: &str = "You are a helpful health assistant. Answer the following health-related question with practical suggestions for prevention and management. Provide specific, actionable advice in simple language. Keep your response brief (3-4 sentences) and focus on home remedies, lifestyle changes, and self-care tips when appropriate. Avoid simply telling the user to \"see a doctor\" unless it's a clear emergency";

/// Prompt used to check whether an API key works.
pub const KEY_CHECK_PROMPT: &str = "Hello, this is a test message.";

/// Wrap a user question in the health instruction.
#[must_use]
pub fn health_prompt(user_text: &str) -> String {
    format!("{HEALTH_INSTRUCTION}: {user_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_prompt() {
        let prompt = health_prompt("What are flu symptoms?");
        assert!(prompt.starts_with("You are a helpful health assistant."));
        assert!(prompt.contains("3-4 sentences"));
        assert!(prompt.contains("\"see a doctor\""));
        assert!(prompt.ends_with("clear emergency: What are flu symptoms?"));
    }
}
