//! Deterministic generator used by tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::errors::{GeneratorError, GeneratorResult};
use super::generator::{GenerateFuture, GenerationRequest, TextGenerator};

/// One scripted reply, optionally delayed.
#[derive(Clone, Debug)]
pub struct ScriptedReply {
    result: GeneratorResult<String>,
    delay: Duration,
}

impl ScriptedReply {
    /// A successful answer.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            result: Ok(text.into()),
            delay: Duration::ZERO,
        }
    }

    /// A failure.
    #[must_use]
    pub fn error(err: GeneratorError) -> Self {
        Self {
            result: Err(err),
            delay: Duration::ZERO,
        }
    }

    /// Resolve only after `delay`.
    #[must_use]
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Generator that plays back queued replies in order and records prompts.
///
/// When the queue is empty the fallback reply is used; without one the
/// call fails with a malformed-response error.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<ScriptedReply>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Play back `replies` in order.
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with `reply`.
    #[must_use]
    pub fn always(reply: ScriptedReply) -> Self {
        Self {
            fallback: Some(reply),
            ..Self::default()
        }
    }

    /// Prompts received so far, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self) -> Option<ScriptedReply> {
        let queued = self
            .replies
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        queued.or_else(|| self.fallback.clone())
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> GenerateFuture<'a, GeneratorResult<String>> {
        Box::pin(async move {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(request.prompt.clone());
            }

            let Some(reply) = self.next_reply() else {
                return Err(GeneratorError::MalformedResponse(
                    "no scripted reply left".to_string(),
                ));
            };
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            reply.result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plays_back_in_order() {
        let generator = ScriptedGenerator::new([
            ScriptedReply::text("first"),
            ScriptedReply::error(GeneratorError::Transport("connection reset".to_string())),
        ]);
        let request = GenerationRequest::health("q");

        assert_eq!(generator.generate(&request).await.unwrap(), "first");
        assert!(generator.generate(&request).await.is_err());
        assert!(matches!(
            generator.generate(&request).await,
            Err(GeneratorError::MalformedResponse(_))
        ));
        assert_eq!(generator.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_default_check_key() {
        let ok = ScriptedGenerator::always(ScriptedReply::text("Hi!"));
        assert!(ok.check_key().await.valid);

        let bad = ScriptedGenerator::always(ScriptedReply::error(GeneratorError::Api {
            status: 403,
            code: "PERMISSION_DENIED".to_string(),
            message: "denied".to_string(),
        }));
        let status = bad.check_key().await;
        assert!(!status.valid);
        assert_eq!(status.status_code, Some(403));
        assert_eq!(bad.prompts(), ["Hello, this is a test message."]);
    }
}
