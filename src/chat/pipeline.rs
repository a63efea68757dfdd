//! Message pipeline: user message, pending placeholder, generator call, settle.
//!
//! Sends to the same conversation are serialized through a per-conversation
//! async lane, so the pending placeholder of one request is always settled
//! before the next request appends anything. Sends to different
//! conversations run concurrently. The store lock is never held across the
//! generator call.
//!
//! Once a send holds its lane it runs on its own task, so dropping the
//! caller (a disconnected HTTP client) never strands a placeholder.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::llm::{GenerationRequest, TextGenerator};

use super::ids::{ConversationId, MessageId};
use super::store::{ConversationAction, ConversationStore};
use super::types::Message;

/// Store shared between the pipeline and request handlers.
pub type SharedStore = Arc<RwLock<ConversationStore>>;

/// Text shown in place of an answer when generation fails.
pub const FAILURE_NOTICE: &str = "Sorry, I couldn't process your request. Please try again later.";

type Lanes = DashMap<ConversationId, Arc<Mutex<()>>>;

/// How a send request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// Blank text; nothing was appended.
    Ignored,
    /// Target conversation does not exist, or was deleted before the answer
    /// arrived.
    UnknownConversation,
    /// The conversation already ends with a pending answer; nothing was
    /// appended and the generator was not called.
    Busy,
    /// The generator answered; a final assistant message was appended.
    Answered,
    /// The generator failed; an error notice was appended.
    Failed,
}

/// Drives a send from user input to a settled assistant message.
pub struct MessagePipeline {
    store: SharedStore,
    generator: Arc<dyn TextGenerator>,
    lanes: Arc<Lanes>,
}

impl MessagePipeline {
    /// Create a pipeline over `store` using `generator`.
    #[must_use]
    pub fn new(store: SharedStore, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            store,
            generator,
            lanes: Arc::new(DashMap::new()),
        }
    }

    /// The store this pipeline writes to.
    #[must_use]
    pub const fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The generator this pipeline calls.
    #[must_use]
    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    /// Send `text` to `conversation` and wait for the answer to settle.
    ///
    /// Failures of the generator are converted into an error-status message
    /// and never propagate. If the returned future is dropped after the lane
    /// was acquired, the send still runs to completion in the background.
    pub async fn send_message(&self, conversation: ConversationId, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            debug!(%conversation, "Ignoring blank message");
            return SendOutcome::Ignored;
        }

        let lane = self.lane(conversation).lock_owned().await;
        let task = tokio::spawn(run_send(
            lane,
            Arc::clone(&self.store),
            Arc::clone(&self.generator),
            Arc::clone(&self.lanes),
            conversation,
            text.to_string(),
        ));

        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%conversation, error = %err, "Send task did not complete");
                SendOutcome::Failed
            }
        }
    }

    /// Send `text` to the current conversation, creating one if there is none.
    ///
    /// Returns the conversation the message went to, or `None` for blank text.
    pub async fn send_to_current(&self, text: &str) -> (Option<ConversationId>, SendOutcome) {
        if text.trim().is_empty() {
            return (None, SendOutcome::Ignored);
        }

        let conversation = {
            let mut store = self.store.write().await;
            match store.current_id() {
                Some(id) => id,
                None => {
                    let id = store.create_conversation();
                    info!(%id, "Created conversation for first message");
                    id
                }
            }
        };

        let outcome = self.send_message(conversation, text).await;
        (Some(conversation), outcome)
    }

    fn lane(&self, conversation: ConversationId) -> Arc<Mutex<()>> {
        self.lanes
            .entry(conversation)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Body of one send, run on its own task while holding the lane.
async fn run_send(
    lane: OwnedMutexGuard<()>,
    store: SharedStore,
    generator: Arc<dyn TextGenerator>,
    lanes: Arc<Lanes>,
    conversation: ConversationId,
    text: String,
) -> SendOutcome {
    let outcome = settle_answer(&store, generator.as_ref(), conversation, &text).await;
    drop(lane);
    lanes.remove_if(&conversation, |_, idle| Arc::strong_count(idle) == 1);
    outcome
}

async fn settle_answer(
    store: &SharedStore,
    generator: &dyn TextGenerator,
    conversation: ConversationId,
    text: &str,
) -> SendOutcome {
    let pending = Message::pending();
    let pending_id = pending.id;

    {
        let mut store = store.write().await;
        if !store.contains(conversation) {
            debug!(%conversation, "Send to unknown conversation");
            return SendOutcome::UnknownConversation;
        }
        store.apply(ConversationAction::AppendUser {
            conversation,
            message: Message::user(text),
        });
        store.apply(ConversationAction::AppendPending {
            conversation,
            message: pending,
        });
        if !ends_with(&store, conversation, pending_id) {
            warn!(%conversation, "Conversation already awaits an answer; message not recorded");
            return SendOutcome::Busy;
        }
    }

    let request = GenerationRequest::health(text);
    let (message, outcome) = match generator.generate(&request).await {
        Ok(answer) => (Message::assistant(answer), SendOutcome::Answered),
        Err(err) => {
            warn!(%conversation, error = %err, "Text generation failed");
            (Message::error(FAILURE_NOTICE), SendOutcome::Failed)
        }
    };

    let mut store = store.write().await;
    if !store.contains(conversation) {
        debug!(%conversation, "Conversation deleted before the answer arrived");
        return SendOutcome::UnknownConversation;
    }
    store.apply(ConversationAction::Settle {
        conversation,
        pending: pending_id,
        message,
    });
    outcome
}

fn ends_with(store: &ConversationStore, conversation: ConversationId, id: MessageId) -> bool {
    store
        .get(conversation)
        .and_then(|c| c.messages.last())
        .is_some_and(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::chat::types::{MessageStatus, Sender};
    use crate::llm::{GeneratorError, ScriptedGenerator, ScriptedReply};

    fn pipeline_with(generator: ScriptedGenerator) -> (MessagePipeline, ConversationId) {
        let mut store = ConversationStore::new();
        let id = store.create_conversation();
        let store = Arc::new(RwLock::new(store));
        (MessagePipeline::new(store, Arc::new(generator)), id)
    }

    async fn messages(pipeline: &MessagePipeline, id: ConversationId) -> Vec<Message> {
        pipeline.store().read().await.get(id).unwrap().messages.clone()
    }

    #[tokio::test]
    async fn test_successful_send() {
        let (pipeline, c) =
            pipeline_with(ScriptedGenerator::always(ScriptedReply::text("Rest, fluids, ...")));

        let outcome = pipeline.send_message(c, "What are flu symptoms?").await;
        assert_eq!(outcome, SendOutcome::Answered);

        let messages = messages(&pipeline, c).await;
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.status == MessageStatus::Final));
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "What are flu symptoms?");
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].text, "Rest, fluids, ...");

        let store = pipeline.store().read().await;
        assert_eq!(store.get(c).unwrap().title, "What are flu symptoms?");
    }

    #[tokio::test]
    async fn test_network_failure_becomes_error_message() {
        let (pipeline, c) = pipeline_with(ScriptedGenerator::always(ScriptedReply::error(
            GeneratorError::Transport("connection refused".to_string()),
        )));

        let outcome = pipeline.send_message(c, "test").await;
        assert_eq!(outcome, SendOutcome::Failed);

        let messages = messages(&pipeline, c).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].status, MessageStatus::Final);
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].status, MessageStatus::Error);
        assert_eq!(messages[1].text, FAILURE_NOTICE);
    }

    #[tokio::test]
    async fn test_api_error_and_malformed_also_fail_softly() {
        let (pipeline, c) = pipeline_with(ScriptedGenerator::new([
            ScriptedReply::error(GeneratorError::Api {
                status: 429,
                code: "RESOURCE_EXHAUSTED".to_string(),
                message: "quota".to_string(),
            }),
            ScriptedReply::error(GeneratorError::MalformedResponse("empty".to_string())),
        ]));

        assert_eq!(pipeline.send_message(c, "a").await, SendOutcome::Failed);
        assert_eq!(pipeline.send_message(c, "b").await, SendOutcome::Failed);
        // The store stays usable.
        assert_eq!(messages(&pipeline, c).await.len(), 4);
    }

    #[tokio::test]
    async fn test_blank_text_is_ignored() {
        let generator = ScriptedGenerator::always(ScriptedReply::text("unused"));
        let (pipeline, c) = pipeline_with(generator);

        for blank in ["", "   ", "\n\t"] {
            assert_eq!(pipeline.send_message(c, blank).await, SendOutcome::Ignored);
        }
        assert!(messages(&pipeline, c).await.is_empty());
        assert_eq!(pipeline.store().read().await.get(c).unwrap().title, "New conversation");
    }

    #[tokio::test]
    async fn test_message_count_grows_by_two() {
        let (pipeline, c) = pipeline_with(ScriptedGenerator::always(ScriptedReply::text("ok")));
        for (i, text) in ["one", "two", "three"].into_iter().enumerate() {
            pipeline.send_message(c, text).await;
            assert_eq!(messages(&pipeline, c).await.len(), 2 * (i + 1));
        }
    }

    #[tokio::test]
    async fn test_long_first_message_title() {
        let (pipeline, c) = pipeline_with(ScriptedGenerator::always(ScriptedReply::text("ok")));
        let text = "What should I eat to keep my blood sugar stable?";
        pipeline.send_message(c, text).await;
        let store = pipeline.store().read().await;
        let title = &store.get(c).unwrap().title;
        assert_eq!(title, &format!("{}...", &text[..27]));
    }

    #[tokio::test]
    async fn test_unknown_conversation() {
        let (pipeline, _) = pipeline_with(ScriptedGenerator::always(ScriptedReply::text("ok")));
        let outcome = pipeline.send_message(ConversationId::new(), "hello").await;
        assert_eq!(outcome, SendOutcome::UnknownConversation);
    }

    #[tokio::test]
    async fn test_pending_is_tail_while_waiting() {
        let (pipeline, c) = pipeline_with(ScriptedGenerator::always(
            ScriptedReply::text("later").after(Duration::from_millis(200)),
        ));
        let pipeline = Arc::new(pipeline);

        let task = {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.send_message(c, "slow question").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let in_flight = messages(&pipeline, c).await;
        assert_eq!(in_flight.len(), 2);
        assert_eq!(in_flight.iter().filter(|m| m.is_pending()).count(), 1);
        assert!(in_flight[1].is_pending());

        assert_eq!(task.await.unwrap(), SendOutcome::Answered);
        let settled = messages(&pipeline, c).await;
        assert_eq!(settled.len(), 2);
        assert!(settled.iter().all(|m| !m.is_pending()));
    }

    #[tokio::test]
    async fn test_concurrent_sends_are_serialized() {
        let (pipeline, c) = pipeline_with(ScriptedGenerator::new([
            ScriptedReply::text("answer one").after(Duration::from_millis(100)),
            ScriptedReply::text("answer two"),
        ]));

        let (first, second) = futures::future::join(
            pipeline.send_message(c, "one"),
            pipeline.send_message(c, "two"),
        )
        .await;
        assert_eq!(first, SendOutcome::Answered);
        assert_eq!(second, SendOutcome::Answered);

        let texts: Vec<String> = messages(&pipeline, c)
            .await
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, ["one", "answer one", "two", "answer two"]);
        assert!(pipeline.lanes.is_empty());
    }

    #[tokio::test]
    async fn test_sends_to_different_conversations_overlap() {
        let generator = ScriptedGenerator::always(
            ScriptedReply::text("ok").after(Duration::from_millis(150)),
        );
        let (pipeline, a) = pipeline_with(generator);
        let b = pipeline.store().write().await.create_conversation();

        let started = std::time::Instant::now();
        futures::future::join(pipeline.send_message(a, "x"), pipeline.send_message(b, "y")).await;
        assert!(started.elapsed() < Duration::from_millis(290));
        assert_eq!(messages(&pipeline, a).await.len(), 2);
        assert_eq!(messages(&pipeline, b).await.len(), 2);
    }

    #[tokio::test]
    async fn test_send_to_current_creates_conversation() {
        let store = Arc::new(RwLock::new(ConversationStore::new()));
        let pipeline = MessagePipeline::new(
            Arc::clone(&store),
            Arc::new(ScriptedGenerator::always(ScriptedReply::text("hi"))),
        );

        let (blank_target, blank) = pipeline.send_to_current("  ").await;
        assert_eq!(blank, SendOutcome::Ignored);
        assert!(blank_target.is_none());
        assert!(store.read().await.is_empty());

        let (target, outcome) = pipeline.send_to_current("hello").await;
        assert_eq!(outcome, SendOutcome::Answered);
        let store = store.read().await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.current_id(), target);
        assert_eq!(store.current().unwrap().messages.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_while_waiting_drops_answer() {
        let (pipeline, c) = pipeline_with(ScriptedGenerator::always(
            ScriptedReply::text("late").after(Duration::from_millis(100)),
        ));
        let pipeline = Arc::new(pipeline);

        let task = {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.send_message(c, "question").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        pipeline.store().write().await.delete_conversation(c).unwrap();

        assert_eq!(task.await.unwrap(), SendOutcome::UnknownConversation);
        let store = pipeline.store().read().await;
        assert!(store.get(c).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_send_still_settles() {
        let (pipeline, c) = pipeline_with(ScriptedGenerator::new([
            ScriptedReply::text("slow answer").after(Duration::from_millis(200)),
            ScriptedReply::text("fast"),
        ]));

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), pipeline.send_message(c, "first"))
                .await;
        assert!(timed_out.is_err());

        let outcome = pipeline.send_message(c, "second").await;
        assert_eq!(outcome, SendOutcome::Answered);

        let messages = messages(&pipeline, c).await;
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "slow answer", "second", "fast"]);
        assert!(messages.iter().all(|m| m.status == MessageStatus::Final));
        assert!(pipeline.lanes.is_empty());
    }

    #[tokio::test]
    async fn test_pending_tail_blocks_generation() {
        let generator = Arc::new(ScriptedGenerator::always(ScriptedReply::text("unused")));
        let mut store = ConversationStore::new();
        let c = store.create_conversation();
        store.apply(ConversationAction::AppendUser {
            conversation: c,
            message: Message::user("earlier"),
        });
        store.apply(ConversationAction::AppendPending {
            conversation: c,
            message: Message::pending(),
        });
        let pipeline = MessagePipeline::new(Arc::new(RwLock::new(store)), generator.clone());

        assert_eq!(pipeline.send_message(c, "now").await, SendOutcome::Busy);
        assert!(generator.prompts().is_empty());

        let messages = messages(&pipeline, c).await;
        assert_eq!(messages.len(), 2);
        assert!(messages[1].is_pending());
    }

    #[tokio::test]
    async fn test_prompt_wraps_user_text() {
        let generator = Arc::new(ScriptedGenerator::always(ScriptedReply::text("ok")));
        let mut store = ConversationStore::new();
        let c = store.create_conversation();
        let pipeline = MessagePipeline::new(Arc::new(RwLock::new(store)), generator.clone());

        pipeline.send_message(c, "Is ginger good for nausea?").await;
        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("You are a helpful health assistant."));
        assert!(prompts[0].ends_with(": Is ginger good for nausea?"));
    }
}
