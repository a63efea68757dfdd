//! Application state shared across all request handlers.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::chat::{ConversationStore, MessagePipeline, SharedStore};
use crate::config::AppConfig;
use crate::identity::IdentityService;
use crate::llm::{GeminiClient, TextGenerator};
use crate::speech::{NoopRecognizer, SpeechRecognizer};

/// Shared application state.
pub struct AppState {
    /// Loaded configuration.
    pub config: AppConfig,
    /// Text generator behind the proxy endpoints and the pipeline.
    pub generator: Arc<dyn TextGenerator>,
    /// Conversation store and send pipeline.
    pub pipeline: MessagePipeline,
    /// Signed-in user handling.
    pub identity: IdentityService,
    /// Dictation backend.
    pub speech: Arc<dyn SpeechRecognizer>,
}

impl AppState {
    /// Create the production state: Gemini client, file-backed identity,
    /// optionally seeded store and no speech backend.
    ///
    /// # Errors
    /// Returns an error if the Gemini client cannot be created.
    pub fn new(config: AppConfig) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let client = GeminiClient::new(config.gemini.clone())
            .map_err(|e| format!("Failed to create Gemini client: {e}"))?;

        let store = if config.seed_placeholders {
            ConversationStore::with_placeholders(Utc::now())
        } else {
            ConversationStore::new()
        };
        let identity = IdentityService::from_config(&config.identity);

        Ok(Self::from_parts(
            config,
            Arc::new(client),
            store,
            identity,
            Arc::new(NoopRecognizer),
        ))
    }

    /// Assemble state from already-built parts.
    #[must_use]
    pub fn from_parts(
        config: AppConfig,
        generator: Arc<dyn TextGenerator>,
        store: ConversationStore,
        identity: IdentityService,
        speech: Arc<dyn SpeechRecognizer>,
    ) -> Arc<Self> {
        let store: SharedStore = Arc::new(RwLock::new(store));
        let pipeline = MessagePipeline::new(store, Arc::clone(&generator));
        Arc::new(Self {
            config,
            generator,
            pipeline,
            identity,
            speech,
        })
    }

    /// The conversation store.
    #[must_use]
    pub const fn store(&self) -> &SharedStore {
        self.pipeline.store()
    }
}
