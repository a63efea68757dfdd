//! HTTP route handlers for the Health Hub API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::chat::{
    ChatError, Conversation, ConversationId, ConversationSummary, Message, SendOutcome,
};
use crate::identity::{IdentityError, UserIdentity};
use crate::llm::{GenerationRequest, GeneratorError, KeyStatus, TextGenerator};
use crate::speech::SpeechRecognizer;

use super::state::AppState;

/// Manual test page for the proxy endpoints.
const TESTER_PAGE: &str = include_str!("tester.html");

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(tester_page))
        .route("/health", get(health_check))
        .route("/api/gemini", post(gemini_proxy))
        .route("/api/test-key", get(test_key))
        .route("/api/capabilities", get(capabilities))
        .route(
            "/api/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/api/conversations/{id}",
            get(get_conversation)
                .patch(rename_conversation)
                .delete(delete_conversation),
        )
        .route("/api/conversations/{id}/select", post(select_conversation))
        .route("/api/conversations/{id}/share", get(share_conversation))
        .route("/api/conversations/{id}/messages", post(send_message))
        .route("/api/messages", post(send_to_current))
        .route("/api/login", post(login))
        .route("/api/signup", post(signup))
        .route("/api/logout", post(logout))
        .route("/api/me", get(me))
        .with_state(state)
}

/// JSON error response: `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let status = match err {
            ChatError::EmptyTitle => StatusCode::BAD_REQUEST,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        Self::new(status, err.to_string())
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        let status = match err {
            IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            IdentityError::Io(_) | IdentityError::Serialization(_) => {
                error!(error = %err, "Identity storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

async fn tester_page() -> Html<&'static str> {
    Html(TESTER_PAGE)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "health-hub",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ---------------------------------------------------------------------------
// Proxy
// ---------------------------------------------------------------------------

/// Proxy request.
#[derive(Debug, Deserialize)]
pub struct ProxyRequest {
    /// The user's question, sent without the instruction.
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Proxy response.
#[derive(Debug, Serialize)]
pub struct ProxyResponse {
    /// Generated answer.
    pub response: String,
}

/// Forward a question to the generator with the health instruction.
async fn gemini_proxy(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProxyRequest>,
) -> Result<Json<ProxyResponse>, ApiError> {
    let prompt = request.prompt.unwrap_or_default();
    if prompt.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Prompt is required"));
    }

    let preview: String = prompt.chars().take(30).collect();
    info!(prompt = %preview, "Proxying health question");

    match state
        .generator
        .generate(&GenerationRequest::health(&prompt))
        .await
    {
        Ok(response) => Ok(Json(ProxyResponse { response })),
        Err(err) => {
            warn!(error = %err, hint = err.hint().unwrap_or(""), "Proxy request failed");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                proxy_error_message(&err),
            ))
        }
    }
}

fn proxy_error_message(err: &GeneratorError) -> String {
    match err {
        GeneratorError::Api { message, .. } => message.clone(),
        GeneratorError::MalformedResponse(_) => "Unexpected response format".to_string(),
        other => other.to_string(),
    }
}

/// Check the configured API key.
async fn test_key(State(state): State<Arc<AppState>>) -> Json<KeyStatus> {
    Json(state.generator.check_key().await)
}

/// Optional platform features.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Whether dictation is available.
    pub speech_recognition: bool,
}

async fn capabilities(State(state): State<Arc<AppState>>) -> Json<Capabilities> {
    Json(Capabilities {
        speech_recognition: state.speech.is_supported(),
    })
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

/// Sidebar listing.
#[derive(Debug, Serialize)]
pub struct ConversationList {
    /// Conversations, newest first.
    pub conversations: Vec<ConversationSummary>,
    /// Current conversation.
    pub current: Option<ConversationId>,
}

/// Full conversation with display fields.
#[derive(Debug, Serialize)]
pub struct ConversationView {
    /// The conversation.
    #[serde(flatten)]
    pub conversation: Conversation,
    /// Relative creation label.
    pub created_label: String,
    /// Whether this is the current conversation.
    pub is_current: bool,
}

/// Rename body.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// New title.
    pub title: String,
}

/// Send body.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Message text.
    pub text: String,
}

/// Result of a send.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    /// How the send ended.
    pub outcome: SendOutcome,
    /// Conversation the message went to.
    pub conversation_id: Option<ConversationId>,
    /// Messages of that conversation after the send.
    pub messages: Vec<Message>,
}

async fn list_conversations(State(state): State<Arc<AppState>>) -> Json<ConversationList> {
    let store = state.store().read().await;
    Json(ConversationList {
        conversations: store.list_conversations(Utc::now()),
        current: store.current_id(),
    })
}

async fn create_conversation(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ConversationSummary>), ApiError> {
    let mut store = state.store().write().await;
    let id = store.create_conversation();
    info!(%id, "Conversation created");
    let summary = store
        .summary(id, Utc::now())
        .ok_or(ChatError::NotFound(id))?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
) -> Result<Json<ConversationView>, ApiError> {
    let store = state.store().read().await;
    let conversation = store.get(id).ok_or(ChatError::NotFound(id))?;
    Ok(Json(ConversationView {
        created_label: conversation.created_label(Utc::now()),
        is_current: store.current_id() == Some(id),
        conversation: conversation.clone(),
    }))
}

async fn select_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
) -> Result<StatusCode, ApiError> {
    state.store().write().await.select_conversation(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn rename_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
    Json(request): Json<RenameRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .store()
        .write()
        .await
        .rename_conversation(id, &request.title)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
) -> Result<StatusCode, ApiError> {
    state.store().write().await.delete_conversation(id)?;
    info!(%id, "Conversation deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn share_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let link = state.store().read().await.share_link(id)?;
    Ok(Json(serde_json::json!({ "link": link })))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
    Json(request): Json<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let outcome = state.pipeline.send_message(id, &request.text).await;
    match outcome {
        SendOutcome::UnknownConversation => Err(ChatError::NotFound(id).into()),
        SendOutcome::Busy => Err(ApiError::new(
            StatusCode::CONFLICT,
            "Conversation is still waiting for an answer",
        )),
        _ => Ok(Json(send_response(&state, outcome, Some(id)).await)),
    }
}

async fn send_to_current(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendRequest>,
) -> Json<SendResponse> {
    let (target, outcome) = state.pipeline.send_to_current(&request.text).await;
    let target = target.or(state.store().read().await.current_id());
    Json(send_response(&state, outcome, target).await)
}

async fn send_response(
    state: &AppState,
    outcome: SendOutcome,
    conversation_id: Option<ConversationId>,
) -> SendResponse {
    let store = state.store().read().await;
    let messages = conversation_id
        .and_then(|id| store.get(id))
        .map(|c| c.messages.clone())
        .unwrap_or_default();
    SendResponse {
        outcome,
        conversation_id,
        messages,
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Login body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Signup body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
    /// Password repeated.
    pub confirm_password: String,
}

/// Signed-in user, if any.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// The user.
    pub user: Option<UserIdentity>,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserIdentity>, ApiError> {
    let user = state
        .identity
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(user))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserIdentity>), ApiError> {
    let user = state
        .identity
        .signup(
            &request.username,
            &request.password,
            &request.confirm_password,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn logout(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.identity.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(State(state): State<Arc<AppState>>) -> Result<Json<MeResponse>, ApiError> {
    let user = state.identity.current().await?;
    Ok(Json(MeResponse { user }))
}
