//! Gemini `generateContent` REST client.
//!
//! The API key travels in the `key` query parameter and is never logged.
//! A successful answer is `candidates[0].content.parts[0].text`; an explicit
//! `error` object becomes [`GeneratorError::Api`]; anything else is malformed.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::{ApiKey, GeminiConfig};

use super::errors::{GeneratorError, GeneratorResult};
use super::generator::{
    GenerateFuture, GenerationConfig, GenerationRequest, KeyStatus, SafetySetting, TextGenerator,
};

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationConfig,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    safety_settings: &'a [SafetySetting],
}

impl<'a> GenerateContentRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: &request.config,
            safety_settings: &request.safety,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    error: Option<ApiErrorBody>,
}

/// A model advertised by the API.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-1.5-pro`.
    pub name: String,
    /// Methods the model supports, e.g. `generateContent`.
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

/// Async client for the Gemini REST API.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> GeneratorResult<Self> {
        Url::parse(&config.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Whether an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Model this client talks to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// List models visible to the configured key.
    ///
    /// # Errors
    /// Returns an error if the key is missing, the request fails or the API reports an error.
    pub async fn list_models(&self) -> GeneratorResult<Vec<ModelInfo>> {
        let key = self.api_key()?;
        let url = build_url(&self.config, "models", key)?;

        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        let parsed: ListModelsResponse = serde_json::from_str(&body)
            .map_err(|e| GeneratorError::MalformedResponse(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(api_error(status, error));
        }
        Ok(parsed.models)
    }

    fn api_key(&self) -> GeneratorResult<&ApiKey> {
        self.config
            .api_key
            .as_ref()
            .ok_or(GeneratorError::MissingApiKey)
    }

    async fn post_generate(
        &self,
        request: &GenerationRequest,
    ) -> GeneratorResult<(u16, GenerateContentResponse)> {
        let key = self.api_key()?;
        let path = format!("models/{}:generateContent", self.config.model);
        let url = build_url(&self.config, &path, key)?;

        debug!(
            model = %self.config.model,
            key = %key.masked(),
            prompt_chars = request.prompt.chars().count(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(url)
            .json(&GenerateContentRequest::from_request(request))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, "generateContent response received");

        let parsed = serde_json::from_str(&body).map_err(|e| {
            warn!(status, "generateContent returned a non-JSON body");
            GeneratorError::MalformedResponse(e.to_string())
        })?;
        Ok((status, parsed))
    }
}

impl TextGenerator for GeminiClient {
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> GenerateFuture<'a, GeneratorResult<String>> {
        Box::pin(async move {
            let (status, body) = self.post_generate(request).await?;
            extract_text(status, body)
        })
    }

    fn check_key(&self) -> GenerateFuture<'_, KeyStatus> {
        Box::pin(async move {
            if !self.has_api_key() {
                return KeyStatus::missing();
            }

            let request = GenerationRequest::key_check();
            match self.post_generate(&request).await {
                Ok((status, body)) => key_status(status, body),
                Err(err) => KeyStatus::from_error(&err),
            }
        })
    }
}

/// Build `{base}/{version}/{path}?key=...`.
fn build_url(config: &GeminiConfig, path: &str, key: &ApiKey) -> GeneratorResult<Url> {
    let base = config.base_url.trim_end_matches('/');
    let mut url = Url::parse(&format!("{base}/{}/{path}", config.api_version))?;
    url.query_pairs_mut().append_pair("key", key.expose());
    Ok(url)
}

fn api_error(status: u16, error: ApiErrorBody) -> GeneratorError {
    GeneratorError::Api {
        status: error.code.unwrap_or(status),
        code: error.status.unwrap_or_else(|| "UNKNOWN".to_string()),
        message: error.message.unwrap_or_else(|| "Unknown error".to_string()),
    }
}

fn extract_text(status: u16, body: GenerateContentResponse) -> GeneratorResult<String> {
    let text = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text);

    match (text, body.error) {
        (Some(text), _) => Ok(text),
        (None, Some(error)) => Err(api_error(status, error)),
        (None, None) => Err(GeneratorError::MalformedResponse(
            "response has neither candidate text nor an error".to_string(),
        )),
    }
}

/// A key check succeeds when the call is 2xx and returns at least one candidate.
fn key_status(status: u16, body: GenerateContentResponse) -> KeyStatus {
    if (200..300).contains(&status) && !body.candidates.is_empty() {
        return KeyStatus {
            valid: true,
            message: "API key is valid".to_string(),
            status_code: Some(status),
        };
    }

    let message = body
        .error
        .and_then(|e| e.message)
        .unwrap_or_else(|| "API request failed".to_string());
    KeyStatus {
        valid: false,
        message,
        status_code: Some(status),
    }
}
