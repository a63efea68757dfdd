//! Text generator abstraction and its request types.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::errors::{GeneratorError, GeneratorResult};
use super::prompt::{KEY_CHECK_PROMPT, health_prompt};

/// Boxed future type for generator operations.
pub type GenerateFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sampling and length settings sent with a request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-k sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Output token budget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    /// Settings used for health answers.
    #[must_use]
    pub const fn health_assistant() -> Self {
        Self {
            temperature: Some(0.7),
            top_k: Some(40),
            top_p: Some(0.95),
            max_output_tokens: Some(300),
        }
    }

    /// Minimal settings for the API key check.
    #[must_use]
    pub const fn key_check() -> Self {
        Self {
            temperature: None,
            top_k: None,
            top_p: None,
            max_output_tokens: Some(10),
        }
    }
}

/// Content category filtered by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    /// Harassment.
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    /// Hate speech.
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    /// Sexually explicit content.
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    /// Dangerous content.
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

/// Blocking threshold for a harm category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyThreshold {
    /// Block only high-probability harm.
    BlockOnlyHigh,
    /// Block medium and high probability harm.
    BlockMediumAndAbove,
    /// Block low, medium and high probability harm.
    BlockLowAndAbove,
    /// Never block.
    BlockNone,
}

/// One category/threshold pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    /// Filtered category.
    pub category: HarmCategory,
    /// Threshold applied to it.
    pub threshold: SafetyThreshold,
}

/// Medium-and-above blocking on every category.
#[must_use]
pub fn default_safety_settings() -> Vec<SafetySetting> {
    [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category,
        threshold: SafetyThreshold::BlockMediumAndAbove,
    })
    .collect()
}

/// A complete text generation request.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    /// Full prompt text (instruction included).
    pub prompt: String,
    /// Sampling settings.
    pub config: GenerationConfig,
    /// Safety thresholds.
    pub safety: Vec<SafetySetting>,
}

impl GenerationRequest {
    /// Request answering `user_text` as the health assistant.
    #[must_use]
    pub fn health(user_text: &str) -> Self {
        Self {
            prompt: health_prompt(user_text),
            config: GenerationConfig::health_assistant(),
            safety: default_safety_settings(),
        }
    }

    /// Request used to check that the API key works.
    #[must_use]
    pub fn key_check() -> Self {
        Self {
            prompt: KEY_CHECK_PROMPT.to_string(),
            config: GenerationConfig::key_check(),
            safety: Vec::new(),
        }
    }
}

/// Result of an API key check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatus {
    /// Whether the key produced a successful answer.
    pub valid: bool,
    /// Human-readable explanation.
    pub message: String,
    /// HTTP status of the check request, when one was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl KeyStatus {
    /// Status reported when no key is configured.
    #[must_use]
    pub fn missing() -> Self {
        Self {
            valid: false,
            message: "API key not found in environment".to_string(),
            status_code: None,
        }
    }

    /// Status derived from a failed key check.
    #[must_use]
    pub fn from_error(err: &GeneratorError) -> Self {
        match err {
            GeneratorError::MissingApiKey => Self::missing(),
            GeneratorError::Api {
                status, message, ..
            } => Self {
                valid: false,
                message: message.clone(),
                status_code: Some(*status),
            },
            other => Self {
                valid: false,
                message: other.to_string(),
                status_code: None,
            },
        }
    }
}

/// Trait abstraction over the external text generator.
pub trait TextGenerator: Send + Sync {
    /// Generate text for `request`.
    ///
    /// # Errors
    /// Returns an error on transport failure, an explicit API error, or a
    /// response without text.
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> GenerateFuture<'a, GeneratorResult<String>>;

    /// Check that the configured credentials work by sending a tiny request.
    fn check_key(&self) -> GenerateFuture<'_, KeyStatus> {
        Box::pin(async move {
            let request = GenerationRequest::key_check();
            match self.generate(&request).await {
                Ok(_) => KeyStatus {
                    valid: true,
                    message: "API key is valid".to_string(),
                    status_code: Some(200),
                },
                Err(err) => KeyStatus::from_error(&err),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_request() {
        let request = GenerationRequest::health("I have a headache");
        assert!(request.prompt.ends_with(": I have a headache"));
        assert_eq!(request.config.max_output_tokens, Some(300));
        assert_eq!(request.config.top_k, Some(40));
        assert_eq!(request.safety.len(), 4);
        assert!(
            request
                .safety
                .iter()
                .all(|s| s.threshold == SafetyThreshold::BlockMediumAndAbove)
        );
    }

    #[test]
    fn test_config_wire_format() {
        let json = serde_json::to_value(GenerationConfig::health_assistant()).unwrap();
        assert_eq!(json["topK"], 40);
        assert_eq!(json["maxOutputTokens"], 300);

        let config = serde_json::to_value(GenerationConfig::key_check()).unwrap();
        assert_eq!(config, serde_json::json!({ "maxOutputTokens": 10 }));
    }

    #[test]
    fn test_safety_wire_format() {
        let json = serde_json::to_value(default_safety_settings()).unwrap();
        assert_eq!(json[0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(json[3]["category"], "HARM_CATEGORY_DANGEROUS_CONTENT");
        assert_eq!(json[0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn test_key_status_from_error() {
        let status = KeyStatus::from_error(&GeneratorError::Api {
            status: 400,
            code: "INVALID_ARGUMENT".to_string(),
            message: "API key not valid".to_string(),
        });
        assert!(!status.valid);
        assert_eq!(status.status_code, Some(400));
        assert_eq!(status.message, "API key not valid");

        let missing = KeyStatus::from_error(&GeneratorError::MissingApiKey);
        assert_eq!(missing, KeyStatus::missing());
        let json = serde_json::to_value(&missing).unwrap();
        assert!(json.get("statusCode").is_none());
    }
}
