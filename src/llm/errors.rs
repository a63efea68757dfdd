//! Error types for the text generator.

use thiserror::Error;

/// Errors produced while calling the external text generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    /// No API key is configured.
    #[error("API key is not configured")]
    MissingApiKey,
    /// Network or transport failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),
    /// The API answered with an explicit error payload.
    #[error("api error {status} ({code}): {message}")]
    Api {
        /// HTTP status of the response.
        status: u16,
        /// Provider status code, e.g. `INVALID_ARGUMENT`.
        code: String,
        /// Human-readable message from the provider.
        message: String,
    },
    /// The response could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The endpoint URL is invalid.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl GeneratorError {
    /// Whether the failure points at a bad or unauthorised API key.
    #[must_use]
    pub fn is_api_key_issue(&self) -> bool {
        match self {
            Self::MissingApiKey => true,
            Self::Api { code, message, .. } => {
                matches!(
                    code.as_str(),
                    "INVALID_ARGUMENT" | "PERMISSION_DENIED" | "UNAUTHENTICATED"
                ) || message.contains("API key")
            }
            _ => false,
        }
    }

    /// A hint for the operator, when the error has a well-known cause.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingApiKey => Some("set GEMINI_API_KEY in the environment"),
            Self::Api { code, .. } => match code.as_str() {
                "INVALID_ARGUMENT" => {
                    Some("the API key looks malformed; make sure it was copied correctly")
                }
                "PERMISSION_DENIED" => Some("the API key has no access to the Gemini API"),
                "UNAUTHENTICATED" => Some("the API key is invalid or expired"),
                _ => None,
            },
            Self::Transport(_) => Some("check the network connection and the endpoint URL"),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GeneratorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<url::ParseError> for GeneratorError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Convenience result alias for generator calls.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: &str, message: &str) -> GeneratorError {
        GeneratorError::Api {
            status: 400,
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_api_key_issue_detection() {
        assert!(GeneratorError::MissingApiKey.is_api_key_issue());
        assert!(api("PERMISSION_DENIED", "denied").is_api_key_issue());
        assert!(api("FAILED_PRECONDITION", "API key not valid").is_api_key_issue());
        assert!(!api("RESOURCE_EXHAUSTED", "quota").is_api_key_issue());
        assert!(!GeneratorError::Transport("reset".to_string()).is_api_key_issue());
    }

    #[test]
    fn test_hints() {
        assert!(api("UNAUTHENTICATED", "x").hint().is_some());
        assert!(api("INTERNAL", "x").hint().is_none());
        assert!(GeneratorError::MalformedResponse("x".to_string()).hint().is_none());
    }
}
