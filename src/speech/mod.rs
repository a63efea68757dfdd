//! Speech-to-text seam.
//!
//! Dictation is a platform capability. Targets without a recognizer use
//! [`NoopRecognizer`], which reports itself unsupported so callers can tell
//! the user instead of failing silently.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed future type for recognizer operations.
pub type SpeechFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Speech recognition errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// No recognizer is available on this platform.
    #[error("Speech recognition is not supported on this platform")]
    Unsupported,
    /// The recognizer reported an error.
    #[error("speech recognition error: {0}")]
    Recognition(String),
}

/// Convenience result alias for recognizer operations.
pub type SpeechResult<T> = Result<T, SpeechError>;

/// How a dictation session runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionOptions {
    /// BCP 47 language tag.
    pub language: String,
    /// Keep listening after the first final result.
    pub continuous: bool,
    /// Report partial transcripts while the user speaks.
    pub interim_results: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            continuous: false,
            interim_results: true,
        }
    }
}

/// Text recognized so far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    /// Recognized text.
    pub text: String,
    /// Whether the recognizer will not revise this text.
    pub is_final: bool,
}

/// A speech-to-text backend.
pub trait SpeechRecognizer: Send + Sync {
    /// Whether dictation can be offered at all.
    fn is_supported(&self) -> bool;

    /// Listen once and return the transcript.
    ///
    /// # Errors
    /// Returns `Unsupported` when no backend exists, or the backend's error.
    fn recognize<'a>(
        &'a self,
        options: &'a RecognitionOptions,
    ) -> SpeechFuture<'a, SpeechResult<Transcript>>;
}

/// Recognizer for targets without speech support.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopRecognizer;

impl SpeechRecognizer for NoopRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn recognize<'a>(
        &'a self,
        _options: &'a RecognitionOptions,
    ) -> SpeechFuture<'a, SpeechResult<Transcript>> {
        Box::pin(async { Err(SpeechError::Unsupported) })
    }
}
