//! External text generation for the Health Hub assistant.
//!
//! - `generator`: the `TextGenerator` trait and request types
//! - `gemini`: REST client for the Gemini API
//! - `prompt`: the fixed health-assistant instruction
//! - `scripted`: deterministic generator for tests and offline runs

pub mod errors;
pub mod gemini;
pub mod generator;
pub mod prompt;
pub mod scripted;

pub use errors::{GeneratorError, GeneratorResult};
pub use gemini::{GeminiClient, ModelInfo};
pub use generator::{
    GenerateFuture, GenerationConfig, GenerationRequest, HarmCategory, KeyStatus, SafetySetting,
    SafetyThreshold, TextGenerator, default_safety_settings,
};
pub use prompt::{HEALTH_INSTRUCTION, health_prompt};
pub use scripted::{ScriptedGenerator, ScriptedReply};
