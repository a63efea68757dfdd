//! Health Hub chat service: conversation state, the message pipeline and the Gemini proxy.

// Strict policy: dangerous or non-idiomatic practices are refused
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(non_camel_case_types)]
#![deny(unused_must_use)]
#![deny(non_snake_case)]
#![deny(non_upper_case_globals)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy discipline
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::shadow_unrelated)]
#![deny(clippy::too_many_arguments)]
#![deny(clippy::cognitive_complexity)]
#![deny(overflowing_literals)]
// Tests unwrap freely
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

/// Conversation store, reducer and message pipeline.
pub mod chat;
/// Runtime configuration loaded from the environment.
pub mod config;
/// Persisted user identity and the fixed-credential login check.
pub mod identity;
/// External text generation (Gemini) client and prompt construction.
pub mod llm;
/// HTTP server: proxy endpoints and chat routes.
#[allow(clippy::missing_errors_doc, clippy::unused_async)]
pub mod server;
/// Speech-to-text capability seam.
pub mod speech;
/// Entry helpers to start the Health Hub server.
pub mod start_health_hub;
