//! Reasoning-engine access for Switchyard.
//!
//! [`OpenAiCompatEngine`] talks to any OpenAI-compatible chat-completions
//! endpoint. [`Session`] binds one engine to a fixed system prompt and tool
//! set and runs the engine↔tool round-trip loop, surfacing streamed
//! progress and tool invocations into the shared activity timeline.

pub mod openai_compat;
pub mod session;

pub use openai_compat::OpenAiCompatEngine;
pub use session::Session;
