//! # Switchyard Core
//!
//! Domain types, traits, and error definitions for the Switchyard agent
//! router. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here: the reasoning
//! engine ([`Engine`]), the remote tool server ([`ToolServer`]), and the
//! uniform callable a session can invoke ([`Tool`]). Implementations live
//! in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod engine;
pub mod error;
pub mod render;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use engine::{ChatMessage, ChatRole, Engine, EngineReply, EngineRequest, StreamChunk, ToolUse};
pub use error::{EngineError, Error, Result, ToolError, ToolServerError};
pub use render::render_reply;
pub use tool::{Tool, ToolDescriptor, ToolServer};
