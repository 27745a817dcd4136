//! Engine trait — the abstraction over reasoning-engine backends.
//!
//! An Engine knows how to send a conversation (plus the tools the model may
//! call) to a reasoning engine and get a reply back, either complete or as
//! a stream of chunks. What the engine does internally — including how many
//! tool round-trips it reasons through — is opaque to callers.

use crate::error::EngineError;
use crate::render::render_reply;
use crate::tool::ToolDescriptor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The role of a message in an engine conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instructions (an agent's fixed instructions)
    System,
    /// The prompt payload handed to the engine
    User,
    /// The engine's reply
    Assistant,
    /// A tool invocation result fed back to the engine
    Tool,
}

/// A single message in an engine conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced this message
    pub role: ChatRole,

    /// The text content
    pub content: String,

    /// Tool invocations requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_uses: Vec<ToolUse>,

    /// If this is a tool result, which tool use it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
            tool_uses: Vec::new(),
            tool_use_id: None,
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            tool_uses: Vec::new(),
            tool_use_id: None,
        }
    }

    /// Create an assistant message carrying the given tool uses.
    pub fn assistant(content: impl Into<String>, tool_uses: Vec<ToolUse>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            tool_uses,
            tool_use_id: None,
        }
    }

    /// Create a tool result message.
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: content.into(),
            tool_uses: Vec::new(),
            tool_use_id: Some(tool_use_id.into()),
        }
    }
}

/// A tool invocation requested by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUse {
    /// Unique id for this invocation (matches the engine's tool-use id)
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

/// A request to the reasoning engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRequest {
    /// The model to use (e.g., "anthropic/claude-sonnet-4")
    pub model: String,

    /// The conversation so far
    pub messages: Vec<ChatMessage>,

    /// Temperature (0.0 = deterministic)
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the engine may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,
}

/// A complete reply from the engine.
///
/// `content` is deliberately an untyped JSON value: engines reply with a
/// plain string, a mapping with `text`/`content` keys, or a list of content
/// parts depending on the backend. Callers normalize it with
/// [`render_reply`](crate::render::render_reply) at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineReply {
    /// The reply content in whatever shape the backend produced
    pub content: serde_json::Value,

    /// Tool invocations the engine wants performed before it can finish
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_uses: Vec<ToolUse>,
}

/// A single chunk in a streaming reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Complete tool uses (typically only on the final chunk)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_uses: Vec<ToolUse>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,
}

/// The core Engine trait.
///
/// Every reasoning-engine backend implements this trait. The session loop
/// calls `complete()` or `stream()` without knowing which backend is in
/// use — pure polymorphism.
#[async_trait]
pub trait Engine: Send + Sync {
    /// A human-readable name for this engine (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get a complete reply.
    async fn complete(
        &self,
        request: EngineRequest,
    ) -> std::result::Result<EngineReply, EngineError>;

    /// Send a request and get a stream of reply chunks.
    ///
    /// Default implementation calls `complete()` and wraps the result as a
    /// single done chunk.
    async fn stream(
        &self,
        request: EngineRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, EngineError>>,
        EngineError,
    > {
        let reply = self.complete(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(StreamChunk {
                content: Some(render_reply(&reply.content)),
                tool_uses: reply.tool_uses,
                done: true,
            }))
            .await;
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_constructors() {
        let msg = ChatMessage::user("route this request");
        assert_eq!(msg.role, ChatRole::User);
        assert!(msg.tool_uses.is_empty());

        let result = ChatMessage::tool_result("use_1", "42 rows");
        assert_eq!(result.role, ChatRole::Tool);
        assert_eq!(result.tool_use_id.as_deref(), Some("use_1"));
    }

    #[test]
    fn engine_request_serialization() {
        let req = EngineRequest {
            model: "mock-model".into(),
            messages: vec![ChatMessage::system("be brief")],
            temperature: 0.2,
            max_tokens: Some(1024),
            tools: vec![],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("mock-model"));
        assert!(json.contains("be brief"));
        // Empty tool list is omitted entirely
        assert!(!json.contains("\"tools\""));
    }

    struct FixedEngine;

    #[async_trait]
    impl Engine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: EngineRequest,
        ) -> std::result::Result<EngineReply, EngineError> {
            Ok(EngineReply {
                content: serde_json::json!({"text": "done"}),
                tool_uses: vec![],
            })
        }
    }

    #[tokio::test]
    async fn default_stream_wraps_complete() {
        let engine = FixedEngine;
        let mut rx = engine
            .stream(EngineRequest {
                model: "m".into(),
                messages: vec![],
                temperature: 0.0,
                max_tokens: None,
                tools: vec![],
            })
            .await
            .unwrap();

        let chunk = rx.recv().await.unwrap().unwrap();
        assert!(chunk.done);
        assert_eq!(chunk.content.as_deref(), Some("done"));
        assert!(rx.recv().await.is_none());
    }
}
