//! Shared test helpers for agent and orchestrator tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use switchyard_config::{AgentSpec, EngineConfig};
use switchyard_core::engine::{Engine, EngineReply, EngineRequest, ToolUse};
use switchyard_core::error::{EngineError, ToolServerError};
use switchyard_core::tool::{ToolDescriptor, ToolServer};

/// An engine that returns a sequence of scripted replies.
///
/// Each `complete` call pops the next reply; an exhausted script yields
/// `EngineError::Empty`, which doubles as the failure fixture.
pub struct ScriptedEngine {
    replies: Mutex<std::collections::VecDeque<EngineReply>>,
}

impl ScriptedEngine {
    pub fn new(replies: Vec<EngineReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }

    /// Text-only replies in order.
    pub fn text_replies(texts: Vec<&str>) -> Self {
        Self::new(texts.into_iter().map(text_reply).collect())
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: EngineRequest) -> Result<EngineReply, EngineError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EngineError::Empty("script exhausted".into()))
    }
}

/// A text-only engine reply.
pub fn text_reply(text: &str) -> EngineReply {
    EngineReply {
        content: serde_json::json!(text),
        tool_uses: vec![],
    }
}

/// A reply that requests one tool use.
pub fn tool_use_reply(name: &str, arguments: serde_json::Value) -> EngineReply {
    EngineReply {
        content: serde_json::Value::String(String::new()),
        tool_uses: vec![ToolUse {
            id: format!("use_{name}"),
            name: name.into(),
            arguments: arguments.to_string(),
        }],
    }
}

/// A tool server with a fixed catalog that echoes invocations.
pub struct FakeServer {
    tools: Vec<String>,
    close_calls: AtomicUsize,
    fail_close: bool,
}

impl FakeServer {
    pub fn with_tools(tools: Vec<&str>) -> Self {
        Self {
            tools: tools.into_iter().map(String::from).collect(),
            close_calls: AtomicUsize::new(0),
            fail_close: false,
        }
    }

    pub fn failing_close(tools: Vec<&str>) -> Self {
        Self {
            tools: tools.into_iter().map(String::from).collect(),
            close_calls: AtomicUsize::new(0),
            fail_close: true,
        }
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolServer for FakeServer {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServerError> {
        Ok(self
            .tools
            .iter()
            .map(|name| ToolDescriptor {
                name: name.clone(),
                description: format!("{name} tool"),
                input_schema: serde_json::json!({"type": "object"}),
            })
            .collect())
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolServerError> {
        Ok(serde_json::json!({
            "content": [{"type": "text", "text": format!("{name} ran with {arguments}")}]
        }))
    }

    async fn close(&self) -> Result<(), ToolServerError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(ToolServerError::Connection("close refused".into()));
        }
        Ok(())
    }
}

/// A minimal agent spec for fixtures.
pub fn spec(name: &str, tool_name: &str) -> AgentSpec {
    AgentSpec {
        name: name.into(),
        tool_name: tool_name.into(),
        tool_description: format!("{name} specialist"),
        instructions: format!("You are the {name} agent."),
        endpoint: "http://127.0.0.1:8101/mcp/".into(),
    }
}

/// Engine settings for fixtures.
pub fn engine_config() -> EngineConfig {
    EngineConfig::default()
}
