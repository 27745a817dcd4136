//! Tool traits — the abstractions over what an engine session can call.
//!
//! [`Tool`] is the uniform callable handed to a session: remote tool-server
//! operations and whole domain agents are both exposed through it.
//! [`ToolServer`] is the connection to a remote provider of named, typed
//! operations.

use crate::error::{ToolError, ToolServerError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A tool definition sent to the engine so it knows what it can call.
///
/// Also the shape of a tool-server catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    #[serde(default)]
    pub description: String,

    /// JSON Schema describing the tool's input
    #[serde(default = "default_schema", alias = "inputSchema")]
    pub input_schema: serde_json::Value,
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object" })
}

/// The uniform callable interface a session invokes on behalf of the
/// engine.
///
/// Implementations: a remote tool-server operation, or a domain-agent
/// delegate wrapped for the orchestrator's engine.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the engine).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's input.
    fn input_schema(&self) -> serde_json::Value;

    /// Invoke the tool with the given arguments, returning rendered text.
    async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a descriptor for sending to the engine.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// A connection to a remote tool server.
///
/// Opened eagerly when a domain agent is constructed, used for the life of
/// the process, and closed exactly once at teardown.
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Fetch the server's tool catalog.
    async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolServerError>;

    /// Invoke a named tool with the given arguments.
    async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolServerError>;

    /// Close the connection. Best-effort; safe to call more than once.
    async fn close(&self) -> std::result::Result<(), ToolServerError>;
}
