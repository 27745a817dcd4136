//! Placeholder connection for a tool server that never came up.

use async_trait::async_trait;
use switchyard_core::error::ToolServerError;
use switchyard_core::tool::{ToolDescriptor, ToolServer};

/// Stands in for a tool server whose handshake failed at startup.
///
/// Every operation reports the original connection failure, so the owning
/// agent degrades to a text-only responder instead of aborting the runtime.
pub struct DisconnectedServer {
    endpoint: String,
    reason: String,
}

impl DisconnectedServer {
    pub fn new(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ToolServer for DisconnectedServer {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServerError> {
        Err(ToolServerError::Connection(format!(
            "{}: {}",
            self.endpoint, self.reason
        )))
    }

    async fn invoke(
        &self,
        _name: &str,
        _arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolServerError> {
        Err(ToolServerError::Connection(format!(
            "{}: {}",
            self.endpoint, self.reason
        )))
    }

    async fn close(&self) -> Result<(), ToolServerError> {
        Ok(())
    }
}
