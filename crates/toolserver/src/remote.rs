//! Adapter from a tool-server catalog entry to the uniform `Tool` trait.

use async_trait::async_trait;
use std::sync::Arc;
use switchyard_core::error::ToolError;
use switchyard_core::render_reply;
use switchyard_core::tool::{Tool, ToolDescriptor, ToolServer};

/// One remote operation, invocable through its server connection.
pub struct RemoteTool {
    server: Arc<dyn ToolServer>,
    descriptor: ToolDescriptor,
}

impl RemoteTool {
    pub fn new(server: Arc<dyn ToolServer>, descriptor: ToolDescriptor) -> Self {
        Self { server, descriptor }
    }

    /// Wrap a whole catalog into session-ready tools.
    pub fn wrap_catalog(
        server: &Arc<dyn ToolServer>,
        catalog: Vec<ToolDescriptor>,
    ) -> Vec<Arc<dyn Tool>> {
        catalog
            .into_iter()
            .map(|descriptor| {
                Arc::new(RemoteTool::new(server.clone(), descriptor)) as Arc<dyn Tool>
            })
            .collect()
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn input_schema(&self) -> serde_json::Value {
        self.descriptor.input_schema.clone()
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let result = self
            .server
            .invoke(&self.descriptor.name, arguments)
            .await
            .map_err(|e| ToolError::Failed {
                name: self.descriptor.name.clone(),
                reason: e.to_string(),
            })?;

        // Servers wrap text in nested content structures; flatten them.
        Ok(render_reply(&result))
    }
}
