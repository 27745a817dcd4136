//! The delegate callable an orchestrator exposes for each domain agent.

use crate::domain::DomainAgent;
use async_trait::async_trait;
use std::sync::Arc;
use switchyard_core::error::ToolError;
use switchyard_core::tool::Tool;

/// Wraps a domain agent as a named, described tool for the orchestrator's
/// engine. The body is exactly `agent.run(query, context)`.
pub struct AgentDelegate {
    agent: Arc<DomainAgent>,
}

impl AgentDelegate {
    pub fn new(agent: Arc<DomainAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Tool for AgentDelegate {
    fn name(&self) -> &str {
        &self.agent.spec().tool_name
    }

    fn description(&self) -> &str {
        &self.agent.spec().tool_description
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question or task for this agent"
                },
                "context": {
                    "type": "string",
                    "description": "Optional extra context for the agent"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ToolError::InvalidArguments("missing required string field 'query'".into())
            })?;
        let context = arguments.get("context").and_then(|v| v.as_str());

        self.agent
            .run(query, context)
            .await
            .map_err(|e| ToolError::Failed {
                name: self.agent.spec().tool_name.clone(),
                reason: e.to_string(),
            })
    }
}
