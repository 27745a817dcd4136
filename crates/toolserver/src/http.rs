//! JSON-RPC 2.0 over HTTP tool-server client.
//!
//! Protocol flow: `initialize` handshake (capturing the session id header
//! when the server issues one), `notifications/initialized`, then
//! `tools/list` / `tools/call` for the life of the connection, and an HTTP
//! DELETE on close.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use switchyard_core::error::ToolServerError;
use switchyard_core::tool::{ToolDescriptor, ToolServer};
use tracing::{debug, warn};

const PROTOCOL_VERSION: &str = "2025-03-26";
const SESSION_HEADER: &str = "Mcp-Session-Id";

/// A persistent connection to one tool server.
#[derive(Debug)]
pub struct HttpToolServer {
    endpoint: String,
    client: reqwest::Client,
    session_id: Option<String>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl HttpToolServer {
    /// Open a connection: POST `initialize`, record the session id, and
    /// acknowledge with `notifications/initialized`.
    ///
    /// This is the eager, fallible step of domain-agent construction.
    pub async fn connect(endpoint: impl Into<String>) -> Result<Self, ToolServerError> {
        let endpoint = endpoint.into();
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ToolServerError::Connection(e.to_string()))?;

        let init = RpcRequest {
            jsonrpc: "2.0",
            id: Some(1),
            method: "initialize".into(),
            params: serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "clientInfo": { "name": "switchyard", "version": env!("CARGO_PKG_VERSION") },
                "capabilities": {}
            }),
        };

        let response = client
            .post(&endpoint)
            .header("Accept", "application/json, text/event-stream")
            .json(&init)
            .send()
            .await
            .map_err(|e| ToolServerError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ToolServerError::Connection(format!(
                "initialize returned status {}",
                response.status()
            )));
        }

        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| ToolServerError::Protocol(e.to_string()))?;
        body.into_result()?;

        let server = Self {
            endpoint,
            client,
            session_id,
            next_id: AtomicU64::new(2),
            closed: AtomicBool::new(false),
        };

        // Notification — fire and forget, no id, no result expected.
        let ack = RpcRequest {
            jsonrpc: "2.0",
            id: None,
            method: "notifications/initialized".into(),
            params: serde_json::json!({}),
        };
        if let Err(e) = server.post(&ack).await {
            debug!(endpoint = %server.endpoint, error = %e, "initialized notification not accepted");
        }

        debug!(endpoint = %server.endpoint, "Tool server connected");
        Ok(server)
    }

    /// The endpoint this connection is bound to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, request: &RpcRequest) -> Result<reqwest::Response, ToolServerError> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json, text/event-stream")
            .json(request);
        if let Some(session_id) = &self.session_id {
            builder = builder.header(SESSION_HEADER, session_id);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| ToolServerError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ToolServerError::Connection(format!(
                "{} returned status {}",
                request.method,
                response.status()
            )));
        }
        Ok(response)
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ToolServerError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ToolServerError::Connection("connection closed".into()));
        }

        let request = RpcRequest {
            jsonrpc: "2.0",
            id: Some(self.next_id.fetch_add(1, Ordering::SeqCst)),
            method: method.into(),
            params,
        };

        let response = self.post(&request).await?;
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| ToolServerError::Protocol(e.to_string()))?;
        body.into_result()
    }
}

#[async_trait]
impl ToolServer for HttpToolServer {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServerError> {
        let result = self.call("tools/list", serde_json::json!({})).await?;
        let listing: ToolListing = serde_json::from_value(result)
            .map_err(|e| ToolServerError::Protocol(format!("bad tools/list result: {e}")))?;
        Ok(listing.tools)
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolServerError> {
        self.call(
            "tools/call",
            serde_json::json!({ "name": name, "arguments": arguments }),
        )
        .await
        .map_err(|e| match e {
            ToolServerError::Rpc { code, message } => ToolServerError::Invocation {
                tool: name.to_string(),
                reason: format!("server error {code}: {message}"),
            },
            other => other,
        })
    }

    async fn close(&self) -> Result<(), ToolServerError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(()); // already closed
        }

        let mut builder = self.client.delete(&self.endpoint);
        if let Some(session_id) = &self.session_id {
            builder = builder.header(SESSION_HEADER, session_id);
        }
        match builder.send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "Tool server close failed");
                Err(ToolServerError::Connection(e.to_string()))
            }
        }
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    method: String,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn into_result(self) -> Result<serde_json::Value, ToolServerError> {
        if let Some(error) = self.error {
            return Err(ToolServerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(serde_json::Value::Null))
    }
}

#[derive(Debug, Deserialize)]
struct ToolListing {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}
