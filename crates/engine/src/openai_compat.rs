//! OpenAI-compatible engine implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, and any other
//! endpoint exposing `/v1/chat/completions`.
//!
//! Supports:
//! - Chat completions (non-streaming and streaming SSE)
//! - Tool use / function calling
//! - Heterogeneous reply content (string or content-part lists)

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use switchyard_core::engine::{
    ChatMessage, ChatRole, Engine, EngineReply, EngineRequest, StreamChunk, ToolUse,
};
use switchyard_core::error::EngineError;
use switchyard_core::tool::ToolDescriptor;
use tracing::{debug, trace, warn};

/// An OpenAI-compatible reasoning engine.
pub struct OpenAiCompatEngine {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatEngine {
    /// Create a new OpenAI-compatible engine.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| EngineError::Network(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create an OpenRouter engine (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Result<Self, EngineError> {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Convert our messages to the wire format.
    fn to_api_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    ChatRole::System => "system".into(),
                    ChatRole::User => "user".into(),
                    ChatRole::Assistant => "assistant".into(),
                    ChatRole::Tool => "tool".into(),
                },
                content: Some(m.content.clone()),
                tool_calls: if m.tool_uses.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_uses
                            .iter()
                            .map(|tu| ApiToolCall {
                                id: tu.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tu.name.clone(),
                                    arguments: tu.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_use_id.clone(),
            })
            .collect()
    }

    /// Convert tool descriptors to the function-calling wire format.
    fn to_api_tools(tools: &[ToolDescriptor]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                },
            })
            .collect()
    }

    fn build_body(&self, request: &EngineRequest, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": stream,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        body
    }

    fn classify_status(status: u16, body: String) -> EngineError {
        match status {
            429 => EngineError::RateLimited {
                retry_after_secs: 5,
            },
            401 | 403 => EngineError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ),
            _ => EngineError::Api {
                status_code: status,
                message: body,
            },
        }
    }
}

#[async_trait]
impl Engine for OpenAiCompatEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: EngineRequest) -> Result<EngineReply, EngineError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(&request, false);

        debug!(engine = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Engine returned error");
            return Err(Self::classify_status(status, error_body));
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| EngineError::Api {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::Empty("no choices in response".into()))?;

        let tool_uses: Vec<ToolUse> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolUse {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(EngineReply {
            content: choice.message.content.unwrap_or(serde_json::Value::Null),
            tool_uses,
        })
    }

    async fn stream(
        &self,
        request: EngineRequest,
    ) -> Result<
        tokio::sync::mpsc::Receiver<Result<StreamChunk, EngineError>>,
        EngineError,
    > {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(&request, true);

        debug!(engine = %self.name, model = %request.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Engine streaming error");
            return Err(Self::classify_status(status, error_body));
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let engine_name = self.name.clone();

        // Read the SSE byte stream and parse chunks in a background task.
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            // Tool-call deltas arrive incrementally, keyed by index.
            let mut accumulators: std::collections::BTreeMap<u32, ToolUseAccumulator> =
                std::collections::BTreeMap::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(EngineError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    let data = data.trim();

                    if data == "[DONE]" {
                        let _ = tx
                            .send(Ok(StreamChunk {
                                content: None,
                                tool_uses: drain_accumulators(&mut accumulators),
                                done: true,
                            }))
                            .await;
                        return;
                    }

                    match serde_json::from_str::<StreamResponse>(data) {
                        Ok(stream_resp) => {
                            let Some(choice) = stream_resp.choices.first() else {
                                continue;
                            };
                            let delta = &choice.delta;

                            if let Some(tc_deltas) = &delta.tool_calls {
                                for tc_delta in tc_deltas {
                                    let acc = accumulators
                                        .entry(tc_delta.index)
                                        .or_default();
                                    if let Some(id) = &tc_delta.id {
                                        acc.id = id.clone();
                                    }
                                    if let Some(func) = &tc_delta.function {
                                        if let Some(name) = &func.name {
                                            acc.name = name.clone();
                                        }
                                        if let Some(args) = &func.arguments {
                                            acc.arguments.push_str(args);
                                        }
                                    }
                                }
                            }

                            let has_content =
                                delta.content.as_ref().is_some_and(|c| !c.is_empty());
                            if has_content {
                                let chunk = StreamChunk {
                                    content: delta.content.clone(),
                                    tool_uses: Vec::new(),
                                    done: false,
                                };
                                if tx.send(Ok(chunk)).await.is_err() {
                                    return; // receiver dropped
                                }
                            }
                        }
                        Err(e) => {
                            trace!(
                                engine = %engine_name,
                                data = %data,
                                error = %e,
                                "Ignoring unparseable SSE chunk"
                            );
                        }
                    }
                }
            }

            // Stream ended without [DONE] — still emit the final chunk.
            let _ = tx
                .send(Ok(StreamChunk {
                    content: None,
                    tool_uses: drain_accumulators(&mut accumulators),
                    done: true,
                }))
                .await;
        });

        Ok(rx)
    }
}

fn drain_accumulators(
    accumulators: &mut std::collections::BTreeMap<u32, ToolUseAccumulator>,
) -> Vec<ToolUse> {
    std::mem::take(accumulators)
        .into_values()
        .map(ToolUseAccumulator::into_tool_use)
        .collect()
}

// --- Wire types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiReplyMessage,
}

/// The engine's reply message. `content` stays a raw value because
/// backends reply with either a plain string or a list of content parts.
#[derive(Debug, Deserialize)]
struct ApiReplyMessage {
    #[serde(default)]
    content: Option<serde_json::Value>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

// --- Streaming SSE types ---

#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCallDelta>>,
}

/// A tool-call delta — arrives incrementally across chunks.
#[derive(Debug, Deserialize)]
struct StreamToolCallDelta {
    index: u32,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<StreamFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Accumulates incremental tool-call deltas into a complete tool use.
#[derive(Default)]
struct ToolUseAccumulator {
    id: String,
    name: String,
    arguments: String,
}

impl ToolUseAccumulator {
    fn into_tool_use(self) -> ToolUse {
        ToolUse {
            id: self.id,
            name: self.name,
            arguments: self.arguments,
        }
    }
}
