//! A reasoning-engine session bound to a fixed tool set.
//!
//! The session runs the engine↔tool loop: stream a reply, surface content
//! deltas as `process` events, execute any requested tool uses (all of
//! them concurrently), feed the results back, and repeat until the engine
//! answers with text alone. Callers see one opaque `send()` — however many
//! tool round-trips happen inside it.

use std::sync::Arc;
use switchyard_core::engine::{ChatMessage, Engine, EngineRequest, ToolUse};
use switchyard_core::error::ToolError;
use switchyard_core::tool::{Tool, ToolDescriptor};
use switchyard_telemetry::{LogStore, Stage};
use tracing::{debug, warn};

/// One bound engine session.
pub struct Session {
    /// The engine backend.
    engine: Arc<dyn Engine>,
    /// Model identifier.
    model: String,
    /// Sampling temperature.
    temperature: f32,
    /// Max tokens per reply.
    max_tokens: Option<u32>,
    /// Fixed system instructions.
    system_prompt: String,
    /// The tools this session may call.
    tools: Vec<Arc<dyn Tool>>,
    /// Display name used for timeline events.
    agent_name: String,
    /// Shared activity timeline.
    log: Arc<LogStore>,
    /// Bound on engine↔tool round trips per send.
    max_iterations: u32,
}

impl Session {
    /// Create a new session.
    pub fn new(
        engine: Arc<dyn Engine>,
        model: impl Into<String>,
        temperature: f32,
        system_prompt: impl Into<String>,
        tools: Vec<Arc<dyn Tool>>,
        agent_name: impl Into<String>,
        log: Arc<LogStore>,
    ) -> Self {
        Self {
            engine,
            model: model.into(),
            temperature,
            max_tokens: None,
            system_prompt: system_prompt.into(),
            tools,
            agent_name: agent_name.into(),
            log,
            max_iterations: 25,
        }
    }

    /// Set the max tokens per engine reply.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of tool round trips per send.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// The tools bound to this session.
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Send a prompt and drive the engine to a final reply.
    ///
    /// The returned value is the engine's final content, in whatever shape
    /// the backend produced; callers normalize it at their boundary.
    pub async fn send(
        &self,
        prompt: &str,
    ) -> Result<serde_json::Value, switchyard_core::Error> {
        let descriptors: Vec<ToolDescriptor> =
            self.tools.iter().map(|t| t.descriptor()).collect();

        let mut messages = vec![
            ChatMessage::system(&self.system_prompt),
            ChatMessage::user(prompt),
        ];

        let mut iteration = 0;
        while iteration < self.max_iterations {
            iteration += 1;
            debug!(agent = %self.agent_name, iteration, "Session iteration");

            let request = EngineRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: descriptors.clone(),
            };

            let mut rx = self.engine.stream(request).await?;
            let mut content = String::new();
            let mut tool_uses: Vec<ToolUse> = Vec::new();

            while let Some(chunk) = rx.recv().await {
                let chunk = chunk?;
                if let Some(delta) = &chunk.content {
                    if !delta.trim().is_empty() {
                        self.log
                            .add(&self.agent_name, Stage::Process, delta.as_str(), None);
                    }
                    content.push_str(delta);
                }
                tool_uses.extend(chunk.tool_uses);
                if chunk.done {
                    break;
                }
            }

            if tool_uses.is_empty() {
                // Final text reply
                return Ok(serde_json::Value::String(content));
            }

            // The engine wants tools run before it can finish.
            for tu in &tool_uses {
                let arguments: serde_json::Value =
                    serde_json::from_str(&tu.arguments).unwrap_or(serde_json::Value::Null);
                self.log.add(
                    &self.agent_name,
                    Stage::Tool,
                    format!("Calling tool {}", tu.name),
                    Some(serde_json::json!({
                        "tool": { "id": tu.id, "name": tu.name, "arguments": arguments }
                    })),
                );
            }

            messages.push(ChatMessage::assistant(content, tool_uses.clone()));

            // All requested uses run concurrently.
            let results =
                futures::future::join_all(tool_uses.iter().map(|tu| self.execute(tu))).await;

            for (tu, result) in tool_uses.iter().zip(results) {
                let text = match result {
                    Ok(text) => text,
                    Err(e) => {
                        // Reported back to the engine so it can recover.
                        warn!(agent = %self.agent_name, tool = %tu.name, error = %e, "Tool use failed");
                        format!("Error: {e}")
                    }
                };
                messages.push(ChatMessage::tool_result(&tu.id, text));
            }
        }

        warn!(
            agent = %self.agent_name,
            iterations = self.max_iterations,
            "Max tool iterations reached, forcing text reply"
        );
        Ok(serde_json::Value::String(
            "Maximum tool iterations reached without a final reply. Please refine the request."
                .into(),
        ))
    }

    async fn execute(&self, tu: &ToolUse) -> Result<String, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == tu.name)
            .ok_or_else(|| ToolError::NotFound(tu.name.clone()))?;

        let arguments = if tu.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&tu.arguments)
                .map_err(|e| ToolError::InvalidArguments(e.to_string()))?
        };

        tool.invoke(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use switchyard_core::engine::EngineReply;
    use switchyard_core::error::EngineError;

    /// An engine that returns a sequence of scripted replies.
    struct ScriptedEngine {
        replies: Mutex<std::collections::VecDeque<EngineReply>>,
    }

    impl ScriptedEngine {
        fn new(replies: Vec<EngineReply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }

        fn text(text: &str) -> EngineReply {
            EngineReply {
                content: serde_json::json!(text),
                tool_uses: vec![],
            }
        }

        fn tool_use(name: &str, arguments: &str) -> EngineReply {
            EngineReply {
                content: serde_json::Value::String(String::new()),
                tool_uses: vec![ToolUse {
                    id: format!("use_{name}"),
                    name: name.into(),
                    arguments: arguments.into(),
                }],
            }
        }
    }

    #[async_trait]
    impl Engine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: EngineRequest,
        ) -> Result<EngineReply, EngineError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| EngineError::Empty("script exhausted".into()))
        }
    }

    struct CountingTool {
        calls: AtomicUsize,
        reply: String,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "lookup"
        }
        fn description(&self) -> &str {
            "Looks things up"
        }
        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn invoke(&self, _arguments: serde_json::Value) -> Result<String, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    fn session_with(
        engine: ScriptedEngine,
        tools: Vec<Arc<dyn Tool>>,
        log: Arc<LogStore>,
    ) -> Session {
        Session::new(
            Arc::new(engine),
            "mock-model",
            0.2,
            "you are a test agent",
            tools,
            "Tester",
            log,
        )
    }

    #[tokio::test]
    async fn plain_text_reply() {
        let log = Arc::new(LogStore::default());
        let session = session_with(ScriptedEngine::new(vec![ScriptedEngine::text("hi")]), vec![], log.clone());

        let value = session.send("hello").await.unwrap();
        assert_eq!(value, serde_json::json!("hi"));

        // The streamed reply surfaced as a consolidated process entry.
        let events = log.dump();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].stage, Stage::Process);
        assert_eq!(events[0].message, "hi");
    }

    #[tokio::test]
    async fn tool_round_trip() {
        let log = Arc::new(LogStore::default());
        let tool = Arc::new(CountingTool {
            calls: AtomicUsize::new(0),
            reply: "42 rows".into(),
        });
        let session = session_with(
            ScriptedEngine::new(vec![
                ScriptedEngine::tool_use("lookup", r#"{"query":"stock"}"#),
                ScriptedEngine::text("There are 42 rows."),
            ]),
            vec![tool.clone()],
            log.clone(),
        );

        let value = session.send("how many rows?").await.unwrap();
        assert_eq!(value, serde_json::json!("There are 42 rows."));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);

        // Tool events carry the captured invocation as payload.
        let events = log.dump();
        let tool_events: Vec<_> = events.iter().filter(|e| e.stage == Stage::Tool).collect();
        assert_eq!(tool_events.len(), 1);
        let payload = tool_events[0].payload.as_ref().unwrap();
        assert_eq!(payload["tool"]["name"], "lookup");
        assert_eq!(payload["tool"]["arguments"]["query"], "stock");
    }

    #[tokio::test]
    async fn failed_tool_is_reported_back_to_engine() {
        struct FailingTool;

        #[async_trait]
        impl Tool for FailingTool {
            fn name(&self) -> &str {
                "broken"
            }
            fn description(&self) -> &str {
                "Always fails"
            }
            fn input_schema(&self) -> serde_json::Value {
                serde_json::json!({"type": "object"})
            }
            async fn invoke(
                &self,
                _arguments: serde_json::Value,
            ) -> Result<String, ToolError> {
                Err(ToolError::Failed {
                    name: "broken".into(),
                    reason: "boom".into(),
                })
            }
        }

        let log = Arc::new(LogStore::default());
        let session = session_with(
            ScriptedEngine::new(vec![
                ScriptedEngine::tool_use("broken", "{}"),
                ScriptedEngine::text("I could not complete that."),
            ]),
            vec![Arc::new(FailingTool)],
            log,
        );

        // The session survives: the failure went back to the engine, which
        // produced a final reply.
        let value = session.send("try it").await.unwrap();
        assert_eq!(value, serde_json::json!("I could not complete that."));
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_back_to_engine() {
        let log = Arc::new(LogStore::default());
        let session = session_with(
            ScriptedEngine::new(vec![
                ScriptedEngine::tool_use("missing", "{}"),
                ScriptedEngine::text("done"),
            ]),
            vec![],
            log,
        );
        let value = session.send("go").await.unwrap();
        assert_eq!(value, serde_json::json!("done"));
    }

    #[tokio::test]
    async fn engine_failure_propagates() {
        let log = Arc::new(LogStore::default());
        let session = session_with(ScriptedEngine::new(vec![]), vec![], log);
        let err = session.send("hello").await.unwrap_err();
        assert!(matches!(
            err,
            switchyard_core::Error::Engine(EngineError::Empty(_))
        ));
    }

    #[tokio::test]
    async fn iteration_bound_forces_text_reply() {
        let log = Arc::new(LogStore::default());
        let tool = Arc::new(CountingTool {
            calls: AtomicUsize::new(0),
            reply: "again".into(),
        });
        // Engine asks for the tool on every turn.
        let session = session_with(
            ScriptedEngine::new(vec![
                ScriptedEngine::tool_use("lookup", "{}"),
                ScriptedEngine::tool_use("lookup", "{}"),
                ScriptedEngine::tool_use("lookup", "{}"),
            ]),
            vec![tool.clone()],
            log,
        )
        .with_max_iterations(2);

        let value = session.send("loop forever").await.unwrap();
        let text = switchyard_core::render_reply(&value);
        assert!(text.contains("Maximum tool iterations"));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn parallel_tool_uses_all_execute() {
        struct TwoUseEngine {
            turns: Mutex<u32>,
        }

        #[async_trait]
        impl Engine for TwoUseEngine {
            fn name(&self) -> &str {
                "two-use"
            }
            async fn complete(
                &self,
                request: EngineRequest,
            ) -> Result<EngineReply, EngineError> {
                let mut turns = self.turns.lock().unwrap();
                *turns += 1;
                if *turns == 1 {
                    Ok(EngineReply {
                        content: serde_json::Value::String(String::new()),
                        tool_uses: vec![
                            ToolUse {
                                id: "use_a".into(),
                                name: "lookup".into(),
                                arguments: "{}".into(),
                            },
                            ToolUse {
                                id: "use_b".into(),
                                name: "lookup".into(),
                                arguments: "{}".into(),
                            },
                        ],
                    })
                } else {
                    // Both results must be in the conversation by now.
                    let tool_results = request
                        .messages
                        .iter()
                        .filter(|m| m.tool_use_id.is_some())
                        .count();
                    assert_eq!(tool_results, 2);
                    Ok(EngineReply {
                        content: serde_json::json!("merged"),
                        tool_uses: vec![],
                    })
                }
            }
        }

        let log = Arc::new(LogStore::default());
        let tool = Arc::new(CountingTool {
            calls: AtomicUsize::new(0),
            reply: "part".into(),
        });
        let session = Session::new(
            Arc::new(TwoUseEngine {
                turns: Mutex::new(0),
            }),
            "mock-model",
            0.2,
            "test",
            vec![tool.clone()],
            "Tester",
            log,
        );

        let value = session.send("fan out").await.unwrap();
        assert_eq!(value, serde_json::json!("merged"));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 2);
    }
}
