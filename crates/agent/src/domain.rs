//! One specialist agent bound to a remote tool server.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use switchyard_config::{AgentSpec, EngineConfig};
use switchyard_core::engine::Engine;
use switchyard_core::render_reply;
use switchyard_core::tool::ToolServer;
use switchyard_engine::Session;
use switchyard_telemetry::{LogStore, Stage};
use switchyard_toolserver::RemoteTool;
use tracing::{info, warn};

/// A domain agent: one engine session, one tool-server connection, one
/// subject area.
///
/// Constructed once at runtime start (the tool catalog is fetched eagerly),
/// lives for the process lifetime, and is closed exactly once at teardown.
pub struct DomainAgent {
    key: String,
    spec: AgentSpec,
    server: Arc<dyn ToolServer>,
    session: Session,
    log: Arc<LogStore>,
    closed: AtomicBool,
}

impl DomainAgent {
    /// Build an agent over an already-opened tool-server connection.
    ///
    /// Fetches the catalog once. A catalog failure degrades the agent to a
    /// text-only responder — recorded as a warning, never raised, since one
    /// unreachable server must not abort the whole runtime.
    pub async fn connect(
        key: impl Into<String>,
        spec: AgentSpec,
        engine: Arc<dyn Engine>,
        engine_config: &EngineConfig,
        server: Arc<dyn ToolServer>,
        log: Arc<LogStore>,
    ) -> Self {
        let key = key.into();

        let tools = match server.list_tools().await {
            Ok(catalog) => {
                if catalog.is_empty() {
                    warn!(
                        agent = %spec.name,
                        endpoint = %spec.endpoint,
                        "Tool server returned an empty catalog; agent degrades to a text-only responder"
                    );
                }
                RemoteTool::wrap_catalog(&server, catalog)
            }
            Err(e) => {
                warn!(
                    agent = %spec.name,
                    endpoint = %spec.endpoint,
                    error = %e,
                    "Could not fetch tool catalog; agent degrades to a text-only responder"
                );
                Vec::new()
            }
        };

        info!(agent = %spec.name, key = %key, tools = tools.len(), "Domain agent ready");

        let session = Session::new(
            engine,
            &engine_config.model,
            engine_config.temperature,
            &spec.instructions,
            tools,
            &spec.name,
            log.clone(),
        )
        .with_max_tokens(engine_config.max_tokens);

        Self {
            key,
            spec,
            server,
            session,
            log,
            closed: AtomicBool::new(false),
        }
    }

    /// Stable key used for indexing within a runtime.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display name, used as the timeline's agent tag.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The agent's configuration.
    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    /// Number of remote tools bound to this agent's session.
    pub fn tool_count(&self) -> usize {
        self.session.tools().len()
    }

    /// Answer a query, optionally grounded in caller-supplied context.
    ///
    /// Either returns the fully rendered reply or raises a classified
    /// failure — never partial output. Every hop is recorded: the prompt
    /// payload as `input`, the rendered reply as `output`, or the failure
    /// as `error` before it propagates.
    pub async fn run(
        &self,
        query: &str,
        context: Option<&str>,
    ) -> Result<String, switchyard_core::Error> {
        let payload = match context {
            Some(ctx) if !ctx.trim().is_empty() => format!("{query}\n\nContext: {ctx}"),
            _ => query.to_string(),
        };

        self.log.add(&self.spec.name, Stage::Input, &payload, None);

        match self.session.send(&payload).await {
            Ok(value) => {
                let content = render_reply(&value);
                self.log.add(&self.spec.name, Stage::Output, &content, None);
                Ok(content)
            }
            Err(e) => {
                self.log.add(&self.spec.name, Stage::Error, e.to_string(), None);
                Err(e)
            }
        }
    }

    /// Close the tool-server connection. Idempotent; close failures are
    /// logged and swallowed — teardown never throws past this point.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.server.close().await {
            warn!(agent = %self.spec.name, error = %e, "Tool server close failed");
        }
    }
}
