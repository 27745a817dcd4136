//! The routing orchestrator — merges specialist answers into one reply.

use crate::delegate::AgentDelegate;
use crate::domain::DomainAgent;
use std::sync::Arc;
use switchyard_config::EngineConfig;
use switchyard_core::engine::Engine;
use switchyard_core::render_reply;
use switchyard_core::tool::Tool;
use switchyard_engine::Session;
use switchyard_telemetry::{LogStore, Stage};
use tracing::info;

/// The top-level session that treats each domain agent as a callable tool.
///
/// The delegate set is built once at construction and is immutable — there
/// is no runtime agent registration. Which delegates get called, with what
/// query and context, and how many times, is the engine's decision.
pub struct Orchestrator {
    agents: Vec<Arc<DomainAgent>>,
    session: Session,
    log: Arc<LogStore>,
}

impl Orchestrator {
    /// Build the orchestrator over the given agents.
    pub fn new(
        agents: Vec<Arc<DomainAgent>>,
        instructions: impl Into<String>,
        engine: Arc<dyn Engine>,
        engine_config: &EngineConfig,
        log: Arc<LogStore>,
    ) -> Self {
        let delegates: Vec<Arc<dyn Tool>> = agents
            .iter()
            .map(|agent| Arc::new(AgentDelegate::new(agent.clone())) as Arc<dyn Tool>)
            .collect();

        info!(delegates = delegates.len(), "Orchestrator ready");

        let session = Session::new(
            engine,
            &engine_config.model,
            engine_config.temperature,
            instructions,
            delegates,
            "Orchestrator",
            log.clone(),
        )
        .with_max_tokens(engine_config.max_tokens);

        Self {
            agents,
            session,
            log,
        }
    }

    /// The agents this orchestrator routes to.
    pub fn agents(&self) -> &[Arc<DomainAgent>] {
        &self.agents
    }

    /// Route one user message and return the merged reply.
    ///
    /// Failures are not caught here: a delegate failure has already been
    /// recorded as an `error` event by the owning agent, and an engine
    /// failure propagates to the caller unmodified.
    pub async fn run(&self, user_message: &str) -> Result<String, switchyard_core::Error> {
        self.log.add("User", Stage::Input, user_message, None);

        let value = self.session.send(user_message).await?;
        let content = render_reply(&value);

        self.log.add("Orchestrator", Stage::Output, &content, None);
        Ok(content)
    }
}
