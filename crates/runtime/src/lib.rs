//! The Switchyard composition root.
//!
//! Builds the shared subsystems exactly once — one activity timeline, one
//! reasoning-engine client, one domain agent per configured spec (in config
//! key order), one orchestrator over all of them — and exposes the runtime
//! surface: `handle`, `logs`, `reset`, `shutdown`.

use std::collections::BTreeMap;
use std::sync::Arc;
use switchyard_agent::{DomainAgent, Orchestrator};
use switchyard_config::AppConfig;
use switchyard_core::engine::Engine;
use switchyard_core::tool::ToolServer;
use switchyard_engine::OpenAiCompatEngine;
use switchyard_telemetry::{LogEvent, LogStore};
use switchyard_toolserver::{DisconnectedServer, HttpToolServer};
use tracing::{info, warn};

/// A fully assembled Switchyard runtime.
pub struct Runtime {
    log: Arc<LogStore>,
    orchestrator: Orchestrator,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime").finish_non_exhaustive()
    }
}

impl Runtime {
    /// Build a runtime from configuration, opening one tool-server
    /// connection per agent spec.
    ///
    /// A tool server that refuses its handshake degrades its agent to a
    /// text-only responder; it never aborts startup.
    pub async fn connect(config: &AppConfig) -> Result<Self, switchyard_core::Error> {
        let api_key = config.engine.api_key.clone().ok_or_else(|| {
            switchyard_core::Error::Config {
                message: "no API key configured — set SWITCHYARD_API_KEY or engine.api_key".into(),
            }
        })?;

        let engine: Arc<dyn Engine> = Arc::new(OpenAiCompatEngine::new(
            "openai-compat",
            &config.engine.api_url,
            api_key,
        )?);

        let mut servers: BTreeMap<String, Arc<dyn ToolServer>> = BTreeMap::new();
        for (key, spec) in &config.agents {
            let server: Arc<dyn ToolServer> = match HttpToolServer::connect(&spec.endpoint).await
            {
                Ok(server) => Arc::new(server),
                Err(e) => {
                    warn!(
                        agent = %spec.name,
                        endpoint = %spec.endpoint,
                        error = %e,
                        "Tool server handshake failed"
                    );
                    Arc::new(DisconnectedServer::new(&spec.endpoint, e.to_string()))
                }
            };
            servers.insert(key.clone(), server);
        }

        Self::assemble(config, engine, servers).await
    }

    /// Assemble a runtime from already-built collaborators.
    ///
    /// This is the composition seam `connect` funnels through; tests and
    /// embedders inject their own engine and tool servers here.
    pub async fn assemble(
        config: &AppConfig,
        engine: Arc<dyn Engine>,
        mut servers: BTreeMap<String, Arc<dyn ToolServer>>,
    ) -> Result<Self, switchyard_core::Error> {
        let log = Arc::new(LogStore::new(config.log.capacity));

        let mut agents = Vec::with_capacity(config.agents.len());
        for (key, spec) in &config.agents {
            let server = servers
                .remove(key)
                .ok_or_else(|| switchyard_core::Error::Config {
                    message: format!("no tool server supplied for agent '{key}'"),
                })?;
            let agent = DomainAgent::connect(
                key,
                spec.clone(),
                engine.clone(),
                &config.engine,
                server,
                log.clone(),
            )
            .await;
            agents.push(Arc::new(agent));
        }

        info!(agents = agents.len(), "Runtime assembled");

        let orchestrator = Orchestrator::new(
            agents,
            &config.coordinator.instructions,
            engine,
            &config.engine,
            log.clone(),
        );

        Ok(Self { log, orchestrator })
    }

    /// Route one user message through the orchestrator.
    pub async fn handle(&self, message: &str) -> Result<String, switchyard_core::Error> {
        self.orchestrator.run(message).await
    }

    /// The full activity timeline, oldest first.
    pub fn logs(&self) -> Vec<LogEvent> {
        self.log.dump()
    }

    /// The last `n` timeline entries.
    pub fn tail(&self, n: usize) -> Vec<LogEvent> {
        self.log.tail(n)
    }

    /// Clear the activity timeline.
    pub fn reset(&self) {
        self.log.clear();
    }

    /// The agents this runtime routes to, in construction order.
    pub fn agents(&self) -> &[Arc<DomainAgent>] {
        self.orchestrator.agents()
    }

    /// Shared handle to the activity timeline.
    pub fn log(&self) -> Arc<LogStore> {
        self.log.clone()
    }

    /// Close every agent's tool-server connection.
    ///
    /// Best-effort: individual close failures are logged by the owning
    /// agent and never block cleanup of the rest.
    pub async fn shutdown(&self) {
        for agent in self.orchestrator.agents() {
            agent.close().await;
        }
        info!("Runtime shut down");
    }
}
