//! Configuration loading, validation, and management for Switchyard.
//!
//! Loads configuration from `~/.switchyard/config.toml` with environment
//! variable overrides. Validates all settings at startup. The agent map is
//! read-only for the process lifetime — there is no hot reload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.switchyard/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reasoning-engine settings shared by every session
    #[serde(default)]
    pub engine: EngineConfig,

    /// The orchestrator's own instructions
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// Domain agent specs, keyed by stable agent key.
    ///
    /// A `BTreeMap` so construction order is deterministic across runs.
    #[serde(default)]
    pub agents: BTreeMap<String, AgentSpec>,

    /// Activity timeline settings
    #[serde(default)]
    pub log: LogConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Reasoning-engine connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of an OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key (overridable via environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per engine reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_api_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    4096
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("engine", &self.engine)
            .field("coordinator", &self.coordinator)
            .field("agents", &self.agents)
            .field("log", &self.log)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Orchestrator-level instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// System instructions for the routing session
    #[serde(default = "default_coordinator_instructions")]
    pub instructions: String,
}

fn default_coordinator_instructions() -> String {
    "You route user requests to the correct specialist agent tools, \
     coordinate their results, and answer with one merged reply. \
     Call no agent when none applies."
        .into()
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            instructions: default_coordinator_instructions(),
        }
    }
}

/// One domain agent's identity and network binding.
///
/// Immutable for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Display name, used as the timeline's agent tag
    pub name: String,

    /// Name under which the orchestrator's engine can invoke this agent
    pub tool_name: String,

    /// Description shown to the orchestrator's engine
    pub tool_description: String,

    /// The agent's own system instructions
    pub instructions: String,

    /// URL of the agent's tool server
    pub endpoint: String,
}

/// Activity timeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Maximum retained events (oldest are evicted first)
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
}

fn default_log_capacity() -> usize {
    2000
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
        }
    }
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8410
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.switchyard/config.toml).
    ///
    /// Also checks environment variables:
    /// - `SWITCHYARD_API_KEY` (highest priority), `OPENROUTER_API_KEY`,
    ///   `OPENAI_API_KEY`
    /// - `SWITCHYARD_API_URL`, `SWITCHYARD_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.engine.api_key.is_none() {
            config.engine.api_key = std::env::var("SWITCHYARD_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(url) = std::env::var("SWITCHYARD_API_URL") {
            config.engine.api_url = url;
        }

        if let Ok(model) = std::env::var("SWITCHYARD_MODEL") {
            config.engine.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".switchyard")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.temperature < 0.0 || self.engine.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "engine.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.log.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "log.capacity must be greater than 0".into(),
            ));
        }

        for (key, spec) in &self.agents {
            if spec.endpoint.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "agent '{key}' has an empty endpoint"
                )));
            }
            if spec.tool_name.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "agent '{key}' has an empty tool_name"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.engine.api_key.is_some()
    }

    /// Generate a starter config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let scaffold = r#"# Switchyard configuration

[engine]
api_url = "https://openrouter.ai/api/v1"
model = "anthropic/claude-sonnet-4"
temperature = 0.2
max_tokens = 4096
# api_key = "sk-..."   # or set SWITCHYARD_API_KEY

[coordinator]
instructions = """
Route user requests to the correct specialist:
- reporter_agent: stock aging and cost reports
- planner_agent: project plans and material usage
Coordinate the results into one reply.
"""

[log]
capacity = 2000

[gateway]
host = "127.0.0.1"
port = 8410

[agents.reporter]
name = "Reporter"
tool_name = "reporter_agent"
tool_description = "Agent for generating reports from aging stock and actual cost data."
instructions = "You analyze business reports. Always inspect a report's columns before reading it."
endpoint = "http://127.0.0.1:8101/mcp/"

[agents.planner]
name = "Planner"
tool_name = "planner_agent"
tool_description = "Agent for project planning and material usage tracking."
instructions = "You provide insight on project tasks and material requirements."
endpoint = "http://127.0.0.1:8101/mcp/"
"#;
        scaffold.to_string()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            coordinator: CoordinatorConfig::default(),
            agents: BTreeMap::new(),
            log: LogConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
