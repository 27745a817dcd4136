//! Error types for the Switchyard domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Switchyard operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Reasoning engine errors ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Tool server errors ---
    #[error("Tool server error: {0}")]
    ToolServer(#[from] ToolServerError),

    // --- Tool invocation errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A failure inside the reasoning engine (the model call itself).
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by engine, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Engine returned an empty response: {0}")]
    Empty(String),
}

/// A failure talking to a remote tool server.
#[derive(Debug, Error)]
pub enum ToolServerError {
    /// The server is unreachable or the handshake failed. Non-fatal at
    /// agent construction time: the agent degrades to zero tools.
    #[error("Tool server unreachable: {0}")]
    Connection(String),

    #[error("Tool invocation failed: {tool} — {reason}")]
    Invocation { tool: String, reason: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server error {code}: {message}")]
    Rpc { code: i64, message: String },
}

/// A failure in a callable tool (remote adapter or agent delegate).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool failed: {name} — {reason}")]
    Failed { name: String, reason: String },
}
