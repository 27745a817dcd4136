//! Remote tool-server access for Switchyard.
//!
//! A tool server is an external service exposing named, typed operations
//! over JSON-RPC 2.0 on a single HTTP endpoint. [`HttpToolServer`] opens
//! the connection eagerly (handshake + catalog fetch) and [`RemoteTool`]
//! adapts one catalog entry into the uniform [`Tool`] callable a session
//! can invoke.
//!
//! [`Tool`]: switchyard_core::Tool

pub mod disconnected;
pub mod http;
pub mod remote;

pub use disconnected::DisconnectedServer;
pub use http::HttpToolServer;
pub use remote::RemoteTool;
