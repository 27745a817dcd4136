//! Domain agents and the routing orchestrator.
//!
//! A [`DomainAgent`] is a bound pairing of one reasoning-engine session and
//! one remote tool-server connection, specialized to a subject area. The
//! [`Orchestrator`] owns a set of domain agents, exposes each to its own
//! engine as a named delegate tool, and merges their answers into one
//! reply.
//!
//! # Architecture
//!
//! ```text
//! User request
//!       │
//!       ▼
//! ┌──────────────┐
//! │ Orchestrator │  ← engine picks delegates, merges results
//! └──┬───────┬───┘
//!    │       │
//!    ▼       ▼
//! ┌──────┐ ┌──────┐
//! │ A-1  │ │ A-2  │  ← DomainAgents (each bound to a tool server)
//! └──────┘ └──────┘
//! ```

pub mod delegate;
pub mod domain;
pub mod orchestrator;

pub use delegate::AgentDelegate;
pub use domain::DomainAgent;
pub use orchestrator::Orchestrator;

#[cfg(test)]
pub(crate) mod test_helpers;
