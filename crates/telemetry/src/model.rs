//! Data model for the agent activity timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The lifecycle stage an event belongs to. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// A prompt payload handed to an agent
    Input,
    /// Streamed reasoning progress (consolidated per agent)
    Process,
    /// A tool invocation, with the captured call as payload
    Tool,
    /// A finished, rendered reply
    Output,
    /// A classified failure
    Error,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Process => write!(f, "process"),
            Self::Tool => write!(f, "tool"),
            Self::Output => write!(f, "output"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One entry in the timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// When the event was recorded (refreshed on consolidation)
    pub timestamp: DateTime<Utc>,

    /// Display name of the agent that produced the event
    pub agent: String,

    /// Lifecycle stage
    pub stage: Stage,

    /// Human-readable message (space-joined across consolidated notices)
    pub message: String,

    /// Optional structured payload (e.g. a captured tool invocation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Stage::Process).unwrap(), "\"process\"");
        assert_eq!(Stage::Error.to_string(), "error");
    }

    #[test]
    fn event_serialization_omits_empty_payload() {
        let event = LogEvent {
            timestamp: Utc::now(),
            agent: "Reporter".into(),
            stage: Stage::Output,
            message: "done".into(),
            payload: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("payload"));

        let roundtrip: LogEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.agent, "Reporter");
        assert_eq!(roundtrip.stage, Stage::Output);
    }
}
