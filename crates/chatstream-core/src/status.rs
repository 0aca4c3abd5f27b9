//! Status enums for messages and their streaming phases.

use serde::{Deserialize, Serialize};

/// Transient status of an in-flight bot message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The assistant is reasoning before acting.
    Thinking,
    /// The assistant has started calling tools.
    ToolStart,
    /// A tool call finished and its result is being processed.
    ToolEnd,
    /// Response text is streaming in.
    Streaming,
}

impl Phase {
    /// Status text shown while the message is in this phase.
    ///
    /// `Streaming` has no status text; the accumulated response is shown instead.
    pub fn status_text(&self) -> Option<&'static str> {
        match self {
            Self::Thinking => Some(THINKING_TEXT),
            Self::ToolStart => Some(TOOL_START_TEXT),
            Self::ToolEnd => Some(TOOL_END_TEXT),
            Self::Streaming => None,
        }
    }
}

pub(crate) const THINKING_TEXT: &str = "Thinking...";
pub(crate) const TOOL_START_TEXT: &str = "Calling tools...";
pub(crate) const TOOL_END_TEXT: &str = "Processing results...";

/// Lifecycle state of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "phase", rename_all = "snake_case")]
pub enum MessageState {
    /// Empty bot message waiting for its first chunk.
    Placeholder,
    /// Bot message being assembled from streamed chunks.
    Active(Phase),
    /// Complete and immutable.
    #[default]
    Final,
}

impl MessageState {
    /// Returns true if the message can still receive chunks.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Placeholder | Self::Active(_))
    }

    /// Current phase, if the message is actively streaming.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Active(phase) => Some(*phase),
            Self::Placeholder | Self::Final => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_states() {
        assert!(MessageState::Placeholder.is_in_flight());
        assert!(MessageState::Active(Phase::Thinking).is_in_flight());
        assert!(!MessageState::Final.is_in_flight());
    }

    #[test]
    fn test_phase_only_when_active() {
        assert_eq!(MessageState::Placeholder.phase(), None);
        assert_eq!(MessageState::Final.phase(), None);
        assert_eq!(
            MessageState::Active(Phase::ToolEnd).phase(),
            Some(Phase::ToolEnd)
        );
    }

    #[test]
    fn test_phase_wire_names() {
        assert_eq!(serde_json::to_string(&Phase::ToolStart).unwrap(), "\"tool_start\"");
        assert_eq!(serde_json::to_string(&Phase::Streaming).unwrap(), "\"streaming\"");
    }
}
