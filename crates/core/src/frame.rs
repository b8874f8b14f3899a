//! Frames carried on the client-facing output stream.
//!
//! A turn's output is a totally ordered sequence of [`WireFrame`]s: filtered
//! text fragments interleaved with structured side-channel events. The
//! line encoding lives in the protocol crate; this module only defines the
//! shapes.

use serde::{Deserialize, Serialize};

/// A structured side-channel event. Serializes as an object with a `type`
/// field, e.g. `{"type":"tool_usage","tool":"WebSearch","description":"…"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataEvent {
    /// The model invoked a tool.
    ToolUsage { tool: String, description: String },

    /// Completion metadata for the turn. Always the last frame of a turn.
    Meta { info: serde_json::Value },

    /// The upstream source failed; the stream ends after this frame.
    Error { content: String },
}

impl DataEvent {
    /// The `type` discriminator as it appears on the wire.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ToolUsage { .. } => "tool_usage",
            Self::Meta { .. } => "meta",
            Self::Error { .. } => "error",
        }
    }
}

/// One frame of the output stream.
#[derive(Debug, Clone, PartialEq)]
pub enum WireFrame {
    /// A fragment of filtered, user-visible text.
    Text(String),
    /// A side-channel event.
    Data(DataEvent),
}

impl WireFrame {
    pub fn text(fragment: impl Into<String>) -> Self {
        Self::Text(fragment.into())
    }

    pub fn tool_usage(tool: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Data(DataEvent::ToolUsage {
            tool: tool.into(),
            description: description.into(),
        })
    }

    pub fn meta(info: serde_json::Value) -> Self {
        Self::Data(DataEvent::Meta { info })
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::Data(DataEvent::Error {
            content: content.into(),
        })
    }
}
