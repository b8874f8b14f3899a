//! Upstream model-output source: the collaborator that feeds a turn.
//!
//! A source yields raw events believed to originate from a single model
//! turn, in order. It may terminate abruptly (channel closed without a
//! `Completed` event) or fail mid-stream (an `Err` item).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::SourceError;

/// One raw event from the model for the current turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelEvent {
    /// A chunk of raw model text. May split markup anywhere.
    Text { content: String },

    /// The model invoked a tool.
    ToolUse {
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },

    /// The turn finished. Reported figures are forwarded in the `meta` frame.
    Completed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cost_usd: Option<f64>,
    },
}

impl ModelEvent {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn tool_use(name: impl Into<String>, input: serde_json::Value) -> Self {
        Self::ToolUse {
            name: name.into(),
            input,
        }
    }
}

/// A client request that opens one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub message: String,

    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_session_id() -> String {
    "default".into()
}

impl TurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: default_session_id(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }
}

/// The receiving half of an open turn.
pub type SourceStream = mpsc::Receiver<std::result::Result<ModelEvent, SourceError>>;

/// Produces model output for a turn.
///
/// Implementations are injected into the turn pipeline; nothing in the
/// filtering or framing code depends on where the text comes from.
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Start a turn and return the stream of its raw events.
    async fn open_turn(&self, request: TurnRequest) -> std::result::Result<SourceStream, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_event_parses_from_script_json() {
        let event: ModelEvent =
            serde_json::from_str(r#"{"type":"tool_use","name":"WebSearch","input":{"query":"rope"}}"#)
                .unwrap();
        match event {
            ModelEvent::ToolUse { name, input } => {
                assert_eq!(name, "WebSearch");
                assert_eq!(input["query"], "rope");
            }
            other => panic!("Expected ToolUse, got {other:?}"),
        }
    }

    #[test]
    fn completed_fields_are_optional() {
        let event: ModelEvent = serde_json::from_str(r#"{"type":"completed"}"#).unwrap();
        assert_eq!(
            event,
            ModelEvent::Completed {
                duration_ms: None,
                cost_usd: None
            }
        );
    }

    #[test]
    fn turn_request_defaults_session() {
        let request: TurnRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(request.session_id, "default");
        let request = TurnRequest::new("hi").with_session("s-1");
        assert_eq!(request.session_id, "s-1");
    }
}
