//! A [`ModelSource`] that replays a fixed script.
//!
//! Scripts are JSON lines. Each line is a model event or a failure marker:
//!
//! ```text
//! {"type":"tool_use","name":"WebSearch","input":{"query":"attention"}}
//! {"type":"text","content":"Found it: <citation url=\"/paper/1\">Vaswani</citation>"}
//! {"fail":"upstream connection reset"}
//! {"type":"completed","duration_ms":1200,"cost_usd":0.004}
//! ```
//!
//! Used by the CLI `replay` and `serve` commands and by tests.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;
use veilstream_core::error::{Result, SourceError};
use veilstream_core::source::{ModelEvent, ModelSource, SourceStream, TurnRequest};

const SCRIPT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    /// The source fails mid-turn with this message.
    Fail { fail: String },
    Event(ModelEvent),
}

#[derive(Debug, Clone)]
pub struct ScriptedSource {
    name: String,
    steps: Vec<ScriptStep>,
    chunk_size: usize,
    open_error: Option<String>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            name: "scripted".into(),
            steps,
            chunk_size: 0,
            open_error: None,
        }
    }

    pub fn from_events(events: impl IntoIterator<Item = ModelEvent>) -> Self {
        Self::new(events.into_iter().map(ScriptStep::Event).collect())
    }

    /// Parse a JSONL script. Blank lines and `#` comments are skipped.
    pub fn from_jsonl(script: &str) -> Result<Self> {
        let mut steps = Vec::new();
        for (index, line) in script.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let step: ScriptStep = serde_json::from_str(line).map_err(|e| {
                SourceError::InvalidEvent(format!("script line {}: {e}", index + 1))
            })?;
            steps.push(step);
        }
        Ok(Self::new(steps))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let script = std::fs::read_to_string(path)?;
        let source = Self::from_jsonl(&script)?;
        Ok(source.with_name(path.display().to_string()))
    }

    /// A source that refuses every turn.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            open_error: Some(reason.into()),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Re-split every text event into pieces of `chunk_size` characters.
    /// Zero keeps text events as written.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    fn expand(&self) -> Vec<std::result::Result<ModelEvent, SourceError>> {
        let mut items = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            match step {
                ScriptStep::Fail { fail } => {
                    items.push(Err(SourceError::StreamInterrupted(fail.clone())));
                    break;
                }
                ScriptStep::Event(ModelEvent::Text { content }) if self.chunk_size > 0 => {
                    let chars: Vec<char> = content.chars().collect();
                    items.extend(
                        chars
                            .chunks(self.chunk_size)
                            .map(|piece| Ok(ModelEvent::text(piece.iter().collect::<String>()))),
                    );
                }
                ScriptStep::Event(event) => items.push(Ok(event.clone())),
            }
        }
        items
    }
}

#[async_trait]
impl ModelSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open_turn(&self, request: TurnRequest) -> std::result::Result<SourceStream, SourceError> {
        if let Some(reason) = &self.open_error {
            return Err(SourceError::Unavailable(reason.clone()));
        }

        let items = self.expand();
        debug!(
            source = %self.name,
            session = %request.session_id,
            items = items.len(),
            "Replaying script"
        );

        let (tx, rx) = mpsc::channel(SCRIPT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            for item in items {
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(source: &ScriptedSource) -> Vec<std::result::Result<ModelEvent, SourceError>> {
        let mut rx = source.open_turn(TurnRequest::new("hi")).await.unwrap();
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        items
    }

    #[test]
    fn parses_script_lines() {
        let source = ScriptedSource::from_jsonl(
            r#"
# warm-up
{"type":"tool_use","name":"WebSearch","input":{"query":"rope"}}
{"type":"text","content":"Hello"}
{"fail":"reset"}
{"type":"completed"}
"#,
        )
        .unwrap();
        assert_eq!(source.steps().len(), 4);
        assert_eq!(
            source.steps()[2],
            ScriptStep::Fail {
                fail: "reset".into()
            }
        );
    }

    #[test]
    fn bad_line_reports_its_number() {
        let err = ScriptedSource::from_jsonl("{\"type\":\"text\",\"content\":\"a\"}\n{oops}")
            .unwrap_err();
        assert!(err.to_string().contains("script line 2"));
    }

    #[tokio::test]
    async fn replays_in_order_with_chunking() {
        let source = ScriptedSource::from_events([
            ModelEvent::text("abcdefg"),
            ModelEvent::Completed {
                duration_ms: Some(5),
                cost_usd: None,
            },
        ])
        .with_chunk_size(3);

        let items = collect(&source).await;
        let texts: Vec<String> = items
            .iter()
            .filter_map(|item| match item {
                Ok(ModelEvent::Text { content }) => Some(content.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, ["abc", "def", "g"]);
        assert!(matches!(items.last(), Some(Ok(ModelEvent::Completed { .. }))));
    }

    #[tokio::test]
    async fn failure_ends_the_stream() {
        let source = ScriptedSource::new(vec![
            ScriptStep::Event(ModelEvent::text("partial")),
            ScriptStep::Fail {
                fail: "reset".into(),
            },
            ScriptStep::Event(ModelEvent::text("never")),
        ]);
        let items = collect(&source).await;
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1],
            Err(SourceError::StreamInterrupted("reset".into()))
        );
    }

    #[tokio::test]
    async fn unavailable_source_refuses_turns() {
        let source = ScriptedSource::unavailable("maintenance");
        let err = source.open_turn(TurnRequest::new("hi")).await.unwrap_err();
        assert_eq!(err, SourceError::Unavailable("maintenance".into()));
    }
}
