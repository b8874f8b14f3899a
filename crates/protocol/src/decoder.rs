//! Frame decoder: raw wire text back to an ordered list of typed events.
//!
//! Decoding never fails. A bad line becomes an [`EventKind::Unknown`] event
//! plus an entry in [`ParsedStream::parse_errors`], and decoding carries on
//! with the next line.

use serde::Serialize;
use serde_json::Value;

use crate::encoder::{DATA_PREFIX, TEXT_PREFIX};

const SSE_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Text,
    ToolUsage,
    Meta,
    Data,
    Done,
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::ToolUsage => "tool_usage",
            Self::Meta => "meta",
            Self::Data => "data",
            Self::Done => "done",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedEvent {
    pub kind: EventKind,
    /// The text fragment for `text`, the decoded object for structured
    /// kinds, the line itself for `unknown`.
    pub payload: Value,
    /// The trimmed source line.
    pub raw: String,
}

impl DecodedEvent {
    fn new(kind: EventKind, payload: Value, raw: &str) -> Self {
        Self {
            kind,
            payload,
            raw: raw.to_string(),
        }
    }

    /// The fragment of a `text` event, if it is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self.kind {
            EventKind::Text => self.payload.as_str(),
            _ => None,
        }
    }

    /// The payload's `type` field, when the payload is an object.
    pub fn payload_type(&self) -> Option<&str> {
        self.payload.get("type").and_then(Value::as_str)
    }
}

/// Every event in stream order, plus one message per line that did not decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedStream {
    pub events: Vec<DecodedEvent>,
    pub parse_errors: Vec<String>,
}

impl ParsedStream {
    pub fn is_clean(&self) -> bool {
        self.parse_errors.is_empty()
    }

    fn decode_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match decode_line(line) {
            Ok(event) => self.events.push(event),
            Err(message) => {
                self.events.push(DecodedEvent::new(
                    EventKind::Unknown,
                    Value::String(line.to_string()),
                    line,
                ));
                self.parse_errors.push(message);
            }
        }
    }
}

fn decode_line(line: &str) -> Result<DecodedEvent, String> {
    let failure = |reason: &dyn std::fmt::Display| format!("parse failure for line '{line}': {reason}");

    // `data:` is checked before `d:`, which is one of its prefixes.
    if let Some(rest) = line.strip_prefix(TEXT_PREFIX) {
        let payload: Value = serde_json::from_str(rest.trim()).map_err(|e| failure(&e))?;
        if !payload.is_string() {
            return Err(failure(&"text payload must decode to a string"));
        }
        Ok(DecodedEvent::new(EventKind::Text, payload, line))
    } else if let Some(rest) = line.strip_prefix(SSE_PREFIX) {
        let rest = rest.trim();
        if rest == DONE_SENTINEL {
            return Ok(DecodedEvent::new(
                EventKind::Done,
                Value::String(DONE_SENTINEL.to_string()),
                line,
            ));
        }
        let payload: Value = serde_json::from_str(rest).map_err(|e| failure(&e))?;
        let text = match &payload {
            Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("content") => {
                map.get("content").or_else(|| map.get("text")).cloned()
            }
            Value::Object(map) => map.get("text").cloned(),
            _ => None,
        };
        Ok(match text {
            Some(text) => DecodedEvent::new(EventKind::Text, text, line),
            None => DecodedEvent::new(EventKind::Data, payload, line),
        })
    } else if let Some(rest) = line.strip_prefix(DATA_PREFIX) {
        let payload: Value = serde_json::from_str(rest.trim()).map_err(|e| failure(&e))?;
        let kind = match payload.get("type").and_then(Value::as_str) {
            Some("tool_usage") => EventKind::ToolUsage,
            Some("meta") => EventKind::Meta,
            _ => EventKind::Data,
        };
        Ok(DecodedEvent::new(kind, payload, line))
    } else {
        Err(format!("unsupported format: {line}"))
    }
}

/// Incremental decoder for a raw wire stream split at arbitrary points.
///
/// Only complete lines are decoded; an unterminated trailing line waits for
/// more input or for [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct FrameDecoder {
    partial: String,
    parsed: ParsedStream,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw wire text. Returns the events decoded from the lines this
    /// chunk completed.
    pub fn push(&mut self, chunk: &str) -> &[DecodedEvent] {
        let before = self.parsed.events.len();
        self.partial.push_str(chunk);
        if let Some(last_newline) = self.partial.rfind('\n') {
            let rest = self.partial.split_off(last_newline + 1);
            let complete = std::mem::replace(&mut self.partial, rest);
            for line in complete.lines() {
                self.parsed.decode_line(line);
            }
        }
        &self.parsed.events[before..]
    }

    /// Everything decoded so far.
    pub fn parsed(&self) -> &ParsedStream {
        &self.parsed
    }

    /// End of input: the trailing line, if any, is treated as complete.
    pub fn finish(mut self) -> ParsedStream {
        let tail = std::mem::take(&mut self.partial);
        self.parsed.decode_line(&tail);
        self.parsed
    }
}

/// Decode line-complete chunks, each holding one or more whole lines.
pub fn parse_stream<I, S>(chunks: I) -> ParsedStream
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = ParsedStream::default();
    for chunk in chunks {
        for line in chunk.as_ref().lines() {
            parsed.decode_line(line);
        }
    }
    parsed
}
