//! Read-only projections over decoded events, for tests and observability.

use serde_json::Value;

use crate::decoder::{DecodedEvent, EventKind};

/// All text fragments joined in order: what a client renders as prose.
pub fn visible_text(events: &[DecodedEvent]) -> String {
    events.iter().filter_map(DecodedEvent::as_text).collect()
}

/// Tool names from `tool_usage` events, in stream order.
pub fn tool_sequence(events: &[DecodedEvent]) -> Vec<String> {
    events
        .iter()
        .filter(|event| event.kind == EventKind::ToolUsage)
        .filter_map(|event| event.payload.get("tool"))
        .map(|tool| match tool {
            Value::String(name) => name.clone(),
            other => other.to_string(),
        })
        .collect()
}

/// Payloads of structured events whose `type` field equals `event_type`.
pub fn by_type<'a>(events: &'a [DecodedEvent], event_type: &str) -> Vec<&'a Value> {
    events
        .iter()
        .filter(|event| {
            matches!(
                event.kind,
                EventKind::Data | EventKind::Meta | EventKind::ToolUsage
            )
        })
        .filter(|event| event.payload_type() == Some(event_type))
        .map(|event| &event.payload)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::parse_stream;

    const TRANSCRIPT: &str = concat!(
        "d:{\"type\":\"tool_usage\",\"tool\":\"Skill:paper.read\",\"description\":\"a\"}\n",
        "0:\"Reading \"\n",
        "d:{\"type\":\"tool_usage\",\"tool\":\"WebSearch\",\"description\":\"b\"}\n",
        "0:\"done.\"\n",
        "d:{\"type\":\"meta\",\"info\":{\"duration_ms\":12}}\n",
    );

    #[test]
    fn scenario_projection() {
        let parsed = parse_stream([
            r#"d:{"type":"tool_usage","tool":"WebSearch","description":"x"}"#,
            r#"0:"Hello""#,
        ]);
        assert_eq!(visible_text(&parsed.events), "Hello");
        assert_eq!(tool_sequence(&parsed.events), ["WebSearch"]);
    }

    #[test]
    fn tool_order_follows_stream_order() {
        let parsed = parse_stream([TRANSCRIPT]);
        assert_eq!(tool_sequence(&parsed.events), ["Skill:paper.read", "WebSearch"]);
        assert_eq!(visible_text(&parsed.events), "Reading done.");
    }

    #[test]
    fn by_type_selects_structured_payloads() {
        let parsed = parse_stream([TRANSCRIPT]);
        let meta = by_type(&parsed.events, "meta");
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0]["info"]["duration_ms"], 12);
        assert_eq!(by_type(&parsed.events, "tool_usage").len(), 2);
        assert!(by_type(&parsed.events, "error").is_empty());
    }

    #[test]
    fn non_string_text_payloads_are_not_visible() {
        let parsed = parse_stream(["data: {\"text\": 5}", "0:\"ok\""]);
        assert_eq!(visible_text(&parsed.events), "ok");
    }
}
