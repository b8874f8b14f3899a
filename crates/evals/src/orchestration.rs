//! Orchestration check: decode a mixed-format transcript and compare what
//! the client saw with what was persisted as the assistant's response.

use serde::Serialize;
use veilstream_protocol::{parse_stream, tool_sequence, visible_text};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestrationReport {
    pub mixed_stream_parse_error_count: usize,
    /// Persisted length over visible length, in characters.
    pub persisted_response_completeness_ratio: f64,
    pub tool_sequence: Vec<String>,
    pub visible_text: String,
}

pub fn evaluate_orchestration<I, S>(chunks: I, persisted_response: &str) -> OrchestrationReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parsed = parse_stream(chunks);
    let visible = visible_text(&parsed.events);
    let expected = visible.chars().count().max(1);

    OrchestrationReport {
        mixed_stream_parse_error_count: parsed.parse_errors.len(),
        persisted_response_completeness_ratio: persisted_response.chars().count() as f64
            / expected as f64,
        tool_sequence: tool_sequence(&parsed.events),
        visible_text: visible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_formats_decode_together() {
        let report = evaluate_orchestration(
            [
                "d:{\"type\":\"tool_usage\",\"tool\":\"read_paper\",\"description\":\"x\"}\n",
                "0:\"Hello \"\n",
                "data: {\"type\":\"content\",\"content\":\"world\"}\n",
                "data: [DONE]\n",
            ],
            "Hello world",
        );
        assert_eq!(report.mixed_stream_parse_error_count, 0);
        assert_eq!(report.visible_text, "Hello world");
        assert_eq!(report.tool_sequence, ["read_paper"]);
        assert!((report.persisted_response_completeness_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn truncated_persistence_lowers_ratio() {
        let report = evaluate_orchestration(["0:\"abcd\"", "garbage"], "ab");
        assert_eq!(report.mixed_stream_parse_error_count, 1);
        assert!((report.persisted_response_completeness_ratio - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_stream_does_not_divide_by_zero() {
        let report = evaluate_orchestration(Vec::<String>::new(), "");
        assert_eq!(report.persisted_response_completeness_ratio, 0.0);
    }
}
