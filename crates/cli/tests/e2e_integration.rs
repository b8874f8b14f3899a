//! End-to-end integration tests for the VeilStream pipeline.
//!
//! These tests exercise the full path from model events to what a client
//! reconstructs: filter, encoder, turn pipeline, HTTP gateway, decoder and
//! the transcript checks.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use veilstream_agent::{ScriptStep, ScriptedSource, TurnStreamer};
use veilstream_config::AppConfig;
use veilstream_core::error::SourceError;
use veilstream_core::event::{DomainEvent, EventBus};
use veilstream_core::source::{ModelEvent, ModelSource, SourceStream, TurnRequest};
use veilstream_evals::{audit_transcript, evaluate_filter_contract, evaluate_orchestration};
use veilstream_filter::{StreamFilter, transform};
use veilstream_gateway::{GatewayState, build_router};
use veilstream_protocol::{EventKind, FrameDecoder, by_type, parse_stream, tool_sequence, visible_text};

// ── Fixtures ─────────────────────────────────────────────────────────────

const SCENARIO: &str = r#"Let me check.<thinking>search plan</thinking>Found it: <citation url="/paper/1706.03762">Vaswani 2017</citation>"#;

const RESEARCH_SCRIPT: &str = r#"
{"type":"tool_use","name":"Skill:paper.read","input":{"skill":"paper.read","args":"1706.03762"}}
{"type":"text","content":"<thinking>The user wants the attention paper. It is at /Users/alice/papers/1706.03762.pdf</thinking>"}
{"type":"text","content":"Here is the summary.\n<summary>\nSelf-attention replaces recurrence.\nTraining is parallel.\n</summary>\n"}
{"type":"text","content":"Stored locally: /Users/alice/papers/1706.03762.pdf\n"}
{"type":"text","content":"Source: <source url=\"/paper/1706.03762\">Attention Is All You Need</source>"}
{"type":"completed","duration_ms":850,"cost_usd":0.0125}
"#;

fn research_source(chunk_size: usize) -> ScriptedSource {
    ScriptedSource::from_jsonl(RESEARCH_SCRIPT)
        .expect("fixture script parses")
        .with_chunk_size(chunk_size)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A source that never completes: it yields text, then closes abruptly.
struct AbruptSource;

#[async_trait::async_trait]
impl ModelSource for AbruptSource {
    fn name(&self) -> &str {
        "abrupt"
    }

    async fn open_turn(&self, _request: TurnRequest) -> Result<SourceStream, SourceError> {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(Ok(ModelEvent::text("Working on it <private>token=abc123")))
            .await
            .unwrap();
        Ok(rx)
    }
}

// ── Filter ───────────────────────────────────────────────────────────────

#[test]
fn scenario_single_and_three_char_chunks_agree() {
    let expected = "Let me check.Found it: [Vaswani 2017](/paper/1706.03762)";
    assert_eq!(transform(SCENARIO), expected);

    let chars: Vec<char> = SCENARIO.chars().collect();
    let chunks: Vec<String> = chars.chunks(3).map(|c| c.iter().collect()).collect();
    assert_eq!(StreamFilter::filter_all(&chunks), expected);
}

#[test]
fn filter_matches_engine_at_every_split_of_a_long_answer() {
    let input = concat!(
        "<thinking>plan: read local first</thinking>Results:\n\n\n\n",
        "<citation url=\"/paper/1810.04805\">Devlin 2019</citation> and ",
        "<citation>Radford 2018</citation>.\n",
        "/home/bob/cache/bert.pdf\n",
        "<debug>tokens=512</debug>Opened `/var/tmp/x.pdf` ok.\n",
        "<summary>Pretraining helps.</summary>",
    );
    let expected = transform(input);
    assert!(!expected.contains("plan"));
    assert!(!expected.contains("/home/bob"));

    for (split, _) in input.char_indices().skip(1) {
        let out = StreamFilter::filter_all([&input[..split], &input[split..]]);
        assert_eq!(out, expected, "split at byte {split}");
    }

    let mut filter = StreamFilter::new();
    let mut out = String::new();
    for ch in input.chars() {
        out.push_str(&filter.push(&ch.to_string()));
    }
    out.push_str(&filter.flush());
    assert_eq!(out, expected);
}

#[test]
fn hidden_content_never_leaks_under_any_chunking() {
    let secret = "SECRET-7f3a";
    let input = format!(
        "A <private>{secret}</private> B <thinking>{secret}</thinking> C <debug>{secret}"
    );
    for size in 1..=input.len() {
        let chars: Vec<char> = input.chars().collect();
        let chunks: Vec<String> = chars.chunks(size).map(|c| c.iter().collect()).collect();
        let report = evaluate_filter_contract(&chunks);
        assert!(!report.visible_text.contains(secret), "chunk size {size}");
        assert!(!report.visible_text.contains("SECRET"), "chunk size {size}");
        assert!(report.holds(), "chunk size {size}: {report:?}");
    }
}

// ── Turn pipeline ────────────────────────────────────────────────────────

#[tokio::test]
async fn research_turn_is_clean_for_every_chunk_size() {
    let reference = TurnStreamer::new(Arc::new(research_source(0)))
        .collect(TurnRequest::new("summarize attention"))
        .await
        .unwrap();
    let reference_text = visible_text(&parse_stream([reference.as_str()]).events);

    for chunk_size in [1, 2, 3, 7, 64] {
        let wire = TurnStreamer::new(Arc::new(research_source(chunk_size)))
            .collect(TurnRequest::new("summarize attention"))
            .await
            .unwrap();

        let report = audit_transcript(&wire, &["alice", "1706.03762.pdf"]);
        assert!(report.passed(), "chunk size {chunk_size}: {report:#?}");
        assert_eq!(report.visible_text, reference_text, "chunk size {chunk_size}");
        assert!(report.retrieval_order.first_retrieval_tool_local);
        assert_eq!(report.citations.minimum_local_citations, 1);
        assert_eq!(report.citations.invalid_citation_url_count, 0);
    }

    assert!(reference_text.contains("> Self-attention replaces recurrence.\n> Training is parallel."));
    assert!(reference_text.contains("📄 **Source**: [Attention Is All You Need](/paper/1706.03762)"));
    assert!(!reference_text.contains("Stored locally"));
}

#[tokio::test]
async fn meta_is_the_last_frame() {
    let wire = TurnStreamer::new(Arc::new(research_source(5)))
        .collect(TurnRequest::new("q"))
        .await
        .unwrap();
    let parsed = parse_stream([wire.as_str()]);
    let last = parsed.events.last().unwrap();
    assert_eq!(last.kind, EventKind::Meta);
    assert_eq!(last.payload["info"]["duration_ms"], 850);
    assert_eq!(by_type(&parsed.events, "meta").len(), 1);
    assert!(wire.ends_with('\n'));
    assert!(wire.lines().all(|l| l.starts_with("0:") || l.starts_with("d:")));
}

#[tokio::test]
async fn abrupt_upstream_is_flushed_without_leaking() {
    let bus = Arc::new(EventBus::new(16));
    let wire = TurnStreamer::new(Arc::new(AbruptSource))
        .with_event_bus(bus)
        .collect(TurnRequest::new("q"))
        .await
        .unwrap();
    let parsed = parse_stream([wire.as_str()]);
    assert_eq!(visible_text(&parsed.events), "Working on it");
    assert!(by_type(&parsed.events, "meta").is_empty());
    assert!(!wire.contains("abc123"));
}

#[tokio::test]
async fn failing_turn_reports_error_and_publishes_failure() {
    let bus = Arc::new(EventBus::new(16));
    let mut events = bus.subscribe();
    let source = ScriptedSource::new(vec![
        ScriptStep::Event(ModelEvent::text("Half an answer <thinking>half a plan")),
        ScriptStep::Fail {
            fail: "model overloaded".into(),
        },
    ]);

    let wire = TurnStreamer::new(Arc::new(source))
        .with_event_bus(bus.clone())
        .collect(TurnRequest::new("q"))
        .await
        .unwrap();
    let parsed = parse_stream([wire.as_str()]);
    let errors = by_type(&parsed.events, "error");
    assert_eq!(errors.len(), 1);
    assert!(errors[0]["content"].as_str().unwrap().contains("model overloaded"));
    assert!(!wire.contains("half a plan"));

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if let DomainEvent::TurnFailed { error_message, .. } = event.as_ref() {
            assert!(error_message.contains("model overloaded"));
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

// ── Gateway ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn gateway_streams_a_decodable_turn() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[stream]\nchannel_capacity = 2\n").unwrap();
    let config = AppConfig::load_from(&config_path).unwrap();

    let state = Arc::new(GatewayState::new(Arc::new(research_source(3)), &config));
    let app = build_router(state);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/chat/stream")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({"message": "summarize attention", "session_id": "e2e"}).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-vercel-ai-data-stream").unwrap(), "v1");

    let wire = body_text(response).await;

    // Decode the way a client would: arbitrary network splits, line-buffered.
    let mut decoder = FrameDecoder::new();
    let bytes = wire.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        let mut end = (start + 11).min(bytes.len());
        while !wire.is_char_boundary(end) {
            end += 1;
        }
        decoder.push(&wire[start..end]);
        start = end;
    }
    let parsed = decoder.finish();
    assert!(parsed.is_clean(), "{:?}", parsed.parse_errors);
    assert_eq!(tool_sequence(&parsed.events), ["Skill:paper.read"]);

    let orchestration = evaluate_orchestration([wire.as_str()], &visible_text(&parsed.events));
    assert_eq!(orchestration.mixed_stream_parse_error_count, 0);
    assert!((orchestration.persisted_response_completeness_ratio - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn gateway_rejects_bad_requests() {
    let state = Arc::new(GatewayState::new(
        Arc::new(ScriptedSource::unavailable("no model")),
        &AppConfig::default(),
    ));
    let app = build_router(state);

    let empty = Request::builder()
        .method("POST")
        .uri("/v1/chat/stream")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"message":""}"#))
        .unwrap();
    let response = app.clone().oneshot(empty).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let refused = Request::builder()
        .method("POST")
        .uri("/v1/chat/stream")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"message":"hello"}"#))
        .unwrap();
    let response = app.oneshot(refused).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("no model"));
}

// ── Decoder compatibility ────────────────────────────────────────────────

#[test]
fn legacy_transcript_with_bad_line_still_decodes() {
    let transcript = concat!(
        "d:{\"type\":\"tool_usage\",\"tool\":\"WebSearch\",\"description\":\"x\"}\n",
        "0:not-valid-json\n",
        "data: {\"type\":\"content\",\"content\":\"Hello\"}\n",
        "0:\" world\"\n",
        "data: [DONE]\n",
    );
    let parsed = parse_stream([transcript]);
    assert_eq!(parsed.parse_errors.len(), 1);
    assert!(parsed.parse_errors[0].contains("0:not-valid-json"));
    assert_eq!(visible_text(&parsed.events), "Hello world");
    assert_eq!(tool_sequence(&parsed.events), ["WebSearch"]);
    assert_eq!(parsed.events.last().unwrap().kind, EventKind::Done);
}
