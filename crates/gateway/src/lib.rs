//! HTTP gateway for VeilStream.
//!
//! Exposes a health check and one streaming chat endpoint whose body is the
//! line wire format, written as the turn produces it.
//!
//! Built on Axum; the response body is a chunked stream fed by the turn's
//! line channel.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use veilstream_agent::TurnStreamer;
use veilstream_config::AppConfig;
use veilstream_core::event::{DomainEvent, EventBus};
use veilstream_core::source::{ModelSource, TurnRequest};

/// Marks the body as a data stream for clients that speak the line format.
pub const DATA_STREAM_HEADER: HeaderName = HeaderName::from_static("x-vercel-ai-data-stream");

const MAX_BODY_BYTES: usize = 256 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub streamer: TurnStreamer,
    pub event_bus: Arc<EventBus>,
}

impl GatewayState {
    pub fn new(source: Arc<dyn ModelSource>, config: &AppConfig) -> Self {
        let event_bus = Arc::new(EventBus::default());
        let streamer = TurnStreamer::new(source)
            .with_event_bus(event_bus.clone())
            .with_channel_capacity(config.stream.channel_capacity);
        Self {
            streamer,
            event_bus,
        }
    }
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/chat/stream", post(chat_stream_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(
    config: AppConfig,
    source: Arc<dyn ModelSource>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.bind_addr();
    let state = Arc::new(GatewayState::new(source, &config));

    tokio::spawn(log_domain_events(state.event_bus.subscribe()));

    let app = build_router(state.clone());

    info!(addr = %addr, source = %state.streamer.source_name(), "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Write domain events to the debug log until the bus closes. A slow logger
/// skips what it missed and carries on. Returns how many events were logged.
async fn log_domain_events(mut events: broadcast::Receiver<Arc<DomainEvent>>) -> usize {
    let mut logged = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                debug!(turn = %event.turn_id(), event = ?event, "Domain event");
                logged += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Domain event log fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
    logged
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// `POST /v1/chat/stream`: Send a message, receive the turn as wire lines.
async fn chat_stream_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    if payload.message.trim().is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "message must not be empty"));
    }

    let mut request = TurnRequest::new(payload.message);
    if let Some(session_id) = payload.session_id {
        request = request.with_session(session_id);
    }
    info!(
        session = %request.session_id,
        message_len = request.message.len(),
        "v1/chat/stream request"
    );

    let rx = state.streamer.run(request).await.map_err(|e| {
        warn!(error = %e, "Model source refused the turn");
        error_response(StatusCode::BAD_GATEWAY, format!("Model source error: {e}"))
    })?;

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (DATA_STREAM_HEADER, "v1"),
        ],
        body,
    ))
}
