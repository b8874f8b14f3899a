//! The turn pipeline.
//!
//! [`TurnStreamer`] opens one turn against the injected [`ModelSource`] and
//! spawns a task that owns the turn's [`StreamFilter`]. Raw model events go
//! in; encoded wire lines come out of an ordered channel, ready to be written
//! verbatim to a response body.
//!
//! Frame order follows event order. The `meta` frame is always last, and
//! nothing is sent after an `error` frame.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use veilstream_core::error::{Result, SourceError};
use veilstream_core::event::{DomainEvent, EventBus};
use veilstream_core::frame::WireFrame;
use veilstream_core::source::{ModelEvent, ModelSource, SourceStream, TurnRequest};
use veilstream_filter::StreamFilter;
use veilstream_protocol::encode_frame;

use crate::describe::describe_tool;

const DEFAULT_CHANNEL_CAPACITY: usize = 128;

pub struct TurnStreamer {
    source: Arc<dyn ModelSource>,
    event_bus: Option<Arc<EventBus>>,
    channel_capacity: usize,
}

impl TurnStreamer {
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        Self {
            source,
            event_bus: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Open a turn and start streaming it.
    ///
    /// Fails only if the source refuses to open the turn. Failures after that
    /// arrive in-band as an `error` frame.
    pub async fn run(&self, request: TurnRequest) -> Result<mpsc::Receiver<String>> {
        let session_id = request.session_id.clone();
        let upstream = self.source.open_turn(request).await?;

        let turn_id = Uuid::new_v4();
        info!(
            turn = %turn_id,
            session = %session_id,
            source = %self.source.name(),
            "Turn started"
        );
        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::TurnStarted {
                turn_id,
                session_id,
                source: self.source.name().to_string(),
                timestamp: Utc::now(),
            });
        }

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let turn = Turn {
            id: turn_id,
            event_bus: self.event_bus.clone(),
            tx,
            filter: StreamFilter::new(),
            frames_sent: 0,
            started: Instant::now(),
        };
        tokio::spawn(turn.drive(upstream));
        Ok(rx)
    }

    /// Run a turn to the end and collect its wire lines into one buffer.
    pub async fn collect(&self, request: TurnRequest) -> Result<String> {
        let mut rx = self.run(request).await?;
        let mut wire = String::new();
        while let Some(line) = rx.recv().await {
            wire.push_str(&line);
        }
        Ok(wire)
    }
}

/// The receiver is gone.
struct Disconnected;

enum Outcome {
    Completed { duration_ms: u64 },
    Failed(SourceError),
    /// Upstream closed without reporting completion.
    Truncated,
}

/// State owned by one running turn.
struct Turn {
    id: Uuid,
    event_bus: Option<Arc<EventBus>>,
    tx: mpsc::Sender<String>,
    filter: StreamFilter,
    frames_sent: usize,
    started: Instant,
}

impl Turn {
    async fn drive(mut self, mut upstream: SourceStream) {
        match self.pump(&mut upstream).await {
            Ok(Outcome::Completed { duration_ms }) => {
                info!(turn = %self.id, frames = self.frames_sent, duration_ms, "Turn completed");
                self.publish(DomainEvent::TurnCompleted {
                    turn_id: self.id,
                    frames_sent: self.frames_sent,
                    duration_ms,
                    timestamp: Utc::now(),
                });
            }
            Ok(Outcome::Failed(error)) => {
                warn!(turn = %self.id, error = %error, "Upstream failed mid-turn");
                self.publish(DomainEvent::TurnFailed {
                    turn_id: self.id,
                    error_message: error.to_string(),
                    timestamp: Utc::now(),
                });
            }
            Ok(Outcome::Truncated) => {
                warn!(turn = %self.id, frames = self.frames_sent, "Upstream ended without completion");
            }
            Err(Disconnected) => {
                let held_bytes = self.filter.buffered_len();
                info!(turn = %self.id, held_bytes, "Client disconnected, discarding buffered output");
                self.publish(DomainEvent::ClientDisconnected {
                    turn_id: self.id,
                    held_bytes,
                    timestamp: Utc::now(),
                });
            }
        }
    }

    async fn pump(&mut self, upstream: &mut SourceStream) -> std::result::Result<Outcome, Disconnected> {
        while let Some(item) = upstream.recv().await {
            match item {
                Ok(ModelEvent::Text { content }) => {
                    let visible = self.filter.push(&content);
                    self.send(WireFrame::Text(visible)).await?;
                }
                Ok(ModelEvent::ToolUse { name, input }) => {
                    let description = describe_tool(&name, &input);
                    debug!(turn = %self.id, tool = %name, "Tool used");
                    self.publish(DomainEvent::ToolUsed {
                        turn_id: self.id,
                        tool: name.clone(),
                        timestamp: Utc::now(),
                    });
                    self.send(WireFrame::tool_usage(name, description)).await?;
                }
                Ok(ModelEvent::Completed {
                    duration_ms,
                    cost_usd,
                }) => {
                    let rest = self.filter.flush();
                    self.send(WireFrame::Text(rest)).await?;

                    let duration_ms = duration_ms.unwrap_or_else(|| self.elapsed_ms());
                    let info = serde_json::json!({ "duration_ms": duration_ms, "cost": cost_usd });
                    self.send(WireFrame::meta(info)).await?;
                    return Ok(Outcome::Completed { duration_ms });
                }
                Err(error) => {
                    // Whatever the filter still holds was never proven safe.
                    self.send(WireFrame::error(error.to_string())).await?;
                    return Ok(Outcome::Failed(error));
                }
            }
        }

        let rest = self.filter.flush();
        self.send(WireFrame::Text(rest)).await?;
        Ok(Outcome::Truncated)
    }

    async fn send(&mut self, frame: WireFrame) -> std::result::Result<(), Disconnected> {
        let line = match encode_frame(&frame) {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!(turn = %self.id, error = %e, "Dropping frame that failed to encode");
                return Ok(());
            }
        };
        if let WireFrame::Data(event) = &frame {
            debug!(turn = %self.id, kind = event.event_type(), "Data frame");
        }
        self.tx.send(line).await.map_err(|_| Disconnected)?;
        self.frames_sent += 1;
        Ok(())
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
