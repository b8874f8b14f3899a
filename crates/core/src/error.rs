//! Error types for the VeilStream domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The content filter and
//! the frame decoder are total and never produce these; errors only arise at
//! the edges (upstream model sources, serialization, I/O).

use thiserror::Error;

/// The top-level error type for all VeilStream operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Upstream errors ---
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by an upstream model-output source.
///
/// These are surfaced to the client as an `error` data frame; the message is
/// the `Display` form, so keep it human-readable.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    #[error("Model source unavailable: {0}")]
    Unavailable(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Invalid event from source: {0}")]
    InvalidEvent(String),
}
