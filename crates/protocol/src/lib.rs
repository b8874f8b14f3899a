//! The line wire format between a turn and its client.
//!
//! One frame per `\n`-terminated line:
//!
//! | Prefix  | Payload                              |
//! |---------|--------------------------------------|
//! | `0:`    | JSON string, a filtered text fragment |
//! | `d:`    | JSON object with a `type` field       |
//! | `data:` | `[DONE]` or a JSON object (decode only) |
//!
//! The encoder only produces `0:` and `d:`. The decoder also accepts the
//! `data:` framing so older transcripts still decode.

pub mod decoder;
pub mod encoder;
pub mod trace;

pub use decoder::{DecodedEvent, EventKind, FrameDecoder, ParsedStream, parse_stream};
pub use encoder::{DATA_PREFIX, TEXT_PREFIX, encode_frame};
pub use trace::{by_type, tool_sequence, visible_text};
