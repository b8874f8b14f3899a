//! Frame encoder: one [`WireFrame`] to one wire line.

use veilstream_core::frame::WireFrame;

pub const TEXT_PREFIX: &str = "0:";
pub const DATA_PREFIX: &str = "d:";

/// Encode a frame as a single `\n`-terminated line.
///
/// Returns `Ok(None)` for an empty text fragment, which is never put on the
/// wire.
pub fn encode_frame(frame: &WireFrame) -> Result<Option<String>, serde_json::Error> {
    let (prefix, payload) = match frame {
        WireFrame::Text(text) if text.is_empty() => return Ok(None),
        WireFrame::Text(text) => (TEXT_PREFIX, serde_json::to_string(text)?),
        WireFrame::Data(event) => (DATA_PREFIX, serde_json::to_string(event)?),
    };

    let mut line = String::with_capacity(prefix.len() + payload.len() + 1);
    line.push_str(prefix);
    line.push_str(&payload);
    line.push('\n');
    Ok(Some(line))
}
