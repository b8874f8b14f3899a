//! `veilstream replay`: Stream one scripted turn as wire lines.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use veilstream_agent::{ScriptedSource, TurnStreamer};
use veilstream_config::AppConfig;
use veilstream_core::source::TurnRequest;

pub async fn run(
    script: &Path,
    message: String,
    chunk_size: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let chunk_size = chunk_size.unwrap_or(config.stream.replay_chunk_size);
    let source = ScriptedSource::from_path(script)?.with_chunk_size(chunk_size);

    let streamer = TurnStreamer::new(Arc::new(source))
        .with_channel_capacity(config.stream.channel_capacity);
    let mut rx = streamer.run(TurnRequest::new(message)).await?;

    let mut stdout = std::io::stdout().lock();
    while let Some(line) = rx.recv().await {
        stdout.write_all(line.as_bytes())?;
        stdout.flush()?;
    }
    Ok(())
}
