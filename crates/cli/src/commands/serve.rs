//! `veilstream serve`: Start the HTTP gateway.

use std::path::PathBuf;
use std::sync::Arc;

use veilstream_agent::ScriptedSource;
use veilstream_config::AppConfig;

pub async fn run(
    port_override: Option<u16>,
    script_override: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    let script = script_override
        .or_else(|| config.stream.script_path.clone())
        .ok_or("No script to serve: pass --script or set stream.script_path")?;

    let source = ScriptedSource::from_path(&script)?.with_chunk_size(config.stream.replay_chunk_size);

    println!("VeilStream Gateway");
    println!("   Listening: {}", config.bind_addr());
    println!("   Script:    {}", script.display());

    veilstream_gateway::start(config, Arc::new(source)).await?;

    Ok(())
}
