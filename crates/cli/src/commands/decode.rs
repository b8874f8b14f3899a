//! `veilstream decode`: Decode a wire transcript.

use std::path::Path;

use veilstream_protocol::{parse_stream, tool_sequence, visible_text};

pub async fn run(file: Option<&Path>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let wire = super::read_input(file)?;
    let parsed = parse_stream([wire.as_str()]);
    let text = visible_text(&parsed.events);
    let tools = tool_sequence(&parsed.events);

    if json {
        let out = serde_json::json!({
            "visible_text": text,
            "tool_sequence": tools,
            "events": parsed.events,
            "parse_errors": parsed.parse_errors,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{text}");
    println!();
    println!("   Events:       {}", parsed.events.len());
    if tools.is_empty() {
        println!("   Tools:        (none)");
    } else {
        println!("   Tools:        {}", tools.join(" → "));
    }
    if parsed.parse_errors.is_empty() {
        println!("   Parse errors: 0");
    } else {
        println!("   Parse errors: {}", parsed.parse_errors.len());
        for error in &parsed.parse_errors {
            println!("   ⚠️  {error}");
        }
    }
    Ok(())
}
