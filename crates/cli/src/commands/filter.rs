//! `veilstream filter`: Show what a client would see for raw model output.

use std::io::Write;
use std::path::Path;

use tracing::debug;
use veilstream_filter::StreamFilter;

pub async fn run(file: Option<&Path>, chunk_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let input = super::read_input(file)?;
    let chunks = split_chunks(&input, chunk_size);
    debug!(chunks = chunks.len(), input_bytes = input.len(), "Filtering input");

    let mut filter = StreamFilter::new();
    let mut stdout = std::io::stdout().lock();
    for chunk in &chunks {
        stdout.write_all(filter.push(chunk).as_bytes())?;
    }
    stdout.write_all(filter.flush().as_bytes())?;
    writeln!(stdout)?;
    Ok(())
}

/// Split into pieces of `size` characters; zero keeps the text whole.
fn split_chunks(text: &str, size: usize) -> Vec<String> {
    if size == 0 {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|piece| piece.iter().collect()).collect()
}
