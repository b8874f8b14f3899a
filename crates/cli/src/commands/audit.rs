//! `veilstream audit`: Leak, citation and retrieval checks on a transcript.
//!
//! Prints the JSON report and exits non-zero when the transcript leaks.

use std::path::Path;

use veilstream_evals::audit_transcript;

pub async fn run(file: Option<&Path>, deny: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let wire = super::read_input(file)?;
    let report = audit_transcript(&wire, deny);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.passed() {
        return Err("audit failed: transcript has parse errors or leaks".into());
    }
    Ok(())
}
