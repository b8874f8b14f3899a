pub mod audit;
pub mod config_cmd;
pub mod decode;
pub mod filter;
pub mod replay;
pub mod serve;

use std::io::Read;
use std::path::Path;

/// Read a whole input file, or stdin for `None` and `-`.
pub fn read_input(path: Option<&Path>) -> Result<String, Box<dyn std::error::Error>> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()).into()),
        _ => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}
