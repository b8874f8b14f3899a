//! Human-readable descriptions for `tool_usage` frames.

use serde_json::Value;

/// Describe what a tool call is doing, from its name and JSON input.
pub fn describe_tool(name: &str, input: &Value) -> String {
    match name {
        "WebSearch" => match first_text(input, &["query", "search_term"]) {
            Some(query) => format!("Searching the web for: {}", preview(&query, 80)),
            None => "Searching the web for information...".into(),
        },
        "WebFetch" => match first_text(input, &["url"]) {
            Some(url) => format!("Fetching content from {}", domain_of(&url)),
            None => "Fetching content from a URL...".into(),
        },
        "Read" => match first_text(input, &["path", "file_path"]) {
            Some(path) => format!("Reading file: {}", file_name(&path)),
            None => "Reading a file...".into(),
        },
        "Write" => match first_text(input, &["path", "file_path"]) {
            Some(path) => format!("Writing to file: {}", file_name(&path)),
            None => "Writing to a file...".into(),
        },
        "Bash" | "bash" => {
            if let Some(description) = first_text(input, &["description"]) {
                format!("Running: {}", preview(&description, 70))
            } else if let Some(command) = first_text(input, &["command"]) {
                format!("Running command: {}", preview(&command, 60))
            } else {
                "Executing a shell command...".into()
            }
        }
        "Task" => match first_text(input, &["description", "task"]) {
            Some(task) => format!("Running task: {}", preview(&task, 60)),
            None => "Running a background task...".into(),
        },
        "Skill" => describe_skill(input),
        _ => describe_generic(name, input),
    }
}

fn describe_skill(input: &Value) -> String {
    let skill = first_text(input, &["skill", "skill_name", "name"]);
    let args = first_text(input, &["args", "arguments", "query"]);
    match (skill, args) {
        (Some(skill), Some(args)) => format!("Using '{skill}' skill for: {}", preview(&args, 50)),
        (Some(skill), None) => format!("Using skill: {skill}"),
        (None, Some(args)) => format!("Using skill for: {}", preview(&args, 60)),
        (None, None) => "Using a specialized skill...".into(),
    }
}

fn describe_generic(name: &str, input: &Value) -> String {
    let display = title_case(&name.replace('_', " "));
    let keys = ["query", "search", "topic", "name", "path", "url", "command", "description"];
    match first_text(input, &keys) {
        Some(value) => format!("{display}: {}", preview(&value, 50)),
        None => format!("Running: {display}"),
    }
}

/// The first key holding a non-empty value, rendered as text.
fn first_text(input: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| input.get(*key))
        .map(|value| match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .find(|text| !text.is_empty())
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn domain_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split('/').next().unwrap_or(rest)
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Uppercase each letter that follows a non-letter, lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if after_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(ch);
            after_letter = false;
        }
    }
    out
}
