//! Retrieval-ordering checks over a turn's tool sequence.
//!
//! The assistant is expected to search the local library before going to
//! the web, and to say so explicitly when a paper is missing locally.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

pub const LOCAL_RETRIEVAL_TOOLS: [&str; 4] = [
    "read_paper",
    "Skill:knowledge.paper.read",
    "Skill:paper.read",
    "Skill:knowledge.paper.search",
];
pub const WEB_TOOLS: [&str; 2] = ["WebSearch", "WebFetch"];
pub const FALLBACK_TOOLS: [&str; 3] = ["WebSearch", "WebFetch", "Skill:knowledge.paper.search"];

static MISSING_LOCAL: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)missing local",
        r"(?i)could not find .*local",
        r"(?i)not found .*library",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("missing-local pattern"))
    .collect()
});

fn is_local(tool: &str) -> bool {
    LOCAL_RETRIEVAL_TOOLS.contains(&tool)
}

fn is_web(tool: &str) -> bool {
    WEB_TOOLS.contains(&tool)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalOrderReport {
    pub first_retrieval_tool_local: bool,
    pub web_tool_calls_before_first_local: usize,
}

/// The first tool call must be a local retrieval, with no web calls before it.
/// Without any local call, every web call counts as premature.
pub fn retrieval_order<S: AsRef<str>>(tool_sequence: &[S]) -> RetrievalOrderReport {
    let first_local = tool_sequence.iter().position(|t| is_local(t.as_ref()));
    let stop = first_local.unwrap_or(tool_sequence.len());
    RetrievalOrderReport {
        first_retrieval_tool_local: first_local == Some(0),
        web_tool_calls_before_first_local: tool_sequence[..stop]
            .iter()
            .filter(|t| is_web(t.as_ref()))
            .count(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalBudgetReport {
    pub web_tool_calls: usize,
    pub local_retrieval_calls: usize,
}

pub fn retrieval_budget<S: AsRef<str>>(tool_sequence: &[S]) -> RetrievalBudgetReport {
    RetrievalBudgetReport {
        web_tool_calls: tool_sequence.iter().filter(|t| is_web(t.as_ref())).count(),
        local_retrieval_calls: tool_sequence.iter().filter(|t| is_local(t.as_ref())).count(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FallbackReport {
    pub missing_local_stated: bool,
    pub fallback_tool_calls: usize,
}

pub fn missing_local_fallback<S: AsRef<str>>(response_text: &str, tool_sequence: &[S]) -> FallbackReport {
    FallbackReport {
        missing_local_stated: MISSING_LOCAL.iter().any(|re| re.is_match(response_text)),
        fallback_tool_calls: tool_sequence
            .iter()
            .filter(|t| FALLBACK_TOOLS.contains(&t.as_ref()))
            .count(),
    }
}
