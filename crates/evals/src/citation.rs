//! Citation link checks: local papers are cited as `/paper/{id}`.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]\(([^)]+)\)").expect("markdown link pattern"));

static LOCAL_PAPER_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/paper/[A-Za-z0-9._:-]+$").expect("local paper url pattern"));

const LOCAL_PREFIX: &str = "/paper/";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CitationReport {
    pub minimum_local_citations: usize,
    /// Malformed local URLs plus every non-local URL.
    pub invalid_citation_url_count: usize,
    pub all_citation_urls: Vec<String>,
}

pub fn extract_citation_urls(text: &str) -> Vec<String> {
    MARKDOWN_LINK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn evaluate_citations(text: &str) -> CitationReport {
    let urls = extract_citation_urls(text);
    let (local, external): (Vec<&String>, Vec<&String>) =
        urls.iter().partition(|url| url.starts_with(LOCAL_PREFIX));
    let malformed_local = local
        .iter()
        .filter(|url| !LOCAL_PAPER_URL.is_match(url))
        .count();

    CitationReport {
        minimum_local_citations: local.len(),
        invalid_citation_url_count: malformed_local + external.len(),
        all_citation_urls: urls,
    }
}
