//! Deterministic checks over what a client actually received.
//!
//! Every check is a pure function of a decoded transcript or of raw filter
//! input, so the same reports can back unit tests, CI gates and the
//! `veilstream audit` command.

pub mod citation;
pub mod contract;
pub mod hygiene;
pub mod orchestration;
pub mod tool_trace;

use serde::Serialize;
use veilstream_protocol::{parse_stream, tool_sequence, visible_text};

pub use citation::{CitationReport, evaluate_citations, extract_citation_urls};
pub use contract::{FilterContractReport, evaluate_filter_contract};
pub use hygiene::{HygieneReport, evaluate_hygiene, sensitive_leakage_count};
pub use orchestration::{OrchestrationReport, evaluate_orchestration};
pub use tool_trace::{
    FallbackReport, RetrievalBudgetReport, RetrievalOrderReport, missing_local_fallback,
    retrieval_budget, retrieval_order,
};

/// Every transcript-level check in one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub parse_errors: Vec<String>,
    pub tool_sequence: Vec<String>,
    pub hygiene: HygieneReport,
    pub sensitive_leakage_count: usize,
    pub citations: CitationReport,
    pub retrieval_order: RetrievalOrderReport,
    pub retrieval_budget: RetrievalBudgetReport,
    pub fallback: FallbackReport,
    pub visible_text: String,
}

impl AuditReport {
    /// No parse errors and no leaks of any kind.
    pub fn passed(&self) -> bool {
        self.parse_errors.is_empty() && self.hygiene.is_clean() && self.sensitive_leakage_count == 0
    }
}

/// Decode a wire transcript and run every check on it.
pub fn audit_transcript<S: AsRef<str>>(wire: &str, denylist: &[S]) -> AuditReport {
    let parsed = parse_stream([wire]);
    let text = visible_text(&parsed.events);
    let tools = tool_sequence(&parsed.events);

    AuditReport {
        hygiene: evaluate_hygiene(&text),
        sensitive_leakage_count: sensitive_leakage_count(&text, denylist),
        citations: evaluate_citations(&text),
        retrieval_order: retrieval_order(&tools),
        retrieval_budget: retrieval_budget(&tools),
        fallback: missing_local_fallback(&text, &tools),
        parse_errors: parsed.parse_errors,
        tool_sequence: tools,
        visible_text: text,
    }
}
