//! Leakage checks on visible text.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

pub(crate) static HIDDEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:thinking|private|debug)\b").expect("hidden tag pattern")
});

static ABSOLUTE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^|[\s`])/(?:Users|home|var|tmp)/[^\s`<>]+").expect("absolute path pattern")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HygieneReport {
    pub hidden_tag_leakage_count: usize,
    pub absolute_path_leakage_count: usize,
}

impl HygieneReport {
    pub fn is_clean(&self) -> bool {
        self.hidden_tag_leakage_count == 0 && self.absolute_path_leakage_count == 0
    }
}

pub fn evaluate_hygiene(text: &str) -> HygieneReport {
    HygieneReport {
        hidden_tag_leakage_count: HIDDEN_TAG.find_iter(text).count(),
        absolute_path_leakage_count: ABSOLUTE_PATH.find_iter(text).count(),
    }
}

/// Number of denylisted tokens present in `text`, case-insensitively.
pub fn sensitive_leakage_count<S: AsRef<str>>(text: &str, denylist: &[S]) -> usize {
    let lowered = text.to_lowercase();
    denylist
        .iter()
        .filter(|token| lowered.contains(&token.as_ref().to_lowercase()))
        .count()
}
