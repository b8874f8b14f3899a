//! Filter contract: no hidden tag, whole or partial, survives the stream
//! filter under the given chunking.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;
use veilstream_filter::StreamFilter;

use crate::hygiene::HIDDEN_TAG;

static RAW_PARTIAL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(?:think|priv|deb)").expect("partial tag pattern"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterContractReport {
    pub visible_text: String,
    pub hidden_tag_leakage_count: usize,
    pub raw_partial_tag_leakage_count: usize,
}

impl FilterContractReport {
    pub fn holds(&self) -> bool {
        self.hidden_tag_leakage_count == 0 && self.raw_partial_tag_leakage_count == 0
    }
}

pub fn evaluate_filter_contract<I, S>(chunks: I) -> FilterContractReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let visible_text = StreamFilter::filter_all(chunks);
    FilterContractReport {
        hidden_tag_leakage_count: HIDDEN_TAG.find_iter(&visible_text).count(),
        raw_partial_tag_leakage_count: RAW_PARTIAL_TAG.find_iter(&visible_text).count(),
        visible_text,
    }
}
